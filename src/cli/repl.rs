// Interactive REPL
// Queries in, answers with strategy provenance out; feedback commands feed
// the weight learner

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::pipeline::{PipelineResponse, QueryPipeline};
use crate::strategies::StrategyKind;

pub async fn run_repl(pipeline: QueryPipeline) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut last_experience: Option<u64> = None;

    println!("strata - adaptive query router");
    println!("Ask anything. Commands: /good /bad /stats /recent /quit");

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;

                match line {
                    "/quit" | "/exit" => break,
                    "/stats" => print_stats(&pipeline),
                    "/recent" => print_recent(&pipeline),
                    "/good" | "/bad" => match last_experience {
                        Some(id) => match pipeline.submit_feedback(id, line == "/good") {
                            Ok(()) => println!("Thanks, noted."),
                            Err(e) => println!("Could not record feedback: {e}"),
                        },
                        None => println!("Nothing to rate yet."),
                    },
                    query => {
                        let response = pipeline.respond(query).await;
                        print_response(&response);
                        last_experience = Some(response.experience_id);
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

pub fn print_response(response: &PipelineResponse) {
    println!("{}", response.answer);
    println!(
        "  [{} | confidence {:.2} | {}]",
        response.strategy_used, response.confidence, response.rationale
    );
}

fn print_stats(pipeline: &QueryPipeline) {
    let stats = pipeline.stats();
    println!("strategy      weight  success  uses");
    for kind in StrategyKind::ALL {
        if let Some(s) = stats.get(&kind) {
            println!(
                "{:<13} {:.3}   {:.2}     {}",
                kind.as_str(),
                s.weight,
                s.success_rate,
                s.total_uses
            );
        }
    }
}

fn print_recent(pipeline: &QueryPipeline) {
    let recent = pipeline.recent(10);
    if recent.is_empty() {
        println!("No queries yet.");
        return;
    }
    for experience in recent {
        let feedback = match experience.feedback {
            Some(1) => "+",
            Some(_) => "-",
            None => " ",
        };
        println!(
            "{feedback} #{} [{}] {}",
            experience.id,
            experience.strategy.as_str(),
            experience.query
        );
    }
}
