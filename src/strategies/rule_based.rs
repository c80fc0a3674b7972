// Rule engine
// Safety refusals, static FAQ answers, and role-entity validation

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use super::{Prediction, Strategy, StrategyKind};
use crate::analyzer::QueryFeatures;

/// Fixed refusal for restricted queries.
const RESTRICTED_REFUSAL: &str = "I cannot fulfill this request. My safety protocols prevent me \
    from answering queries related to predictions of personal scores, hacking, or unethical \
    activities.";

static RESTRICTED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"predict.*mark",
        r"predict.*score",
        r"how.*hack",
        r"bypass.*security",
        r"cheat.*exam",
        r"illegal",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern compiles"))
    .collect()
});

/// Static FAQ rules, matched as substrings of the normalized query.
const STATIC_RULES: &[(&str, &str)] = &[
    (
        "what is meta-learning",
        "Meta-learning is 'learning how to learn': a system that automatically picks the best \
         answering strategy for each task and improves that choice over time.",
    ),
    (
        "who created you",
        "I am an adaptive answering system that routes each question to the strategy best \
         suited to it.",
    ),
    (
        "help",
        "I answer questions using different strategies: rule-based matching, retrieval, \
         classical pattern analysis, or a generative model. Rate answers with /good or /bad \
         and I adapt which strategy I reach for.",
    ),
    ("version", "System version 0.3.1"),
    (
        "minimum attendance",
        "The minimum attendance requirement is 75% for students and 3 hours per week for \
         project participants.",
    ),
    (
        "minimum age",
        "The minimum age requirement for participation is 16 years of age or older.",
    ),
    (
        "attendance requirement",
        "Attendance is mandatory at 75% threshold with a minimum of 3 active hours per week.",
    ),
    (
        "perform calculations",
        "The system supports simple arithmetic operations (+, -, *, /) and averages. It does \
         not support calculus or advanced statistical modelling.",
    ),
    (
        "what calculations",
        "I can help with basic addition, subtraction, multiplication, and division.",
    ),
    (
        "how do you learn",
        "I learn by selecting the best strategy for your question and improving my strategy \
         weights from your feedback.",
    ),
];

const INDIAN_STATES: &[&str] = &[
    "andhra pradesh",
    "arunachal pradesh",
    "assam",
    "bihar",
    "chhattisgarh",
    "goa",
    "gujarat",
    "haryana",
    "himachal pradesh",
    "jharkhand",
    "karnataka",
    "kerala",
    "madhya pradesh",
    "maharashtra",
    "manipur",
    "meghalaya",
    "mizoram",
    "nagaland",
    "odisha",
    "punjab",
    "rajasthan",
    "sikkim",
    "tamil nadu",
    "telangana",
    "tripura",
    "uttar pradesh",
    "uttarakhand",
    "west bengal",
];

/// Catch queries that pair a national role with a state-level entity; the
/// correction is more useful than whatever retrieval would find.
fn role_entity_mismatch(query: &str) -> Option<String> {
    if query.contains("prime minister") || query.contains("pm of") {
        if let Some(state) = INDIAN_STATES.iter().find(|s| query.contains(*s)) {
            let state = title_case(state);
            return Some(format!(
                "In India, {state} is a state and has a Chief Minister, not a Prime Minister. \
                 Are you looking for the Chief Minister of {state}?"
            ));
        }
    }

    if query.contains("president") {
        if let Some(state) = INDIAN_STATES.iter().find(|s| query.contains(*s)) {
            let state = title_case(state);
            return Some(format!(
                "Individual states in India do not have their own Presidents; they are headed \
                 by Governors. Were you looking for the Governor of {state} or the President \
                 of India?"
            ));
        }
    }

    None
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Safety and static-knowledge layer. Always consulted first by the
/// executor; anything it answers, it answers with full confidence.
#[derive(Debug, Default)]
pub struct RuleBasedStrategy;

impl RuleBasedStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Strategy for RuleBasedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RuleBased
    }

    async fn predict(&self, query: &str, _features: &QueryFeatures) -> Prediction {
        let q = query.trim().to_lowercase();

        if let Some(correction) = role_entity_mismatch(&q) {
            return Prediction::new(correction, 1.0, "role-entity mismatch detected");
        }

        for pattern in RESTRICTED_PATTERNS.iter() {
            if pattern.is_match(&q) {
                info!(pattern = pattern.as_str(), "restricted query blocked");
                return Prediction::new(RESTRICTED_REFUSAL, 1.0, "safety rule violation blocked");
            }
        }

        for (key, answer) in STATIC_RULES {
            if q.contains(key) {
                return Prediction::new(*answer, 1.0, format!("static rule match: '{key}'"));
            }
        }

        Prediction::miss("no rule matched")
    }
}
