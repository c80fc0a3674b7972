// Local similarity index
// TF-IDF vectors over the knowledge base, cosine-scored per query

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_stemmers::{Algorithm, Stemmer};
use serde::Deserialize;
use tracing::info;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "this", "to", "was", "were", "what", "which",
    "who", "will", "with",
];

#[derive(Debug, Deserialize)]
struct KnowledgeEntry {
    text: String,
}

/// In-memory TF-IDF index over a fixed document set. Built once at startup,
/// read-only afterwards.
pub struct KnowledgeIndex {
    documents: Vec<String>,
    idf: HashMap<String, f64>,
    // One sparse unit-length vector per document, keyed by stemmed term.
    doc_vectors: Vec<HashMap<String, f64>>,
    stemmer: Stemmer,
}

impl KnowledgeIndex {
    /// Load a JSON knowledge base: an array of `{ "text": ... }` entries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read knowledge base at {}", path.display()))?;
        let entries: Vec<KnowledgeEntry> = serde_json::from_str(&contents)
            .with_context(|| format!("invalid knowledge base at {}", path.display()))?;
        let index = Self::from_documents(entries.into_iter().map(|e| e.text).collect());
        info!(documents = index.len(), "knowledge base indexed");
        Ok(index)
    }

    pub fn from_documents(documents: Vec<String>) -> Self {
        let stemmer = Stemmer::create(Algorithm::English);

        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| tokenize(doc, &stemmer))
            .collect();

        // Document frequency per term.
        let mut df: HashMap<String, usize> = HashMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&String> = tokens.iter().collect();
            seen.sort();
            seen.dedup();
            for term in seen {
                *df.entry(term.clone()).or_default() += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, count)| (term, (n / (1.0 + count as f64)).ln() + 1.0))
            .collect();

        let doc_vectors = tokenized
            .iter()
            .map(|tokens| weighted_vector(tokens, &idf))
            .collect();

        Self {
            documents,
            idf,
            doc_vectors,
            stemmer,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Best-scoring document for the query, with its cosine similarity.
    /// None when the index is empty or the query shares no vocabulary.
    pub fn best_match(&self, query: &str) -> Option<(&str, f64)> {
        let tokens = tokenize(query, &self.stemmer);
        let query_vector = weighted_vector(&tokens, &self.idf);
        if query_vector.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, doc_vector) in self.doc_vectors.iter().enumerate() {
            let score = dot(&query_vector, doc_vector);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((i, score)),
            }
        }

        best.map(|(i, score)| (self.documents[i].as_str(), score))
    }
}

fn tokenize(text: &str, stemmer: &Stemmer) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| w.len() > 1 && !STOP_WORDS.contains(w))
        .map(|w| stemmer.stem(w).to_string())
        .collect()
}

/// tf * idf weights, normalized to unit length so dot products are cosines.
fn weighted_vector(tokens: &[String], idf: &HashMap<String, f64>) -> HashMap<String, f64> {
    let mut tf: HashMap<String, f64> = HashMap::new();
    for token in tokens {
        *tf.entry(token.clone()).or_default() += 1.0;
    }

    let mut vector: HashMap<String, f64> = tf
        .into_iter()
        .filter_map(|(term, count)| idf.get(&term).map(|idf| (term, count * idf)))
        .collect();

    let norm: f64 = vector.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in vector.values_mut() {
            *value /= norm;
        }
    }
    vector
}

fn dot(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    // Iterate the smaller map.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, v)| large.get(term).map(|w| v * w))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> KnowledgeIndex {
        KnowledgeIndex::from_documents(vec![
            "Rust is a systems programming language focused on safety and speed.".to_string(),
            "Python is a popular interpreted language for scripting and data science.".to_string(),
            "Photosynthesis converts sunlight into chemical energy in plants.".to_string(),
        ])
    }

    #[test]
    fn test_exact_topic_scores_highest() {
        let index = sample_index();
        let (doc, score) = index.best_match("rust programming language safety").unwrap();
        assert!(doc.contains("Rust"));
        assert!(score > 0.4, "score was {score}");
    }

    #[test]
    fn test_unrelated_query_scores_low() {
        let index = sample_index();
        match index.best_match("weather forecast for tomorrow") {
            Some((_, score)) => assert!(score <= 0.4, "score was {score}"),
            None => {}
        }
    }

    #[test]
    fn test_empty_index_returns_none() {
        let index = KnowledgeIndex::from_documents(Vec::new());
        assert!(index.is_empty());
        assert!(index.best_match("anything").is_none());
    }

    #[test]
    fn test_no_shared_vocabulary_returns_none_or_zero() {
        let index = sample_index();
        if let Some((_, score)) = index.best_match("zzzz qqqq") {
            assert_eq!(score, 0.0);
        }
    }

    #[test]
    fn test_load_from_json_file() -> Result<()> {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"[{{"text": "The capital of France is Paris."}}, {{"text": "Water boils at 100 degrees Celsius."}}]"#
        )?;

        let index = KnowledgeIndex::load(file.path())?;
        assert_eq!(index.len(), 2);
        let (doc, _) = index.best_match("capital france").unwrap();
        assert!(doc.contains("Paris"));
        Ok(())
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(KnowledgeIndex::load("/nonexistent/kb.json").is_err());
    }
}
