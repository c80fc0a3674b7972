// Configuration structs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON knowledge base backing the local similarity index.
    #[serde(default = "default_knowledge_base_path")]
    pub knowledge_base_path: PathBuf,

    /// External provider toggles.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge_base_path: default_knowledge_base_path(),
            providers: ProvidersConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_true")]
    pub duckduckgo_enabled: bool,
    #[serde(default = "default_true")]
    pub wikipedia_enabled: bool,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            duckduckgo_enabled: true,
            wikipedia_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_knowledge_base_path() -> PathBuf {
    PathBuf::from("data/knowledge_base.json")
}
