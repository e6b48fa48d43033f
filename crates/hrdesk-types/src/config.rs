//! Engine configuration.
//!
//! Deserialized from `config.toml` in the data directory; every field has a
//! default so a missing or partial file still yields a working engine.

use serde::{Deserialize, Serialize};

/// Configuration for the conversation engine and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Organization name used in greeting templates.
    #[serde(default = "default_org_name")]
    pub org_name: String,

    /// Reasoning model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI-compatible endpoint of the local model server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Default top-k for retrieval; query-shape heuristics may override.
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,

    /// Minimum similarity a fragment must reach to count as grounding.
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Prompt length budget, in characters.
    #[serde(default = "default_prompt_budget")]
    pub prompt_budget: usize,

    /// Maximum retained turns per session; oldest evicted first.
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// Seconds of inactivity before a session goes Idle.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Seconds of inactivity before an Idle session expires.
    #[serde(default = "default_retention_timeout_secs")]
    pub retention_timeout_secs: u64,

    /// Upper bound on one generation call.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Upper bound on one retrieval call.
    #[serde(default = "default_retrieval_timeout_ms")]
    pub retrieval_timeout_ms: u64,

    /// Generation retries after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Contact address surfaced when the corpus has no answer.
    #[serde(default = "default_hr_contact")]
    pub hr_contact: String,

    /// Anaphoric tokens the reference resolver scans for.
    #[serde(default = "default_anaphors")]
    pub anaphors: Vec<String>,
}

fn default_org_name() -> String {
    "Acme AI Ltd.".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_tokens() -> u32 {
    1200
}

fn default_retrieval_k() -> usize {
    8
}

fn default_min_score() -> f32 {
    0.25
}

fn default_prompt_budget() -> usize {
    6000
}

fn default_history_cap() -> usize {
    20
}

fn default_idle_timeout_secs() -> u64 {
    900
}

fn default_retention_timeout_secs() -> u64 {
    3600
}

fn default_generation_timeout_secs() -> u64 {
    30
}

fn default_retrieval_timeout_ms() -> u64 {
    800
}

fn default_max_retries() -> u32 {
    2
}

fn default_hr_contact() -> String {
    "people@acmeai.tech".to_string()
}

fn default_anaphors() -> Vec<String> {
    [
        "he", "him", "his", "she", "her", "hers", "they", "them", "their", "it", "its", "this",
        "that",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            org_name: default_org_name(),
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retrieval_k: default_retrieval_k(),
            min_score: default_min_score(),
            prompt_budget: default_prompt_budget(),
            history_cap: default_history_cap(),
            idle_timeout_secs: default_idle_timeout_secs(),
            retention_timeout_secs: default_retention_timeout_secs(),
            generation_timeout_secs: default_generation_timeout_secs(),
            retrieval_timeout_ms: default_retrieval_timeout_ms(),
            max_retries: default_max_retries(),
            hr_contact: default_hr_contact(),
            anaphors: default_anaphors(),
        }
    }
}
