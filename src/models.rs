use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SimConfig {
    #[serde(default = "default_runs")]
    pub runs: usize,
    #[serde(default = "default_mean_auth_time")]
    pub mean_auth_time: f64,
    #[serde(default = "default_success_probability")]
    pub success_probability: f64,
    /// Users per unit time, scaled down to the fixed run window by the generator.
    #[serde(default = "default_arrival_rate")]
    pub arrival_rate: f64,
    #[serde(default = "default_sla_threshold")]
    pub sla_threshold: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_throughput_window")]
    pub throughput_window: usize,
    #[serde(default)]
    pub narrative: NarrativeConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            mean_auth_time: default_mean_auth_time(),
            success_probability: default_success_probability(),
            arrival_rate: default_arrival_rate(),
            sla_threshold: default_sla_threshold(),
            seed: default_seed(),
            throughput_window: default_throughput_window(),
            narrative: NarrativeConfig::default(),
        }
    }
}

/// Settings for the chat-completions service that writes the report prose.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct NarrativeConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Language the prose is written in, e.g. "English" or "Brazilian Portuguese".
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub style: ReportStyle,
    /// Author line the report prompt asks the model to include.
    #[serde(default)]
    pub author: Option<String>,
}

/// Formatting conventions requested from the narrative service.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    #[default]
    Plain,
    /// Brazilian academic layout (ABNT NBR 14724).
    Abnt,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            reasoning_effort: default_reasoning_effort(),
            timeout_secs: default_timeout_secs(),
            language: default_language(),
            style: ReportStyle::default(),
            author: None,
        }
    }
}

fn default_runs() -> usize {
    1000
}

fn default_mean_auth_time() -> f64 {
    2.0
}

fn default_success_probability() -> f64 {
    0.9
}

fn default_arrival_rate() -> f64 {
    600.0
}

fn default_sla_threshold() -> f64 {
    5.0
}

fn default_seed() -> u64 {
    42
}

fn default_throughput_window() -> usize {
    50
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "openai/gpt-oss-20b".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    1.0
}

fn default_top_p() -> f64 {
    1.0
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_reasoning_effort() -> Option<String> {
    Some("medium".to_string())
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_language() -> String {
    "English".to_string()
}
