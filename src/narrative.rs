use std::fmt::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::metrics::SummaryMetrics;
use crate::models::{NarrativeConfig, ReportStyle};

/// Turns a prompt into prose. Failures are fatal to the caller; nothing retries.
pub trait NarrativeGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionClient {
    agent: ureq::Agent,
    config: NarrativeConfig,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    top_p: f64,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'a str>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionClient {
    /// Reads the API key from the environment variable named in the config.
    pub fn from_config(config: &NarrativeConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| Error::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::with_api_key(config, api_key))
    }

    pub fn with_api_key(config: &NarrativeConfig, api_key: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            config: config.clone(),
            api_key,
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_completion_tokens: self.config.max_tokens,
            reasoning_effort: self
                .config
                .reasoning_effort
                .as_deref()
                .filter(|effort| !effort.trim().is_empty()),
            stream: false,
        }
    }
}

impl NarrativeGenerator for ChatCompletionClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        info!(model = %self.config.model, prompt_len = prompt.len(), "requesting narrative");
        let response = self
            .agent
            .post(&self.config.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(self.request_body(prompt))
            .map_err(|err| {
                warn!(error = %err, "narrative request failed");
                Error::UpstreamFailure(err.to_string())
            })?;
        let body = response
            .into_string()
            .map_err(|err| Error::UpstreamFailure(format!("failed to read response: {}", err)))?;
        parse_completion(&body)
    }
}

/// Pulls the first choice's text out of a chat-completions response body.
pub fn parse_completion(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|err| Error::UpstreamFailure(format!("malformed response: {}", err)))?;
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| Error::UpstreamFailure("response contained no message".to_string()))?;
    if text.is_empty() {
        return Err(Error::UpstreamFailure("response message was empty".to_string()));
    }
    Ok(text)
}

pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => format!("{}", value as i64),
        Some(value) => format!("{:.4}", value),
        None => "undefined".to_string(),
    }
}

/// Language, layout and author requirements shared by both prompts.
fn style_requirements(config: &NarrativeConfig, with_author: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nWrite the entire text in {}.", config.language);
    if config.style == ReportStyle::Abnt {
        out.push_str(
            "Follow the ABNT NBR 14724 standard for technical and scientific documents: \
             main titles in bold capital letters; subtitles in bold with only the first \
             letter capitalised; justified paragraphs with 1.5 line spacing; margins of \
             2.5 cm (top and left) and 2 cm (bottom and right); progressive section \
             numbering (1, 1.1, 1.2, ...). The text must be ready to paste into a word \
             processor document.\n",
        );
    }
    if with_author {
        if let Some(author) = config.author.as_deref().filter(|name| !name.trim().is_empty()) {
            let _ = writeln!(out, "Report author: {}", author.trim());
        }
    }
    out
}

pub fn report_prompt(summary: &SummaryMetrics, config: &NarrativeConfig) -> String {
    let mut prompt = String::from(
        "You are an assistant that writes formal, professional technical reports.\n\n\
         The following metrics summarize a Monte Carlo simulation of a login system \
         with user authentication:\n\n",
    );
    for entry in summary.entries() {
        let _ = writeln!(prompt, "- {}: {}", entry.name, format_value(entry.value));
    }
    prompt.push_str(
        "\nWrite a complete, formal and structured report with numbered sections \
         (1, 1.1, 1.2, ...):\n\
         1. Title and executive summary: state the title in capital letters, then \
         describe the context, goals and main observed metrics.\n\
         2. General metrics: interpret total requests, throughput and total simulated \
         time, pointing out patterns, trends and possible bottlenecks.\n\
         3. Authentication metrics: analyse mean authentication time, success rate, \
         failures and SLA violations and their relevance to overall performance.\n\
         4. Observations and recommendations: draw objective conclusions and suggest \
         improvements for reliability, scalability and response time.\n\n\
         Use impersonal technical language and continuous prose paragraphs; do not use \
         bullet lists. Metrics marked as undefined had no samples and must be reported \
         as such. Do not include charts or code; they are added separately.\n",
    );
    prompt.push_str(&style_requirements(config, true));
    prompt
}

pub fn chart_analysis_prompt(
    summary: &SummaryMetrics,
    chart_digest: &str,
    config: &NarrativeConfig,
) -> String {
    let mut prompt = String::from(
        "You are an assistant specialised in technical analysis of data visualisations.\n\n\
         The charts below were produced from a simulation of user logins with \
         authentication. Each chart is summarised as text.\n\n",
    );
    prompt.push_str(chart_digest);
    let _ = writeln!(
        prompt,
        "\nThe simulation observed {} requests and {} SLA violations.",
        summary.total_requests, summary.sla_violations
    );
    prompt.push_str(
        "\nInterpret the visual results clearly, formally and objectively for inclusion \
         in an academic technical report. Focus on patterns, anomalies, stability of the \
         system and insights on performance, bottlenecks and response time. Do not \
         repeat detailed numbers from the main report. Use numbered headings \
         (for example \"4.1 Analysis of performance charts\") and prose paragraphs \
         without bullet lists.\n",
    );
    prompt.push_str(&style_requirements(config, false));
    prompt
}
