//! OpenAI-compatible chat completions client for the semantic analyzer.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::{SemanticAnalyzer, build_prompt, parse_verdict};
use crate::config::SemanticConfig;
use crate::core::SemanticResult;
use crate::error::SemanticError;
use crate::graph::DependencyGraph;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// Sends the serialized graph to a chat completions endpoint and parses the verdict.
#[derive(Debug, Clone)]
pub struct LlmAnalyzer {
    config: SemanticConfig,
}

impl LlmAnalyzer {
    pub fn new(config: SemanticConfig) -> Self {
        Self { config }
    }

    fn api_key(&self) -> Result<String, SemanticError> {
        match std::env::var(&self.config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(SemanticError::Unavailable(format!(
                "environment variable {} is not set",
                self.config.api_key_env
            ))),
        }
    }
}

impl SemanticAnalyzer for LlmAnalyzer {
    #[instrument(skip_all, fields(model = %self.config.model))]
    fn analyze(&self, graph: &DependencyGraph) -> Result<SemanticResult, SemanticError> {
        let api_key = self.api_key()?;
        let prompt = build_prompt(graph)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| SemanticError::Request(e.to_string()))?;

        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": 0,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        debug!(endpoint = %self.config.endpoint, "requesting semantic analysis");
        let response = client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| SemanticError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(SemanticError::Request(format!(
                "HTTP {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| SemanticError::Malformed(e.to_string()))?;
        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SemanticError::Malformed("response has no message content".into()))?;

        parse_verdict(&text)
    }
}
