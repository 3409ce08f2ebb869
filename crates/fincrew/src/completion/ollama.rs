//! Ollama backend (`POST /api/generate`, non-streaming).

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionError, CompletionRequest};

/// Maximum length of a backend error body kept in error messages.
const MAX_ERROR_BODY_LENGTH: usize = 200;

fn truncate_error_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        Some((idx, _)) => format!("{}... (truncated)", &body[..idx]),
        None => body.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Blocking client for a local or remote Ollama server.
///
/// Must be constructed and dropped outside of an async runtime context.
pub struct OllamaClient {
    http: Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, CompletionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = format!("{}/api/generate", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            endpoint,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn map_transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout(e.to_string())
    } else {
        CompletionError::Unavailable(e.to_string())
    }
}

impl CompletionClient for OllamaClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
        };

        debug!(
            "Sending {} prompt chars to {} (model {})",
            request.prompt.chars().count(),
            self.endpoint,
            self.model
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            let detail = format!("{}: {}", status, truncate_error_body(&detail));

            return Err(match status {
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                    CompletionError::Timeout(detail)
                }
                s if s.is_client_error() => CompletionError::Refused(detail),
                _ => CompletionError::Unavailable(detail),
            });
        }

        let parsed: GenerateResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout(e.to_string())
            } else {
                CompletionError::Unavailable(format!("Malformed completion response: {}", e))
            }
        })?;

        Ok(parsed.response)
    }
}
