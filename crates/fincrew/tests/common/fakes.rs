#![allow(dead_code)]

use std::sync::Mutex;

use fincrew::completion::{CompletionClient, CompletionError, CompletionRequest};

/// Answers by the first `(marker, reply)` whose marker occurs in the prompt,
/// recording every request it sees.
pub struct ScriptedClient {
    script: Vec<(String, Result<String, String>)>,
    fallback: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            fallback: "ok".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, marker: &str, text: &str) -> Self {
        self.script.push((marker.to_string(), Ok(text.to_string())));
        self
    }

    /// Makes requests containing `marker` fail as if the backend were down.
    pub fn fail(mut self, marker: &str, reason: &str) -> Self {
        self.script.push((marker.to_string(), Err(reason.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = self
            .script
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Ok(self.fallback.clone()));

        reply.map_err(CompletionError::Unavailable)
    }
}

/// Markers unique to each built-in stage prompt.
pub const VERIFY_MARKER: &str = "Determine whether this is a valid financial document";
pub const ANALYSIS_MARKER: &str = "Provide a structured financial report including";
pub const RISK_MARKER: &str = "Using the financial analysis as context";
pub const RECOMMEND_MARKER: &str = "provide final recommendation";

/// A client that plays the four built-in stages with canned answers.
pub fn financial_script() -> ScriptedClient {
    ScriptedClient::new()
        .reply(RECOMMEND_MARKER, "Final Recommendation: BUY\n- Revenue grew 12%")
        .reply(RISK_MARKER, "RISK: leverage is low")
        .reply(ANALYSIS_MARKER, "ANALYSIS: revenue $10M, net income $2M")
        .reply(VERIFY_MARKER, "VALID FINANCIAL DOCUMENT\n- has an income statement")
}
