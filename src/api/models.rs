//! Request and response models for the relay API.

use crate::core::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Inbound body: `{"prompt": "<string>"}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl PromptRequest {
    /// Parse a raw body and return its prompt.
    ///
    /// Malformed JSON, a missing or null `prompt`, a non-string `prompt` and
    /// an empty string are all rejected.
    pub fn parse_prompt(body: &[u8]) -> Result<String> {
        let request: PromptRequest = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid JSON body: {}", e)))?;

        match request.prompt {
            Some(prompt) if !prompt.is_empty() => Ok(prompt),
            Some(_) => Err(AppError::InvalidRequest("Empty prompt".to_string())),
            None => Err(AppError::InvalidRequest("Missing prompt".to_string())),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}
