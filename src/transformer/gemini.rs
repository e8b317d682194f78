//! Gemini `streamGenerateContent` wire types.
//!
//! Only the fields the relay reads or writes are modelled. Everything else in
//! the upstream payload is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Role assigned to the caller's prompt.
pub const USER_ROLE: &str = "user";

// ============================================================================
// Request
// ============================================================================

/// `{"contents":[{"role":"user","parts":[{"text":"..."}]}]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Single-turn request carrying one user prompt.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                role: Some(USER_ROLE.to_string()),
                parts: vec![Part {
                    text: Some(prompt.into()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ============================================================================
// Response
// ============================================================================

/// One element of the streamed response array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    /// Present when the upstream reports a failure inside the stream.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, if present and non-empty.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}

/// Parse one complete JSON object from the stream and pull out its text.
///
/// Objects that do not parse, or parse without text, yield `None`. Neither
/// case is an error.
pub fn extract_text(object: &str) -> Option<String> {
    let response: GenerateContentResponse = match serde_json::from_str(object) {
        Ok(response) => response,
        Err(e) => {
            tracing::trace!(error = %e, "Skipping unparsable stream object");
            return None;
        }
    };

    if let Some(error) = &response.error {
        tracing::warn!(error = %error, "Upstream reported an error inside the stream");
        return None;
    }

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        tracing::debug!(block_reason = %reason, "Upstream blocked the prompt");
    }

    if let Some(reason) = response
        .candidates
        .first()
        .and_then(|candidate| candidate.finish_reason.as_deref())
    {
        tracing::debug!(finish_reason = %reason, "Upstream candidate finished");
    }

    response.first_text().map(str::to_string)
}
