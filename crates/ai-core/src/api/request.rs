//! Request body construction for the generate endpoint.

use serde::Serialize;

/// Body of one generate request. Built fresh per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestPayload {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
}

/// Build the request payload.
///
/// `stream` is always set. A blank system prompt and an empty prior context
/// are omitted from the body entirely rather than sent empty.
pub fn build_request(
    composed_prompt: &str,
    model: &str,
    system: Option<&str>,
    prior_context: Option<&[i64]>,
) -> RequestPayload {
    RequestPayload {
        model: model.to_string(),
        prompt: composed_prompt.to_string(),
        stream: true,
        system: system
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
        context: prior_context
            .filter(|c| !c.is_empty())
            .map(<[i64]>::to_vec),
    }
}

/// Serialize the payload to the JSON body sent on the wire.
pub fn build_request_body(payload: &RequestPayload) -> serde_json::Value {
    serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
}
