//! HTTP dispatch of a generate request.

use super::request::RequestPayload;
use super::stream::GenerateStream;
use crate::error::TurnError;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

/// Send a streaming request and return the event stream for its body.
///
/// Connection failures and non-success statuses are transport errors; an
/// error message in a JSON error body is surfaced in place of the raw text.
pub async fn send_streaming_request(
    client: &Client,
    url: &str,
    payload: &RequestPayload,
) -> Result<GenerateStream, TurnError> {
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/x-ndjson")
        .json(payload)
        .send()
        .await
        .map_err(|e| TurnError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(TurnError::Status {
            status: status.as_u16(),
            message: error_message_from_body(&body),
        });
    }

    Ok(GenerateStream::from_response(response))
}

fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
