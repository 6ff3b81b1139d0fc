use serde_json::Value;

use crate::error::ApiResult;
use crate::models::ForensicsResponse;

/// Human-readable verdict lines for a forensics response.
///
/// Nothing is produced unless the call itself succeeded. A tampered image gets
/// a warning followed by one numbered line per indicator.
pub fn tamper_summary(response: &ForensicsResponse) -> Vec<String> {
    if !response.status.is_success() {
        return Vec::new();
    }

    if !response.is_tampered() {
        return vec!["No signs of tampering detected".to_string()];
    }

    let mut lines = vec!["WARNING: image may have been tampered with!".to_string()];
    lines.extend(
        response
            .indicators()
            .iter()
            .enumerate()
            .map(|(i, indicator)| format!("Indicator {}: {}", i + 1, indicator.description)),
    );
    lines
}

/// Render an outcome as JSON text: the payload itself, or the error envelope.
pub fn render_result(result: &ApiResult, pretty: bool) -> String {
    let value = match result {
        Ok(payload) => payload.clone(),
        Err(failure) => failure.to_envelope(),
    };
    render_json(&value, pretty)
}

fn render_json(value: &Value, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    // serializing a Value cannot fail
    rendered.unwrap_or_default()
}
