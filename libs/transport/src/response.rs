//! Normalizes HTTP outcomes into canonical delivery results.

use std::collections::BTreeMap;

use chatwire_core::{DeliveryError, DeliveryResult, Party, RequestInfo};
use serde_json::Value;
use tracing::warn;

/// Folds a reqwest outcome into a [`DeliveryResult`]. Never returns an
/// error: transport failures, undecodable bodies, and platform error
/// objects all land in the result's `error` field, a platform error object
/// overriding the rest.
pub(crate) async fn normalize_response(
    platform: &str,
    outcome: Result<reqwest::Response, reqwest::Error>,
    fallback_recipient: &Party,
) -> DeliveryResult {
    let mut result = DeliveryResult {
        recipient: fallback_recipient.clone(),
        ..Default::default()
    };

    let response = match outcome {
        Ok(response) => response,
        Err(err) => {
            warn!(platform, error = %err, "delivery request failed");
            result.error = Some(DeliveryError::request(err.to_string()));
            return result;
        }
    };

    result.request = Some(request_info(&response));

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            warn!(platform, error = %err, "reading delivery response failed");
            result.error = Some(DeliveryError::request(err.to_string()));
            return result;
        }
    };

    match serde_json::from_str::<Value>(&body) {
        Ok(raw) => {
            if let Some(id) = raw.get("recipient_id").and_then(Value::as_str) {
                result.recipient = Party::new(id);
            }
            if let Some(mid) = raw.get("message_id").and_then(Value::as_str) {
                result.mids = vec![mid.to_string()];
            }
            if let Some(error) = raw.get("error") {
                result.error = Some(DeliveryError::remote(platform, error.clone()));
            }
            result.raw = raw;
        }
        Err(_) => {
            warn!(platform, "delivery response body was not JSON");
            result.error = Some(DeliveryError::decode());
        }
    }

    result
}

fn request_info(response: &reqwest::Response) -> RequestInfo {
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let encoding = headers.get("content-type").and_then(|ct| charset_of(ct));
    RequestInfo {
        status: response.status().as_u16(),
        headers,
        encoding,
    }
}

/// Pulls the charset parameter out of a Content-Type header, if any.
fn charset_of(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("charset="))
        .next()
        .map(|charset| charset.trim_matches('"').to_ascii_lowercase())
}
