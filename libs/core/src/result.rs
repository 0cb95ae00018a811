use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::Party;

/// Transport-level details of the HTTP exchange behind a delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestInfo {
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

/// Classes of delivery failure. These are captured into a
/// [`DeliveryResult`], never raised, so callers decide their own retry
/// policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// Connection failure or timeout before a response was read.
    Request,
    /// The response body was not valid JSON.
    Decode,
    /// The platform's own API returned a structured error object.
    Remote,
    /// Writing the payload to the local output sink failed.
    Output,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryError {
    /// `"internal"` for local failures, else the transport name.
    pub platform: String,
    pub kind: DeliveryErrorKind,
    pub message: String,
    /// The platform's error object, verbatim, for [`DeliveryErrorKind::Remote`].
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl DeliveryError {
    pub fn request(message: impl Into<String>) -> Self {
        Self {
            platform: "internal".into(),
            kind: DeliveryErrorKind::Request,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn decode() -> Self {
        Self {
            platform: "internal".into(),
            kind: DeliveryErrorKind::Decode,
            message: "Failed to convert received data to JSON".into(),
            details: Value::Null,
        }
    }

    pub fn remote(platform: impl Into<String>, details: Value) -> Self {
        let message = details
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| details.to_string());
        Self {
            platform: platform.into(),
            kind: DeliveryErrorKind::Remote,
            message,
            details,
        }
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self {
            platform: "internal".into(),
            kind: DeliveryErrorKind::Output,
            message: message.into(),
            details: Value::Null,
        }
    }
}

/// Canonical outcome of one outbound HTTP call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryResult {
    /// Absent when the request never completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,
    /// Recipient resolved from the response, else the originally addressed one.
    #[serde(default)]
    pub recipient: Party,
    /// Message ids returned by the platform.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mids: Vec<String>,
    /// Decoded response body, `null` when none was decoded.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub raw: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DeliveryError>,
}

impl DeliveryResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remote_error_keeps_platform_object_verbatim() {
        let details = json!({"message": "Invalid OAuth access token.", "code": 190});
        let err = DeliveryError::remote("messenger", details.clone());
        assert_eq!(err.kind, DeliveryErrorKind::Remote);
        assert_eq!(err.platform, "messenger");
        assert_eq!(err.message, "Invalid OAuth access token.");
        assert_eq!(err.details, details);
    }

    #[test]
    fn decode_error_uses_fixed_message() {
        let err = DeliveryError::decode();
        assert_eq!(err.message, "Failed to convert received data to JSON");
        assert_eq!(err.platform, "internal");
    }
}
