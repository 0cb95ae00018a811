//! Webhook subscription handshake.

use std::collections::HashMap;

/// Answers the platform's subscription handshake: when the query string
/// carries the expected `hub.verify_token`, the `hub.challenge` value must
/// be echoed back verbatim. Any mismatch or missing parameter yields `None`
/// and the caller should reject the request.
pub fn verify_webhook(
    expected_token: Option<&str>,
    params: &HashMap<String, String>,
) -> Option<String> {
    let expected = expected_token?;
    let presented = params.get("hub.verify_token")?;
    if presented != expected {
        return None;
    }
    params.get("hub.challenge").cloned()
}
