//! Generic HTTP callback client: optional stdout echo, optional POST.

use std::io::{self, Write};
use std::sync::Mutex;

use chatwire_core::{CanonicalMessage, DeliveryError, DeliveryResult};
use chatwire_translator::raw::build_payload;
use serde_json::Value;

use crate::config::RawConfig;
use crate::response::normalize_response;

/// Delivers pass-through payloads for the schema-transparent platform.
///
/// The payload is first echoed to the output sink (stdout by default,
/// optionally wrapped as a JSONP callback invocation), then POSTed to the
/// configured server when one is set. With no server configured the result
/// carries no request details and no error.
pub struct RawClient<W = io::Stdout>
where
    W: Write + Send,
{
    http: reqwest::Client,
    config: RawConfig,
    sink: Mutex<W>,
}

impl RawClient<io::Stdout> {
    pub fn new(http: reqwest::Client, config: RawConfig) -> Self {
        Self::with_sink(http, config, io::stdout())
    }
}

impl<W> RawClient<W>
where
    W: Write + Send,
{
    /// Uses a custom output sink instead of stdout.
    pub fn with_sink(http: reqwest::Client, config: RawConfig, sink: W) -> Self {
        Self {
            http,
            config,
            sink: Mutex::new(sink),
        }
    }

    pub async fn send_message(&self, out: &CanonicalMessage) -> DeliveryResult {
        let payload = build_payload(out);

        // Weakest error: overwritten by any transport or remote error below.
        let print_error = self.print_payload(&payload);

        let mut result = if let Some(server) = &self.config.server {
            let outcome = self
                .http
                .post(server)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .timeout(self.config.timeout())
                .json(&payload)
                .send()
                .await;
            normalize_response("raw", outcome, &out.recipient).await
        } else {
            DeliveryResult {
                recipient: out.recipient.clone(),
                ..Default::default()
            }
        };

        if result.error.is_none() {
            result.error = print_error;
        }
        result
    }

    /// Smart send is a no-op split on this platform.
    pub async fn smart_send(&self, out: &CanonicalMessage) -> Vec<DeliveryResult> {
        vec![self.send_message(out).await]
    }

    fn print_payload(&self, payload: &Value) -> Option<DeliveryError> {
        if !self.config.print {
            return None;
        }
        let has_text = payload
            .get("text")
            .and_then(Value::as_str)
            .is_some_and(|text| !text.is_empty());
        if self.config.print_text_only && !has_text {
            return None;
        }

        let line = match &self.config.jsonp {
            Some(callback) => format!("{callback}({payload});"),
            None => payload.to_string(),
        };

        let Ok(mut sink) = self.sink.lock() else {
            return Some(DeliveryError::output(
                "Could not print response data to the output sink.",
            ));
        };
        writeln!(sink, "{line}").err().map(|err| {
            DeliveryError::output(format!(
                "Could not print response data to the output sink: {err}"
            ))
        })
    }
}
