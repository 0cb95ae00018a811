//! Graph API client for the structured platform.

use anyhow::{Context, Result};
use chatwire_core::{
    Button, CanonicalMessage, ConfigError, DeliveryResult, Party, ReplyContext,
};
use chatwire_translator::messenger::{build_buttons, build_payload, split_for_delivery, ButtonMode};
use chatwire_translator::SendLimits;
use serde_json::{json, Value};

use crate::config::MessengerConfig;
use crate::response::normalize_response;

const PROFILE_FIELDS: &str = "first_name,last_name,profile_pic,locale,timezone,gender";

/// Sends canonical messages over the Graph API and normalizes the outcomes.
///
/// Delivery methods never fail: every outcome is a [`DeliveryResult`].
/// Thread-settings and profile lookups are configuration plumbing and do
/// return errors.
pub struct MessengerClient {
    http: reqwest::Client,
    config: MessengerConfig,
    limits: SendLimits,
}

impl MessengerClient {
    pub fn new(http: reqwest::Client, config: MessengerConfig) -> Self {
        Self {
            http,
            config,
            limits: SendLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SendLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}?access_token={}",
            self.config.api_base.trim_end_matches('/'),
            path,
            urlencoding::encode(&self.config.access_token)
        )
    }

    /// Delivers one already-built payload to the send endpoint.
    pub async fn deliver(&self, payload: &Value, recipient: &Party) -> DeliveryResult {
        let outcome = self
            .http
            .post(self.endpoint("me/messages"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.config.timeout())
            .json(payload)
            .send()
            .await;
        normalize_response("messenger", outcome, recipient).await
    }

    /// Builds and delivers the single-call payload for `out`.
    pub async fn send_message(&self, out: &CanonicalMessage) -> DeliveryResult {
        let payload = build_payload(out, &self.limits);
        self.deliver(&payload, &out.recipient).await
    }

    /// Smart send: splits `out` into the calls the platform accepts and
    /// delivers them in order.
    pub async fn smart_send(&self, out: &CanonicalMessage) -> Vec<DeliveryResult> {
        let mut results = Vec::new();
        for part in split_for_delivery(out) {
            results.push(self.send_message(&part).await);
        }
        results
    }

    /// Sends to the last known sender when `out` has no recipient.
    pub async fn reply(&self, mut out: CanonicalMessage, ctx: &ReplyContext) -> DeliveryResult {
        out.ensure_recipient(ctx);
        self.send_message(&out).await
    }

    pub async fn smart_reply(
        &self,
        mut out: CanonicalMessage,
        ctx: &ReplyContext,
    ) -> Vec<DeliveryResult> {
        out.ensure_recipient(ctx);
        self.smart_send(&out).await
    }

    /// Reads the currently whitelisted webview domains.
    pub async fn whitelisted_domains(&self) -> Result<Vec<String>> {
        let url = format!(
            "{}&fields=whitelisted_domains",
            self.endpoint("me/thread_settings")
        );
        let body: Value = self
            .http
            .get(url)
            .timeout(self.config.timeout())
            .send()
            .await
            .context("read thread settings")?
            .json()
            .await
            .context("decode thread settings")?;
        let domains = body["data"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.get("whitelisted_domains"))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        Ok(domains)
    }

    /// Replaces the webview domain whitelist. An empty list is a
    /// configuration mistake and is rejected up front.
    pub async fn set_whitelisted_domains(&self, domains: &[String]) -> Result<Value> {
        if domains.is_empty() {
            return Err(ConfigError::EmptyDomainList.into());
        }
        self.post_thread_settings(json!({
            "setting_type": "domain_whitelisting",
            "whitelisted_domains": domains,
            "domain_action_type": "add",
        }))
        .await
    }

    /// Installs the persistent menu from generic button descriptions.
    pub async fn set_persistent_menu(&self, buttons: &[Button]) -> Result<Value> {
        self.post_thread_settings(json!({
            "setting_type": "call_to_actions",
            "thread_state": "existing_thread",
            "call_to_actions": build_buttons(buttons, ButtonMode::Menu),
        }))
        .await
    }

    /// Sets the get-started button postback payload.
    pub async fn set_get_started(&self, payload: &str) -> Result<Value> {
        self.post_thread_settings(json!({
            "setting_type": "call_to_actions",
            "thread_state": "new_thread",
            "call_to_actions": [ { "payload": payload } ],
        }))
        .await
    }

    /// Removes the persistent menu.
    pub async fn clear_persistent_menu(&self) -> Result<Value> {
        let body: Value = self
            .http
            .delete(self.endpoint("me/thread_settings"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.config.timeout())
            .json(&json!({
                "setting_type": "call_to_actions",
                "thread_state": "existing_thread",
            }))
            .send()
            .await
            .context("clear persistent menu")?
            .json()
            .await
            .context("decode thread settings response")?;
        Ok(body)
    }

    /// Fetches the public profile fields for a platform user id.
    pub async fn user_profile(&self, user_id: &str) -> Result<Value> {
        let url = format!(
            "{}&fields={}",
            self.endpoint(user_id),
            PROFILE_FIELDS
        );
        let body: Value = self
            .http
            .get(url)
            .timeout(self.config.timeout())
            .send()
            .await
            .with_context(|| format!("fetch profile for {user_id}"))?
            .json()
            .await
            .context("decode profile response")?;
        Ok(body)
    }

    async fn post_thread_settings(&self, body: Value) -> Result<Value> {
        let response: Value = self
            .http
            .post(self.endpoint("me/thread_settings"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.config.timeout())
            .json(&body)
            .send()
            .await
            .context("post thread settings")?
            .json()
            .await
            .context("decode thread settings response")?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use chatwire_core::{DeliveryErrorKind, SenderAction};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(api_base: String) -> MessengerClient {
        let mut config = MessengerConfig::new("test-token");
        config.api_base = api_base;
        MessengerClient::new(reqwest::Client::new(), config)
    }

    #[tokio::test]
    async fn successful_send_surfaces_recipient_and_mid() {
        let app = Router::new().route(
            "/me/messages",
            post(|Json(payload): Json<Value>| async move {
                assert_eq!(payload["message"]["text"], "hello");
                Json(json!({ "recipient_id": "user-9", "message_id": "mid.77" }))
            }),
        );
        let base = serve(app).await;

        let result = client(base)
            .send_message(&CanonicalMessage::text(Party::new("user-9"), "hello"))
            .await;

        assert!(result.is_ok());
        assert_eq!(result.recipient.id.as_deref(), Some("user-9"));
        assert_eq!(result.mids, vec!["mid.77".to_string()]);
        assert_eq!(result.request.unwrap().status, 200);
    }

    #[tokio::test]
    async fn platform_error_object_overrides_transport_state() {
        let app = Router::new().route(
            "/me/messages",
            post(|| async {
                Json(json!({
                    "error": { "message": "Invalid OAuth access token.", "code": 190 }
                }))
            }),
        );
        let base = serve(app).await;

        let result = client(base)
            .send_message(&CanonicalMessage::text(Party::new("u"), "hi"))
            .await;

        let error = result.error.unwrap();
        assert_eq!(error.kind, DeliveryErrorKind::Remote);
        assert_eq!(error.platform, "messenger");
        assert_eq!(error.message, "Invalid OAuth access token.");
        // The original recipient is kept when the response names none.
        assert_eq!(result.recipient.id.as_deref(), Some("u"));
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let app = Router::new().route("/me/messages", post(|| async { "not json" }));
        let base = serve(app).await;

        let result = client(base)
            .send_message(&CanonicalMessage::text(Party::new("u"), "hi"))
            .await;

        let error = result.error.unwrap();
        assert_eq!(error.kind, DeliveryErrorKind::Decode);
        assert_eq!(error.message, "Failed to convert received data to JSON");
        // The request itself completed, so its details are present.
        assert_eq!(result.request.unwrap().status, 200);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_request_error() {
        // Nothing listens on this port.
        let result = client("http://127.0.0.1:9".into())
            .send_message(&CanonicalMessage::text(Party::new("u"), "hi"))
            .await;

        let error = result.error.unwrap();
        assert_eq!(error.kind, DeliveryErrorKind::Request);
        assert_eq!(error.platform, "internal");
        assert!(result.request.is_none());
    }

    #[tokio::test]
    async fn smart_send_delivers_in_order() {
        let app = Router::new().route(
            "/me/messages",
            post(|Json(payload): Json<Value>| async move {
                let mid = if payload.get("sender_action").is_some() {
                    "mid.action"
                } else {
                    "mid.content"
                };
                Json(json!({ "message_id": mid }))
            }),
        );
        let base = serve(app).await;

        let mut out = CanonicalMessage::text(Party::new("u"), "on my way");
        out.extras.action = Some(SenderAction::TypingOn);
        let results = client(base).smart_send(&out).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].mids, vec!["mid.content".to_string()]);
        assert_eq!(results[1].mids, vec!["mid.action".to_string()]);
    }

    #[tokio::test]
    async fn empty_domain_whitelist_is_rejected_without_a_call() {
        let result = client("http://127.0.0.1:9".into())
            .set_whitelisted_domains(&[])
            .await;
        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::EmptyDomainList)
        );
    }

    #[test]
    fn endpoint_escapes_the_access_token() {
        let mut config = MessengerConfig::new("to&ken=x");
        config.api_base = "https://graph.example.com/v2.6/".into();
        let client = MessengerClient::new(reqwest::Client::new(), config);
        assert_eq!(
            client.endpoint("me/messages"),
            "https://graph.example.com/v2.6/me/messages?access_token=to%26ken%3Dx"
        );
    }
}
