//! Generic HTTP callback transport: schema-transparent in both directions.
//!
//! Inbound payloads are filtered to the fields the canonical model knows;
//! outbound payloads pass through whatever the message carries, with no
//! truncation and no template selection.

use chatwire_core::{Attachment, AttachmentKind, CanonicalMessage, Extras, Party};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Translates a generic-shape payload. Never fails; a non-object payload is
/// logged and degrades to an empty canonical message.
pub fn translate(payload: &Value) -> CanonicalMessage {
    let mut message = CanonicalMessage {
        raw: payload.clone(),
        ..Default::default()
    };

    let Some(data) = payload.as_object() else {
        warn!("raw inbound payload was not a JSON object");
        return message;
    };

    // Shallow merge onto the unresolved skeleton: only a present id wins.
    if let Some(sender) = data.get("sender") {
        message.sender = party_from(sender);
    }
    if let Some(recipient) = data.get("recipient") {
        message.recipient = party_from(recipient);
    }

    message.text = Some(
        data.get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    );

    if let Some(items) = data
        .get("attachment")
        .or_else(|| data.get("attachments"))
        .and_then(Value::as_array)
    {
        message.attachments = items.iter().filter_map(filtered_attachment).collect();
    }

    if let Some(other) = data.get("other") {
        message.extras = match serde_json::from_value::<Extras>(other.clone()) {
            Ok(extras) => extras,
            Err(err) => {
                warn!(error = %err, "raw inbound \"other\" did not match known signals");
                Extras::default()
            }
        };
    }

    message
}

fn party_from(value: &Value) -> Party {
    Party {
        id: value
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Copies only the allow-listed fields; unknown fields are silently dropped.
/// Items with no recognized field at all are discarded.
fn filtered_attachment(item: &Value) -> Option<Attachment> {
    let obj = item.as_object()?;
    let mut attachment = Attachment::default();
    let mut recognized = false;

    if let Some(url) = obj.get("url").and_then(Value::as_str) {
        attachment.url = Some(url.to_string());
        recognized = true;
    }
    if let Some(kind) = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(AttachmentKind::parse)
    {
        attachment.kind = Some(kind);
        recognized = true;
    }
    if let Some(reusable) = obj.get("reusable").and_then(Value::as_bool) {
        attachment.reusable = Some(reusable);
        recognized = true;
    }
    for (key, slot) in [
        ("title", &mut attachment.title),
        ("description", &mut attachment.description),
        ("sticker", &mut attachment.sticker),
    ] {
        if let Some(text) = obj.get(key).and_then(Value::as_str) {
            *slot = Some(text.to_string());
            recognized = true;
        }
    }
    if let Some(latitude) = obj.get("latitude").and_then(Value::as_f64) {
        attachment.latitude = Some(latitude);
        recognized = true;
    }
    if let Some(longitude) = obj.get("longitude").and_then(Value::as_f64) {
        attachment.longitude = Some(longitude);
        recognized = true;
    }

    recognized.then_some(attachment)
}

/// Pass-through payload: whichever of recipient/sender/text/attachment/other
/// the message carries, verbatim.
pub fn build_payload(out: &CanonicalMessage) -> Value {
    let mut payload = Map::new();
    if out.recipient.id.is_some() {
        payload.insert("recipient".into(), json!(out.recipient));
    }
    if out.sender.id.is_some() {
        payload.insert("sender".into(), json!(out.sender));
    }
    if let Some(text) = &out.text {
        payload.insert("text".into(), json!(text));
    }
    if !out.attachments.is_empty() {
        payload.insert("attachment".into(), json!(out.attachments));
    }
    if !out.extras.is_empty() {
        payload.insert("other".into(), json!(out.extras));
    }
    Value::Object(payload)
}
