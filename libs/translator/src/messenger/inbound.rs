//! Normalizes structured webhook deliveries into the canonical model.
//!
//! The webhook envelope is decoded with explicit optional fields instead of
//! blind nested indexing; anything that does not match degrades to an empty
//! canonical message so the hosting service can still acknowledge the
//! delivery (a 5xx would only earn a duplicate retry).

use chatwire_core::{Attachment, AttachmentKind, CanonicalMessage, Party};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessagingEvent {
    sender: Option<WireParty>,
    recipient: Option<WireParty>,
    timestamp: Option<i64>,
    delivery: Option<Watermark>,
    read: Option<Watermark>,
    postback: Option<Postback>,
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct WireParty {
    id: Option<String>,
}

impl From<WireParty> for Party {
    fn from(wire: WireParty) -> Self {
        Party { id: wire.id }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Watermark {
    watermark: Option<i64>,
    mids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Postback {
    payload: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IncomingMessage {
    text: Option<String>,
    is_echo: Option<bool>,
    mid: Option<String>,
    attachments: Vec<IncomingAttachment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IncomingAttachment {
    #[serde(rename = "type")]
    kind: Option<String>,
    payload: Option<AttachmentPayload>,
    // Legacy shape: some events expose these directly on the item.
    url: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AttachmentPayload {
    url: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    sticker_id: Option<Value>,
    coordinates: Option<Coordinates>,
    is_reusable: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Coordinates {
    lat: Option<f64>,
    long: Option<f64>,
}

/// Translates a structured webhook payload. Never fails; only the first
/// messaging event of the first entry is considered.
pub fn translate(payload: &Value) -> CanonicalMessage {
    let mut message = CanonicalMessage {
        raw: payload.clone(),
        ..Default::default()
    };

    let envelope: WebhookEnvelope = match serde_json::from_value(payload.clone()) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "unrecognized messenger webhook shape");
            return message;
        }
    };

    let Some(event) = envelope
        .entry
        .into_iter()
        .next()
        .and_then(|entry| entry.messaging.into_iter().next())
    else {
        warn!("messenger webhook carried no messaging events");
        return message;
    };

    if let Some(sender) = event.sender {
        message.sender = sender.into();
    }
    if let Some(recipient) = event.recipient {
        message.recipient = recipient.into();
    }
    message.extras.timestamp = event.timestamp;

    if let Some(delivery) = event.delivery {
        message.extras.delivery = delivery.watermark;
        if !delivery.mids.is_empty() {
            message.extras.mids = delivery.mids;
        }
    }
    if let Some(read) = event.read {
        message.extras.read = read.watermark;
    }

    // Postback wins over a sibling message; the two are not expected to
    // co-occur, but the decoder needs a deterministic order.
    if let Some(postback) = event.postback {
        message.text = Some(postback.payload.unwrap_or_default());
        message.extras.is_postback = true;
    } else if let Some(incoming) = event.message {
        // A message with no text field still yields present-but-empty text.
        message.text = Some(incoming.text.unwrap_or_default());
        message.extras.is_echo = incoming.is_echo.unwrap_or(false);
        if let Some(mid) = incoming.mid {
            message.extras.mids = vec![mid];
        }
        message.attachments = incoming
            .attachments
            .into_iter()
            .filter_map(normalize_attachment)
            .collect();
    }

    message
}

fn normalize_attachment(item: IncomingAttachment) -> Option<Attachment> {
    let kind = item.kind.as_deref().and_then(AttachmentKind::parse);

    if let Some(payload) = item.payload {
        let (latitude, longitude) = payload
            .coordinates
            .map(|c| (c.lat, c.long))
            .unwrap_or((None, None));
        return Some(Attachment {
            url: payload.url,
            kind,
            reusable: payload.is_reusable,
            title: payload.title,
            description: payload.subtitle,
            sticker: payload.sticker_id.map(sticker_id_to_string),
            latitude,
            longitude,
            ..Default::default()
        });
    }

    // Legacy shape: items without a payload are dropped unless they expose
    // url/title/subtitle directly.
    if item.url.is_none() && item.title.is_none() && item.subtitle.is_none() {
        return None;
    }
    Some(Attachment {
        url: item.url,
        kind,
        title: item.title,
        description: item.subtitle,
        ..Default::default()
    })
}

fn sticker_id_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_payload(event: Value) -> Value {
        json!({ "entry": [ { "messaging": [ event ] } ] })
    }

    #[test]
    fn text_message_is_normalized() {
        let payload = event_payload(json!({
            "sender": { "id": "user-1" },
            "recipient": { "id": "page-1" },
            "timestamp": 1_700_000_000_000i64,
            "message": { "mid": "mid.1", "text": "hello" }
        }));

        let msg = translate(&payload);
        assert_eq!(msg.sender.id.as_deref(), Some("user-1"));
        assert_eq!(msg.recipient.id.as_deref(), Some("page-1"));
        assert_eq!(msg.text.as_deref(), Some("hello"));
        assert_eq!(msg.extras.timestamp, Some(1_700_000_000_000));
        assert_eq!(msg.extras.mids, vec!["mid.1".to_string()]);
        assert_eq!(msg.raw, payload);
    }

    #[test]
    fn message_without_text_field_is_present_but_empty() {
        let payload = event_payload(json!({
            "sender": { "id": "u" },
            "recipient": { "id": "p" },
            "message": { "mid": "mid.2" }
        }));
        assert_eq!(translate(&payload).text.as_deref(), Some(""));
    }

    #[test]
    fn delivery_and_read_watermarks_are_surfaced() {
        let payload = event_payload(json!({
            "sender": { "id": "u" },
            "recipient": { "id": "p" },
            "delivery": { "watermark": 111, "mids": ["mid.a", "mid.b"] },
            "read": { "watermark": 222 }
        }));

        let msg = translate(&payload);
        assert_eq!(msg.extras.delivery, Some(111));
        assert_eq!(msg.extras.read, Some(222));
        assert_eq!(msg.extras.mids, vec!["mid.a".to_string(), "mid.b".to_string()]);
        // No message and no postback: text stays absent.
        assert_eq!(msg.text, None);
    }

    #[test]
    fn postback_wins_over_sibling_message() {
        let payload = event_payload(json!({
            "sender": { "id": "u" },
            "recipient": { "id": "p" },
            "postback": { "payload": "GET_STARTED" },
            "message": { "text": "ignored" }
        }));

        let msg = translate(&payload);
        assert_eq!(msg.text.as_deref(), Some("GET_STARTED"));
        assert!(msg.extras.is_postback);
    }

    #[test]
    fn echo_flag_is_surfaced() {
        let payload = event_payload(json!({
            "sender": { "id": "page-1" },
            "recipient": { "id": "user-1" },
            "message": { "text": "echoed", "is_echo": true }
        }));
        assert!(translate(&payload).extras.is_echo);
    }

    #[test]
    fn attachment_payload_fields_are_mapped() {
        let payload = event_payload(json!({
            "sender": { "id": "u" },
            "recipient": { "id": "p" },
            "message": {
                "text": "",
                "attachments": [{
                    "type": "image",
                    "payload": {
                        "url": "http://cdn/x.png",
                        "title": "A pin",
                        "subtitle": "somewhere",
                        "sticker_id": 369_239_263_222_822i64,
                        "coordinates": { "lat": 1.5, "long": -2.25 },
                        "is_reusable": true
                    }
                }]
            }
        }));

        let msg = translate(&payload);
        assert_eq!(msg.attachments.len(), 1);
        let att = &msg.attachments[0];
        assert_eq!(att.url.as_deref(), Some("http://cdn/x.png"));
        assert_eq!(att.kind, Some(AttachmentKind::Image));
        assert_eq!(att.title.as_deref(), Some("A pin"));
        assert_eq!(att.description.as_deref(), Some("somewhere"));
        assert_eq!(att.sticker.as_deref(), Some("369239263222822"));
        assert_eq!(att.latitude, Some(1.5));
        assert_eq!(att.longitude, Some(-2.25));
        assert_eq!(att.reusable, Some(true));
    }

    #[test]
    fn legacy_attachment_shape_maps_direct_fields() {
        let payload = event_payload(json!({
            "sender": { "id": "u" },
            "recipient": { "id": "p" },
            "message": {
                "attachments": [
                    { "type": "fallback", "url": "http://x/legacy.pdf", "title": "Doc", "subtitle": "old shape" },
                    { "type": "fallback" }
                ]
            }
        }));

        let msg = translate(&payload);
        // The second item exposes nothing usable and is dropped.
        assert_eq!(msg.attachments.len(), 1);
        assert_eq!(msg.attachments[0].url.as_deref(), Some("http://x/legacy.pdf"));
        assert_eq!(msg.attachments[0].description.as_deref(), Some("old shape"));
        assert_eq!(msg.attachments[0].kind, None);
    }

    #[test]
    fn malformed_payload_degrades_to_empty_message() {
        for payload in [
            json!("not an object"),
            json!({ "entry": "nope" }),
            json!({ "entry": [] }),
            json!({ "entry": [ { "messaging": [] } ] }),
            json!({ "unrelated": true }),
        ] {
            let msg = translate(&payload);
            assert_eq!(msg.sender.id, None);
            assert_eq!(msg.text, None);
            assert!(msg.attachments.is_empty());
            assert_eq!(msg.raw, payload);
        }
    }
}
