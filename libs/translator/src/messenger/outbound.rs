//! Builds Graph API send payloads from canonical outbound messages.
//!
//! The structured platform accepts exactly one content channel per call:
//! text may not ride alongside a media attachment, and a sender action may
//! not ride alongside any content. [`build_payload`] applies those rules to
//! one message; [`split_for_delivery`] decomposes a message that needs more
//! than one call.

use chatwire_core::{classify, AttachmentKind, CanonicalMessage};
use serde_json::{json, Map, Value};
use unicode_segmentation::UnicodeSegmentation;

use super::buttons::{build_buttons, ButtonMode};

/// Platform limits applied while building payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendLimits {
    /// Maximum text length per message, in graphemes.
    pub max_text: usize,
    /// Maximum length of a title/description spilled over from text.
    pub title_len: usize,
    /// Maximum number of buttons on a template element.
    pub max_buttons: usize,
}

impl Default for SendLimits {
    fn default() -> Self {
        Self {
            max_text: 320,
            title_len: 80,
            max_buttons: 3,
        }
    }
}

/// Builds the single-call payload for `out`. Pure with respect to the
/// message: calling it twice on the same message yields identical payloads.
pub fn build_payload(out: &CanonicalMessage, limits: &SendLimits) -> Value {
    let mut message = Map::new();

    if let Some(text) = &out.text {
        message.insert(
            "text".into(),
            json!(truncate_graphemes(text, limits.max_text)),
        );
    }

    // Single-attachment handling only; multi-attachment messages never get
    // media or template treatment on this platform.
    if out.attachments.len() == 1 {
        let attachment = &out.attachments[0];
        if let Some(url) = attachment.url.as_ref().filter(|u| !u.is_empty()) {
            build_media_attachment(out, url, &mut message, limits);
        } else if matches!(attachment.kind, None | Some(AttachmentKind::None))
            && !attachment.buttons.is_empty()
        {
            // No media at all: the buttons become quick replies next to
            // whatever text is already set.
            message.insert(
                "quick_replies".into(),
                json!(build_buttons(&attachment.buttons, ButtonMode::QuickReply)),
            );
        }
    }

    let mut payload = Map::new();
    payload.insert("recipient".into(), json!({ "id": out.recipient.id }));

    // A sender action is mutually exclusive with content in a single call;
    // when content is present the action is left for the splitter.
    match &out.extras.action {
        Some(action) if message.is_empty() => {
            payload.insert("sender_action".into(), json!(action.as_str()));
        }
        _ => {
            payload.insert("message".into(), Value::Object(message));
        }
    }

    if let Some(notification) = &out.extras.notification {
        payload.insert("notification_type".into(), json!(notification.as_str()));
    }

    Value::Object(payload)
}

fn build_media_attachment(
    out: &CanonicalMessage,
    url: &str,
    message: &mut Map<String, Value>,
    limits: &SendLimits,
) {
    let attachment = &out.attachments[0];
    let kind = attachment
        .kind
        .filter(AttachmentKind::is_media)
        .unwrap_or_else(|| classify(url));
    let reusable = attachment.cache_expiry.is_some_and(|exp| exp > now_epoch());

    // Template selection looks at what the attachment itself declares; text
    // spilled into the title below does not promote a bare image to a card.
    let is_card = attachment.title.is_some()
        || attachment.description.is_some()
        || !attachment.buttons.is_empty();

    let mut title = attachment.title.clone();
    let mut description = attachment.description.clone();
    if let Some(text) = out.text.as_ref().filter(|t| !t.is_empty()) {
        // The platform refuses text next to an attachment: drop it from the
        // payload and keep its head as title (or description when a title
        // already exists).
        if title.is_none() {
            title = Some(truncate_graphemes(text, limits.title_len));
        } else if description.is_none() {
            description = Some(truncate_graphemes(text, limits.title_len));
        }
        message.remove("text");
    }

    if !is_card || kind != AttachmentKind::Image {
        message.insert(
            "attachment".into(),
            json!({
                "type": kind.as_str(),
                "payload": { "url": url, "is_reusable": reusable },
            }),
        );
        return;
    }

    let template_buttons: Vec<Value> = build_buttons(&attachment.buttons, ButtonMode::Attachment)
        .into_iter()
        .take(limits.max_buttons)
        .collect();
    let mut element = json!({
        "title": title.unwrap_or_else(|| url.to_string()),
        "image_url": url,
        "subtitle": description.unwrap_or_default(),
        "default_action": {
            "type": "web_url",
            "url": url,
            "fallback_url": url,
        },
    });
    if !template_buttons.is_empty() {
        element["buttons"] = json!(template_buttons);
    }
    message.insert(
        "attachment".into(),
        json!({
            "type": "template",
            "payload": {
                "template_type": "generic",
                "elements": [ element ],
            },
        }),
    );
}

/// Splits a message that carries both a sender action and content into the
/// ordered calls the platform accepts: content first, then the action.
pub fn split_for_delivery(out: &CanonicalMessage) -> Vec<CanonicalMessage> {
    if out.extras.action.is_none() || !out.has_content() {
        return vec![out.clone()];
    }

    let mut content = out.clone();
    content.extras.action = None;

    let mut action = out.clone();
    action.text = None;
    action.attachments.clear();

    vec![content, action]
}

fn truncate_graphemes(text: &str, max: usize) -> String {
    UnicodeSegmentation::graphemes(text, true).take(max).collect()
}

fn now_epoch() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
