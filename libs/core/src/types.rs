use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Supported messaging platforms.
///
/// ```
/// use chatwire_core::Platform;
///
/// let p: Platform = "messenger".parse().unwrap();
/// assert_eq!(p.as_str(), "messenger");
/// assert!("carrier-pigeon".parse::<Platform>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Messenger,
    Raw,
}

impl Platform {
    /// Returns the lowercase string identifier used in payloads and results.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Messenger => "messenger",
            Platform::Raw => "raw",
        }
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "messenger" => Ok(Platform::Messenger),
            "raw" => Ok(Platform::Raw),
            other => Err(ConfigError::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a conversation. The id stays `None` until resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Party {
    pub id: Option<String>,
}

impl Party {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
        }
    }

    /// A party whose id has not been resolved yet.
    pub fn unresolved() -> Self {
        Self { id: None }
    }
}

/// Attachment media classes accepted by the structured platform.
///
/// `None` marks an attachment that carries no media at all (for example a
/// quick-reply container); it is never sent as a media type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
    Video,
    File,
    None,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Video => "video",
            AttachmentKind::File => "file",
            AttachmentKind::None => "none",
        }
    }

    /// Parses a wire string, returning `None` for anything unrecognized.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(AttachmentKind::Image),
            "audio" => Some(AttachmentKind::Audio),
            "video" => Some(AttachmentKind::Video),
            "file" => Some(AttachmentKind::File),
            "none" => Some(AttachmentKind::None),
            _ => None,
        }
    }

    /// Whether this kind can be sent as a media attachment.
    pub fn is_media(&self) -> bool {
        !matches!(self, AttachmentKind::None)
    }
}

/// Button kinds understood by the button builder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ButtonKind {
    Url,
    Postback,
    Location,
}

/// A generic button/quick-reply/menu-item description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Button {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub kind: ButtonKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Button {
    pub fn postback(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            kind: ButtonKind::Postback,
            value: Some(value.into()),
            image: None,
        }
    }

    pub fn url(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            kind: ButtonKind::Url,
            value: Some(value.into()),
            image: None,
        }
    }

    pub fn location() -> Self {
        Self {
            text: None,
            kind: ButtonKind::Location,
            value: None,
            image: None,
        }
    }
}

/// A single attachment on a canonical message.
///
/// `latitude`/`longitude` are only meaningful as a pair. `cache_expiry` is an
/// epoch-seconds timestamp; the outbound builder marks the asset reusable only
/// while it lies in the future.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AttachmentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reusable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_expiry: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

impl Attachment {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Container attachment that only carries buttons (quick replies).
    pub fn with_buttons(buttons: Vec<Button>) -> Self {
        Self {
            buttons,
            ..Default::default()
        }
    }
}

/// Sender-action directives accepted by the structured platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    TypingOn,
    TypingOff,
    MarkSeen,
}

impl SenderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderAction::TypingOn => "typing_on",
            SenderAction::TypingOff => "typing_off",
            SenderAction::MarkSeen => "mark_seen",
        }
    }
}

/// Push-notification hint attached to an outbound payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Regular,
    SilentPush,
    NoPush,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Regular => "REGULAR",
            NotificationKind::SilentPush => "SILENT_PUSH",
            NotificationKind::NoPush => "NO_PUSH",
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Auxiliary signals carried alongside a message.
///
/// A default `Extras` serializes to `{}`; every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Extras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Delivery watermark (epoch millis) from a delivery receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<i64>,
    /// Read watermark (epoch millis) from a read receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mids: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_echo: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_postback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<SenderAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationKind>,
}

impl Extras {
    pub fn is_empty(&self) -> bool {
        *self == Extras::default()
    }
}

/// The wire-neutral message record exchanged between translators and
/// application logic.
///
/// `text: None` means the original payload had no text field at all;
/// `text: Some("")` means the field was present but empty. Translators and
/// builders preserve that distinction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CanonicalMessage {
    #[serde(default)]
    pub sender: Party,
    #[serde(default)]
    pub recipient: Party,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Extras::is_empty")]
    pub extras: Extras,
    /// Untouched original payload, retained for diagnostics.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

impl CanonicalMessage {
    /// Plain text message addressed to `recipient`.
    pub fn text(recipient: Party, body: impl Into<String>) -> Self {
        Self {
            recipient,
            text: Some(body.into()),
            ..Default::default()
        }
    }

    /// Sender-action-only message (typing indicator, mark-seen).
    pub fn action(recipient: Party, action: SenderAction) -> Self {
        Self {
            recipient,
            extras: Extras {
                action: Some(action),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Whether the message carries sendable content (non-empty text or any
    /// attachment), as opposed to signals only.
    pub fn has_content(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty()) || !self.attachments.is_empty()
    }

    /// Fills an unset recipient from the reply context's sender.
    pub fn ensure_recipient(&mut self, ctx: &ReplyContext) {
        if self.recipient.id.is_none() {
            self.recipient = ctx.sender.clone();
        }
    }
}

/// Request-scoped record of who an inbound message came from, used by the
/// reply shorthand. Captured per request; never shared across requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyContext {
    pub sender: Party,
    pub recipient: Party,
}

impl ReplyContext {
    pub fn from_inbound(message: &CanonicalMessage) -> Self {
        Self {
            sender: message.sender.clone(),
            recipient: message.recipient.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn platform_parses_known_names_only() {
        assert_eq!("messenger".parse::<Platform>().unwrap(), Platform::Messenger);
        assert_eq!("raw".parse::<Platform>().unwrap(), Platform::Raw);
        assert!("telegram".parse::<Platform>().is_err());
    }

    #[test]
    fn default_extras_serialize_to_empty_object() {
        let value = serde_json::to_value(Extras::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn text_state_distinction_survives_round_trip() {
        let absent = CanonicalMessage::default();
        let empty = CanonicalMessage {
            text: Some(String::new()),
            ..Default::default()
        };

        let absent_back: CanonicalMessage =
            serde_json::from_value(serde_json::to_value(&absent).unwrap()).unwrap();
        let empty_back: CanonicalMessage =
            serde_json::from_value(serde_json::to_value(&empty).unwrap()).unwrap();

        assert_eq!(absent_back.text, None);
        assert_eq!(empty_back.text, Some(String::new()));
    }

    #[test]
    fn ensure_recipient_only_fills_unset_ids() {
        let inbound = CanonicalMessage {
            sender: Party::new("user-1"),
            recipient: Party::new("page-1"),
            ..Default::default()
        };
        let ctx = ReplyContext::from_inbound(&inbound);

        let mut reply = CanonicalMessage::text(Party::unresolved(), "hi");
        reply.ensure_recipient(&ctx);
        assert_eq!(reply.recipient.id.as_deref(), Some("user-1"));

        let mut addressed = CanonicalMessage::text(Party::new("someone-else"), "hi");
        addressed.ensure_recipient(&ctx);
        assert_eq!(addressed.recipient.id.as_deref(), Some("someone-else"));
    }

    #[test]
    fn action_only_message_has_no_content() {
        let msg = CanonicalMessage::action(Party::new("u"), SenderAction::TypingOn);
        assert!(!msg.has_content());
        assert!(CanonicalMessage::text(Party::new("u"), "hello").has_content());
        // Present-but-empty text is not content either.
        let empty = CanonicalMessage {
            text: Some(String::new()),
            ..Default::default()
        };
        assert!(!empty.has_content());
    }
}
