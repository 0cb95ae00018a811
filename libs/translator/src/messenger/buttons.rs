//! Converts generic button descriptions into platform button payloads.

use chatwire_core::{Button, ButtonKind};
use serde_json::{json, Value};

/// Label used when a button carries no text of its own.
pub const DEFAULT_LABEL: &str = "Select";

/// Where the built buttons will be embedded; each spot has its own schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonMode {
    /// Buttons inside a rich template element.
    Attachment,
    /// Quick replies rendered under the composer.
    QuickReply,
    /// Persistent-menu entries.
    Menu,
}

/// Builds platform button payloads. Pure and total: a missing label falls
/// back to [`DEFAULT_LABEL`], ordering is preserved, and truncation to the
/// platform's button limit is left to the caller.
pub fn build_buttons(buttons: &[Button], mode: ButtonMode) -> Vec<Value> {
    buttons.iter().map(|b| build_button(b, mode)).collect()
}

fn build_button(button: &Button, mode: ButtonMode) -> Value {
    let title = button
        .text
        .clone()
        .unwrap_or_else(|| DEFAULT_LABEL.to_string());

    match mode {
        ButtonMode::QuickReply => {
            if button.kind == ButtonKind::Location {
                // Location capture carries no payload of its own.
                return json!({ "content_type": "location" });
            }
            // Quick replies have no independent payload channel; the title
            // doubles as the postback payload.
            let mut reply = json!({
                "content_type": "text",
                "title": title,
                "payload": title,
            });
            if let Some(image) = &button.image {
                reply["image_url"] = json!(image);
            }
            reply
        }
        ButtonMode::Menu => {
            if button.kind == ButtonKind::Url && button.value.is_some() {
                json!({
                    "type": "web_url",
                    "title": title,
                    "url": button.value,
                })
            } else {
                json!({
                    "type": "postback",
                    "title": title,
                    "payload": button.value,
                })
            }
        }
        ButtonMode::Attachment => {
            // Template buttons open inside the hosting app.
            if button.kind == ButtonKind::Url && button.value.is_some() {
                json!({
                    "type": "web_url",
                    "title": title,
                    "url": button.value,
                    "messenger_extensions": true,
                    "webview_height_ratio": "full",
                })
            } else {
                let payload = button.value.clone().unwrap_or_else(|| title.clone());
                json!({
                    "type": "postback",
                    "title": title,
                    "payload": payload,
                    "messenger_extensions": true,
                    "webview_height_ratio": "full",
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_reply_location_has_no_payload() {
        let built = build_buttons(&[Button::location()], ButtonMode::QuickReply);
        assert_eq!(built, vec![json!({"content_type": "location"})]);
    }

    #[test]
    fn quick_reply_title_mirrors_payload() {
        let mut button = Button::postback("Yes", "IGNORED");
        button.image = Some("https://cdn.example.com/yes.png".into());
        let built = build_buttons(&[button], ButtonMode::QuickReply);
        assert_eq!(built[0]["title"], "Yes");
        assert_eq!(built[0]["payload"], "Yes");
        assert_eq!(built[0]["image_url"], "https://cdn.example.com/yes.png");
    }

    #[test]
    fn missing_label_falls_back_to_placeholder() {
        let button = Button {
            text: None,
            kind: ButtonKind::Postback,
            value: Some("DO_IT".into()),
            image: None,
        };
        let built = build_buttons(&[button], ButtonMode::Menu);
        assert_eq!(built[0]["title"], DEFAULT_LABEL);
        assert_eq!(built[0]["payload"], "DO_IT");
    }

    #[test]
    fn menu_url_button_without_value_degrades_to_postback() {
        let button = Button {
            text: Some("Site".into()),
            kind: ButtonKind::Url,
            value: None,
            image: None,
        };
        let built = build_buttons(&[button], ButtonMode::Menu);
        assert_eq!(built[0]["type"], "postback");
    }

    #[test]
    fn attachment_buttons_open_in_hosting_app() {
        let built = build_buttons(
            &[
                Button::url("Open", "https://example.com"),
                Button {
                    text: Some("Ping".into()),
                    kind: ButtonKind::Postback,
                    value: None,
                    image: None,
                },
            ],
            ButtonMode::Attachment,
        );
        assert_eq!(built[0]["type"], "web_url");
        assert_eq!(built[0]["messenger_extensions"], true);
        assert_eq!(built[0]["webview_height_ratio"], "full");
        // Postback payload defaults to the title in attachment mode.
        assert_eq!(built[1]["payload"], "Ping");
        assert_eq!(built[1]["messenger_extensions"], true);
    }

    #[test]
    fn ordering_is_preserved() {
        let built = build_buttons(
            &[
                Button::postback("a", "1"),
                Button::postback("b", "2"),
                Button::postback("c", "3"),
            ],
            ButtonMode::Attachment,
        );
        let titles: Vec<_> = built.iter().map(|b| b["title"].clone()).collect();
        assert_eq!(titles, vec![json!("a"), json!("b"), json!("c")]);
    }
}
