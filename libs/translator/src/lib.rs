//! Translators between the canonical chat model and platform wire formats.
//!
//! Inbound: [`translate_inbound`] normalizes a webhook payload into a
//! [`CanonicalMessage`] and never fails — malformed input degrades to an
//! empty message and is logged. Outbound: the per-platform builders turn a
//! canonical message into request payloads, and [`split_for_delivery`]
//! decomposes one logical send into the minimal ordered sequence the target
//! platform can legally accept.

pub mod messenger;
pub mod raw;

use chatwire_core::{CanonicalMessage, Platform};
use serde_json::Value;

pub use messenger::outbound::SendLimits;

/// Normalizes an inbound webhook payload for `platform` into the canonical
/// model. Total: structural mismatches are logged and yield a best-effort
/// message with `sender.id = None`.
pub fn translate_inbound(platform: Platform, payload: &Value) -> CanonicalMessage {
    match platform {
        Platform::Messenger => messenger::inbound::translate(payload),
        Platform::Raw => raw::translate(payload),
    }
}

/// Builds the single-payload representation of `out` for `platform`.
pub fn build_payload(platform: Platform, out: &CanonicalMessage, limits: &SendLimits) -> Value {
    match platform {
        Platform::Messenger => messenger::outbound::build_payload(out, limits),
        Platform::Raw => raw::build_payload(out),
    }
}

/// Smart send: splits one logical message into the ordered sends the
/// platform accepts. A no-op single-element list for the raw platform.
pub fn split_for_delivery(platform: Platform, out: &CanonicalMessage) -> Vec<CanonicalMessage> {
    match platform {
        Platform::Messenger => messenger::outbound::split_for_delivery(out),
        Platform::Raw => vec![out.clone()],
    }
}
