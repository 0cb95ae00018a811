//! Structured-platform translation: webhook events in, Graph API payloads out.

pub mod buttons;
pub mod inbound;
pub mod outbound;

pub use buttons::{build_buttons, ButtonMode};
pub use inbound::translate;
pub use outbound::{build_payload, split_for_delivery, SendLimits};
