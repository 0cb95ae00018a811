//! Canonical chat message model shared by Chatwire translators and transports.
//!
//! The types here are wire-neutral: inbound translators produce a
//! [`CanonicalMessage`], outbound payload builders consume one, and transport
//! adapters report a [`DeliveryResult`]. Nothing in this crate talks to the
//! network.

mod classify;
mod error;
mod result;
mod types;

pub use classify::classify;
pub use error::ConfigError;
pub use result::{DeliveryError, DeliveryErrorKind, DeliveryResult, RequestInfo};
pub use types::{
    Attachment, AttachmentKind, Button, ButtonKind, CanonicalMessage, Extras, NotificationKind,
    Party, Platform, ReplyContext, SenderAction,
};
