//! HTTP delivery adapters for the supported platforms.
//!
//! Each client performs one HTTP call with an injected [`reqwest::Client`]
//! and normalizes the outcome into a [`chatwire_core::DeliveryResult`];
//! delivery failures are captured there, never raised. Only configuration
//! mistakes surface as `Err`.

mod config;
mod messenger;
mod raw;
mod response;
mod verify;

pub use config::{MessengerConfig, PlatformConfig, RawConfig, DEFAULT_API_BASE};
pub use messenger::MessengerClient;
pub use raw::RawClient;
pub use verify::verify_webhook;
