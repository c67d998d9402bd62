//! Alert delivery for threshold crossings.
//!
//! This crate provides:
//! - A channel abstraction with console, Discord webhook and email backends
//! - A dispatcher that fans a batch of alerts out to every enabled channel,
//!   isolating per-channel failures

pub mod channel;
pub mod config;
pub mod console;
pub mod dispatcher;
pub mod email;
pub mod webhook;

pub use channel::{AlertChannel, ChannelError, DeliveryOutcome, DeliveryResult};
pub use config::{AlertSecrets, AlertSettings};
pub use console::ConsoleChannel;
pub use dispatcher::{AlertDispatcher, DispatchReport};
pub use email::EmailChannel;
pub use webhook::WebhookChannel;
