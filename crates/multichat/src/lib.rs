//! Hub-side endpoint: a client of a MultiChat relay server.
//!
//! The client registers with a name and shared secret, then exchanges
//! `client-message` / `forwarding-message` frames with the server.

pub mod frames;
pub mod protocol;

pub use {
    frames::Frame,
    protocol::{MultiChatProtocol, format_forwarded},
};
