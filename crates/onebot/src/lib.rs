//! Bot-side endpoint: a OneBot (CQHTTP) websocket connection.
//!
//! Inbound chat messages are filtered and labelled by [`routing`] and forwarded
//! to the hub; hub messages are fanned out to every recipient that is
//! currently posting, as tracked by [`roster`]. The two in-band
//! [`command`]s let a chat mute and unmute itself.

pub mod command;
pub mod frames;
pub mod protocol;
pub mod roster;
pub mod routing;

pub use {
    command::Command,
    protocol::OneBotProtocol,
    roster::{PostingState, Recipient, Transition},
    routing::{FilterReason, Route, Router},
};
