//! Transports and the supervised endpoint runtime.
//!
//! Both relay sides (bot and hub) are an [`Endpoint`] around their own
//! [`Protocol`] implementation. Each endpoint runs on its own task and talks to
//! the other one only through [`EndpointHandle::post`].

pub mod endpoint;
pub mod error;
pub mod memory;
pub mod state;
pub mod transport;
pub mod ws;

pub use {
    endpoint::{Endpoint, EndpointHandle, Peer, Protocol, RetryPolicy},
    error::{Error, Result},
    memory::{MemoryPeer, MemoryTransport},
    state::{ConnectionState, Readiness},
    transport::{Connection, Transport},
    ws::WebSocketTransport,
};
