//! Abstract bidirectional text-frame channel.

use std::pin::Pin;

use {
    async_trait::async_trait,
    futures::{Sink, Stream},
};

use crate::Result;

/// Write half of a connection.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = crate::Error> + Send>>;

/// Read half of a connection. The stream ends when the remote side closes.
pub type FrameSource = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One established connection, already split into halves so the endpoint can
/// wait on inbound frames and write outbound ones from the same task.
pub struct Connection {
    pub sink: FrameSink,
    pub source: FrameSource,
}

impl Connection {
    pub fn new(sink: FrameSink, source: FrameSource) -> Self {
        Self { sink, source }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Something that can (re)open a [`Connection`].
///
/// Called once per attempt by the endpoint's reconnect loop.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable target, used in logs.
    fn describe(&self) -> String;

    async fn connect(&self) -> Result<Connection>;
}
