//! In-process transport.
//!
//! Each call to [`MemoryTransport::accept`] queues one connection and returns
//! its remote half as a [`MemoryPeer`]; the next `connect` hands the queued
//! connection to the endpoint. With nothing queued, `connect` is refused the
//! way an unreachable server would be. Used to drive endpoints without a
//! network.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    futures::sink,
    tokio::sync::{mpsc, watch},
    tokio_stream::wrappers::UnboundedReceiverStream,
};

use crate::{
    Error, Result,
    transport::{Connection, Transport},
};

/// Transport whose remote ends live in the same process.
#[derive(Debug)]
pub struct MemoryTransport {
    name: String,
    pending: Mutex<VecDeque<Connection>>,
    attempts: watch::Sender<usize>,
}

impl MemoryTransport {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            pending: Mutex::new(VecDeque::new()),
            attempts: watch::Sender::new(0),
        })
    }

    /// Queue a connection for the next `connect` call.
    pub fn accept(&self) -> MemoryPeer {
        let (to_endpoint, inbound) = mpsc::unbounded_channel::<Result<String>>();
        let (outbound, from_endpoint) = mpsc::unbounded_channel::<String>();

        let sink = sink::unfold(outbound, |tx, frame: String| async move {
            tx.send(frame).map_err(|_| Error::Closed)?;
            Ok::<_, Error>(tx)
        });
        let source = UnboundedReceiverStream::new(inbound);

        let conn = Connection::new(Box::pin(sink), Box::pin(source));
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(conn);

        MemoryPeer {
            to_endpoint,
            from_endpoint,
        }
    }

    /// Number of `connect` calls so far, successful or not.
    pub fn attempts(&self) -> usize {
        *self.attempts.borrow()
    }

    /// Wait until at least `n` connect attempts have been made.
    pub async fn wait_for_attempts(&self, n: usize) {
        let mut rx = self.attempts.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|count| *count >= n).await;
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn describe(&self) -> String {
        format!("memory://{}", self.name)
    }

    async fn connect(&self) -> Result<Connection> {
        self.attempts.send_modify(|n| *n += 1);
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| Error::connection(format!("{}: connection refused", self.describe())))
    }
}

/// Remote half of a [`MemoryTransport`] connection.
///
/// Dropping it (or calling [`MemoryPeer::close`]) ends the endpoint's inbound
/// stream, which the endpoint sees as the server going away.
#[derive(Debug)]
pub struct MemoryPeer {
    to_endpoint: mpsc::UnboundedSender<Result<String>>,
    from_endpoint: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Deliver a text frame to the endpoint.
    pub fn send(&self, frame: impl Into<String>) -> bool {
        self.to_endpoint.send(Ok(frame.into())).is_ok()
    }

    pub fn send_json(&self, value: &serde_json::Value) -> bool {
        self.send(value.to_string())
    }

    /// Inject a transport failure into the endpoint's inbound stream.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.to_endpoint
            .send(Err(Error::Connection(message.into())))
            .is_ok()
    }

    /// Next frame written by the endpoint, or `None` once it dropped the
    /// connection.
    pub async fn recv(&mut self) -> Option<String> {
        self.from_endpoint.recv().await
    }

    /// Next frame parsed as JSON. Non-JSON frames yield `Value::Null`.
    pub async fn recv_json(&mut self) -> Option<serde_json::Value> {
        let frame = self.recv().await?;
        Some(serde_json::from_str(&frame).unwrap_or(serde_json::Value::Null))
    }

    /// A frame already written by the endpoint, without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.from_endpoint.try_recv().ok()
    }

    pub fn close(self) {}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        futures::{SinkExt, StreamExt},
    };

    #[tokio::test]
    async fn refuses_without_queued_connection() {
        let transport = MemoryTransport::new("test");
        let err = transport.connect().await.unwrap_err();
        assert!(err.to_string().contains("memory://test"));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn frames_flow_both_ways() {
        let transport = MemoryTransport::new("test");
        let mut peer = transport.accept();
        let Connection {
            mut sink,
            mut source,
        } = transport.connect().await.unwrap();

        peer.send("in");
        assert_eq!(source.next().await.unwrap().unwrap(), "in");

        sink.send("out".to_string()).await.unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("out"));

        peer.fail("reset");
        assert!(source.next().await.unwrap().is_err());

        peer.close();
        assert!(source.next().await.is_none());
    }

    #[tokio::test]
    async fn connections_are_handed_out_in_order() {
        let transport = MemoryTransport::new("test");
        let first = transport.accept();
        let _second = transport.accept();

        let Connection { mut source, .. } = transport.connect().await.unwrap();
        first.send("one");
        assert_eq!(source.next().await.unwrap().unwrap(), "one");
        assert_eq!(transport.attempts(), 1);
        transport.wait_for_attempts(1).await;
    }
}
