//! Supervised endpoint runtime shared by both relay sides.
//!
//! An [`Endpoint`] owns one [`Transport`] and runs connect → handshake →
//! receive in a loop, sleeping a fixed delay after every failure. The
//! side-specific parts (what to say first, how to read frames, how to turn a
//! post into frames) live behind [`Protocol`].
//!
//! Posts from the peer never touch the connection directly: they are queued
//! to the endpoint task, which writes them only while `Ready`. Anything that
//! arrives while the endpoint is not Ready is dropped, not buffered.

use std::{sync::Arc, time::Duration};

use {
    futures::{SinkExt, StreamExt},
    tokio::sync::{mpsc, watch},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use chatbridge_metrics::{counter, endpoint as endpoint_metrics, gauge, labels};

use crate::{
    Result,
    state::{ConnectionState, Readiness},
    transport::{Connection, FrameSink, Transport},
};

/// Side-specific behaviour plugged into an [`Endpoint`].
///
/// All methods run on the endpoint's own task, so implementations can keep
/// mutable state without locking.
pub trait Protocol: Send + 'static {
    /// Short identifier used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Frame to send right after connecting, if any.
    fn hello(&mut self) -> Result<Option<String>>;

    /// Inspect the first inbound frame of a connection.
    fn on_handshake(&mut self, frame: &str) -> Readiness;

    /// Handle one inbound frame. Returned frames are written back on this
    /// endpoint's own connection; forwarding goes through `peer`.
    ///
    /// An error discards the frame but keeps the connection.
    fn on_frame(&mut self, frame: &str, peer: &dyn Peer) -> Result<Vec<String>>;

    /// Turn a post from the peer into frames for this connection.
    fn render_post(&mut self, text: &str) -> Result<Vec<String>>;
}

/// The one-way forwarding edge between endpoints.
pub trait Peer: Send + Sync {
    /// Best-effort delivery. Returns `false` when the text was dropped.
    fn post(&self, text: String) -> bool;
}

/// Fixed-delay reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_DELAY)
    }
}

/// Upper bound on the close handshake during `stop()`.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Why a single connection attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// `stop()` was requested; do not reconnect.
    Stopped,
    /// The remote side closed the stream.
    RemoteClosed,
}

/// Cloneable control surface of a running [`Endpoint`].
///
/// This is what the peer holds: posting is safe from any task.
#[derive(Debug, Clone)]
pub struct EndpointHandle {
    name: &'static str,
    state: watch::Receiver<ConnectionState>,
    posts: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl EndpointHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state().accepts_posts()
    }

    /// Queue `text` for delivery if the endpoint is Ready; drop it otherwise.
    pub fn post(&self, text: impl Into<String>) -> bool {
        if !self.is_ready() {
            debug!(endpoint = self.name, state = %self.state(), "dropping post: endpoint not ready");
            #[cfg(feature = "metrics")]
            counter!(endpoint_metrics::POSTS_DROPPED_TOTAL, labels::ENDPOINT => self.name)
                .increment(1);
            return false;
        }
        self.posts.send(text.into()).is_ok()
    }

    /// Close the transport and end the run loop without reconnecting.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait until the endpoint reaches `target`. Returns `false` if the
    /// endpoint went away first.
    pub async fn wait_for_state(&self, target: ConnectionState) -> bool {
        let mut rx = self.state.clone();
        rx.wait_for(|s| *s == target).await.is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

impl Peer for EndpointHandle {
    fn post(&self, text: String) -> bool {
        EndpointHandle::post(self, text)
    }
}

/// One managed connection with its own lifecycle.
pub struct Endpoint<P> {
    protocol: P,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    state: watch::Sender<ConnectionState>,
    posts: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
}

impl<P: Protocol> Endpoint<P> {
    pub fn new(
        protocol: P,
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
    ) -> (Self, EndpointHandle) {
        let (state, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (posts_tx, posts) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let handle = EndpointHandle {
            name: protocol.name(),
            state: state_rx,
            posts: posts_tx,
            cancel: cancel.clone(),
        };
        let endpoint = Self {
            protocol,
            transport,
            retry,
            state,
            posts,
            cancel,
        };
        (endpoint, handle)
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Supervised loop. Returns only after `stop()`.
    pub async fn run(mut self, peer: Arc<dyn Peer>) {
        let name = self.protocol.name();
        info!(endpoint = name, target = %self.transport.describe(), "endpoint starting");

        loop {
            match self.connect_and_serve(peer.as_ref()).await {
                Ok(Exit::Stopped) => break,
                Ok(Exit::RemoteClosed) => warn!(endpoint = name, "connection closed by remote"),
                Err(e) => warn!(endpoint = name, error = %e, "connection failed"),
            }
            self.set_state(ConnectionState::Disconnected);

            info!(
                endpoint = name,
                delay_secs = self.retry.delay.as_secs(),
                "reconnecting after delay"
            );
            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.retry.delay) => {},
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!(endpoint = name, "endpoint stopped");
    }

    /// Single connection attempt: connect, handshake, then pump frames.
    async fn connect_and_serve(&mut self, peer: &dyn Peer) -> Result<Exit> {
        let name = self.protocol.name();
        let cancel = self.cancel.clone();
        if cancel.is_cancelled() {
            return Ok(Exit::Stopped);
        }

        self.set_state(ConnectionState::Connecting);
        #[cfg(feature = "metrics")]
        counter!(endpoint_metrics::CONNECT_ATTEMPTS_TOTAL, labels::ENDPOINT => name).increment(1);

        let Connection {
            mut sink,
            mut source,
        } = tokio::select! {
            () = cancel.cancelled() => return Ok(Exit::Stopped),
            conn = self.transport.connect() => conn?,
        };
        info!(endpoint = name, "connected");
        self.discard_stale_posts();

        self.set_state(ConnectionState::Handshaking);
        if let Some(hello) = self.protocol.hello()?
            && !write_or_cancel(&mut sink, vec![hello], &cancel, name).await?
        {
            self.set_state(ConnectionState::Closing);
            close_quietly(&mut sink, name).await;
            return Ok(Exit::Stopped);
        }

        let ack = tokio::select! {
            () = cancel.cancelled() => {
                self.set_state(ConnectionState::Closing);
                close_quietly(&mut sink, name).await;
                return Ok(Exit::Stopped);
            },
            frame = source.next() => match frame {
                Some(frame) => frame?,
                None => return Ok(Exit::RemoteClosed),
            },
        };
        match self.protocol.on_handshake(&ack) {
            Readiness::Ready => {
                self.set_state(ConnectionState::Ready);
                info!(endpoint = name, "endpoint ready");
            },
            Readiness::ReceiveOnly => {
                warn!(
                    endpoint = name,
                    "unexpected handshake acknowledgement, posting disabled on this connection"
                );
            },
        }

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    self.set_state(ConnectionState::Closing);
                    close_quietly(&mut sink, name).await;
                    return Ok(Exit::Stopped);
                },
                frame = source.next() => match frame {
                    Some(Ok(frame)) => {
                        #[cfg(feature = "metrics")]
                        counter!(endpoint_metrics::FRAMES_RECEIVED_TOTAL, labels::ENDPOINT => name)
                            .increment(1);
                        let replies = match self.protocol.on_frame(&frame, peer) {
                            Ok(replies) => replies,
                            Err(e) => {
                                warn!(endpoint = name, error = %e, "discarding inbound frame");
                                continue;
                            },
                        };
                        if !write_or_cancel(&mut sink, replies, &cancel, name).await? {
                            self.set_state(ConnectionState::Closing);
                            close_quietly(&mut sink, name).await;
                            return Ok(Exit::Stopped);
                        }
                    },
                    Some(Err(e)) => return Err(e),
                    None => return Ok(Exit::RemoteClosed),
                },
                Some(text) = self.posts.recv() => {
                    if !self.state.borrow().accepts_posts() {
                        debug!(endpoint = name, "dropping queued post: endpoint not ready");
                        continue;
                    }
                    let frames = match self.protocol.render_post(&text) {
                        Ok(frames) => frames,
                        Err(e) => {
                            warn!(endpoint = name, error = %e, "failed to encode post");
                            continue;
                        },
                    };
                    if !write_or_cancel(&mut sink, frames, &cancel, name).await? {
                        self.set_state(ConnectionState::Closing);
                        close_quietly(&mut sink, name).await;
                        return Ok(Exit::Stopped);
                    }
                },
            }
        }
    }

    /// Posts queued for a previous connection are not replayed.
    fn discard_stale_posts(&mut self) {
        let mut dropped = 0usize;
        while self.posts.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(endpoint = self.protocol.name(), dropped, "discarded stale posts");
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev == next {
            return;
        }
        debug!(endpoint = self.protocol.name(), from = %prev, to = %next, "state changed");

        #[cfg(feature = "metrics")]
        {
            let ready = gauge!(endpoint_metrics::READY);
            if next == ConnectionState::Ready {
                ready.increment(1.0);
            } else if prev == ConnectionState::Ready {
                ready.decrement(1.0);
            }
        }
    }
}

async fn write_frames(sink: &mut FrameSink, frames: Vec<String>, name: &'static str) -> Result<()> {
    for frame in frames {
        debug!(endpoint = name, %frame, "send");
        sink.send(frame).await?;
        #[cfg(feature = "metrics")]
        counter!(endpoint_metrics::FRAMES_SENT_TOTAL, labels::ENDPOINT => name).increment(1);
    }
    Ok(())
}

/// Write `frames` unless `stop()` is requested first.
///
/// Returns `Ok(false)` when cancelled. A remote that stops reading would
/// otherwise keep the write pending forever.
async fn write_or_cancel(
    sink: &mut FrameSink,
    frames: Vec<String>,
    cancel: &CancellationToken,
    name: &'static str,
) -> Result<bool> {
    tokio::select! {
        () = cancel.cancelled() => Ok(false),
        written = write_frames(sink, frames, name) => written.map(|()| true),
    }
}

/// Flushing the close can stall just like any other write.
async fn close_quietly(sink: &mut FrameSink, name: &'static str) {
    match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
        Ok(Ok(())) => {},
        Ok(Err(e)) => debug!(endpoint = name, error = %e, "error while closing connection"),
        Err(_) => debug!(endpoint = name, "close timed out, dropping connection"),
    }
}
