use std::fmt;

/// Lifecycle of one endpoint connection.
///
/// Only `Ready` accepts outbound posts; in every other state posts are
/// dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Handshaking,
    Ready,
    Closing,
}

impl ConnectionState {
    #[must_use]
    pub fn accepts_posts(self) -> bool {
        self == Self::Ready
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Handshaking => "handshaking",
            Self::Ready => "ready",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of inspecting the handshake acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Handshake completed; the endpoint may post.
    Ready,
    /// Unexpected acknowledgement. Inbound events are still processed but the
    /// endpoint never becomes Ready on this connection.
    ReceiveOnly,
}
