//! Metric names and label keys used across the relay.

/// Per-endpoint connection and traffic metrics. Labelled with `endpoint`.
pub mod endpoint {
    /// Connection attempts, including the first one
    pub const CONNECT_ATTEMPTS_TOTAL: &str = "chatbridge_endpoint_connect_attempts_total";
    /// Endpoints currently in the Ready state
    pub const READY: &str = "chatbridge_endpoints_ready";
    /// Inbound frames received from the remote side
    pub const FRAMES_RECEIVED_TOTAL: &str = "chatbridge_endpoint_frames_received_total";
    /// Frames written to the remote side
    pub const FRAMES_SENT_TOTAL: &str = "chatbridge_endpoint_frames_sent_total";
    /// Posts discarded because the endpoint was not Ready
    pub const POSTS_DROPPED_TOTAL: &str = "chatbridge_endpoint_posts_dropped_total";
}

/// Routing decisions on the bot side.
pub mod routing {
    /// Events forwarded to the hub
    pub const FORWARDED_TOTAL: &str = "chatbridge_routing_forwarded_total";
    /// Events filtered out (unlistened source, unsupported sub-type)
    pub const FILTERED_TOTAL: &str = "chatbridge_routing_filtered_total";
    /// Posting commands that changed a recipient's state. Labelled with `command`.
    pub const COMMANDS_TOTAL: &str = "chatbridge_routing_commands_total";
}

/// Common label keys.
pub mod labels {
    pub const ENDPOINT: &str = "endpoint";
    pub const COMMAND: &str = "command";
}
