//! OneBot wire format.
//!
//! Outbound frames are API calls (`{"action": ..., "params": {...}}`).
//! Inbound frames are either responses to those calls, recognised by a
//! `retcode` field, or events keyed by `post_type`.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::roster::Recipient;

/// An API call sent to the bot runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum ApiCall {
    SendGroupMsg { group_id: i64, message: String },
    SendPrivateMsg { user_id: i64, message: String },
}

impl ApiCall {
    /// Message call addressed to `recipient`.
    pub fn send_to(recipient: Recipient, message: impl Into<String>) -> Self {
        let message = message.into();
        match recipient {
            Recipient::Group(group_id) => Self::SendGroupMsg { group_id, message },
            Recipient::Friend(user_id) => Self::SendPrivateMsg { user_id, message },
        }
    }

    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Any inbound frame.
#[derive(Debug, Clone)]
pub enum Inbound {
    Response(ApiResponse),
    Event(Event),
}

impl Inbound {
    pub fn parse(frame: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(frame)?;
        if value.get("retcode").is_some() {
            serde_json::from_value(value).map(Self::Response)
        } else {
            serde_json::from_value(value).map(Self::Event)
        }
    }
}

/// Result of an earlier API call. Only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub retcode: i64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "post_type", rename_all = "snake_case")]
pub enum Event {
    Message(MessageEvent),
    MetaEvent(MetaEvent),
    /// Notices, requests, `message_sent` echoes and anything newer.
    #[serde(other)]
    Other,
}

/// Lifecycle and heartbeat events.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaEvent {
    pub meta_event_type: String,
    #[serde(default)]
    pub sub_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Group,
    Private,
    #[serde(other)]
    Other,
}

/// A chat message seen by the bot.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub message_type: MessageType,
    #[serde(default)]
    pub sub_type: String,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub sender: Sender,
    pub message: MessageBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub card: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl Sender {
    /// Group card if set and non-empty, otherwise the nickname.
    pub fn display_name(&self) -> &str {
        self.card
            .as_deref()
            .filter(|card| !card.is_empty())
            .or(self.nickname.as_deref())
            .unwrap_or_default()
    }
}

/// Message content, either pre-rendered text or a segment array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Text(String),
    Segments(Vec<Segment>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl MessageBody {
    /// Plain-text rendering. Text segments are kept verbatim, anything else
    /// (images, faces, mentions) becomes a `[kind]` placeholder.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Segments(segments) => Cow::Owned(
                segments
                    .iter()
                    .map(|segment| match segment.kind.as_str() {
                        "text" => segment
                            .data
                            .get("text")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_owned(),
                        kind => format!("[{kind}]"),
                    })
                    .collect(),
            ),
        }
    }
}
