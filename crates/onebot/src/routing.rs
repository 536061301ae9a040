//! Which inbound chat messages reach the hub, and how they are labelled.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use chatbridge_config::BridgeConfig;

use crate::{
    frames::{MessageEvent, MessageType},
    roster::Recipient,
};

/// Group messages must carry this sub-type; anonymous and system
/// notifications are skipped.
pub const GROUP_SUB_TYPE: &str = "normal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Forward this text to the hub.
    Forward(String),
    Filtered(FilterReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterReason {
    UnlistenedGroup(i64),
    UnlistenedFriend(i64),
    GroupSubType(String),
    MissingGroupId,
    UnsupportedMessageType,
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnlistenedGroup(id) => write!(f, "group {id} is not listened"),
            Self::UnlistenedFriend(id) => write!(f, "friend {id} is not listened"),
            Self::GroupSubType(sub) => write!(f, "group sub_type {sub:?} is not relayed"),
            Self::MissingGroupId => f.write_str("group message without group_id"),
            Self::UnsupportedMessageType => f.write_str("unsupported message_type"),
        }
    }
}

/// Listen sets and group aliases.
#[derive(Debug, Clone, Default)]
pub struct Router {
    groups: HashSet<i64>,
    friends: HashSet<i64>,
    aliases: HashMap<i64, String>,
}

impl Router {
    pub fn new(
        groups: impl IntoIterator<Item = i64>,
        friends: impl IntoIterator<Item = i64>,
        aliases: impl IntoIterator<Item = (i64, String)>,
    ) -> Self {
        Self {
            groups: groups.into_iter().collect(),
            friends: friends.into_iter().collect(),
            aliases: aliases.into_iter().collect(),
        }
    }

    /// Entries with `listen: true`. Aliases are only kept for listened groups.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let listened = || config.groups.iter().filter(|g| g.listen);
        Self::new(
            listened().map(|g| g.id),
            config.friends.iter().filter(|f| f.listen).map(|f| f.id),
            listened().filter_map(|g| g.alias.clone().map(|alias| (g.id, alias))),
        )
    }

    /// `[Group <alias or id>] `
    pub fn group_prefix(&self, group_id: i64) -> String {
        match self.aliases.get(&group_id) {
            Some(alias) => format!("[Group {alias}] "),
            None => format!("[Group {group_id}] "),
        }
    }

    pub fn route(&self, event: &MessageEvent) -> Route {
        let sender = event.sender.display_name();
        let content = event.message.to_text();
        match event.message_type {
            MessageType::Group => {
                if event.sub_type != GROUP_SUB_TYPE {
                    return Route::Filtered(FilterReason::GroupSubType(event.sub_type.clone()));
                }
                let Some(group_id) = event.group_id else {
                    return Route::Filtered(FilterReason::MissingGroupId);
                };
                if !self.groups.contains(&group_id) {
                    return Route::Filtered(FilterReason::UnlistenedGroup(group_id));
                }
                Route::Forward(format!(
                    "{}{sender}: {content}",
                    self.group_prefix(group_id)
                ))
            },
            MessageType::Private => {
                if !self.friends.contains(&event.user_id) {
                    return Route::Filtered(FilterReason::UnlistenedFriend(event.user_id));
                }
                Route::Forward(format!("{sender}: {content}"))
            },
            MessageType::Other => Route::Filtered(FilterReason::UnsupportedMessageType),
        }
    }
}

/// The chat a command applies to: the group it was sent in, or the private
/// chat with its sender.
pub fn command_scope(event: &MessageEvent) -> Option<Recipient> {
    match event.message_type {
        MessageType::Group => event.group_id.map(Recipient::Group),
        MessageType::Private => Some(Recipient::Friend(event.user_id)),
        MessageType::Other => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    fn router() -> Router {
        Router::new([123, 456], [7], [(456, "Dev".to_string())])
    }

    fn message(value: serde_json::Value) -> MessageEvent {
        serde_json::from_value(value).unwrap()
    }

    fn group(group_id: i64, sub_type: &str, text: &str) -> MessageEvent {
        message(json!({
            "message_type": "group",
            "sub_type": sub_type,
            "group_id": group_id,
            "user_id": 1,
            "sender": {"card": "Alice", "nickname": "alice99"},
            "message": text,
        }))
    }

    #[rstest]
    #[case(456, "[Group Dev] Alice: hi")]
    #[case(123, "[Group 123] Alice: hi")]
    fn group_messages_get_a_prefix(#[case] id: i64, #[case] expected: &str) {
        assert_eq!(
            router().route(&group(id, "normal", "hi")),
            Route::Forward(expected.to_string())
        );
    }

    #[test]
    fn unlistened_group_is_filtered() {
        assert_eq!(
            router().route(&group(999, "normal", "hi")),
            Route::Filtered(FilterReason::UnlistenedGroup(999))
        );
    }

    #[rstest]
    #[case("anonymous")]
    #[case("notice")]
    #[case("")]
    fn only_normal_group_messages_pass(#[case] sub_type: &str) {
        assert!(matches!(
            router().route(&group(123, sub_type, "hi")),
            Route::Filtered(FilterReason::GroupSubType(_))
        ));
    }

    #[rstest]
    #[case("friend")]
    #[case("group")]
    #[case("other")]
    fn private_messages_pass_for_any_sub_type(#[case] sub_type: &str) {
        let event = message(json!({
            "message_type": "private",
            "sub_type": sub_type,
            "user_id": 7,
            "sender": {"nickname": "Bob"},
            "message": "yo",
        }));
        assert_eq!(router().route(&event), Route::Forward("Bob: yo".to_string()));
    }

    #[test]
    fn unlistened_friend_is_filtered() {
        let event = message(json!({
            "message_type": "private",
            "sub_type": "friend",
            "user_id": 8,
            "message": "yo",
        }));
        assert_eq!(
            router().route(&event),
            Route::Filtered(FilterReason::UnlistenedFriend(8))
        );
    }

    #[test]
    fn nickname_used_when_card_is_empty() {
        let event = message(json!({
            "message_type": "group",
            "sub_type": "normal",
            "group_id": 123,
            "sender": {"card": "", "nickname": "bob"},
            "message": "x",
        }));
        assert_eq!(
            router().route(&event),
            Route::Forward("[Group 123] bob: x".to_string())
        );
    }

    #[test]
    fn command_scope_follows_the_chat() {
        assert_eq!(
            command_scope(&group(123, "normal", "bot stop posting")),
            Some(Recipient::Group(123))
        );
        let private = message(json!({"message_type": "private", "user_id": 7, "message": "x"}));
        assert_eq!(command_scope(&private), Some(Recipient::Friend(7)));
    }
}
