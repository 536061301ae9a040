//! Config schema types for both relay endpoints and the per-chat rules.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Fixed delay between reconnect attempts when nothing else is configured.
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 10;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bot: BotConfig,
    pub hub: HubConfig,
    pub relay: RelayConfig,
    pub groups: Vec<GroupConfig>,
    pub friends: Vec<FriendConfig>,
}

/// Bot-side connection (OneBot / CQHTTP running in websocket mode).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Websocket URL of the bot API, e.g. `ws://127.0.0.1:6700/`.
    pub url: String,
    /// Local display name, used to derive the hub client name.
    pub name: Option<String>,
}

/// Hub-side connection (MultiChat server).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub url: String,
    #[serde(serialize_with = "serialize_secret")]
    pub secret_key: Secret<String>,
    /// Name announced in the `register` request. Derived from `bot.name`
    /// when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

impl std::fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConfig")
            .field("url", &self.url)
            .field("secret_key", &"[REDACTED]")
            .field("client_name", &self.client_name)
            .finish()
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            secret_key: Secret::new(String::new()),
            client_name: None,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Relay runtime knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Seconds to wait after a connection failure before retrying.
    pub reconnect_delay_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY_SECS,
        }
    }
}

/// A bot group chat and what the relay does with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupConfig {
    pub id: i64,
    /// Label used in the forwarded prefix instead of the raw id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Forward messages from this group to the hub.
    #[serde(default)]
    pub listen: bool,
    /// Deliver hub messages into this group.
    #[serde(default)]
    pub post: bool,
}

/// A bot friend (private chat) and what the relay does with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendConfig {
    pub id: i64,
    #[serde(default)]
    pub listen: bool,
    #[serde(default)]
    pub post: bool,
}

impl BridgeConfig {
    /// Client name announced to the hub.
    ///
    /// An explicit `hub.client_name` wins; otherwise `QQ-<bot.name>`, or plain
    /// `QQ` when the bot has no name.
    pub fn hub_client_name(&self) -> String {
        if let Some(name) = self.hub.client_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match self.bot.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("QQ-{name}"),
            None => "QQ".into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.relay.reconnect_delay_secs, 10);
        assert!(cfg.groups.is_empty());
        assert!(cfg.friends.is_empty());
        assert_eq!(cfg.hub.secret_key.expose_secret(), "");
    }

    #[test]
    fn deserialize_from_toml() {
        let raw = r#"
[bot]
url = "ws://127.0.0.1:6700"
name = "Relay"

[hub]
url = "ws://hub.local:8080"
secret_key = "s3cret"

[[groups]]
id = 123
alias = "Dev"
listen = true
post = true

[[groups]]
id = 456
post = true

[[friends]]
id = 789
listen = true
"#;
        let cfg: BridgeConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.bot.url, "ws://127.0.0.1:6700");
        assert_eq!(cfg.hub.secret_key.expose_secret(), "s3cret");
        assert_eq!(cfg.groups.len(), 2);
        assert_eq!(cfg.groups[0].alias.as_deref(), Some("Dev"));
        assert!(!cfg.groups[1].listen);
        assert!(cfg.groups[1].post);
        assert!(cfg.friends[0].listen);
        assert!(!cfg.friends[0].post);
        assert_eq!(cfg.relay.reconnect_delay_secs, 10);
    }

    #[test]
    fn debug_redacts_secret() {
        let mut cfg = BridgeConfig::default();
        cfg.hub.secret_key = Secret::new("hunter2".into());
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn client_name_derivation() {
        let mut cfg = BridgeConfig::default();
        assert_eq!(cfg.hub_client_name(), "QQ");

        cfg.bot.name = Some("Lab".into());
        assert_eq!(cfg.hub_client_name(), "QQ-Lab");

        cfg.hub.client_name = Some("lab-bridge".into());
        assert_eq!(cfg.hub_client_name(), "lab-bridge");
    }
}
