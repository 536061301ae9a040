use {
    chatbridge_channels::{Peer, Protocol, Readiness, Result},
    chatbridge_config::BridgeConfig,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info, warn},
};

use crate::frames::Frame;

pub const NAME: &str = "hub";

/// `[<source>] <content>`, the text handed to the bot side.
pub fn format_forwarded(source: &str, content: &str) -> String {
    format!("[{source}] {content}")
}

/// Hub-side protocol: register, then relay forwarding messages.
pub struct MultiChatProtocol {
    client_name: String,
    secret_key: Secret<String>,
}

impl std::fmt::Debug for MultiChatProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiChatProtocol")
            .field("client_name", &self.client_name)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl MultiChatProtocol {
    pub fn new(client_name: impl Into<String>, secret_key: Secret<String>) -> Self {
        Self {
            client_name: client_name.into(),
            secret_key,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.hub_client_name(), config.hub.secret_key.clone())
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }
}

impl Protocol for MultiChatProtocol {
    fn name(&self) -> &'static str {
        NAME
    }

    fn hello(&mut self) -> Result<Option<String>> {
        let register = Frame::Register {
            client_name: self.client_name.clone(),
            secret_key: self.secret_key.expose_secret().clone(),
        };
        info!(client_name = %self.client_name, "registering with hub");
        Ok(Some(register.to_frame()?))
    }

    fn on_handshake(&mut self, frame: &str) -> Readiness {
        match Frame::parse(frame) {
            Ok(Frame::RegisterAck) => {
                info!(ack = frame, "registered with hub");
                Readiness::Ready
            },
            Ok(_) => {
                warn!(ack = frame, "unexpected register acknowledgement, posting disabled");
                Readiness::ReceiveOnly
            },
            Err(e) => {
                warn!(ack = frame, error = %e, "unreadable register acknowledgement, posting disabled");
                Readiness::ReceiveOnly
            },
        }
    }

    fn on_frame(&mut self, frame: &str, peer: &dyn Peer) -> Result<Vec<String>> {
        match Frame::parse(frame)? {
            Frame::ForwardingMessage {
                source_client_name,
                content,
            } => {
                if !peer.post(format_forwarded(&source_client_name, &content)) {
                    debug!(source = %source_client_name, "bot not ready, message dropped");
                }
            },
            other => debug!(frame = ?other, "ignoring hub frame"),
        }
        Ok(Vec::new())
    }

    fn render_post(&mut self, text: &str) -> Result<Vec<String>> {
        let frame = Frame::ClientMessage {
            content: text.to_owned(),
        };
        Ok(vec![frame.to_frame()?])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        serde_json::{Value, json},
        std::sync::Mutex,
    };

    #[derive(Default)]
    struct Bot(Mutex<Vec<String>>);

    impl Peer for Bot {
        fn post(&self, text: String) -> bool {
            self.0.lock().unwrap().push(text);
            true
        }
    }

    fn protocol() -> MultiChatProtocol {
        MultiChatProtocol::new("QQ-bridge", Secret::new("k".to_string()))
    }

    #[test]
    fn hello_registers() {
        let hello = protocol().hello().unwrap().unwrap();
        let value: Value = serde_json::from_str(&hello).unwrap();
        assert_eq!(
            value,
            json!({"action": "register", "client-name": "QQ-bridge", "secret-key": "k"})
        );
    }

    #[test]
    fn only_register_ack_makes_ready() {
        let mut p = protocol();
        assert_eq!(p.on_handshake(r#"{"action":"register-ack"}"#), Readiness::Ready);
        assert_eq!(
            p.on_handshake(r#"{"action":"register-denied"}"#),
            Readiness::ReceiveOnly
        );
        assert_eq!(p.on_handshake("garbage"), Readiness::ReceiveOnly);
    }

    #[test]
    fn forwarding_message_reaches_the_bot() {
        let bot = Bot::default();
        let frame =
            r#"{"action":"forwarding-message","source-client-name":"Alice","content":"hi"}"#;
        let replies = protocol().on_frame(frame, &bot).unwrap();
        assert!(replies.is_empty());
        assert_eq!(*bot.0.lock().unwrap(), vec!["[Alice] hi"]);
    }

    #[test]
    fn other_actions_are_ignored() {
        let bot = Bot::default();
        protocol()
            .on_frame(r#"{"action":"client-list"}"#, &bot)
            .unwrap();
        protocol()
            .on_frame(r#"{"action":"register-ack"}"#, &bot)
            .unwrap();
        assert!(bot.0.lock().unwrap().is_empty());
    }

    #[test]
    fn posts_become_client_messages() {
        let frames = protocol().render_post("[Group Dev] Bob: yo").unwrap();
        let value: Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(
            value,
            json!({"action": "client-message", "content": "[Group Dev] Bob: yo"})
        );
    }

    #[test]
    fn client_name_follows_config() {
        let mut config = BridgeConfig::default();
        config.bot.name = Some("bridge".into());
        assert_eq!(MultiChatProtocol::from_config(&config).client_name(), "QQ-bridge");
        assert!(!format!("{:?}", protocol()).contains("\"k\""));
    }
}
