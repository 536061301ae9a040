use serde::{Deserialize, Serialize};

/// One MultiChat frame, discriminated by its `action` field.
///
/// Field names are kebab-case on the wire. Actions this client does not
/// know deserialize to [`Frame::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Frame {
    Register {
        #[serde(rename = "client-name")]
        client_name: String,
        #[serde(rename = "secret-key")]
        secret_key: String,
    },
    RegisterAck,
    ClientMessage {
        content: String,
    },
    ForwardingMessage {
        #[serde(rename = "source-client-name")]
        source_client_name: String,
        content: String,
    },
    #[serde(other)]
    Unknown,
}

impl Frame {
    pub fn parse(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }

    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    #[test]
    fn register_uses_kebab_case_fields() {
        let frame = Frame::Register {
            client_name: "QQ-bot".into(),
            secret_key: "s3cret".into(),
        };
        let value: serde_json::Value = serde_json::from_str(&frame.to_frame().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"action": "register", "client-name": "QQ-bot", "secret-key": "s3cret"})
        );
    }

    #[test]
    fn client_message_shape() {
        let frame = Frame::ClientMessage {
            content: "hi".into(),
        };
        assert_eq!(
            frame.to_frame().unwrap(),
            r#"{"action":"client-message","content":"hi"}"#
        );
    }

    #[rstest]
    #[case(r#"{"action":"register-ack"}"#, Frame::RegisterAck)]
    #[case(r#"{"action":"register-ack","message":"welcome"}"#, Frame::RegisterAck)]
    #[case(
        r#"{"action":"forwarding-message","source-client-name":"Alice","content":"hi"}"#,
        Frame::ForwardingMessage { source_client_name: "Alice".into(), content: "hi".into() }
    )]
    #[case(r#"{"action":"client-list","clients":[]}"#, Frame::Unknown)]
    fn parses_inbound(#[case] raw: &str, #[case] expected: Frame) {
        assert_eq!(Frame::parse(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"content":"no action"}"#)]
    #[case(r#"{"action":"forwarding-message","content":"no source"}"#)]
    fn rejects_malformed(#[case] raw: &str) {
        assert!(Frame::parse(raw).is_err());
    }
}
