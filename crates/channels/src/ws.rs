//! WebSocket transport built on tokio-tungstenite.

use {
    async_trait::async_trait,
    futures::{SinkExt, StreamExt, future},
    tokio_tungstenite::{connect_async, tungstenite::Message},
    tracing::debug,
};

use crate::{
    Error, Result,
    transport::{Connection, Transport},
};

/// Connects to a `ws://` or `wss://` URL and exchanges text frames.
///
/// Binary, ping and pong frames are not surfaced; tungstenite answers pings on
/// its own. A close frame ends the inbound stream.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    /// The URL is normalised to a single trailing slash.
    pub fn new(url: impl AsRef<str>) -> Self {
        Self {
            url: format!("{}/", url.as_ref().trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn connect(&self) -> Result<Connection> {
        let (ws, response) = connect_async(self.url.as_str()).await?;
        debug!(url = %self.url, status = %response.status(), "websocket connected");

        let (write, read) = ws.split();
        let sink = write
            .sink_map_err(Error::from)
            .with(|text: String| future::ready(Ok::<_, Error>(Message::Text(text.into()))));
        let source = read
            .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(_) => None,
                    Err(e) => Some(Err(Error::from(e))),
                })
            });

        Ok(Connection::new(Box::pin(sink), Box::pin(source)))
    }
}
