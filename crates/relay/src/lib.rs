//! Relay orchestrator.
//!
//! Runs the bot and hub endpoints as two independent tasks, each holding the
//! other's [`EndpointHandle`] as its forwarding peer. The handles are the only
//! thing the two tasks share.

use std::{sync::Arc, time::Duration};

use {
    chatbridge_channels::{
        Endpoint, EndpointHandle, Peer, Protocol, RetryPolicy, Transport, WebSocketTransport,
    },
    chatbridge_common::{Error, Result},
    chatbridge_config::BridgeConfig,
    chatbridge_multichat::MultiChatProtocol,
    chatbridge_onebot::OneBotProtocol,
    tokio::task::JoinHandle,
    tracing::info,
};

/// Both running endpoints.
#[derive(Debug)]
pub struct Relay {
    bot: EndpointHandle,
    hub: EndpointHandle,
    tasks: Vec<JoinHandle<()>>,
}

impl Relay {
    /// Connect to the URLs in `config` over WebSocket.
    pub fn start(config: &BridgeConfig) -> Self {
        let retry = RetryPolicy::fixed(Duration::from_secs(config.relay.reconnect_delay_secs));
        info!(
            bot = %config.bot.url,
            hub = %config.hub.url,
            client_name = %config.hub_client_name(),
            "starting relay"
        );
        Self::spawn(
            OneBotProtocol::from_config(config),
            Arc::new(WebSocketTransport::new(&config.bot.url)),
            MultiChatProtocol::from_config(config),
            Arc::new(WebSocketTransport::new(&config.hub.url)),
            retry,
        )
    }

    /// Start both endpoints on explicit protocols and transports.
    pub fn spawn<B: Protocol, H: Protocol>(
        bot: B,
        bot_transport: Arc<dyn Transport>,
        hub: H,
        hub_transport: Arc<dyn Transport>,
        retry: RetryPolicy,
    ) -> Self {
        let (bot_endpoint, bot_handle) = Endpoint::new(bot, bot_transport, retry);
        let (hub_endpoint, hub_handle) = Endpoint::new(hub, hub_transport, retry);

        let to_hub: Arc<dyn Peer> = Arc::new(hub_handle.clone());
        let to_bot: Arc<dyn Peer> = Arc::new(bot_handle.clone());
        let tasks = vec![
            tokio::spawn(bot_endpoint.run(to_hub)),
            tokio::spawn(hub_endpoint.run(to_bot)),
        ];

        Self {
            bot: bot_handle,
            hub: hub_handle,
            tasks,
        }
    }

    pub fn bot(&self) -> &EndpointHandle {
        &self.bot
    }

    pub fn hub(&self) -> &EndpointHandle {
        &self.hub
    }

    /// Close both transports and wait for both loops to finish.
    pub async fn stop_all(self) -> Result<()> {
        info!("stopping relay");
        self.bot.stop();
        self.hub.stop();

        let mut first_error = None;
        for task in self.tasks {
            if let Err(e) = task.await {
                first_error.get_or_insert(Error::other("endpoint task failed", e));
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                info!("relay stopped");
                Ok(())
            },
        }
    }
}
