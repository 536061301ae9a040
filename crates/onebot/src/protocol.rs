use {
    chatbridge_channels::{Peer, Protocol, Readiness, Result},
    chatbridge_config::BridgeConfig,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use chatbridge_metrics::{counter, labels, routing as routing_metrics};

use crate::{
    command::Command,
    frames::{ApiCall, Event, Inbound, MessageEvent},
    roster::{PostingState, Transition},
    routing::{Route, Router, command_scope},
};

pub const NAME: &str = "bot";

/// Bot-side protocol: routing, commands and fan-out.
#[derive(Debug, Clone, Default)]
pub struct OneBotProtocol {
    router: Router,
    posting: PostingState,
}

impl OneBotProtocol {
    pub fn new(router: Router, posting: PostingState) -> Self {
        Self { router, posting }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(Router::from_config(config), PostingState::from_config(config))
    }

    pub fn posting(&self) -> &PostingState {
        &self.posting
    }

    fn on_message(&mut self, event: &MessageEvent, peer: &dyn Peer) -> Result<Vec<String>> {
        let text = event.message.to_text();
        if let Some(command) = Command::parse(&text) {
            return self.on_command(command, event);
        }

        match self.router.route(event) {
            Route::Forward(text) => {
                #[cfg(feature = "metrics")]
                counter!(routing_metrics::FORWARDED_TOTAL).increment(1);
                if !peer.post(text) {
                    debug!("hub not ready, message dropped");
                }
            },
            Route::Filtered(reason) => {
                #[cfg(feature = "metrics")]
                counter!(routing_metrics::FILTERED_TOTAL).increment(1);
                debug!(%reason, "message filtered");
            },
        }
        Ok(Vec::new())
    }

    fn on_command(&mut self, command: Command, event: &MessageEvent) -> Result<Vec<String>> {
        let Some(scope) = command_scope(event) else {
            return Ok(Vec::new());
        };
        match self.posting.apply(command, scope) {
            Transition::Moved => {
                info!(%command, %scope, "posting state changed");
                #[cfg(feature = "metrics")]
                counter!(routing_metrics::COMMANDS_TOTAL, labels::COMMAND => command.keyword())
                    .increment(1);
                let reply = ApiCall::send_to(scope, command.confirmation()).to_frame()?;
                Ok(vec![reply])
            },
            Transition::Unchanged => {
                debug!(%command, %scope, "command ignored");
                Ok(Vec::new())
            },
        }
    }
}

impl Protocol for OneBotProtocol {
    fn name(&self) -> &'static str {
        NAME
    }

    fn hello(&mut self) -> Result<Option<String>> {
        Ok(None)
    }

    fn on_handshake(&mut self, frame: &str) -> Readiness {
        info!(ack = frame, "bot connection acknowledged");
        Readiness::Ready
    }

    fn on_frame(&mut self, frame: &str, peer: &dyn Peer) -> Result<Vec<String>> {
        match Inbound::parse(frame)? {
            Inbound::Response(resp) => {
                if resp.retcode == 0 {
                    debug!(status = ?resp.status, "api call succeeded");
                } else {
                    warn!(retcode = resp.retcode, status = ?resp.status, "api call failed");
                }
                Ok(Vec::new())
            },
            Inbound::Event(Event::Message(event)) => self.on_message(&event, peer),
            Inbound::Event(Event::MetaEvent(meta)) => {
                debug!(kind = %meta.meta_event_type, "meta event");
                Ok(Vec::new())
            },
            Inbound::Event(Event::Other) => Ok(Vec::new()),
        }
    }

    fn render_post(&mut self, text: &str) -> Result<Vec<String>> {
        let frames = self
            .posting
            .recipients()
            .map(|recipient| ApiCall::send_to(recipient, text).to_frame())
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(frames)
    }
}
