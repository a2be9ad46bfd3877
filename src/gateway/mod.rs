//! Gateway: the event loop connecting channels to the trigger registry.
//!
//! Every incoming message is either an admin command (handed to the
//! [`AdminProcessor`]) or ordinary chat text checked against the registry.

mod pipeline;


use crate::commands::AdminProcessor;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use trigger_core::{
    config::{AuthConfig, ChannelConfig, Config},
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
    MatchMode,
};
use trigger_store::Registry;

/// The central gateway that routes messages between channels and the registry.
pub struct Gateway {
    pub(super) channels: HashMap<String, Arc<dyn Channel>>,
    pub(super) registry: Arc<Registry>,
    pub(super) admin: AdminProcessor,
    pub(super) auth_config: AuthConfig,
    pub(super) channel_config: ChannelConfig,
    pub(super) match_mode: MatchMode,
    /// Periodic reload from the store, if configured.
    pub(super) refresh_interval: Option<Duration>,
}

impl Gateway {
    pub fn new(
        channels: HashMap<String, Arc<dyn Channel>>,
        registry: Arc<Registry>,
        cfg: &Config,
    ) -> Self {
        let admin = AdminProcessor::new(
            registry.clone(),
            cfg.admin.clone(),
            cfg.auth.deny_message.clone(),
        );
        let refresh_interval = match cfg.store.refresh_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            channels,
            registry,
            admin,
            auth_config: cfg.auth.clone(),
            channel_config: cfg.channel.clone(),
            match_mode: cfg.matching.mode,
            refresh_interval,
        }
    }

    /// Run the main event loop until Ctrl-C.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Trigger gateway running | store: {} | triggers: {} | mode: {} | channels: {} | auth: {}",
            self.registry.store_name(),
            self.registry.len(),
            self.match_mode.display_name(),
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            if self.auth_config.enabled {
                "enforced"
            } else {
                "disabled"
            },
        );

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        let refresh_handle = self.refresh_interval.map(|every| {
            let registry = self.registry.clone();
            tokio::spawn(async move {
                Self::refresh_loop(registry, every).await;
            })
        });

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(incoming) = msg else {
                        warn!("all channels closed");
                        break;
                    };
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.handle_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown(refresh_handle).await;
        Ok(())
    }

    /// Reload the registry from the store at a fixed interval.
    ///
    /// Picks up edits made by other processes and repairs drift after a
    /// mutation that timed out but still committed.
    async fn refresh_loop(registry: Arc<Registry>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; the registry was just loaded.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = registry.refresh().await {
                warn!("registry refresh failed, keeping current triggers: {e}");
            }
        }
    }

    async fn shutdown(&self, refresh_handle: Option<JoinHandle<()>>) {
        info!("Shutting down...");

        if let Some(h) = refresh_handle {
            h.abort();
        }

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        info!("Shutdown complete.");
    }

    /// Send a plain text message back to the chat the message came from.
    async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let Some(channel) = self.channels.get(&incoming.channel) else {
            warn!("no channel named {} to reply on", incoming.channel);
            return;
        };
        if let Err(e) = channel.send(OutgoingMessage::reply_to(incoming, text)).await {
            error!("failed to send message: {e}");
        }
    }
}
