//! Registry INSERT feed.
//!
//! A database trigger raises `pg_notify` on every registry insert; one
//! listener task per process receives those payloads and fans them out to
//! however many live subscriptions exist through a broadcast channel. The
//! feed is purely reactive: it provides no ordering or delivery guarantee
//! beyond what the underlying change stream emits.

use portico_core::models::RegistryEvent;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::broadcast;

/// Postgres NOTIFY channel raised by the registry insert trigger.
pub const REGISTRY_NOTIFY_CHANNEL: &str = "registry_entry_inserted";

#[derive(Clone)]
pub struct RegistryFeed {
    sender: broadcast::Sender<RegistryEvent>,
}

impl RegistryFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        RegistryFeed { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.sender.subscribe()
    }

    /// Push one event to all current subscribers. Send errors mean nobody is
    /// listening, which is fine.
    pub fn publish(&self, event: RegistryEvent) {
        let _ = self.sender.send(event);
    }

    /// Spawn the LISTEN loop. Reconnects with a delay on listener errors so
    /// a database restart does not permanently kill the feed.
    pub fn spawn_listener(&self, pool: PgPool) {
        let feed = self.clone();
        tokio::spawn(async move {
            loop {
                match PgListener::connect_with(&pool).await {
                    Ok(mut listener) => {
                        if let Err(e) = listener.listen(REGISTRY_NOTIFY_CHANNEL).await {
                            tracing::warn!(error = %e, "LISTEN failed, will retry");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                            continue;
                        }
                        tracing::info!(channel = REGISTRY_NOTIFY_CHANNEL, "Registry feed listening");
                        while let Ok(notification) = listener.recv().await {
                            match serde_json::from_str::<RegistryEvent>(notification.payload()) {
                                Ok(event) => feed.publish(event),
                                Err(e) => {
                                    tracing::warn!(
                                        error = %e,
                                        payload = notification.payload(),
                                        "Ignoring malformed registry notification"
                                    );
                                }
                            }
                        }
                        tracing::warn!("Registry feed connection lost, reconnecting");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Registry feed connect failed, will retry");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });
    }
}
