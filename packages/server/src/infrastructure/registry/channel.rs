//! Connection registry backed by one bounded mpsc queue per connection.
//!
//! The websocket handler creates the queue and drains it into the socket;
//! the registry only holds the sending half. A send never waits on a slow
//! reader: when the queue is full the configured [`SlowConsumerPolicy`]
//! decides what happens.

use std::{collections::HashMap, fmt, str::FromStr};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::domain::{ClientId, ConnectionRegistry, OutboundChannel, RegistryError};

/// What to do with a client whose outbound queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlowConsumerPolicy {
    /// Discard the message that did not fit
    #[default]
    Drop,
    /// Drop the client from the registry, which closes its writer
    Disconnect,
}

impl FromStr for SlowConsumerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "disconnect" => Ok(Self::Disconnect),
            other => Err(format!(
                "unknown slow consumer policy '{other}' (expected 'drop' or 'disconnect')"
            )),
        }
    }
}

impl fmt::Display for SlowConsumerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drop => f.write_str("drop"),
            Self::Disconnect => f.write_str("disconnect"),
        }
    }
}

/// Registry of live connections
pub struct ChannelConnectionRegistry {
    /// Key: client id, value: sending half of the connection's queue
    clients: Mutex<HashMap<ClientId, OutboundChannel>>,
    policy: SlowConsumerPolicy,
}

impl ChannelConnectionRegistry {
    pub fn new(policy: SlowConsumerPolicy) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            policy,
        }
    }
}

impl Default for ChannelConnectionRegistry {
    fn default() -> Self {
        Self::new(SlowConsumerPolicy::default())
    }
}

#[async_trait]
impl ConnectionRegistry for ChannelConnectionRegistry {
    async fn register(&self, channel: OutboundChannel) -> ClientId {
        let mut clients = self.clients.lock().await;
        let mut client_id = ClientId::generate();
        while clients.contains_key(&client_id) {
            client_id = ClientId::generate();
        }
        clients.insert(client_id, channel);
        tracing::debug!("Client '{}' registered", client_id);
        client_id
    }

    async fn unregister(&self, client_id: &ClientId) -> bool {
        let mut clients = self.clients.lock().await;
        let removed = clients.remove(client_id).is_some();
        if removed {
            tracing::debug!("Client '{}' unregistered", client_id);
        }
        removed
    }

    async fn lookup(&self, client_id: &ClientId) -> Option<OutboundChannel> {
        let clients = self.clients.lock().await;
        clients.get(client_id).cloned()
    }

    async fn send(&self, client_id: &ClientId, payload: Bytes) -> Result<(), RegistryError> {
        let mut clients = self.clients.lock().await;

        let Some(channel) = clients.get(client_id) else {
            return Err(RegistryError::NotFound(client_id.to_string()));
        };

        match channel.try_send(payload) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                match self.policy {
                    SlowConsumerPolicy::Drop => {
                        tracing::warn!(
                            "Outbound queue for client '{}' is full, dropping message",
                            client_id
                        );
                    }
                    SlowConsumerPolicy::Disconnect => {
                        tracing::warn!(
                            "Outbound queue for client '{}' is full, disconnecting",
                            client_id
                        );
                        clients.remove(client_id);
                    }
                }
                Err(RegistryError::QueueFull(client_id.to_string()))
            }
            Err(TrySendError::Closed(_)) => {
                clients.remove(client_id);
                Err(RegistryError::Closed(client_id.to_string()))
            }
        }
    }

    async fn count(&self) -> usize {
        self.clients.lock().await.len()
    }
}
