//! Server configuration.
//!
//! Built by the binary from its command-line arguments and handed to
//! [`crate::ui::Server`] at construction.

use crate::{
    infrastructure::{
        directory::DirectorySettings,
        persistence::health::DEFAULT_FAILURE_THRESHOLD,
        registry::SlowConsumerPolicy,
    },
    usecase::RouterSettings,
};

/// Outbound frames buffered per connection before the slow-consumer policy applies
pub const DEFAULT_OUTBOUND_QUEUE: usize = 256;

/// Pending membership writes buffered before new ones are dropped
pub const DEFAULT_PERSIST_QUEUE: usize = 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub router: RouterSettings,
    pub directory: DirectorySettings,
    pub outbound_queue: usize,
    pub slow_consumer: SlowConsumerPolicy,
    /// Capacity of both the mirror queue and the set-sync queue
    pub persist_queue: usize,
    /// Consecutive store failures before persistence reports unhealthy
    pub failure_threshold: u64,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            router: RouterSettings::default(),
            directory: DirectorySettings::default(),
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            slow_consumer: SlowConsumerPolicy::default(),
            persist_queue: DEFAULT_PERSIST_QUEUE,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}
