//! Agora presence and messaging server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin agora-server
//! cargo run --bin agora-server -- --host 0.0.0.0 --port 3000 --redis-url redis://:secret@localhost:6379
//! ```

use std::sync::Arc;

use agora_server::{
    config::{DEFAULT_OUTBOUND_QUEUE, DEFAULT_PERSIST_QUEUE, ServerConfig},
    domain::KeyValueStore,
    infrastructure::{
        directory::{DirectorySettings, inmemory::DEFAULT_GROUP},
        persistence::health::DEFAULT_FAILURE_THRESHOLD,
        registry::SlowConsumerPolicy,
        store::{MemoryStore, RedisStore},
    },
    ui::Server,
    usecase::RouterSettings,
};
use agora_shared::logger::setup_logger;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "agora-server")]
#[command(about = "Presence and group-messaging server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "AGORA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "AGORA_PORT", default_value = "8080")]
    port: u16,

    /// Redis URL for the membership mirror; an in-process store is used when absent
    #[arg(long, env = "AGORA_REDIS_URL")]
    redis_url: Option<String>,

    /// Group recorded on rooms created by clients
    #[arg(long, env = "AGORA_DEFAULT_GROUP", default_value = DEFAULT_GROUP)]
    default_group: String,

    /// Deliver room broadcasts back to the sending member
    #[arg(long, env = "AGORA_INCLUDE_SENDER", action = ArgAction::Set, default_value_t = true)]
    include_sender: bool,

    /// Frames buffered per connection before the slow-consumer policy applies
    #[arg(long, env = "AGORA_OUTBOUND_QUEUE", default_value_t = DEFAULT_OUTBOUND_QUEUE)]
    outbound_queue: usize,

    /// What to do when a client's outbound queue is full: drop or disconnect
    #[arg(long, env = "AGORA_SLOW_CONSUMER", default_value_t = SlowConsumerPolicy::Drop)]
    slow_consumer: SlowConsumerPolicy,

    /// Pending membership writes buffered before new ones are dropped
    #[arg(long, env = "AGORA_PERSIST_QUEUE", default_value_t = DEFAULT_PERSIST_QUEUE)]
    persist_queue: usize,

    /// Keep rooms after their last member leaves
    #[arg(long, env = "AGORA_RETAIN_EMPTY_ROOMS")]
    retain_empty_rooms: bool,

    /// Consecutive store failures before health reports degraded
    #[arg(long, env = "AGORA_FAILURE_THRESHOLD", default_value_t = DEFAULT_FAILURE_THRESHOLD)]
    failure_threshold: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            router: RouterSettings {
                include_sender: args.include_sender,
            },
            directory: DirectorySettings {
                default_group: args.default_group,
                retain_empty_rooms: args.retain_empty_rooms,
            },
            outbound_queue: args.outbound_queue,
            slow_consumer: args.slow_consumer,
            persist_queue: args.persist_queue,
            failure_threshold: args.failure_threshold,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let mut args = Args::parse();

    let store: Arc<dyn KeyValueStore> = match args.redis_url.take() {
        Some(url) => match RedisStore::connect(&url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Failed to connect to redis: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("No redis URL given, mirroring membership in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let server = Server::new(args.into(), store);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
