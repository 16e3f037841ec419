//! Connection registry implementations.
//!
//! - `channel`: bounded mpsc queue per connection, drained by the
//!   connection's websocket writer

pub mod channel;

pub use channel::{ChannelConnectionRegistry, SlowConsumerPolicy};
