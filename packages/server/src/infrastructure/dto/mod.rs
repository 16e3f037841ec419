//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `envelope`: outbound websocket reply envelopes
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod envelope;
pub mod http;
