//! Real-time presence and group-messaging server.
//!
//! Clients connect over a websocket, join rooms and exchange direct or
//! room-wide messages. Membership is mirrored into a key-value store as a
//! best-effort copy; live routing never reads from it.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
