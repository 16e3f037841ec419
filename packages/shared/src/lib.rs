//! Shared utilities for the Agora workspace: logging setup and clocks.

pub mod logger;
pub mod time;
