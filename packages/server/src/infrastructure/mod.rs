//! Infrastructure layer: concrete implementations of the domain ports and
//! the wire/HTTP DTOs.

pub mod directory;
pub mod dto;
pub mod persistence;
pub mod registry;
pub mod store;
