//! Shared wire types for the parlor backend: API models and gateway
//! commands/events. Pure data, no I/O.

pub mod api;
pub mod events;
pub mod models;
