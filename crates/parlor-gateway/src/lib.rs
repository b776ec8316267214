//! Realtime surface of the parlor backend: the registry sync service, the
//! WebSocket gateway that pushes its events, and the REST routes that share
//! the same service functions.

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod routes;

pub use error::RegistryError;
pub use registry::{AppState, AppStateInner};
