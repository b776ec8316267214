//! Turn-based elimination game engine.
//!
//! A [`Game`] is an explicit state machine owned by its caller — typically
//! one per connected client — with no ambient state and no I/O. Rounds draw
//! from a six-slot FIFO chamber holding exactly one loaded slot; drawing it
//! ends the session.

pub mod error;
pub mod session;

pub use error::GameError;
pub use session::{CHAMBER_SIZE, Game, RoundOutcome, RoundReport, Session};
