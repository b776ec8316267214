use serde::{Deserialize, Serialize};

use crate::api::NewUser;
use crate::models::User;

/// Events pushed from server to clients over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum GatewayEvent {
    /// Refreshed registry snapshot. Broadcast after every successful insert,
    /// targeted for `get-users` replies and the on-connect snapshot.
    UserList { rows: Vec<User> },

    /// A game session was created and play is open.
    GameStarted {
        players: [String; 2],
        current_player: String,
        rounds_remaining: usize,
        play_enabled: bool,
        death_visible: bool,
    },

    /// Outcome of a single round.
    RoundResult {
        player: String,
        eliminated: bool,
        message: String,
        next_player: Option<String>,
        rounds_remaining: usize,
        play_enabled: bool,
        death_visible: bool,
    },

    /// Play was attempted after the session ended.
    GameOver { message: String },

    /// The session was cleared back to setup.
    GameReset,

    /// A request was rejected; the message is safe to show to the user.
    Error { message: String },
}

/// Commands sent from clients to the server over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum GatewayCommand {
    /// Insert a registry entry; a `user-list` push follows on success.
    AddUser { user: NewUser },

    /// Request a targeted `user-list` push.
    GetUsers,

    /// Start a game session for this connection.
    Start { player1: String, player2: String },

    /// Play one round of this connection's session.
    Play,

    /// Clear this connection's session.
    Reset,
}
