use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GameError;

/// Chamber slots per session; exactly one of them is loaded.
pub const CHAMBER_SIZE: usize = 6;

/// A running session: two players taking turns drawing from the chamber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    players: [String; 2],
    current: usize,
    chamber: VecDeque<bool>,
}

impl Session {
    pub fn players(&self) -> &[String; 2] {
        &self.players
    }

    /// Name of the player whose turn it is.
    pub fn current_player(&self) -> &str {
        &self.players[self.current]
    }

    /// Rounds left before the chamber is exhausted.
    pub fn rounds_remaining(&self) -> usize {
        self.chamber.len()
    }
}

/// Caller-owned game state machine.
///
/// `Setup` waits for player names, `Active` accepts rounds, `Finished`
/// keeps the outcome around for display until the next `reset` or `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Game {
    #[default]
    Setup,
    Active(Session),
    Finished {
        players: [String; 2],
        eliminated: usize,
    },
}

/// What a single round produced, including the signals the UI binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub player: String,
    pub outcome: RoundOutcome,
    /// Set when the session continues; `None` after an elimination.
    pub next_player: Option<String>,
    pub rounds_remaining: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Survived,
    Eliminated,
}

impl RoundReport {
    /// Result text for the UI.
    pub fn message(&self) -> String {
        match self.outcome {
            RoundOutcome::Survived => format!("{} survived!", self.player),
            RoundOutcome::Eliminated => format!("{} was eliminated!", self.player),
        }
    }

    /// Whether the play control stays enabled after this round.
    pub fn play_enabled(&self) -> bool {
        self.outcome == RoundOutcome::Survived
    }

    /// Whether the death indicator becomes visible after this round.
    pub fn death_visible(&self) -> bool {
        self.outcome == RoundOutcome::Eliminated
    }
}

impl Game {
    pub fn new() -> Self {
        Self::Setup
    }

    /// Begin a session with a freshly loaded chamber. Blank names are
    /// rejected; an existing session is replaced.
    pub fn start(&mut self, player1: &str, player2: &str) -> Result<(), GameError> {
        self.start_with_rng(player1, player2, &mut rand::rng())
    }

    /// `start` with an injected RNG, so tests can pin the loaded slot's
    /// position.
    pub fn start_with_rng<R: Rng + ?Sized>(
        &mut self,
        player1: &str,
        player2: &str,
        rng: &mut R,
    ) -> Result<(), GameError> {
        let player1 = player1.trim();
        let player2 = player2.trim();
        if player1.is_empty() || player2.is_empty() {
            return Err(GameError::MissingPlayerName);
        }

        let mut chamber = vec![false; CHAMBER_SIZE];
        chamber[rng.random_range(0..CHAMBER_SIZE)] = true;

        debug!(player1, player2, "session started");
        *self = Self::Active(Session {
            players: [player1.to_string(), player2.to_string()],
            current: 0,
            chamber: chamber.into(),
        });
        Ok(())
    }

    /// Draw the front chamber slot for the current player.
    ///
    /// Survival advances the turn; an elimination moves the machine to
    /// `Finished`, after which every `play` answers `GameOver` without
    /// touching state.
    pub fn play(&mut self) -> Result<RoundReport, GameError> {
        match self {
            Self::Setup => Err(GameError::NotStarted),
            Self::Finished { .. } => Err(GameError::GameOver),
            Self::Active(session) => {
                // One loaded slot among six means the session always ends
                // before the chamber can empty; an empty chamber here can
                // only come from a deserialized snapshot.
                let Some(loaded) = session.chamber.pop_front() else {
                    return Err(GameError::GameOver);
                };

                let player = session.players[session.current].clone();
                if loaded {
                    debug!(%player, "player eliminated");
                    let report = RoundReport {
                        player,
                        outcome: RoundOutcome::Eliminated,
                        next_player: None,
                        rounds_remaining: 0,
                    };
                    let players = session.players.clone();
                    let eliminated = session.current;
                    *self = Self::Finished { players, eliminated };
                    Ok(report)
                } else {
                    session.current = (session.current + 1) % session.players.len();
                    Ok(RoundReport {
                        player,
                        outcome: RoundOutcome::Survived,
                        next_player: Some(session.players[session.current].clone()),
                        rounds_remaining: session.chamber.len(),
                    })
                }
            }
        }
    }

    /// Clear everything back to `Setup`. Valid from any state.
    pub fn reset(&mut self) {
        *self = Self::Setup;
    }

    /// The running session, when there is one.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Active(session) => Some(session),
            _ => None,
        }
    }

    /// Name of the eliminated player once the session has finished.
    pub fn eliminated_player(&self) -> Option<&str> {
        match self {
            Self::Finished { players, eliminated } => Some(&players[*eliminated]),
            _ => None,
        }
    }
}
