use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A player name was empty or blank.
    #[error("both player names are required")]
    MissingPlayerName,

    /// `play` was called before `start`.
    #[error("the game has not been started")]
    NotStarted,

    /// `play` was called with no rounds left to play.
    #[error("the game is over, reset to play again")]
    GameOver,
}
