pub mod builtin;
pub mod external;
pub mod options;
pub mod uci;

pub use builtin::BuiltinEngine;
pub use external::{ExternalConfig, ExternalEngine};
pub use options::{OptionKind, OptionsTable, UciOption};
pub use uci::{UciError, UciMessage};

use std::sync::Arc;

/// A chess engine driven one command at a time.
///
/// Implementations own all board and search state. They are moved onto a
/// single worker thread and never shared, so methods take `&mut self` and no
/// internal locking is needed.
pub trait Engine: Send {
    /// Engine name as reported to hosts
    fn name(&self) -> &str;

    /// Currently selected variant
    fn variant(&self) -> &str;

    /// Whether an option of this name exists (case-insensitive)
    fn has_option(&self, name: &str) -> bool;

    /// Names of all options, in declaration order
    fn option_names(&self) -> Vec<String>;

    /// Update a known option. Unknown names fail with `UnknownOption` and
    /// leave the engine untouched.
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError>;

    /// Reset the position and apply `moves` in order, stopping silently at
    /// the first move that does not parse or is illegal. Returns how many
    /// moves were applied.
    fn set_position(&mut self, start: &StartPosition, moves: &[String]) -> Result<usize, EngineError>;

    /// Search the current position until the limits are hit.
    fn search(&mut self, params: &GoParams) -> Result<SearchOutcome, EngineError>;

    /// Forget search memory (hash tables, history) before a new game
    fn new_game(&mut self) -> Result<(), EngineError>;

    /// Release threads and processes. Called once, from the worker thread.
    fn shutdown(&mut self);
}

/// Builds a fresh engine for every bridge initialization.
pub type EngineFactory = Arc<dyn Fn() -> Result<Box<dyn Engine>, EngineError> + Send + Sync>;

/// Where a `position` command starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPosition {
    /// The start position of the active variant
    StartPos,
    Fen(String),
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub movetime: Option<u64>, // Move time in milliseconds
    pub depth: Option<u8>,     // Search depth
    pub nodes: Option<u64>,    // Node budget
    pub infinite: bool,        // Search until "stop"
}

/// Result of one search
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Best move in UCI notation, `None` when the root move list was empty
    pub best_move: Option<String>,
    pub ponder: Option<String>,
    /// Last info reported by the search
    pub info: EngineInfo,
}

/// Engine analysis information
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub seldepth: Option<u8>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<String>, // Principal variation
    pub multipv: Option<u8>,
    pub currmove: Option<String>,
    pub hashfull: Option<u16>,
    pub nps: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i8), // Negative for being mated
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
    #[error("Unknown variant: {0}")]
    UnknownVariant(String),
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("Invalid value {value:?} for option {name}")]
    InvalidOptionValue { name: String, value: String },
    #[error("Failed to spawn engine: {0}")]
    Spawn(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Protocol error: {0}")]
    Protocol(#[from] UciError),
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("Engine closed")]
    Closed,
    #[error("Engine panicked: {0}")]
    Panicked(String),
}
