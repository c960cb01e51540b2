//! Synchronous UCI command-queue adapter over a single-threaded chess engine.

pub mod bridge;
pub mod command;
pub mod config;
pub mod error;
pub mod global;
pub mod listener;
pub mod queue;
pub mod rendezvous;
pub mod worker;

pub use bridge::{builtin_factory, external_factory, Bridge};
pub use command::UciCommand;
pub use config::{BridgeConfig, EnginePath};
pub use error::BridgeError;
pub use listener::BestMoveListener;
pub use queue::{CommandQueue, QueueClosed, Ticket};
pub use rendezvous::{BestMove, MoveOrigin, ERROR_HISTORY, FALLBACK_MOVE, MAX_MOVE_LEN};
