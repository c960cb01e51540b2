//! Process-wide entry points for hosts that want a single shared engine.
//!
//! The bridge behind these functions is created on first use from
//! [`BridgeConfig::from_env`]. It is never dropped, so call [`quit`] before
//! the process exits to stop the engine cleanly.

use std::sync::OnceLock;
use std::time::Duration;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::listener::BestMoveListener;
use crate::queue::Ticket;

static BRIDGE: OnceLock<Bridge> = OnceLock::new();

/// The shared bridge
pub fn bridge() -> &'static Bridge {
    BRIDGE.get_or_init(|| Bridge::from_config(BridgeConfig::from_env()))
}

pub fn init(variant: Option<&str>) -> Result<(), BridgeError> {
    bridge().initialize(variant)
}

pub fn command(text: &str) -> Result<Ticket, BridgeError> {
    bridge().send_raw_command(text)
}

pub fn set_option(name: &str, value: &str) -> Result<Ticket, BridgeError> {
    bridge().configure_option(name, value)
}

pub fn set_position(fen: &str) -> Result<Ticket, BridgeError> {
    bridge().set_position(fen)
}

pub fn set_position_after_moves(fen: &str, moves: &str) -> Result<Ticket, BridgeError> {
    bridge().set_position_with_moves(fen, moves)
}

/// Best move text; see [`Bridge::request_best_move`]
pub fn get_best_move(time_budget_ms: u64) -> String {
    bridge().request_best_move(time_budget_ms).into_string()
}

/// Wait for queued commands and report the first error; see [`Bridge::sync`]
pub fn sync(timeout: Duration) -> Result<(), BridgeError> {
    bridge().sync(timeout)
}

pub fn register_best_move_callback(listener: impl BestMoveListener + 'static) {
    bridge().register_best_move_callback(listener);
}

pub fn quit() {
    if let Some(bridge) = BRIDGE.get() {
        bridge.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Only test in this crate that touches the shared bridge
    #[test]
    fn test_global_lifecycle() {
        quit();
        init(None).unwrap();
        assert!(bridge().is_initialized());

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        register_best_move_callback(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        set_position_after_moves(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "e2e4 e7e5",
        )
        .unwrap();
        let mv = get_best_move(100);
        assert!(!mv.is_empty() && mv.len() <= 15);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        set_option("Nope", "1").unwrap();
        assert!(matches!(
            sync(Duration::from_secs(5)),
            Err(BridgeError::UnknownOption(name)) if name == "Nope"
        ));
        sync(Duration::from_secs(5)).unwrap();

        quit();
        assert!(!bridge().is_initialized());
        // Any call restarts it
        command("isready").unwrap();
        assert!(bridge().is_initialized());
        quit();
    }
}
