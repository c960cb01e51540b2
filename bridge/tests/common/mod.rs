//! Engine doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bridge::{builtin_factory, BridgeConfig};
use engine::{Engine, EngineError, EngineFactory, GoParams, SearchOutcome, StartPosition};
use parking_lot::Mutex;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const MATED_FEN: &str = "7k/6Q1/6K1/8/8/8/8/8 b - - 0 1";

pub fn test_config() -> BridgeConfig {
    BridgeConfig {
        init_timeout: Duration::from_secs(5),
        default_movetime_ms: 50,
        ..BridgeConfig::default()
    }
}

/// Built-in engine factory that counts how many engines it created
pub fn counting_builtin() -> (EngineFactory, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let inner = builtin_factory();
    let factory: EngineFactory = Arc::new(move || -> Result<Box<dyn Engine>, EngineError> {
        counter.fetch_add(1, Ordering::SeqCst);
        inner()
    });
    (factory, created)
}

/// Engine double: remembers `Tag` option values in execution order and
/// answers searches from a script of `(delay, move)` pairs.
pub struct RecordingEngine {
    tags: Arc<Mutex<Vec<String>>>,
    replies: VecDeque<(Duration, &'static str)>,
}

impl Engine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn variant(&self) -> &str {
        "chess"
    }

    fn has_option(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("Tag")
    }

    fn option_names(&self) -> Vec<String> {
        vec!["Tag".to_string()]
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        if !self.has_option(name) {
            return Err(EngineError::UnknownOption(name.to_string()));
        }
        self.tags.lock().push(value.to_string());
        Ok(())
    }

    fn set_position(&mut self, _start: &StartPosition, moves: &[String]) -> Result<usize, EngineError> {
        Ok(moves.len())
    }

    fn search(&mut self, _params: &GoParams) -> Result<SearchOutcome, EngineError> {
        let (delay, mv) = self.replies.pop_front().unwrap_or((Duration::ZERO, "a2a3"));
        thread::sleep(delay);
        Ok(SearchOutcome {
            best_move: Some(mv.to_string()),
            ..SearchOutcome::default()
        })
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn shutdown(&mut self) {}
}

/// Factory for [`RecordingEngine`]; the returned log is shared by every
/// engine it creates.
pub fn recording_factory(replies: Vec<(Duration, &'static str)>) -> (EngineFactory, Arc<Mutex<Vec<String>>>) {
    let tags = Arc::new(Mutex::new(Vec::new()));
    let log = tags.clone();
    let factory: EngineFactory = Arc::new(move || -> Result<Box<dyn Engine>, EngineError> {
        Ok(Box::new(RecordingEngine {
            tags: log.clone(),
            replies: replies.clone().into(),
        }))
    });
    (factory, tags)
}
