//! Shared result slot between the worker and blocked callers.
//!
//! The worker publishes best moves and `isready` acknowledgements here and
//! wakes every waiter; waiters look for the result belonging to their own
//! ticket so a late answer to an older `go` is never taken for a newer one.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use engine::EngineError;
use parking_lot::{Condvar, Mutex};

use crate::queue::Ticket;

/// Returned when no real engine move is available
pub const FALLBACK_MOVE: &str = "e2e4";

/// Longest move text handed to callers
pub const MAX_MOVE_LEN: usize = 15;

const HISTORY: usize = 32;

/// Errors kept for `sync`; older ones are dropped
pub const ERROR_HISTORY: usize = 64;

/// Where a best move came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOrigin {
    /// Chosen by the engine's search
    Engine,
    /// The search had no root moves (mate, stalemate or a broken position)
    NoRootMoves,
    /// The engine failed while searching
    EngineError,
    /// The caller stopped waiting before the worker answered
    TimedOut,
}

/// A best move in UCI notation plus how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    text: String,
    origin: MoveOrigin,
    ticket: Option<Ticket>,
}

impl BestMove {
    /// A move reported by the engine. Empty text becomes the fallback.
    pub fn from_engine(ticket: Ticket, text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::fallback(MoveOrigin::NoRootMoves, Some(ticket));
        }

        let mut text = text.to_string();
        if text.len() > MAX_MOVE_LEN {
            let mut end = MAX_MOVE_LEN;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }

        Self {
            text,
            origin: MoveOrigin::Engine,
            ticket: Some(ticket),
        }
    }

    pub fn fallback(origin: MoveOrigin, ticket: Option<Ticket>) -> Self {
        Self {
            text: FALLBACK_MOVE.to_string(),
            origin,
            ticket,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> MoveOrigin {
        self.origin
    }

    pub fn ticket(&self) -> Option<Ticket> {
        self.ticket
    }

    /// True when the text is the fallback literal rather than an engine decision
    pub fn is_fallback(&self) -> bool {
        self.origin != MoveOrigin::Engine
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for BestMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An error raised while executing a fire-and-forget command
#[derive(Debug)]
pub struct RecordedError {
    pub ticket: Ticket,
    pub command: String,
    pub error: EngineError,
}

#[derive(Debug, Default)]
struct Slot {
    results: VecDeque<BestMove>,
    ready: bool,
    acked: Option<Ticket>,
    errors: VecDeque<RecordedError>,
}

#[derive(Debug, Default)]
pub struct Rendezvous {
    slot: Mutex<Slot>,
    changed: Condvar,
}

impl Rendezvous {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the current result as stale before a new request
    pub fn clear_ready(&self) {
        self.slot.lock().ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.slot.lock().ready
    }

    /// Store a result, set the ready flag and wake all waiters.
    pub fn publish(&self, best: BestMove) {
        let mut slot = self.slot.lock();
        if slot.results.len() == HISTORY {
            slot.results.pop_front();
        }
        slot.results.push_back(best);
        slot.ready = true;
        drop(slot);

        self.changed.notify_all();
    }

    /// The most recently published result
    pub fn latest(&self) -> Option<BestMove> {
        self.slot.lock().results.back().cloned()
    }

    /// Wait for the result published for `ticket`.
    ///
    /// Returns `None` if it does not arrive within `timeout`.
    pub fn wait_for_move(&self, ticket: Ticket, timeout: Duration) -> Option<BestMove> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        loop {
            if let Some(best) = slot
                .results
                .iter()
                .rev()
                .find(|best| best.ticket == Some(ticket))
            {
                return Some(best.clone());
            }
            if Instant::now() >= deadline {
                return None;
            }
            self.changed.wait_until(&mut slot, deadline);
        }
    }

    /// Record that the worker reached the `isready` with this ticket.
    pub fn acknowledge(&self, ticket: Ticket) {
        let mut slot = self.slot.lock();
        slot.acked = Some(slot.acked.map_or(ticket, |acked| acked.max(ticket)));
        drop(slot);

        self.changed.notify_all();
    }

    /// Wait until the worker has acknowledged `ticket` (or a later one).
    pub fn wait_for_ack(&self, ticket: Ticket, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        loop {
            if slot.acked.is_some_and(|acked| acked >= ticket) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            self.changed.wait_until(&mut slot, deadline);
        }
    }

    pub fn record_error(&self, error: RecordedError) {
        let mut slot = self.slot.lock();
        if slot.errors.len() == ERROR_HISTORY {
            if let Some(dropped) = slot.errors.pop_front() {
                tracing::warn!(
                    ticket = %dropped.ticket,
                    command = %dropped.command,
                    "Error log full, dropping: {}",
                    dropped.error
                );
            }
        }
        slot.errors.push_back(error);
    }

    /// Remove and return the error recorded for one command
    pub fn take_error_for(&self, ticket: Ticket) -> Option<RecordedError> {
        let mut slot = self.slot.lock();
        let index = slot.errors.iter().position(|e| e.ticket == ticket)?;
        slot.errors.remove(index)
    }

    pub fn error_count(&self) -> usize {
        self.slot.lock().errors.len()
    }

    /// Drain errors recorded since the last call
    pub fn take_errors(&self) -> Vec<RecordedError> {
        self.slot.lock().errors.drain(..).collect()
    }
}
