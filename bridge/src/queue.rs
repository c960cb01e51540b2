//! FIFO of pending UCI command lines.
//!
//! Any number of producers push; exactly one worker pops. Every command is
//! stamped with a [`Ticket`] at push time, and tickets increase in the order
//! commands will execute.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::{Condvar, Mutex};

/// Sequence number of a queued command
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A command waiting for the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queued {
    pub ticket: Ticket,
    pub line: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Command queue is closed")]
pub struct QueueClosed;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<Queued>,
    next_ticket: u64,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command and wake the worker. Never blocks on capacity.
    pub fn push(&self, line: impl Into<String>) -> Result<Ticket, QueueClosed> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueClosed);
        }

        state.next_ticket += 1;
        let ticket = Ticket(state.next_ticket);
        state.items.push_back(Queued {
            ticket,
            line: line.into(),
        });
        drop(state);

        self.available.notify_one();
        Ok(ticket)
    }

    /// Block until a command is available or the queue is closed.
    ///
    /// Returns `None` once the queue is closed, even if commands were still
    /// pending when it was.
    pub fn pop_blocking(&self) -> Option<Queued> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            self.available.wait(&mut state);
        }
    }

    /// Close the queue, dropping pending commands. Returns how many were
    /// dropped.
    pub fn close(&self) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        let dropped = state.items.len();
        state.items.clear();
        drop(state);

        self.available.notify_all();
        dropped
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_tickets_increase() {
        let queue = CommandQueue::new();
        let first = queue.push("isready").unwrap();
        let second = queue.push("ucinewgame").unwrap();
        assert!(second > first);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue = Arc::new(CommandQueue::new());
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.pop_blocking())
        };

        thread::sleep(Duration::from_millis(20));
        queue.push("go movetime 10").unwrap();

        let item = consumer.join().unwrap().unwrap();
        assert_eq!(item.line, "go movetime 10");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_close_wakes_worker_and_drops_pending() {
        let queue = Arc::new(CommandQueue::new());
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.pop_blocking())
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.close(), 0);
        assert!(consumer.join().unwrap().is_none());

        assert_eq!(queue.push("isready"), Err(QueueClosed));
        assert!(queue.is_closed());
    }

    #[test]
    fn test_close_discards_pending_commands() {
        let queue = CommandQueue::new();
        queue.push("position startpos").unwrap();
        queue.push("go movetime 100").unwrap();
        assert_eq!(queue.close(), 2);
        assert!(queue.pop_blocking().is_none());
    }

    proptest! {
        #[test]
        fn prop_single_producer_fifo(lines in proptest::collection::vec("[a-z ]{0,12}", 0..40)) {
            let queue = CommandQueue::new();
            let tickets: Vec<Ticket> = lines.iter().map(|line| queue.push(line.clone()).unwrap()).collect();

            for (line, ticket) in lines.iter().zip(tickets) {
                let item = queue.pop_blocking().unwrap();
                prop_assert_eq!(&item.line, line);
                prop_assert_eq!(item.ticket, ticket);
            }
            prop_assert!(queue.is_empty());
        }
    }
}
