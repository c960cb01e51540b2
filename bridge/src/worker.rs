//! The single thread that owns the engine and executes queued commands.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use engine::{Engine, EngineError, GoParams};

use crate::command::UciCommand;
use crate::queue::{CommandQueue, Queued, Ticket};
use crate::rendezvous::{BestMove, MoveOrigin, RecordedError, Rendezvous};

pub const WORKER_THREAD_NAME: &str = "uci-bridge-worker";

/// Start the worker thread. The engine moves onto it and is shut down when
/// the queue closes.
pub fn spawn(
    engine: Box<dyn Engine>,
    queue: Arc<CommandQueue>,
    rendezvous: Arc<Rendezvous>,
    default_movetime_ms: u64,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let mut worker = Worker {
                engine,
                rendezvous,
                default_movetime_ms,
            };
            worker.run(&queue);
        })
}

struct Worker {
    engine: Box<dyn Engine>,
    rendezvous: Arc<Rendezvous>,
    default_movetime_ms: u64,
}

impl Worker {
    fn run(&mut self, queue: &CommandQueue) {
        let engine_name = self.engine.name().to_string();
        let span = tracing::info_span!("worker", engine = %engine_name);
        let _enter = span.enter();

        tracing::info!(variant = self.engine.variant(), "Worker started");

        while let Some(Queued { ticket, line }) = queue.pop_blocking() {
            tracing::trace!(%ticket, line = %line, "Dequeued command");
            let command = UciCommand::parse(&line);

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(ticket, &command)));
            if let Err(payload) = outcome {
                let message = panic_message(payload.as_ref());
                tracing::error!(%ticket, command = %line, "Engine panicked: {}", message);

                if matches!(command, UciCommand::Go(_)) {
                    self.rendezvous
                        .publish(BestMove::fallback(MoveOrigin::EngineError, Some(ticket)));
                }
                self.rendezvous.record_error(RecordedError {
                    ticket,
                    command: line,
                    error: EngineError::Panicked(message),
                });
            }
        }

        tracing::info!("Queue closed, worker exiting");
        self.engine.shutdown();
    }

    fn execute(&mut self, ticket: Ticket, command: &UciCommand) {
        match command {
            UciCommand::Position { start, moves } => {
                match self.engine.set_position(start, moves) {
                    Ok(applied) => {
                        tracing::debug!(%ticket, applied, ignored = moves.len() - applied, "Position set")
                    }
                    Err(e) => self.record(ticket, command, e),
                }
            }
            UciCommand::Go(params) => {
                let best = self.search(ticket, params);
                tracing::debug!(%ticket, best_move = %best, origin = ?best.origin(), "Publishing best move");
                self.rendezvous.publish(best);
            }
            UciCommand::SetOption { name, value } => {
                match self.engine.set_option(name, value) {
                    Ok(()) => tracing::debug!(%ticket, name = %name, value = %value, "Option set"),
                    Err(e) => self.record(ticket, command, e),
                }
            }
            UciCommand::UciNewGame => {
                if let Err(e) = self.engine.new_game() {
                    self.record(ticket, command, e);
                }
            }
            UciCommand::IsReady => self.rendezvous.acknowledge(ticket),
            UciCommand::Stop => {
                tracing::debug!(%ticket, "Ignoring stop, searches finish before the next command");
            }
            UciCommand::Empty => {}
            UciCommand::Unsupported(line) => {
                tracing::debug!(%ticket, line = %line, "Ignoring unsupported command");
            }
        }
    }

    fn search(&mut self, ticket: Ticket, params: &GoParams) -> BestMove {
        let params = self.effective_limits(params);
        match self.engine.search(&params) {
            Ok(outcome) => match outcome.best_move {
                Some(mv) => BestMove::from_engine(ticket, &mv),
                None => {
                    tracing::warn!(%ticket, "Search found no root moves, using fallback");
                    BestMove::fallback(MoveOrigin::NoRootMoves, Some(ticket))
                }
            },
            Err(e) => {
                tracing::error!(%ticket, "Search failed: {}", e);
                self.rendezvous.record_error(RecordedError {
                    ticket,
                    command: "go".to_string(),
                    error: e,
                });
                BestMove::fallback(MoveOrigin::EngineError, Some(ticket))
            }
        }
    }

    /// Nothing can interrupt a running search, so unbounded searches get
    /// the default movetime.
    fn effective_limits(&self, params: &GoParams) -> GoParams {
        let unbounded = params.movetime.is_none() && params.depth.is_none() && params.nodes.is_none();
        if params.infinite || unbounded {
            GoParams {
                movetime: Some(self.default_movetime_ms),
                infinite: false,
                ..params.clone()
            }
        } else {
            params.clone()
        }
    }

    fn record(&self, ticket: Ticket, command: &UciCommand, error: EngineError) {
        tracing::warn!(%ticket, command = command.keyword(), "Command failed: {}", error);
        self.rendezvous.record_error(RecordedError {
            ticket,
            command: command.keyword().to_string(),
            error,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
