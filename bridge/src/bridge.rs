use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use engine::external::find_engine_path;
use engine::options::VARIANT_OPTION;
use engine::{BuiltinEngine, Engine, EngineError, EngineFactory, ExternalConfig, ExternalEngine};
use parking_lot::Mutex;

use crate::config::{BridgeConfig, EnginePath, AUTO_ENGINE_NAMES};
use crate::error::BridgeError;
use crate::listener::{BestMoveListener, ListenerSlot};
use crate::queue::{CommandQueue, Ticket};
use crate::rendezvous::{BestMove, MoveOrigin, Rendezvous};
use crate::worker;

/// Factory for the built-in cozy-chess engine
pub fn builtin_factory() -> EngineFactory {
    Arc::new(|| -> Result<Box<dyn Engine>, EngineError> { Ok(Box::new(BuiltinEngine::new())) })
}

/// Factory spawning a fresh external engine process per initialization
pub fn external_factory(config: ExternalConfig) -> EngineFactory {
    Arc::new(move || -> Result<Box<dyn Engine>, EngineError> {
        Ok(Box::new(ExternalEngine::spawn(config.clone())?))
    })
}

/// A synchronous front end to a single-threaded UCI engine.
///
/// Any number of threads may call into a `Bridge`. Commands are queued and
/// executed in order by one worker thread that owns the engine; callers that
/// need a result block on it with a bounded wait. The engine and worker are
/// created on first use (or by [`Bridge::initialize`]) and torn down by
/// [`Bridge::shutdown`], after which the next call starts a fresh session.
pub struct Bridge {
    config: BridgeConfig,
    factory: EngineFactory,
    listener: ListenerSlot,
    running: Mutex<Option<Running>>,
}

/// One initialized session: its own queue, result slot and worker
struct Running {
    queue: Arc<CommandQueue>,
    rendezvous: Arc<Rendezvous>,
    worker: JoinHandle<()>,
    variant: String,
}

/// The handles a caller needs, cloned out so no lock is held while waiting
struct Session {
    queue: Arc<CommandQueue>,
    rendezvous: Arc<Rendezvous>,
}

impl Session {
    fn push(&self, line: String) -> Result<Ticket, BridgeError> {
        self.queue.push(line).map_err(|_| BridgeError::EngineNotReady)
    }
}

impl Bridge {
    pub fn new(config: BridgeConfig, factory: EngineFactory) -> Self {
        Self {
            config,
            factory,
            listener: ListenerSlot::default(),
            running: Mutex::new(None),
        }
    }

    /// Default configuration with the built-in engine
    pub fn builtin() -> Self {
        Self::new(BridgeConfig::default(), builtin_factory())
    }

    /// Pick the engine backend named by `config.engine_path`.
    pub fn from_config(config: BridgeConfig) -> Self {
        let factory = match &config.engine_path {
            None => builtin_factory(),
            Some(EnginePath::Explicit(path)) => external_factory(ExternalConfig::new(path)),
            Some(EnginePath::Auto) => match find_engine_path(AUTO_ENGINE_NAMES) {
                Some(path) => {
                    tracing::info!(path = %path.display(), "Found engine binary");
                    external_factory(ExternalConfig::new(path))
                }
                None => {
                    tracing::warn!("No engine binary found, using the built-in engine");
                    builtin_factory()
                }
            },
        };
        Self::new(config, factory)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Start the engine and worker. Does nothing if already initialized.
    ///
    /// `None` selects the configured default variant. An engine that does not
    /// answer `isready` within the init timeout is logged, not treated as
    /// a failure.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn initialize(&self, variant: Option<&str>) -> Result<(), BridgeError> {
        let mut running = self.running.lock();
        if let Some(current) = running.as_ref() {
            tracing::debug!(variant = %current.variant, "Already initialized");
            return Ok(());
        }

        let variant = variant.unwrap_or(&self.config.variant);
        *running = Some(self.start(variant)?);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Variant selected when the current session started
    pub fn variant(&self) -> Option<String> {
        self.running.lock().as_ref().map(|r| r.variant.clone())
    }

    /// Commands queued but not yet picked up by the worker
    pub fn pending_commands(&self) -> usize {
        self.running.lock().as_ref().map_or(0, |r| r.queue.len())
    }

    /// Queue a UCI line verbatim. Does not wait for it to run.
    pub fn send_raw_command(&self, text: &str) -> Result<Ticket, BridgeError> {
        let session = self.session()?;
        tracing::trace!(command = text, "Queueing raw command");
        session.push(text.to_string())
    }

    /// Queue `setoption`. Unknown names are ignored by the worker and
    /// reported by the next [`Bridge::sync`].
    pub fn configure_option(&self, name: &str, value: &str) -> Result<Ticket, BridgeError> {
        let session = self.session()?;
        session.push(format!("setoption name {} value {}", name, value))
    }

    pub fn set_position(&self, fen: &str) -> Result<Ticket, BridgeError> {
        self.set_position_with_moves(fen, "")
    }

    /// Queue `position fen <fen> moves <moves>`; `moves` is space separated.
    pub fn set_position_with_moves(&self, fen: &str, moves: &str) -> Result<Ticket, BridgeError> {
        let session = self.session()?;
        let fen = fen.trim();
        let moves = moves.trim();
        let line = if moves.is_empty() {
            format!("position fen {}", fen)
        } else {
            format!("position fen {} moves {}", fen, moves)
        };
        session.push(line)
    }

    /// Search the current position for `time_budget_ms` and return the move.
    ///
    /// Waits at most twice the budget (never less than the configured floor).
    /// Always returns a move: when the engine has none, fails, or does not
    /// answer in time, the fallback move is returned with an origin saying
    /// why. The registered listener sees the same text.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn request_best_move(&self, time_budget_ms: u64) -> BestMove {
        match self.search(time_budget_ms) {
            Ok((best, _)) => best,
            Err(e) => {
                tracing::error!("Best move request failed: {}", e);
                let best = BestMove::fallback(MoveOrigin::EngineError, None);
                self.listener.notify(best.as_str());
                best
            }
        }
    }

    /// Like [`Bridge::request_best_move`] but every fallback is an error.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn best_move(&self, time_budget_ms: u64) -> Result<String, BridgeError> {
        let (best, rendezvous) = match self.search(time_budget_ms) {
            Ok(found) => found,
            Err(e) => {
                self.listener.notify(BestMove::fallback(MoveOrigin::EngineError, None).as_str());
                return Err(e);
            }
        };

        match best.origin() {
            MoveOrigin::Engine => Ok(best.into_string()),
            MoveOrigin::NoRootMoves => Err(BridgeError::NoLegalMove),
            MoveOrigin::TimedOut => Err(BridgeError::SearchTimeout(time_budget_ms)),
            MoveOrigin::EngineError => {
                let recorded = best.ticket().and_then(|ticket| rendezvous.take_error_for(ticket));
                Err(recorded.map_or(BridgeError::EngineNotReady, |r| r.error.into()))
            }
        }
    }

    fn search(&self, time_budget_ms: u64) -> Result<(BestMove, Arc<Rendezvous>), BridgeError> {
        let session = self.session()?;
        session.rendezvous.clear_ready();
        let ticket = session.push(format!("go movetime {}", time_budget_ms))?;

        let wait = self.config.result_wait(time_budget_ms);
        let best = match session.rendezvous.wait_for_move(ticket, wait) {
            Some(best) => best,
            None => {
                tracing::warn!(%ticket, wait_ms = wait.as_millis() as u64, "No best move in time, using fallback");
                BestMove::fallback(MoveOrigin::TimedOut, Some(ticket))
            }
        };

        self.listener.notify(best.as_str());
        Ok((best, session.rendezvous))
    }

    /// Register the listener for best moves, replacing any previous one.
    pub fn register_best_move_callback(&self, listener: impl BestMoveListener + 'static) {
        self.listener.set(listener);
    }

    pub fn clear_best_move_callback(&self) {
        self.listener.clear();
    }

    /// Wait until every command queued so far has run, then report the first
    /// error they raised. Later errors are logged and discarded.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn sync(&self, timeout: Duration) -> Result<(), BridgeError> {
        let session = self.session()?;
        let ticket = session.push("isready".to_string())?;
        if !session.rendezvous.wait_for_ack(ticket, timeout) {
            return Err(BridgeError::EngineNotReady);
        }

        let mut errors = session.rendezvous.take_errors().into_iter();
        let Some(first) = errors.next() else {
            return Ok(());
        };
        for other in errors {
            tracing::warn!(ticket = %other.ticket, command = %other.command, "Discarding error: {}", other.error);
        }
        Err(first.error.into())
    }

    /// Stop the worker and release the engine.
    ///
    /// Pending commands are discarded; a search in progress finishes first.
    /// Safe to call repeatedly.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn shutdown(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        let dropped = running.queue.close();
        if running.worker.join().is_err() {
            tracing::error!("Worker thread panicked");
        }
        tracing::info!(dropped, variant = %running.variant, "Bridge shut down");
    }

    fn session(&self) -> Result<Session, BridgeError> {
        let mut running = self.running.lock();
        let current = match running.take() {
            Some(current) => current,
            None => {
                tracing::debug!("Auto-initializing");
                self.start(&self.config.variant)?
            }
        };
        let session = Session {
            queue: current.queue.clone(),
            rendezvous: current.rendezvous.clone(),
        };
        *running = Some(current);
        Ok(session)
    }

    fn start(&self, variant: &str) -> Result<Running, BridgeError> {
        let mut engine = (self.factory)()?;
        if let Err(e) = select_variant(engine.as_mut(), variant) {
            engine.shutdown();
            return Err(e);
        }
        let engine_name = engine.name().to_string();

        let queue = Arc::new(CommandQueue::new());
        let rendezvous = Arc::new(Rendezvous::new());
        let worker = worker::spawn(
            engine,
            queue.clone(),
            rendezvous.clone(),
            self.config.default_movetime_ms,
        )
        .map_err(BridgeError::WorkerSpawn)?;

        let running = Running {
            queue,
            rendezvous,
            worker,
            variant: variant.to_string(),
        };

        let ticket = running
            .queue
            .push("isready")
            .map_err(|_| BridgeError::EngineNotReady)?;
        if running.rendezvous.wait_for_ack(ticket, self.config.init_timeout) {
            tracing::info!(engine = %engine_name, variant, "Engine ready");
        } else {
            tracing::warn!(
                engine = %engine_name,
                timeout_ms = self.config.init_timeout.as_millis() as u64,
                "Engine not ready before init timeout, continuing"
            );
        }
        Ok(running)
    }
}

fn select_variant(engine: &mut dyn Engine, variant: &str) -> Result<(), BridgeError> {
    if engine.variant().eq_ignore_ascii_case(variant) {
        return Ok(());
    }
    if !engine.has_option(VARIANT_OPTION) {
        return Err(BridgeError::UnknownVariant(variant.to_string()));
    }
    engine.set_option(VARIANT_OPTION, variant)?;
    Ok(())
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .field("listener", &self.listener)
            .finish()
    }
}
