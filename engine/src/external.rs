use crate::options::{OptionsTable, VARIANT_OPTION};
use crate::uci::{parse_uci_message, UciMessage};
use crate::{Engine, EngineError, EngineInfo, GoParams, SearchOutcome, StartPosition};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::runtime::Runtime;

/// An external UCI engine process (e.g. Fairy-Stockfish) driven over its pipes.
///
/// The engine is used from a single worker thread, so I/O is done by blocking
/// on a private current-thread runtime; tokio is only there for the read
/// timeouts.
pub struct ExternalEngine {
    runtime: Runtime,
    process: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    name: String,
    options: OptionsTable,
    config: ExternalConfig,
    closed: bool,
    /// A read timed out, so the pipe may still hold a late answer
    needs_resync: bool,
    /// `isready` commands whose `readyok` never arrived
    unanswered_ready: usize,
}

/// How to launch and talk to the engine binary.
#[derive(Debug, Clone)]
pub struct ExternalConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    /// Time allowed for `uciok` / `readyok`
    pub handshake_timeout: Duration,
    /// Extra time after `movetime` before `stop` is sent
    pub search_grace: Duration,
    /// Time allowed for a `go` without `movetime` before `stop` is sent
    pub search_timeout: Duration,
}

impl ExternalConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            handshake_timeout: Duration::from_secs(10),
            search_grace: Duration::from_millis(500),
            search_timeout: Duration::from_secs(60),
        }
    }
}

impl ExternalEngine {
    /// Spawn the engine and complete the `uci` / `isready` handshake.
    #[tracing::instrument(level = "info", skip(config), fields(path = %config.path.display()))]
    pub fn spawn(config: ExternalConfig) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut process = {
            let _guard = runtime.enter();
            tokio::process::Command::new(&config.path)
                .args(&config.args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| {
                    tracing::error!("Failed to spawn engine: {}", e);
                    EngineError::Spawn(format!("{}: {}", config.path.display(), e))
                })?
        };

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("Failed to get stdin".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("Failed to get stdout".into()))?;

        let mut engine = Self {
            runtime,
            process,
            stdin,
            lines: BufReader::new(stdout).lines(),
            name: config.path.display().to_string(),
            options: OptionsTable::new(),
            config,
            closed: false,
            needs_resync: false,
            unanswered_ready: 0,
        };

        engine.send("uci")?;
        let timeout = engine.config.handshake_timeout;
        let mut options = OptionsTable::new();
        let mut name = None;
        engine.read_until(timeout, "uciok", |msg| match msg {
            UciMessage::Id { name: key, value } if key == "name" => {
                name = Some(value);
                None
            }
            UciMessage::Option(option) => {
                options.declare(option);
                None
            }
            UciMessage::UciOk => Some(()),
            _ => None,
        })?;

        if let Some(name) = name {
            engine.name = name;
        }
        engine.options = options;
        engine.wait_ready()?;

        tracing::info!(
            engine = %engine.name,
            options = engine.options.names().len(),
            variant = engine.variant(),
            "External engine ready"
        );
        Ok(engine)
    }

    fn send(&mut self, line: &str) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        tracing::trace!("UCI >> {}", line);
        let bytes = format!("{}\n", line);
        self.runtime.block_on(write_line(&mut self.stdin, bytes.as_bytes()))?;
        Ok(())
    }

    /// Read lines until `handle` returns a value or `timeout` elapses.
    /// Lines that are not UCI messages are skipped.
    fn read_until<T>(
        &mut self,
        timeout: Duration,
        waiting_for: &'static str,
        mut handle: impl FnMut(UciMessage) -> Option<T>,
    ) -> Result<T, EngineError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let line = self
                .runtime
                .block_on(next_line_before(&mut self.lines, deadline));

            let line = match line {
                Err(_) => {
                    self.needs_resync = true;
                    return Err(EngineError::Timeout(waiting_for));
                }
                Ok(Err(e)) => {
                    tracing::error!("Error reading from engine stdout: {}", e);
                    return Err(EngineError::Io(e));
                }
                Ok(Ok(None)) => {
                    tracing::warn!("Engine stdout EOF - engine closed");
                    self.closed = true;
                    return Err(EngineError::Closed);
                }
                Ok(Ok(Some(line))) => line,
            };

            let trimmed = line.trim();
            tracing::trace!("UCI << {}", trimmed);
            match parse_uci_message(trimmed) {
                Ok(msg) => {
                    if let Some(value) = handle(msg) {
                        return Ok(value);
                    }
                }
                Err(_) => tracing::trace!("Ignoring engine output: {}", trimmed),
            }
        }
    }

    fn wait_ready(&mut self) -> Result<(), EngineError> {
        self.send("isready")?;
        let timeout = self.config.handshake_timeout;
        let result = self.read_until(timeout, "readyok", |msg| {
            matches!(msg, UciMessage::ReadyOk).then_some(())
        });
        if matches!(result, Err(EngineError::Timeout(_))) {
            self.unanswered_ready += 1;
        }
        result
    }

    /// After a read timeout, drain whatever the engine still owes us before
    /// the next command. An engine that cannot be brought back is closed.
    fn resync(&mut self) -> Result<(), EngineError> {
        if !self.needs_resync || self.closed {
            return Ok(());
        }
        tracing::debug!(unanswered = self.unanswered_ready, "Resynchronizing with engine");
        self.send("isready")?;

        let timeout = self.config.handshake_timeout;
        let mut outstanding = self.unanswered_ready + 1;
        let result = self.read_until(timeout, "readyok", |msg| match msg {
            UciMessage::ReadyOk => {
                outstanding -= 1;
                (outstanding == 0).then_some(())
            }
            UciMessage::BestMove { mv, .. } => {
                tracing::debug!("Discarding late bestmove: {:?}", mv);
                None
            }
            _ => None,
        });

        match result {
            Ok(()) => {
                self.needs_resync = false;
                self.unanswered_ready = 0;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Engine did not answer isready, closing it: {}", e);
                self.closed = true;
                Err(EngineError::Closed)
            }
        }
    }
}

async fn next_line_before(
    lines: &mut Lines<BufReader<ChildStdout>>,
    deadline: tokio::time::Instant,
) -> Result<std::io::Result<Option<String>>, tokio::time::error::Elapsed> {
    tokio::time::timeout_at(deadline, lines.next_line()).await
}

async fn write_line(stdin: &mut ChildStdin, bytes: &[u8]) -> std::io::Result<()> {
    stdin.write_all(bytes).await?;
    stdin.flush().await
}

impl Engine for ExternalEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn variant(&self) -> &str {
        self.options.value(VARIANT_OPTION).unwrap_or("chess")
    }

    fn has_option(&self, name: &str) -> bool {
        self.options.contains(name)
    }

    fn option_names(&self) -> Vec<String> {
        self.options.names()
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        self.resync()?;
        let (name, value) = self.options.set(name, value)?;
        let cmd = if value.is_empty() {
            format!("setoption name {}", name)
        } else {
            format!("setoption name {} value {}", name, value)
        };
        tracing::info!("Setting option: {}", cmd);
        self.send(&cmd)
    }

    fn set_position(&mut self, start: &StartPosition, moves: &[String]) -> Result<usize, EngineError> {
        self.resync()?;
        let mut position_cmd = match start {
            StartPosition::StartPos => "position startpos".to_string(),
            StartPosition::Fen(fen) => format!("position fen {}", fen),
        };
        if !moves.is_empty() {
            position_cmd.push_str(" moves");
            for mv in moves {
                position_cmd.push(' ');
                position_cmd.push_str(mv);
            }
        }
        tracing::debug!(moves = moves.len(), "Setting position");
        self.send(&position_cmd)?;
        // Legality is enforced by the engine itself; it does not report how
        // many moves it accepted.
        Ok(moves.len())
    }

    fn search(&mut self, params: &GoParams) -> Result<SearchOutcome, EngineError> {
        self.resync()?;
        let mut go_cmd = "go".to_string();
        if let Some(movetime) = params.movetime {
            go_cmd.push_str(&format!(" movetime {}", movetime));
        }
        if let Some(depth) = params.depth {
            go_cmd.push_str(&format!(" depth {}", depth));
        }
        if let Some(nodes) = params.nodes {
            go_cmd.push_str(&format!(" nodes {}", nodes));
        }
        tracing::info!("Starting engine calculation: {}", go_cmd);
        self.send(&go_cmd)?;

        let budget = match params.movetime {
            Some(movetime) => Duration::from_millis(movetime) + self.config.search_grace,
            None => self.config.search_timeout,
        };
        let mut info = EngineInfo::default();
        let collect = |msg: UciMessage, info: &mut EngineInfo| match msg {
            UciMessage::Info(update) => {
                if update.depth.is_some() {
                    *info = update;
                }
                None
            }
            UciMessage::BestMove { mv, ponder } => Some((mv, ponder)),
            _ => None,
        };

        let result = match self.read_until(budget, "bestmove", |msg| collect(msg, &mut info)) {
            Err(EngineError::Timeout(_)) => {
                tracing::warn!("No bestmove within {:?}, sending stop", budget);
                self.send("stop")?;
                let grace = self.config.search_grace;
                let late = self.read_until(grace, "bestmove", |msg| collect(msg, &mut info))?;
                // The answer to `stop` arrived, nothing is left in the pipe
                self.needs_resync = false;
                late
            }
            other => other?,
        };

        let (best_move, ponder) = result;
        tracing::info!("Received bestmove: {:?}", best_move);
        Ok(SearchOutcome {
            best_move,
            ponder,
            info,
        })
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        self.resync()?;
        self.send("ucinewgame")?;
        self.wait_ready()
    }

    fn shutdown(&mut self) {
        if !self.closed {
            tracing::info!("Sending quit command to engine");
            let _ = self.send("quit");
            self.closed = true;
        }
        let process = &mut self.process;
        self.runtime.block_on(async {
            if tokio::time::timeout(Duration::from_secs(1), process.wait())
                .await
                .is_err()
            {
                tracing::warn!("Engine did not exit after quit, killing it");
                let _ = process.kill().await;
            }
        });
    }
}

impl Drop for ExternalEngine {
    fn drop(&mut self) {
        if !self.closed {
            self.shutdown();
        }
    }
}

const COMMON_DIRS: [&str; 4] = ["/usr/local/bin", "/usr/bin", "/opt/homebrew/bin", "/usr/games"];

/// Find a UCI engine executable on `PATH`, then in common install locations.
/// Earlier names win over later ones.
pub fn find_engine_path(names: &[&str]) -> Option<PathBuf> {
    let path_dirs = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect::<Vec<_>>())
        .unwrap_or_default();
    find_in_dirs(
        names,
        path_dirs.into_iter().chain(COMMON_DIRS.iter().map(PathBuf::from)),
    )
}

fn find_in_dirs(names: &[&str], dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    let dirs: Vec<PathBuf> = dirs
        .into_iter()
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect();
    names.iter().find_map(|name| {
        dirs.iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    })
}
