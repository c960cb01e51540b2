use std::io::{BufRead, Write};
use std::time::Duration;

use bridge::{Bridge, MoveOrigin};

const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `best [ms]`
    Best(Option<u64>),
    Sync,
    Quit,
    Help,
    /// Anything else, queued for the engine verbatim
    Raw(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut tokens = line.split_whitespace();
        let command = match tokens.next() {
            Some("best") => match tokens.next() {
                None => ReplCommand::Best(None),
                Some(ms) => ReplCommand::Best(Some(
                    ms.parse().map_err(|_| format!("Invalid time budget: {}", ms))?,
                )),
            },
            Some("sync") => ReplCommand::Sync,
            Some("quit") | Some("exit") => ReplCommand::Quit,
            Some("help") => ReplCommand::Help,
            _ => ReplCommand::Raw(line.trim().to_string()),
        };
        Ok(command)
    }
}

/// Read commands until `quit` or end of input.
pub fn run(bridge: &Bridge, input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line?;
        let command = match ReplCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "error: {}", message)?;
                continue;
            }
        };

        match command {
            ReplCommand::Best(budget) => {
                let budget = budget.unwrap_or(bridge.config().default_movetime_ms);
                let best = bridge.request_best_move(budget);
                match best.origin() {
                    MoveOrigin::Engine => writeln!(output, "bestmove {}", best)?,
                    origin => writeln!(output, "bestmove {} (fallback: {:?})", best, origin)?,
                }
            }
            ReplCommand::Sync => match bridge.sync(SYNC_TIMEOUT) {
                Ok(()) => writeln!(output, "ok")?,
                Err(e) => writeln!(output, "error: {}", e)?,
            },
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                writeln!(output, "best [ms]  search the current position")?;
                writeln!(output, "sync       wait for queued commands and report errors")?;
                writeln!(output, "quit       exit")?;
                writeln!(output, "anything else is sent to the engine as a UCI command")?;
            }
            ReplCommand::Raw(text) if text.is_empty() => {}
            ReplCommand::Raw(text) => {
                if let Err(e) = bridge.send_raw_command(&text) {
                    writeln!(output, "error: {}", e)?;
                }
            }
        }
        output.flush()?;
    }
    Ok(())
}
