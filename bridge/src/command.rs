//! Parsing of the UCI command lines the worker understands.

use engine::{GoParams, StartPosition};

/// One UCI command, as interpreted by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Position {
        start: StartPosition,
        moves: Vec<String>,
    },
    Go(GoParams),
    SetOption {
        name: String,
        value: String,
    },
    UciNewGame,
    IsReady,
    Stop,
    /// Blank line
    Empty,
    /// Anything else; the worker logs and skips it
    Unsupported(String),
}

impl UciCommand {
    /// Parse one command line. Never fails: malformed input becomes
    /// `Unsupported` so the worker can report it.
    pub fn parse(line: &str) -> Self {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.first() {
            None => UciCommand::Empty,
            Some(&"position") => parse_position(line, &tokens[1..]),
            Some(&"go") => UciCommand::Go(parse_go(&tokens[1..])),
            Some(&"setoption") => parse_setoption(line, &tokens[1..]),
            Some(&"ucinewgame") => UciCommand::UciNewGame,
            Some(&"isready") => UciCommand::IsReady,
            Some(&"stop") => UciCommand::Stop,
            Some(_) => UciCommand::Unsupported(line.trim().to_string()),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            UciCommand::Position { .. } => "position",
            UciCommand::Go(_) => "go",
            UciCommand::SetOption { .. } => "setoption",
            UciCommand::UciNewGame => "ucinewgame",
            UciCommand::IsReady => "isready",
            UciCommand::Stop => "stop",
            UciCommand::Empty => "",
            UciCommand::Unsupported(_) => "unsupported",
        }
    }
}

fn parse_position(line: &str, tokens: &[&str]) -> UciCommand {
    let moves_at = tokens.iter().position(|&token| token == "moves");
    let (setup, moves) = match moves_at {
        Some(index) => (&tokens[..index], &tokens[index + 1..]),
        None => (tokens, &tokens[tokens.len()..]),
    };

    let start = match setup.split_first() {
        Some((&"startpos", _)) => StartPosition::StartPos,
        // An empty FEN is passed on so the engine reports it as invalid
        Some((&"fen", fen)) => StartPosition::Fen(fen.join(" ")),
        _ => return UciCommand::Unsupported(line.trim().to_string()),
    };

    UciCommand::Position {
        start,
        moves: moves.iter().map(|mv| mv.to_string()).collect(),
    }
}

fn parse_go(tokens: &[&str]) -> GoParams {
    let mut params = GoParams::default();
    let mut iter = tokens.iter();
    while let Some(&token) = iter.next() {
        match token {
            "movetime" => params.movetime = iter.next().and_then(|v| v.parse().ok()),
            "depth" => params.depth = iter.next().and_then(|v| v.parse().ok()),
            "nodes" => params.nodes = iter.next().and_then(|v| v.parse().ok()),
            "infinite" => params.infinite = true,
            // Clock-based limits are not interpreted
            "wtime" | "btime" | "winc" | "binc" | "movestogo" | "mate" => {
                iter.next();
            }
            _ => {}
        }
    }
    params
}

/// `setoption name <name...> [value <value...>]`; names and values may
/// contain spaces.
fn parse_setoption(line: &str, tokens: &[&str]) -> UciCommand {
    if tokens.first() != Some(&"name") {
        return UciCommand::Unsupported(line.trim().to_string());
    }

    let rest = &tokens[1..];
    let value_at = rest.iter().position(|&token| token == "value");
    let (name, value) = match value_at {
        Some(index) => (&rest[..index], &rest[index + 1..]),
        None => (rest, &rest[rest.len()..]),
    };

    if name.is_empty() {
        return UciCommand::Unsupported(line.trim().to_string());
    }

    UciCommand::SetOption {
        name: name.join(" "),
        value: value.join(" "),
    }
}
