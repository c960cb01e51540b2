use crate::options::{OptionKind, UciOption};
use crate::{EngineInfo, Score};

/// Incoming message from UCI engine
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)` / `bestmove 0000`
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    Info(EngineInfo),
    Option(UciOption),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, super::UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(super::UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"bestmove") => {
            if tokens.len() < 2 {
                return Err(super::UciError::MalformedMessage(line.to_string()));
            }
            let mv = parse_move_token(tokens[1]);
            let ponder = if tokens.len() >= 4 && tokens[2] == "ponder" {
                parse_move_token(tokens[3])
            } else {
                None
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        Some(&"option") => Ok(UciMessage::Option(parse_option_line(line, &tokens[1..])?)),

        _ => Err(super::UciError::UnknownMessage(line.to_string())),
    }
}

fn parse_move_token(token: &str) -> Option<String> {
    match token {
        "(none)" | "0000" | "none" => None,
        mv => Some(mv.to_string()),
    }
}

/// Parse an "info" line from the engine
fn parse_info_line(tokens: &[&str]) -> EngineInfo {
    let mut info = EngineInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                info.seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                info.time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                info.nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value_str.parse().ok().map(Score::Centipawns),
                            "mate" => value_str.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    info.pv.push(tokens[i].to_string());
                    i += 1;
                }
                continue;
            }
            "multipv" => {
                i += 1;
                info.multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "currmove" => {
                i += 1;
                info.currmove = tokens.get(i).map(|s| s.to_string());
            }
            "hashfull" => {
                i += 1;
                info.hashfull = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "string" => break,
            _ => {
                // Unknown keyword, skip
            }
        }
        i += 1;
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}

/// Parse `option name <name...> type <type> [default <v...>] [min <n>] [max <n>] [var <v...>]*`
fn parse_option_line(line: &str, tokens: &[&str]) -> Result<UciOption, super::UciError> {
    let malformed = || super::UciError::MalformedOption(line.to_string());

    let mut name = Vec::new();
    let mut kind = None;
    let mut default: Option<Vec<&str>> = None;
    let mut min = None;
    let mut max = None;
    let mut vars: Vec<Vec<&str>> = Vec::new();

    let mut section = "";
    for &token in tokens {
        match token {
            "name" | "type" | "default" | "min" | "max" | "var" => {
                section = token;
                match token {
                    "default" => default = Some(Vec::new()),
                    "var" => vars.push(Vec::new()),
                    _ => {}
                }
                continue;
            }
            _ => {}
        }

        match section {
            "name" => name.push(token),
            "type" => kind = Some(token),
            "default" => default.get_or_insert_with(Vec::new).push(token),
            "min" => min = token.parse::<i64>().ok(),
            "max" => max = token.parse::<i64>().ok(),
            "var" => {
                if let Some(var) = vars.last_mut() {
                    var.push(token);
                }
            }
            _ => return Err(malformed()),
        }
    }

    if name.is_empty() {
        return Err(malformed());
    }
    let default = default.map(|words| words.join(" ")).unwrap_or_default();

    let kind = match kind.ok_or_else(malformed)? {
        "check" => OptionKind::Check {
            default: default == "true",
        },
        "spin" => OptionKind::Spin {
            default: default.parse().map_err(|_| malformed())?,
            min: min.unwrap_or(i64::MIN),
            max: max.unwrap_or(i64::MAX),
        },
        "combo" => OptionKind::Combo {
            default,
            vars: vars.into_iter().map(|words| words.join(" ")).collect(),
        },
        "string" => OptionKind::String {
            default: if default == "<empty>" {
                String::new()
            } else {
                default
            },
        },
        "button" => OptionKind::Button,
        _ => return Err(malformed()),
    };

    Ok(UciOption::new(name.join(" "), kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        match msg {
            UciMessage::BestMove { mv, ponder } => {
                assert_eq!(mv.as_deref(), Some("e2e4"));
                assert_eq!(ponder.as_deref(), Some("e7e5"));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_bestmove_none() {
        for line in ["bestmove (none)", "bestmove 0000"] {
            match parse_uci_message(line).unwrap() {
                UciMessage::BestMove { mv, ponder } => {
                    assert!(mv.is_none());
                    assert!(ponder.is_none());
                }
                _ => panic!("Wrong message type"),
            }
        }
    }

    #[test]
    fn test_parse_xiangqi_bestmove() {
        match parse_uci_message("bestmove h2e2").unwrap() {
            UciMessage::BestMove { mv, .. } => assert_eq!(mv.as_deref(), Some("h2e2")),
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_info() {
        let msg = parse_uci_message("info depth 12 score cp 35 nodes 15234 pv e2e4 e7e5").unwrap();
        match msg {
            UciMessage::Info(info) => {
                assert_eq!(info.depth, Some(12));
                assert!(matches!(info.score, Some(Score::Centipawns(35))));
                assert_eq!(info.nodes, Some(15234));
                assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_spin_option() {
        let msg = parse_uci_message("option name Hash type spin default 16 min 1 max 33554432").unwrap();
        match msg {
            UciMessage::Option(option) => {
                assert_eq!(option.name, "Hash");
                assert_eq!(
                    option.kind,
                    OptionKind::Spin {
                        default: 16,
                        min: 1,
                        max: 33554432
                    }
                );
                assert_eq!(option.value(), "16");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_combo_option_with_spaced_name() {
        let msg = parse_uci_message(
            "option name UCI_Variant type combo default chess var chess var xiangqi var shogi",
        )
        .unwrap();
        let UciMessage::Option(option) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(option.name, "UCI_Variant");
        assert_eq!(
            option.kind,
            OptionKind::Combo {
                default: "chess".into(),
                vars: vec!["chess".into(), "xiangqi".into(), "shogi".into()],
            }
        );

        let msg = parse_uci_message("option name Skill Level type spin default 20 min -20 max 20").unwrap();
        let UciMessage::Option(option) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(option.name, "Skill Level");
    }

    #[test]
    fn test_parse_string_and_button_options() {
        let UciMessage::Option(option) =
            parse_uci_message("option name EvalFile type string default <empty>").unwrap()
        else {
            panic!("Wrong message type");
        };
        assert_eq!(option.kind, OptionKind::String { default: String::new() });

        let UciMessage::Option(option) = parse_uci_message("option name Clear Hash type button").unwrap()
        else {
            panic!("Wrong message type");
        };
        assert_eq!(option.kind, OptionKind::Button);
    }

    #[test]
    fn test_malformed_option() {
        assert!(parse_uci_message("option type spin default 1").is_err());
        assert!(parse_uci_message("option name Hash type spin default big").is_err());
    }
}
