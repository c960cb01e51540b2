//! In-process engine built on cozy-chess.

pub mod eval;
pub mod search;

use std::time::Duration;

use chess::{find_variant, format_move, variant_names, Position};

use crate::options::{OptionKind, OptionsTable, VARIANT_OPTION};
use crate::{Engine, EngineError, EngineInfo, GoParams, Score, SearchOutcome, StartPosition};
use search::{Limits, Searcher, MATE};

pub const ENGINE_NAME: &str = "uci-bridge builtin";

const HASH_OPTION: &str = "Hash";
const SKILL_OPTION: &str = "Skill Level";
const OVERHEAD_OPTION: &str = "Move Overhead";
const CHESS960_OPTION: &str = "UCI_Chess960";

const DEFAULT_HASH_MB: i64 = 16;
const MAX_SKILL: i64 = 20;

pub struct BuiltinEngine {
    options: OptionsTable,
    position: Position,
    searcher: Searcher,
}

impl BuiltinEngine {
    pub fn new() -> Self {
        let options = OptionsTable::new()
            .with(
                HASH_OPTION,
                OptionKind::Spin {
                    default: DEFAULT_HASH_MB,
                    min: 1,
                    max: 1024,
                },
            )
            .with(
                SKILL_OPTION,
                OptionKind::Spin {
                    default: MAX_SKILL,
                    min: 0,
                    max: MAX_SKILL,
                },
            )
            .with(
                OVERHEAD_OPTION,
                OptionKind::Spin {
                    default: 10,
                    min: 0,
                    max: 5000,
                },
            )
            .with(
                VARIANT_OPTION,
                OptionKind::Combo {
                    default: "chess".to_string(),
                    vars: variant_names().map(str::to_string).collect(),
                },
            )
            .with(CHESS960_OPTION, OptionKind::Check { default: false });

        Self {
            options,
            position: Position::default(),
            searcher: Searcher::new(DEFAULT_HASH_MB as usize),
        }
    }

    /// The current position, as left by the last `set_position`
    pub fn position(&self) -> &Position {
        &self.position
    }

    fn chess960(&self) -> bool {
        self.options.check(CHESS960_OPTION).unwrap_or(false)
    }

    fn start_fen(&self) -> &'static str {
        find_variant(self.variant())
            .map(|variant| variant.start_fen)
            .unwrap_or(chess::STANDARD_START_FEN)
    }

    /// Depth cap for the configured skill level; full strength is uncapped.
    fn depth_cap(&self) -> Option<u8> {
        let skill = self.options.spin(SKILL_OPTION).unwrap_or(MAX_SKILL);
        if skill >= MAX_SKILL {
            None
        } else {
            Some(1 + (skill / 4) as u8)
        }
    }

    fn limits(&self, params: &GoParams) -> Limits {
        let overhead = self.options.spin(OVERHEAD_OPTION).unwrap_or(0).max(0) as u64;
        let movetime = params
            .movetime
            .filter(|_| !params.infinite)
            .map(|movetime| Duration::from_millis(movetime.saturating_sub(overhead).max(1)));

        let depth = match (params.depth, self.depth_cap()) {
            (Some(depth), Some(cap)) => Some(depth.min(cap)),
            (depth, cap) => depth.or(cap),
        };

        Limits {
            movetime,
            depth,
            nodes: params.nodes,
        }
    }
}

impl Default for BuiltinEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for BuiltinEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
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
        let (name, value) = self.options.set(name, value)?;
        tracing::debug!(option = name, value, "Option set");
        let name = name.to_string();

        if name == HASH_OPTION {
            let mb = self.options.spin(HASH_OPTION).unwrap_or(DEFAULT_HASH_MB);
            self.searcher.resize(mb as usize);
        } else if name == VARIANT_OPTION || name == CHESS960_OPTION {
            let fen = self.start_fen();
            let chess960 = self.chess960();
            self.position = Position::from_fen(fen, chess960)
                .map_err(|e| EngineError::InvalidFen(e.to_string()))?;
        }
        Ok(())
    }

    fn set_position(&mut self, start: &StartPosition, moves: &[String]) -> Result<usize, EngineError> {
        let fen = match start {
            StartPosition::StartPos => self.start_fen(),
            StartPosition::Fen(fen) => fen.as_str(),
        };

        let mut position = Position::from_fen(fen, self.chess960())
            .map_err(|e| EngineError::InvalidFen(e.to_string()))?;
        let applied = position.apply_uci_moves(moves);
        if applied < moves.len() {
            tracing::debug!(
                applied,
                rejected = %moves[applied],
                "Stopped applying moves at first unplayable move"
            );
        }

        self.position = position;
        Ok(applied)
    }

    fn search(&mut self, params: &GoParams) -> Result<SearchOutcome, EngineError> {
        let limits = self.limits(params);
        tracing::debug!(?limits, fen = %self.position.to_fen(), "Starting search");

        let board = self.position.board().clone();
        let report = self.searcher.search(&board, limits);
        let chess960 = self.chess960();

        let score = if report.score.abs() >= MATE - i32::from(search::MAX_DEPTH) {
            let plies = MATE - report.score.abs();
            let moves = ((plies + 1) / 2).clamp(1, i32::from(i8::MAX)) as i8;
            Score::Mate(if report.score > 0 { moves } else { -moves })
        } else {
            Score::Centipawns(report.score)
        };

        let mut pv = Vec::with_capacity(report.pv.len());
        let mut walk = board.clone();
        for &mv in &report.pv {
            pv.push(format_move(&walk, mv, chess960));
            walk.play_unchecked(mv);
        }

        let elapsed_ms = report.elapsed.as_millis() as u64;
        let info = EngineInfo {
            depth: Some(report.depth),
            time_ms: Some(elapsed_ms),
            nodes: Some(report.nodes),
            score: Some(score),
            nps: Some(report.nodes * 1000 / elapsed_ms.max(1)),
            hashfull: Some(self.searcher.hashfull()),
            pv,
            ..EngineInfo::default()
        };
        tracing::debug!(
            depth = report.depth,
            nodes = report.nodes,
            root_moves = report.root_moves,
            elapsed_ms,
            "Search finished"
        );

        Ok(SearchOutcome {
            best_move: report.best_move.map(|mv| format_move(&board, mv, chess960)),
            ponder: info.pv.get(1).cloned(),
            info,
        })
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        self.searcher.clear();
        Ok(())
    }

    fn shutdown(&mut self) {
        self.searcher.clear();
        tracing::debug!("Builtin engine released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn go(movetime: u64) -> GoParams {
        GoParams {
            movetime: Some(movetime),
            ..GoParams::default()
        }
    }

    #[test]
    fn test_start_position_search_returns_legal_move() {
        let mut engine = BuiltinEngine::new();
        engine.set_position(&StartPosition::StartPos, &[]).unwrap();
        let outcome = engine.search(&go(100)).unwrap();
        let best = outcome.best_move.unwrap();
        assert!(chess::parse_legal_move(engine.position().board(), &best, false).is_ok());
    }

    #[test]
    fn test_position_with_moves() {
        let mut engine = BuiltinEngine::new();
        let moves = vec!["e2e4".to_string(), "e7e5".to_string()];
        let applied = engine
            .set_position(&StartPosition::StartPos, &moves)
            .unwrap();
        assert_eq!(applied, 2);
        assert_eq!(engine.position().moves().len(), 2);
    }

    #[test]
    fn test_illegal_move_stops_silently() {
        let mut engine = BuiltinEngine::new();
        let moves = vec!["e2e4".to_string(), "e2e4".to_string(), "d7d5".to_string()];
        let applied = engine
            .set_position(&StartPosition::StartPos, &moves)
            .unwrap();
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_invalid_fen_keeps_previous_position() {
        let mut engine = BuiltinEngine::new();
        engine
            .set_position(&StartPosition::StartPos, &["d2d4".to_string()])
            .unwrap();
        let result = engine.set_position(&StartPosition::Fen("garbage".to_string()), &[]);
        assert!(matches!(result, Err(EngineError::InvalidFen(_))));
        assert_eq!(engine.position().moves().len(), 1);
    }

    #[test]
    fn test_no_root_moves_yields_none() {
        let mut engine = BuiltinEngine::new();
        engine
            .set_position(
                &StartPosition::Fen("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1".to_string()),
                &[],
            )
            .unwrap();
        let outcome = engine.search(&go(50)).unwrap();
        assert!(outcome.best_move.is_none());
    }

    #[test]
    fn test_castling_reported_in_standard_notation() {
        let mut engine = BuiltinEngine::new();
        engine
            .set_position(
                &StartPosition::Fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1".to_string()),
                &[],
            )
            .unwrap();
        let outcome = engine
            .search(&GoParams {
                depth: Some(1),
                ..GoParams::default()
            })
            .unwrap();
        assert_ne!(outcome.best_move.as_deref(), Some("e1h1"));
    }

    #[test]
    fn test_variant_option() {
        let mut engine = BuiltinEngine::new();
        engine.set_option("UCI_Variant", "nocastle").unwrap();
        assert_eq!(engine.variant(), "nocastle");
        assert!(engine.position().to_fen().contains(" w - - "));

        assert!(matches!(
            engine.set_option("UCI_Variant", "xiangqi"),
            Err(EngineError::UnknownVariant(_))
        ));
        assert_eq!(engine.variant(), "nocastle");
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let mut engine = BuiltinEngine::new();
        assert!(!engine.has_option("Threads"));
        assert!(matches!(
            engine.set_option("Threads", "4"),
            Err(EngineError::UnknownOption(_))
        ));
        assert!(engine.set_option("hash", "32").is_ok());
    }

    #[test]
    fn test_skill_level_caps_depth() {
        let mut engine = BuiltinEngine::new();
        engine.set_option("Skill Level", "0").unwrap();
        let outcome = engine.search(&go(500)).unwrap();
        assert!(outcome.info.depth.unwrap() <= 1);
    }

    #[test]
    fn test_new_game_clears_memory() {
        let mut engine = BuiltinEngine::new();
        engine.search(&go(20)).unwrap();
        engine.new_game().unwrap();
        assert_eq!(engine.searcher.hashfull(), 0);
    }
}
