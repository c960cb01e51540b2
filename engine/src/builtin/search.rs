//! Iterative-deepening alpha-beta search over cozy-chess boards.
//!
//! The searcher is deliberately small: material and centralization
//! evaluation, a capture-only quiescence search, and a transposition table
//! for move ordering. It checks its deadline every few thousand nodes so a
//! `go movetime` returns close to the requested time.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use cozy_chess::{Board, Move};

use super::eval::{evaluate, piece_value};

pub const MATE: i32 = 30_000;
pub const MAX_DEPTH: u8 = 64;

const INFINITY: i32 = MATE + 1;
const QUIESCENCE_PLIES: u8 = 8;
const CHECK_INTERVAL: u64 = 2048;
const ENTRY_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy)]
struct TtEntry {
    depth: u8,
    score: i32,
    bound: Bound,
    best: Option<Move>,
}

/// Limits for one search
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    pub movetime: Option<Duration>,
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
}

/// Result of a completed (or interrupted) search
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
    pub root_moves: usize,
}

pub struct Searcher {
    table: HashMap<u64, TtEntry>,
    capacity: usize,
    nodes: u64,
    deadline: Option<Instant>,
    node_limit: Option<u64>,
    stopped: bool,
}

impl Searcher {
    pub fn new(hash_mb: usize) -> Self {
        Self {
            table: HashMap::new(),
            capacity: Self::capacity_for(hash_mb),
            nodes: 0,
            deadline: None,
            node_limit: None,
            stopped: false,
        }
    }

    fn capacity_for(hash_mb: usize) -> usize {
        (hash_mb.max(1) * 1024 * 1024 / ENTRY_BYTES).max(1024)
    }

    /// Resize the transposition table; clears it.
    pub fn resize(&mut self, hash_mb: usize) {
        self.capacity = Self::capacity_for(hash_mb);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.table.shrink_to_fit();
    }

    pub fn hashfull(&self) -> u16 {
        ((self.table.len() * 1000) / self.capacity).min(1000) as u16
    }

    pub fn search(&mut self, board: &Board, limits: Limits) -> SearchReport {
        let start = Instant::now();
        self.nodes = 0;
        self.stopped = false;
        self.deadline = limits.movetime.map(|movetime| start + movetime);
        self.node_limit = limits.nodes;

        let mut root_moves = ordered_moves(board, None);
        let mut report = SearchReport {
            best_move: root_moves.first().copied(),
            root_moves: root_moves.len(),
            ..SearchReport::default()
        };
        if root_moves.is_empty() {
            report.elapsed = start.elapsed();
            return report;
        }

        let max_depth = limits.depth.unwrap_or(MAX_DEPTH).clamp(1, MAX_DEPTH);
        for depth in 1..=max_depth {
            let mut alpha = -INFINITY;
            let mut best = None;

            for &mv in &root_moves {
                let mut child = board.clone();
                child.play_unchecked(mv);
                let score = -self.negamax(&child, depth - 1, 1, -INFINITY, -alpha);
                if self.stopped {
                    break;
                }
                if score > alpha {
                    alpha = score;
                    best = Some(mv);
                }
            }

            // An interrupted iteration is only trusted for the moves it finished
            if let Some(mv) = best {
                report.best_move = Some(mv);
                if !self.stopped {
                    report.score = alpha;
                    report.depth = depth;
                }
            }
            if self.stopped {
                break;
            }

            self.store(board.hash(), depth, alpha, Bound::Exact, best);
            if let Some(mv) = best {
                // Search the previous best first next iteration
                root_moves.retain(|&other| other != mv);
                root_moves.insert(0, mv);
            }
            if alpha.abs() >= MATE - i32::from(MAX_DEPTH) {
                break;
            }
        }

        report.nodes = self.nodes;
        report.elapsed = start.elapsed();
        report.pv = self.principal_variation(board, report.depth);
        if let (Some(best), Some(first)) = (report.best_move, report.pv.first()) {
            if best != *first {
                report.pv = vec![best];
            }
        }
        report
    }

    fn negamax(&mut self, board: &Board, depth: u8, ply: u8, mut alpha: i32, beta: i32) -> i32 {
        if self.should_stop() {
            return 0;
        }
        self.nodes += 1;

        if board.halfmove_clock() >= 100 {
            return 0;
        }

        let hash = board.hash();
        let tt_move = match self.table.get(&hash) {
            Some(entry) => {
                if entry.depth >= depth {
                    match entry.bound {
                        Bound::Exact => return entry.score,
                        Bound::Lower if entry.score >= beta => return entry.score,
                        Bound::Upper if entry.score <= alpha => return entry.score,
                        _ => {}
                    }
                }
                entry.best
            }
            None => None,
        };

        let moves = ordered_moves(board, tt_move);
        if moves.is_empty() {
            return if board.checkers().is_empty() {
                0
            } else {
                -MATE + i32::from(ply)
            };
        }

        if depth == 0 {
            return self.quiescence(board, ply, 0, alpha, beta);
        }

        let original_alpha = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = None;
        for mv in moves {
            let mut child = board.clone();
            child.play_unchecked(mv);
            let score = -self.negamax(&child, depth - 1, ply + 1, -beta, -alpha);
            if self.stopped {
                return 0;
            }
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.store(hash, depth, best_score, bound, best_move);
        best_score
    }

    fn quiescence(&mut self, board: &Board, ply: u8, qply: u8, mut alpha: i32, beta: i32) -> i32 {
        if self.should_stop() {
            return 0;
        }
        self.nodes += 1;

        let stand_pat = evaluate(board);
        if stand_pat >= beta || qply >= QUIESCENCE_PLIES {
            return stand_pat;
        }
        alpha = alpha.max(stand_pat);

        for mv in ordered_moves(board, None)
            .into_iter()
            .filter(|&mv| is_capture(board, mv))
        {
            let mut child = board.clone();
            child.play_unchecked(mv);
            let score = -self.quiescence(&child, ply + 1, qply + 1, -beta, -alpha);
            if self.stopped {
                return 0;
            }
            if score >= beta {
                return score;
            }
            alpha = alpha.max(score);
        }
        alpha
    }

    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if let Some(limit) = self.node_limit {
            if self.nodes >= limit {
                self.stopped = true;
                return true;
            }
        }
        if self.nodes % CHECK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.stopped = true;
                }
            }
        }
        self.stopped
    }

    fn store(&mut self, hash: u64, depth: u8, score: i32, bound: Bound, best: Option<Move>) {
        if self.table.len() >= self.capacity && !self.table.contains_key(&hash) {
            tracing::trace!(entries = self.table.len(), "Transposition table full, clearing");
            self.table.clear();
        }
        self.table.insert(
            hash,
            TtEntry {
                depth,
                score,
                bound,
                best,
            },
        );
    }

    fn principal_variation(&self, board: &Board, depth: u8) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut board = board.clone();
        for _ in 0..depth.max(1) {
            let Some(mv) = self.table.get(&board.hash()).and_then(|entry| entry.best) else {
                break;
            };
            if !board.is_legal(mv) {
                break;
            }
            board.play_unchecked(mv);
            pv.push(mv);
        }
        pv
    }
}

fn is_capture(board: &Board, mv: Move) -> bool {
    board.colors(!board.side_to_move()).has(mv.to)
}

/// Legal moves, hash move first, then captures by MVV-LVA, then quiet moves.
fn ordered_moves(board: &Board, tt_move: Option<Move>) -> Vec<Move> {
    let mut moves = chess::legal_moves(board);
    moves.sort_by_cached_key(|&mv| {
        if Some(mv) == tt_move {
            return i32::MIN;
        }
        let victim = if is_capture(board, mv) {
            board.piece_on(mv.to).map(piece_value).unwrap_or(0)
        } else {
            0
        };
        let attacker = board.piece_on(mv.from).map(piece_value).unwrap_or(0);
        let promotion = mv.promotion.map(piece_value).unwrap_or(0);
        if victim > 0 {
            -(victim * 10 - attacker / 10) - promotion
        } else {
            -promotion
        }
    });
    moves
}
