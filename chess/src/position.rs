use cozy_chess::{Board, Color, GameStatus, Move};

use crate::fen::{format_fen, parse_fen, FenError};
use crate::uci::{legal_moves, parse_legal_move};

/// A position set up from a start FEN plus the moves played from it.
#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
    start_fen: String,
    moves: Vec<Move>,
    chess960: bool,
}

impl Position {
    /// Create a position from a FEN string
    pub fn from_fen(fen: &str, chess960: bool) -> Result<Self, FenError> {
        let board = parse_fen(fen, chess960)?;
        Ok(Self {
            board,
            start_fen: fen.trim().to_string(),
            moves: Vec::new(),
            chess960,
        })
    }

    /// Apply UCI moves in order.
    ///
    /// Stops at the first move that does not parse or is illegal; the moves
    /// after it are ignored. Returns how many moves were applied.
    pub fn apply_uci_moves<S: AsRef<str>>(&mut self, moves: &[S]) -> usize {
        let mut applied = 0;
        for text in moves {
            match parse_legal_move(&self.board, text.as_ref(), self.chess960) {
                Ok(mv) => {
                    self.board.play_unchecked(mv);
                    self.moves.push(mv);
                    applied += 1;
                }
                Err(_) => break,
            }
        }
        applied
    }

    /// Get the current board position
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    /// Moves applied since the start FEN
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn is_chess960(&self) -> bool {
        self.chess960
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(&self.board)
    }

    pub fn status(&self) -> GameStatus {
        self.board.status()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        format_fen(&self.board, self.chess960)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self {
            board: Board::default(),
            start_fen: crate::variant::STANDARD_START_FEN.to_string(),
            moves: Vec::new(),
            chess960: false,
        }
    }
}
