use cozy_chess::Board;

/// Parse a FEN string into a Board.
///
/// Positions that omit the halfmove clock and fullmove number (four fields)
/// are accepted and completed with `0 1`. With `chess960` set, castling
/// rights are read in Shredder notation.
pub fn parse_fen(fen: &str, chess960: bool) -> Result<Board, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.is_empty() {
        return Err(FenError::Empty);
    }

    let normalized = match parts.len() {
        4 => format!("{} 0 1", parts.join(" ")),
        6 => parts.join(" "),
        n => return Err(FenError::FieldCount(n)),
    };

    Board::from_fen(&normalized, chess960).map_err(|_| FenError::InvalidFormat(normalized))
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board, chess960: bool) -> String {
    if chess960 {
        format!("{:#}", board)
    } else {
        board.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Empty FEN")]
    Empty,
    #[error("Expected 4 or 6 FEN fields, found {0}")]
    FieldCount(usize),
    #[error("Invalid FEN format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::STANDARD_START_FEN;

    #[test]
    fn test_parse_start_position() {
        let board = parse_fen(STANDARD_START_FEN, false).unwrap();
        assert_eq!(board.hash(), Board::default().hash());
    }

    #[test]
    fn test_parse_without_move_counters() {
        let board = parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -", false).unwrap();
        assert_eq!(board.hash(), Board::default().hash());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_fen("   ", false), Err(FenError::Empty)));
        assert!(matches!(parse_fen("not a fen", false), Err(FenError::FieldCount(3))));
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1", false),
            Err(FenError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_format_round_trips_start_position() {
        let board = Board::default();
        assert_eq!(format_fen(&board, false), STANDARD_START_FEN);
    }
}
