//! UCI (Universal Chess Interface) move notation

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
    #[error("Illegal move: {0}")]
    IllegalMove(String),
}

/// Parse UCI move text (e2e4, e7e8q) without checking legality.
pub fn parse_uci_move(s: &str) -> Result<Move, MoveError> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return Err(MoveError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = if s.len() == 5 {
        Some(match &s[4..5] {
            "q" => Piece::Queen,
            "r" => Piece::Rook,
            "b" => Piece::Bishop,
            "n" => Piece::Knight,
            _ => return Err(MoveError::InvalidPromotion(s.to_string())),
        })
    } else {
        None
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Parse UCI move text and resolve it against the legal moves of `board`.
///
/// Standard castling notation (king moves two squares) is converted to the
/// king-takes-rook form cozy-chess uses. In Chess960 mode the text is already
/// king-takes-rook.
pub fn parse_legal_move(board: &Board, s: &str, chess960: bool) -> Result<Move, MoveError> {
    let mv = parse_uci_move(s)?;
    let legal = legal_moves(board);
    let mv = if chess960 {
        mv
    } else {
        convert_uci_castling_to_cozy(mv, &legal)
    };

    if legal.contains(&mv) {
        Ok(mv)
    } else {
        Err(MoveError::IllegalMove(s.to_string()))
    }
}

/// All legal moves of a position.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_rank_1_or_8 && is_e_file && is_g_or_c_file && mv.promotion.is_none() {
        let target_square = match (mv.from.rank(), mv.to.file()) {
            (Rank::First, File::G) => Square::new(File::H, Rank::First),
            (Rank::First, File::C) => Square::new(File::A, Rank::First),
            (Rank::Eighth, File::G) => Square::new(File::H, Rank::Eighth),
            (Rank::Eighth, File::C) => Square::new(File::A, Rank::Eighth),
            _ => return mv,
        };

        let converted = Move {
            from: mv.from,
            to: target_square,
            promotion: None,
        };

        // A real king step to g1/c1 stays as is
        if legal_moves.contains(&converted) && !legal_moves.contains(&mv) {
            return converted;
        }
    }

    mv
}

/// Format a move in UCI notation for the position it is played from.
///
/// Outside Chess960, king-takes-rook castling is rendered as the two-square
/// king move (e1h1 → e1g1).
pub fn format_move(board: &Board, mv: Move, chess960: bool) -> String {
    let is_castle = board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move());

    if is_castle && !chess960 {
        let file = if mv.to.file() as u8 > mv.from.file() as u8 {
            File::G
        } else {
            File::C
        };
        let to = Square::new(file, mv.from.rank());
        return format_uci_move(Move {
            from: mv.from,
            to,
            promotion: None,
        });
    }

    format_uci_move(mv)
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

fn parse_square(s: &str) -> Result<Square, MoveError> {
    let mut chars = s.chars();
    let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(MoveError::InvalidSquare(s.to_string()));
    };

    let file = match file {
        'a' => File::A,
        'b' => File::B,
        'c' => File::C,
        'd' => File::D,
        'e' => File::E,
        'f' => File::F,
        'g' => File::G,
        'h' => File::H,
        _ => return Err(MoveError::InvalidSquare(s.to_string())),
    };

    let rank = match rank {
        '1' => Rank::First,
        '2' => Rank::Second,
        '3' => Rank::Third,
        '4' => Rank::Fourth,
        '5' => Rank::Fifth,
        '6' => Rank::Sixth,
        '7' => Rank::Seventh,
        '8' => Rank::Eighth,
        _ => return Err(MoveError::InvalidSquare(s.to_string())),
    };

    Ok(Square::new(file, rank))
}

fn format_square(sq: Square) -> String {
    let file = match sq.file() {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    };
    let rank = match sq.rank() {
        Rank::First => '1',
        Rank::Second => '2',
        Rank::Third => '3',
        Rank::Fourth => '4',
        Rank::Fifth => '5',
        Rank::Sixth => '6',
        Rank::Seventh => '7',
        Rank::Eighth => '8',
    };
    format!("{}{}", file, rank)
}

fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    const CASTLE_READY: &str = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn test_format_uci_move() {
        let mv = Move {
            from: Square::new(File::E, Rank::Second),
            to: Square::new(File::E, Rank::Fourth),
            promotion: None,
        };
        assert_eq!(format_uci_move(mv), "e2e4");
    }

    #[test]
    fn test_format_uci_move_with_promotion() {
        let mv = Move {
            from: Square::new(File::E, Rank::Seventh),
            to: Square::new(File::E, Rank::Eighth),
            promotion: Some(Piece::Queen),
        };
        assert_eq!(format_uci_move(mv), "e7e8q");
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        assert!(matches!(parse_uci_move("e2"), Err(MoveError::InvalidMove(_))));
        assert!(matches!(parse_uci_move("i2e4"), Err(MoveError::InvalidSquare(_))));
        assert!(matches!(parse_uci_move("e7e8k"), Err(MoveError::InvalidPromotion(_))));
        assert!(matches!(parse_uci_move("e2e4e5"), Err(MoveError::InvalidMove(_))));
    }

    #[test]
    fn test_parse_legal_move_checks_legality() {
        let board = Board::default();
        assert!(parse_legal_move(&board, "e2e4", false).is_ok());
        assert!(matches!(
            parse_legal_move(&board, "e2e5", false),
            Err(MoveError::IllegalMove(_))
        ));
    }

    #[test]
    fn test_castling_round_trip() {
        let board = parse_fen(CASTLE_READY, false).unwrap();
        let short = parse_legal_move(&board, "e1g1", false).unwrap();
        assert_eq!(short.to, Square::new(File::H, Rank::First));
        assert_eq!(format_move(&board, short, false), "e1g1");

        let long = parse_legal_move(&board, "e1c1", false).unwrap();
        assert_eq!(long.to, Square::new(File::A, Rank::First));
        assert_eq!(format_move(&board, long, false), "e1c1");
    }

    #[test]
    fn test_chess960_keeps_king_takes_rook() {
        let board = parse_fen(CASTLE_READY, false).unwrap();
        let mv = parse_legal_move(&board, "e1h1", true).unwrap();
        assert_eq!(format_move(&board, mv, true), "e1h1");
    }

    #[test]
    fn test_legal_moves_from_start() {
        assert_eq!(legal_moves(&Board::default()).len(), 20);
    }

    proptest::proptest! {
        #[test]
        fn prop_parse_never_panics(text in "\\PC{0,8}") {
            let board = Board::default();
            let _ = parse_uci_move(&text);
            let _ = parse_legal_move(&board, &text, false);
        }
    }
}
