use cozy_chess::{Board, Color, Piece, Square};

pub const PIECE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 0];

const PAWN_ADVANCE: i32 = 6;
const CENTRE_WEIGHT: [i32; 6] = [2, 8, 6, 2, 2, 0];

/// Static evaluation in centipawns from the side to move's perspective.
pub fn evaluate(board: &Board) -> i32 {
    let white = side_score(board, Color::White);
    let black = side_score(board, Color::Black);
    match board.side_to_move() {
        Color::White => white - black,
        Color::Black => black - white,
    }
}

pub fn piece_value(piece: Piece) -> i32 {
    PIECE_VALUES[piece as usize]
}

fn side_score(board: &Board, color: Color) -> i32 {
    let mut score = 0;
    for &piece in &Piece::ALL {
        for square in board.colored_pieces(color, piece) {
            score += piece_value(piece);
            score += CENTRE_WEIGHT[piece as usize] * centrality(square);
            if piece == Piece::Pawn {
                score += PAWN_ADVANCE * advancement(square, color);
            }
        }
    }
    score
}

/// 0 on the rim, 3 on the four centre squares
fn centrality(square: Square) -> i32 {
    let file = square.file() as i32;
    let rank = square.rank() as i32;
    let file_dist = (2 * file - 7).abs() / 2;
    let rank_dist = (2 * rank - 7).abs() / 2;
    3 - file_dist.max(rank_dist)
}

fn advancement(square: Square, color: Color) -> i32 {
    let rank = square.rank() as i32;
    match color {
        Color::White => rank - 1,
        Color::Black => 6 - rank,
    }
}
