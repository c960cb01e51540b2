pub mod fen;
pub mod position;
pub mod uci;
pub mod variant;

pub use fen::{format_fen, parse_fen, FenError};
pub use position::Position;
pub use uci::{
    convert_uci_castling_to_cozy, format_move, format_uci_move, legal_moves, parse_legal_move,
    parse_uci_move, MoveError,
};
pub use variant::{find_variant, variant_names, Variant, STANDARD_START_FEN};
