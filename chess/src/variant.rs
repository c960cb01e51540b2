//! Variants the built-in engine can play.
//!
//! Every variant here is expressible with cozy-chess rules; it only differs in
//! its starting position. Names follow the UCI_Variant values used by
//! Fairy-Stockfish so hosts can switch engines without renaming.

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A named rule-set with its start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub name: &'static str,
    pub start_fen: &'static str,
}

const VARIANTS: &[Variant] = &[
    Variant {
        name: "chess",
        start_fen: STANDARD_START_FEN,
    },
    Variant {
        name: "nocastle",
        start_fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1",
    },
];

/// Look up a variant by name (case-insensitive).
pub fn find_variant(name: &str) -> Option<&'static Variant> {
    VARIANTS
        .iter()
        .find(|variant| variant.name.eq_ignore_ascii_case(name.trim()))
}

pub fn variant_names() -> impl Iterator<Item = &'static str> {
    VARIANTS.iter().map(|variant| variant.name)
}
