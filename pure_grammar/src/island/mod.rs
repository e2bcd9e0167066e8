//! Independently lexed/parsed island sub-grammars.
//!
//! Island content is re-lexed from scratch with a coordinate base rebased to
//! the island's location in the host document, so every error points at the
//! original file.

pub mod graph_fetch;
pub mod lexer;
pub mod navigation;
pub mod primitive;
