//! Shared utilities: source spans and grammar-text helpers.

pub mod names;
pub mod span;
