//! Protocol model: the JSON-serializable output of the walker.
//!
//! Nodes serialize with a `_type` discriminator so the output matches the
//! wire format consumed downstream.

pub mod domain;
pub mod value;
