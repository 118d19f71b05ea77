//! Typed records built from Semantic Scholar API responses.
//!
//! Records are built by [`crate::normalize`] and never mutated afterwards.
//! They derive serde with camelCase names so caches can store them as JSON.

mod author;
mod paper;

pub use author::Author;
pub use paper::{Candidate, EPOCH_DATE, Paper, Reference};
