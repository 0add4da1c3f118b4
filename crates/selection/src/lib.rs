//! Deterministic sacred-text selection.
//!
//! A seeded call always returns the same entry for the same filters and
//! avoid list; constraints relax progressively (filters first, then the
//! avoid list) so a non-empty corpus always yields a result.

mod selector;

pub use selector::{select_sacred_text, SelectOptions, SelectionError, Result};
