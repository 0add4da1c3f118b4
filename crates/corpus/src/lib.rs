//! Static sacred-text corpus and remedy-state library for Darshan.
//!
//! Content is shipped as versioned JSON packs (`content/*.json`), compiled in
//! via `include_str!` and overridable from caller-supplied bytes. Everything
//! here is immutable after load and safe to share across requests.

mod context;
mod corpus;
mod entry;
mod error;
mod states;

pub use context::{ContextVerse, SutraContext};
pub use corpus::{SacredCorpus, CORPUS_SCHEMA_VERSION};
pub use entry::{SacredEntry, SourceCorpus};
pub use error::{CorpusError, Result};
pub use states::{
    ContemplativeQuestion, FoodGuidance, Practice, RemedyState, StateIndicators, StateLibrary,
    FALLBACK_STATE_KEY, STATES_SCHEMA_VERSION,
};
