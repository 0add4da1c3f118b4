//! Truth Package composition.
//!
//! The composer wires corpus, intent, and selection into one deterministic
//! pipeline: resolve a state, pick a sacred text that avoids recent repeats,
//! attach the state's remedy bundle, and (in personal mode) a name/birth
//! insight. Fixing the inputs fixes the output.

mod compose;
mod insight;
mod model;

pub use compose::{ComposeError, Composer, Result};
pub use model::{
    ComposeOptions, Diagnosis, Mode, PackageMeta, Profile, SacredSection, TruthPackage,
};
