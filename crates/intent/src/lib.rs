//! Rule-based intent parsing and state scoring.
//!
//! Free text goes in; a [`ParsedIntent`] (verb class, subject, theme,
//! emotions, scored state candidates) comes out. All rules are data: the
//! lexicon pack declares keywords, the state library declares indicator
//! weights, and declaration order is the documented tie-break everywhere.

mod error;
mod lexicon;
mod parser;
mod scorer;

pub use error::{IntentError, Result};
pub use lexicon::{EmotionRule, Lexicon, SubjectMarkers, ThemeRule, VerbClassRule, LEXICON_SCHEMA_VERSION};
pub use parser::{IntentParser, ParsedIntent, StateCandidate, Subject, Theme};
pub use scorer::score_state;
