use crate::corpus::SacredCorpus;
use serde::Serialize;

/// A verse reference carried as supporting context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextVerse {
    pub id: String,
    pub text: String,
}

/// A verse with its immediate neighbors in corpus sequence order.
#[derive(Debug, Clone, Serialize)]
pub struct SutraContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<ContextVerse>,
    pub primary: ContextVerse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<ContextVerse>,
}

fn verse(id: &str, text: &str) -> ContextVerse {
    ContextVerse {
        id: id.to_string(),
        text: text.trim().to_string(),
    }
}

impl SacredCorpus {
    /// Resolves a sutra id to itself plus its sequence neighbors.
    ///
    /// Unknown ids resolve to `None`; callers treat that as "no context
    /// available", not as a failure.
    #[must_use]
    pub fn resolve_sutra_context(&self, sutra_id: &str) -> Option<SutraContext> {
        let (prev, primary, next) = self.neighbors(sutra_id)?;
        Some(SutraContext {
            prev: prev.map(|e| verse(&e.id, &e.text)),
            primary: verse(&primary.id, &primary.text),
            next: next.map(|e| verse(&e.id, &e.text)),
        })
    }

    /// Whether the verse needs its predecessor attached.
    ///
    /// Purely positional: everything but the first verse of a corpus opens
    /// mid-argument ("therefore", "thus") and reads wrong without it.
    #[must_use]
    pub fn should_include_prev_context(&self, sutra_id: &str) -> bool {
        matches!(self.corpus_position(sutra_id), Some((position, _)) if position > 0)
    }
}
