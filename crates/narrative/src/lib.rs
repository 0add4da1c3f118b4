//! AI narrative expansion over finalized Truth Packages.
//!
//! The gateway never fails and never blocks on anything but the single
//! outbound connector call: no connector, a dead network, or a malformed
//! response all degrade to the same deterministic summary built from the
//! package itself. Connector output is additive narration only — the
//! structured package fields are never re-parsed from it.

mod connector;
mod fallback;
mod gateway;

pub use connector::{HttpConnector, NarrativeConnector, NarrativeError, NarrativeRequest};
pub use fallback::fallback_summary;
pub use gateway::{NarrativeExpansion, NarrativeGateway, NarrativeSection};
