//! Fact source abstraction.
//!
//! The [`FactSource`] trait is the seam between the merge engine and the
//! knowledge-base adapters. The batch driver holds one source per external
//! reference kind and calls [`FactSource::facts`] only when the manifest
//! carries an identifier for that source.
//!
//! Lookups are synchronous: one person is processed at a time and every
//! lookup sits on the critical path of that person.

use anyhow::Result;

use crate::models::FactSet;

/// A knowledge base that can describe a person by identifier.
///
/// # Contract
///
/// - An identifier the source does not know yields `Ok(FactSet::default())`.
/// - Transport and service failures yield `Err` and abort the batch.
pub trait FactSource {
    /// Short source label used in progress output (e.g. `"wikidata"`).
    fn name(&self) -> &str;

    /// Fetch and normalize the facts recorded for `id`.
    fn facts(&self, id: &str) -> Result<FactSet>;
}
