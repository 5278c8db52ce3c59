//! Core data models used throughout Authority Enrich.
//!
//! These types represent the manifest entries, per-source fact sets, and
//! merged person records that flow through the enrichment pipeline.

use std::collections::BTreeSet;
use std::fmt;

/// Returns the last `/`-separated segment of a URI, e.g. the Q-id of a
/// Wikidata URI or the GND id of a `d-nb.info` URI.
pub fn trailing_segment(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or(uri)
}

/// One line of the person manifest: the internal document id joined to
/// the external references a person may be enriched from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestEntry {
    pub document_id: String,
    /// Wikidata entity URI (`https://www.wikidata.org/wiki/Q…`).
    pub wikidata: Option<String>,
    /// GND authority URI (`https://d-nb.info/gnd/…`).
    pub gnd: Option<String>,
}

impl ManifestEntry {
    pub fn new(document_id: &str, wikidata: Option<&str>, gnd: Option<&str>) -> Self {
        Self {
            document_id: document_id.to_string(),
            wikidata: wikidata.map(str::to_string),
            gnd: gnd.map(str::to_string),
        }
    }

    pub fn wikidata_id(&self) -> Option<&str> {
        self.wikidata.as_deref().map(trailing_segment)
    }

    pub fn gnd_id(&self) -> Option<&str> {
        self.gnd.as_deref().map(trailing_segment)
    }
}

/// Gender as reported by a knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Maps an English label (`"male"`, `"female"`) to a gender.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    /// Maps a GND `375$a` code (`"1"`, `"2"`) to a gender.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(Gender::Male),
            "2" => Some(Gender::Female),
            _ => None,
        }
    }

    /// Display text used in the output document.
    pub fn text(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    /// Value of the `value` attribute in the output document.
    pub fn value(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

/// A date with possibly-unknown trailing components: `YYYY`, `YYYY-MM`,
/// or `YYYY-MM-DD`.
///
/// Only constructed through [`crate::date`], which guarantees that no
/// unknown-marker component survives.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PartialDate(String);

impl PartialDate {
    pub(crate) fn from_canonical(s: String) -> Self {
        PartialDate(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An occupation label together with the URI it was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupation {
    pub label: String,
    pub reference_uri: String,
}

impl Occupation {
    pub fn new(label: &str, reference_uri: &str) -> Self {
        Self {
            label: label.to_string(),
            reference_uri: reference_uri.to_string(),
        }
    }
}

/// Normalized view of one person's attributes as reported by one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactSet {
    pub gender: Option<Gender>,
    pub birth: Option<PartialDate>,
    pub death: Option<PartialDate>,
    pub name_variants: BTreeSet<String>,
    pub occupations: Vec<Occupation>,
}

impl FactSet {
    /// True when the source contributed nothing.
    pub fn is_empty(&self) -> bool {
        self.gender.is_none()
            && self.birth.is_none()
            && self.death.is_none()
            && self.name_variants.is_empty()
            && self.occupations.is_empty()
    }
}

/// The merge result for one person, ready to be projected into markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedPerson {
    pub gender: Option<Gender>,
    pub birth: Option<PartialDate>,
    pub death: Option<PartialDate>,
    pub name_variants: BTreeSet<String>,
    pub occupations: Vec<Occupation>,
    pub wikidata_uri: Option<String>,
    pub authority_uri: Option<String>,
}

impl EnrichedPerson {
    /// True when no enrichment field and no provenance pointer is set.
    pub fn is_bare(&self) -> bool {
        self.gender.is_none()
            && self.birth.is_none()
            && self.death.is_none()
            && self.name_variants.is_empty()
            && self.occupations.is_empty()
            && self.wikidata_uri.is_none()
            && self.authority_uri.is_none()
    }
}
