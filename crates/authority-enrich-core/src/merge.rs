//! Multi-source merge engine for persons.
//!
//! Fact sets arrive in precedence order (Wikidata first, GND second) and are
//! folded into one [`EnrichedPerson`]:
//!
//! | Field | Policy |
//! |-------|--------|
//! | `gender`, `birth`, `death` | first writer wins |
//! | `name_variants` | set union, canonical name removed on finish |
//! | `occupations` | concatenation in precedence order, no dedup |
//! | `wikidata_uri`, `authority_uri` | copied from the manifest entry |
//!
//! A field is never cleared once set; an empty fact set contributes nothing.
//!
//! # Example
//!
//! ```rust
//! use authority_enrich_core::merge::merge_person;
//! use authority_enrich_core::models::{FactSet, ManifestEntry};
//!
//! let entry = ManifestEntry::new("p1", None, None);
//! let person = merge_person(&entry, "Ada Lovelace", Vec::<FactSet>::new());
//! assert!(person.is_bare());
//! ```

use std::collections::BTreeSet;

use crate::models::{EnrichedPerson, FactSet, Gender, ManifestEntry, Occupation, PartialDate};

/// Accumulates fact sets for one person.
#[derive(Debug, Default)]
pub struct PersonMerge {
    gender: Option<Gender>,
    birth: Option<PartialDate>,
    death: Option<PartialDate>,
    name_variants: BTreeSet<String>,
    occupations: Vec<Occupation>,
    sources: usize,
}

impl PersonMerge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the next source's facts. Call in precedence order.
    pub fn absorb(&mut self, facts: FactSet) {
        self.sources += 1;

        if self.gender.is_none() {
            self.gender = facts.gender;
        }
        if self.birth.is_none() {
            self.birth = facts.birth;
        }
        if self.death.is_none() {
            self.death = facts.death;
        }

        self.name_variants.extend(facts.name_variants);
        self.occupations.extend(facts.occupations);
    }

    /// Number of fact sets absorbed so far.
    pub fn source_count(&self) -> usize {
        self.sources
    }

    /// Produce the merged record.
    ///
    /// `display_name` is the person's canonical name in the authority
    /// document; it never appears among the returned variants.
    pub fn finish(self, entry: &ManifestEntry, display_name: &str) -> EnrichedPerson {
        let mut name_variants = self.name_variants;
        name_variants.remove(display_name);
        name_variants.remove(display_name.trim());

        EnrichedPerson {
            gender: self.gender,
            birth: self.birth,
            death: self.death,
            name_variants,
            occupations: self.occupations,
            wikidata_uri: entry.wikidata.clone(),
            authority_uri: entry.gnd.clone(),
        }
    }
}

/// Merge fact sets given in precedence order into one person record.
pub fn merge_person<I>(entry: &ManifestEntry, display_name: &str, sources: I) -> EnrichedPerson
where
    I: IntoIterator<Item = FactSet>,
{
    let mut merge = PersonMerge::new();
    for facts in sources {
        merge.absorb(facts);
    }
    merge.finish(entry, display_name)
}
