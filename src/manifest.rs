//! Manifest reading.
//!
//! Manifests are line-oriented, `|`-separated lists joining the `xml:id` of
//! an authority record to its external references:
//!
//! ```text
//! pers_0001 | https://www.wikidata.org/wiki/Q7186 | https://d-nb.info/gnd/118677896
//! pers_0002 | https://www.wikidata.org/wiki/Q1035
//! place_0001 | https://www.wikidata.org/wiki/Q64 | https://www.geonames.org/2950159/berlin.html
//! ```
//!
//! Trailing fields are optional and every field is whitespace-trimmed; an
//! empty field counts as absent. Blank lines are skipped. A document id that
//! appears twice keeps its last line.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use authority_enrich_core::models::ManifestEntry;

/// A manifest row for a place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceEntry {
    pub document_id: String,
    pub wikidata: Option<String>,
    /// GeoNames URI with the human-readable slug removed.
    pub geonames: Option<String>,
    pub geonames_id: Option<String>,
}

/// Read-only lookup table keyed by document id.
#[derive(Debug, Clone)]
pub struct Manifest<E> {
    entries: HashMap<String, E>,
}

impl<E> Default for Manifest<E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<E> Manifest<E> {
    fn insert(&mut self, id: String, entry: E) {
        self.entries.insert(id, entry);
    }

    pub fn get(&self, document_id: &str) -> Option<&E> {
        self.entries.get(document_id)
    }

    /// Look up an entry; a record without a manifest line is fatal.
    pub fn require(&self, document_id: &str) -> Result<&E> {
        self.get(document_id).ok_or_else(|| {
            anyhow::anyhow!("No manifest entry for document id '{}'", document_id)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type PersonManifest = Manifest<ManifestEntry>;
pub type PlaceManifest = Manifest<PlaceEntry>;

/// Split one manifest line into `(document_id, ref1, ref2)`.
fn split_line(line: &str) -> Option<(String, Option<String>, Option<String>)> {
    if line.trim().is_empty() {
        return None;
    }
    let mut fields = line.split('|').map(|f| f.trim());
    let document_id = fields.next().unwrap_or_default().to_string();
    let mut next_ref = || {
        fields
            .next()
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    };
    let first = next_ref();
    let second = next_ref();
    Some((document_id, first, second))
}

pub fn parse_person_manifest(text: &str) -> PersonManifest {
    let mut manifest = Manifest::default();
    for (document_id, wikidata, gnd) in text.lines().filter_map(split_line) {
        let entry = ManifestEntry {
            document_id: document_id.clone(),
            wikidata,
            gnd,
        };
        manifest.insert(document_id, entry);
    }
    manifest
}

pub fn parse_place_manifest(text: &str) -> PlaceManifest {
    let mut manifest = Manifest::default();
    for (document_id, wikidata, geonames_uri) in text.lines().filter_map(split_line) {
        let (geonames, geonames_id) = match geonames_uri.as_deref().map(split_geonames_uri) {
            Some((base, id)) => (Some(base), id),
            None => (None, None),
        };
        let entry = PlaceEntry {
            document_id: document_id.clone(),
            wikidata,
            geonames,
            geonames_id,
        };
        manifest.insert(document_id, entry);
    }
    manifest
}

/// Split `https://www.geonames.org/2950159/berlin.html` into the base URI
/// `https://www.geonames.org/2950159` and the id `2950159`.
fn split_geonames_uri(uri: &str) -> (String, Option<String>) {
    let trimmed = uri.trim_end_matches('/');
    let is_numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    let (base, last) = match trimmed.rsplit_once('/') {
        Some(split) => split,
        None => return (trimmed.to_string(), None),
    };
    if is_numeric(last) {
        return (trimmed.to_string(), Some(last.to_string()));
    }
    let id = base.rsplit('/').next().filter(|s| is_numeric(s));
    (base.to_string(), id.map(str::to_string))
}

pub fn load_person_manifest(path: &Path) -> Result<PersonManifest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read person manifest: {}", path.display()))?;
    Ok(parse_person_manifest(&text))
}

pub fn load_place_manifest(path: &Path) -> Result<PlaceManifest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read place manifest: {}", path.display()))?;
    Ok(parse_place_manifest(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_lines_with_optional_fields() {
        let text = "\
pers_0001 | https://www.wikidata.org/wiki/Q7186 | https://d-nb.info/gnd/118677896
pers_0002|https://www.wikidata.org/wiki/Q1035

pers_0003
pers_0004 |  | https://d-nb.info/gnd/118540238
";
        let manifest = parse_person_manifest(text);
        assert_eq!(manifest.len(), 4);

        let p1 = manifest.get("pers_0001").unwrap();
        assert_eq!(p1.wikidata_id(), Some("Q7186"));
        assert_eq!(p1.gnd_id(), Some("118677896"));

        let p2 = manifest.get("pers_0002").unwrap();
        assert_eq!(p2.wikidata_id(), Some("Q1035"));
        assert!(p2.gnd.is_none());

        let p3 = manifest.get("pers_0003").unwrap();
        assert!(p3.wikidata.is_none() && p3.gnd.is_none());

        let p4 = manifest.get("pers_0004").unwrap();
        assert!(p4.wikidata.is_none());
        assert_eq!(p4.gnd_id(), Some("118540238"));
    }

    #[test]
    fn repeated_id_keeps_last_line() {
        let manifest = parse_person_manifest(
            "pers_0001 | https://www.wikidata.org/wiki/Q1\npers_0001 | https://www.wikidata.org/wiki/Q2\n",
        );
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("pers_0001").unwrap().wikidata_id(), Some("Q2"));
    }

    #[test]
    fn missing_entry_is_an_error() {
        let manifest = parse_person_manifest("pers_0001|\n");
        let err = manifest.require("pers_9999").unwrap_err();
        assert!(err.to_string().contains("pers_9999"));
    }

    #[test]
    fn place_geonames_uri_is_split() {
        let manifest = parse_place_manifest(
            "place_0001 | https://www.wikidata.org/wiki/Q64 | https://www.geonames.org/2950159/berlin.html\n\
             place_0002 | https://www.wikidata.org/wiki/Q1055 | https://sws.geonames.org/2911298/\n\
             place_0003 | https://www.wikidata.org/wiki/Q90\n",
        );
        let berlin = manifest.get("place_0001").unwrap();
        assert_eq!(
            berlin.geonames.as_deref(),
            Some("https://www.geonames.org/2950159")
        );
        assert_eq!(berlin.geonames_id.as_deref(), Some("2950159"));

        let hamburg = manifest.get("place_0002").unwrap();
        assert_eq!(
            hamburg.geonames.as_deref(),
            Some("https://sws.geonames.org/2911298")
        );
        assert_eq!(hamburg.geonames_id.as_deref(), Some("2911298"));

        let paris = manifest.get("place_0003").unwrap();
        assert!(paris.geonames.is_none() && paris.geonames_id.is_none());
    }
}
