//! Plumbing shared by the enrichment passes: output templates and the
//! summary printed on stdout once a pass has written its file.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::document::{Document, Element};

/// Load the output template for a pass, or a bare TEI skeleton when none
/// is configured. The template must contain a `list` element.
pub fn load_template(path: Option<&Path>, list: &str) -> Result<Document> {
    let doc = match path {
        Some(path) => Document::read(path)?,
        None => Document::tei_skeleton(list),
    };
    if doc.root.descendants(list).is_empty() && doc.root.local_name() != list {
        match path {
            Some(path) => bail!("Template {} has no <{}> element", path.display(), list),
            None => bail!("Output document has no <{}> element", list),
        }
    }
    Ok(doc)
}

/// Append `records` to the first `list` element of `doc`.
pub fn append_to_list(doc: &mut Document, list: &str, records: Vec<Element>) -> Result<()> {
    let Some(target) = doc.root.find_mut(list) else {
        bail!("Output document has no <{}> element", list);
    };
    for record in records {
        target.push(record);
    }
    Ok(())
}

/// Counters reported at the end of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub processed: u64,
    pub enriched: u64,
    pub lookups: u64,
    pub output: PathBuf,
}

impl PassSummary {
    pub fn print(&self, pass: &str) {
        println!("{}", pass);
        println!("  processed: {}", self.processed);
        println!("  enriched: {}", self.enriched);
        println!("  lookups: {}", self.lookups);
        println!("  output: {}", self.output.display());
        println!("ok");
    }
}
