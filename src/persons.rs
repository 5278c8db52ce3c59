//! Persons pass.
//!
//! Walks every `person` of the authority list in document order, enriches
//! it from Wikidata and the GND, and appends it to the `listPerson` of the
//! persons template:
//!
//! 1. `persName` is marked `type="main"`, the first `note` `type="bio"`.
//! 2. The manifest entry for the record's `xml:id` is looked up; a record
//!    without one aborts the pass.
//! 3. Wikidata is asked iff the entry carries a Wikidata reference, the GND
//!    iff it carries a GND reference, in that order.
//! 4. The fact sets are merged and the result appended to the record.
//!
//! The output file is written once, after every record succeeded.

use anyhow::{bail, Context, Result};

use authority_enrich_core::merge::PersonMerge;
use authority_enrich_core::models::{EnrichedPerson, ManifestEntry};
use authority_enrich_core::source::FactSource;

use crate::builder::append_person;
use crate::config::Config;
use crate::document::Document;
use crate::gnd::{GndSource, SruClient};
use crate::http::build_client;
use crate::manifest::{load_person_manifest, PersonManifest};
use crate::pass::{append_to_list, load_template, PassSummary};
use crate::progress::{EnrichProgressEvent, EnrichProgressReporter};
use crate::wikidata::{WikidataClient, WikidataSource};

const PASS: &str = "persons";

/// The knowledge bases a person is enriched from, in precedence order.
pub struct PersonSources<'a> {
    pub wikidata: &'a dyn FactSource,
    pub gnd: &'a dyn FactSource,
}

/// Query the sources the manifest entry references and merge their facts.
///
/// Returns the merged record and the number of lookups made.
pub fn enrich_person(
    entry: &ManifestEntry,
    display_name: &str,
    sources: &PersonSources<'_>,
    reporter: &dyn EnrichProgressReporter,
) -> Result<(EnrichedPerson, u64)> {
    let mut merge = PersonMerge::new();

    let lookups = [
        (sources.wikidata, entry.wikidata_id()),
        (sources.gnd, entry.gnd_id()),
    ];
    for (source, id) in lookups {
        let Some(id) = id else { continue };
        reporter.report(EnrichProgressEvent::Lookup {
            pass: PASS,
            source: source.name().to_string(),
            id: id.to_string(),
        });
        let facts = source.facts(id).with_context(|| {
            format!(
                "{} lookup of '{}' failed for {}",
                source.name(),
                id,
                entry.document_id
            )
        })?;
        tracing::debug!(source = source.name(), id, empty = facts.is_empty(), "facts");
        merge.absorb(facts);
    }

    let lookups = merge.source_count() as u64;
    Ok((merge.finish(entry, display_name), lookups))
}

/// Enrich every `person` of `authority` into the `listPerson` of `output`.
pub fn enrich_persons(
    authority: &Document,
    manifest: &PersonManifest,
    output: &mut Document,
    sources: &PersonSources<'_>,
    reporter: &dyn EnrichProgressReporter,
) -> Result<PassSummary> {
    let people = authority.root.descendants("person");
    let total = people.len() as u64;
    let mut summary = PassSummary::default();
    let mut enriched = Vec::with_capacity(people.len());

    for (i, person) in people.into_iter().enumerate() {
        let mut person = person.clone();
        let Some(id) = person.attr("xml:id").map(str::to_string) else {
            bail!("person element #{} has no xml:id", i + 1);
        };

        let display_name = match person.first_child_mut("persName") {
            Some(name) => {
                name.set_attr("type", "main");
                name.normalized_text()
            }
            None => {
                tracing::warn!(id = %id, "person without persName");
                String::new()
            }
        };
        if let Some(note) = person.first_child_mut("note") {
            note.set_attr("type", "bio");
        }

        reporter.report(EnrichProgressEvent::Processing {
            pass: PASS,
            id: id.clone(),
            label: display_name.clone(),
            n: i as u64 + 1,
            total,
        });

        let entry = manifest.require(&id)?;
        let (record, lookups) = enrich_person(entry, &display_name, sources, reporter)?;
        summary.lookups += lookups;
        if !record.is_bare() {
            summary.enriched += 1;
        }
        append_person(&mut person, &record);
        enriched.push(person);
        summary.processed += 1;
    }

    append_to_list(output, "listPerson", enriched)?;
    Ok(summary)
}

/// `enrich persons`: read inputs, enrich, write `persons.xml`.
pub fn run_persons(config: &Config, reporter: &dyn EnrichProgressReporter) -> Result<PassSummary> {
    let authority = Document::read(&config.input.authority_list)?;
    let manifest = load_person_manifest(&config.input.persons_manifest)?;
    let mut output = load_template(config.templates.persons.as_deref(), "listPerson")?;

    let http = build_client(&config.http)?;
    let wikidata = WikidataSource::new(WikidataClient::new(http.clone(), config.wikidata.clone()));
    let gnd = GndSource::new(SruClient::new(http, config.gnd.clone()));
    let sources = PersonSources {
        wikidata: &wikidata,
        gnd: &gnd,
    };

    let mut summary = enrich_persons(&authority, &manifest, &mut output, &sources, reporter)?;

    summary.output = config.output.persons_path();
    output.write(&summary.output)?;
    tracing::info!(processed = summary.processed, "persons written");
    Ok(summary)
}
