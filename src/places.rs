//! Places pass.
//!
//! Copies every `place` of the authority list into the `listPlace` of the
//! places template, adding:
//!
//! - `type="main"` on the existing `placeName` and a `type="sort"` copy right
//!   after it,
//! - `country`, `region` and `location/geo` from GeoNames when the manifest
//!   carries a GeoNames id,
//! - `ptr type="geonames"` and `ptr type="wikidata"` for the manifest
//!   references.

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::document::{Document, Element, Node};
use crate::geonames::{GeoNamesApi, GeoNamesClient, GeoNamesPlace};
use crate::http::build_client;
use crate::manifest::{load_place_manifest, PlaceEntry, PlaceManifest};
use crate::pass::{append_to_list, load_template, PassSummary};
use crate::progress::{EnrichProgressEvent, EnrichProgressReporter};

const PASS: &str = "places";

/// Add the GeoNames and Wikidata details to one `place` element.
pub fn enrich_place(place: &mut Element, entry: &PlaceEntry, details: Option<&GeoNamesPlace>) {
    if let Some(details) = details {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        if let Some(country) = non_empty(&details.country_name) {
            place.push(Element::new("country").with_text(&country));
        }
        if let Some(region) = non_empty(&details.admin_name1) {
            place.push(Element::new("region").with_text(&region));
        }
        if let Some(geo) = details.geo() {
            fill_geo(place, &geo);
        }
    }

    if let Some(geonames) = &entry.geonames {
        if entry.geonames_id.is_some() {
            place.push(
                Element::new("ptr")
                    .with_attr("type", "geonames")
                    .with_attr("target", geonames),
            );
        }
    }
    if let Some(wikidata) = &entry.wikidata {
        place.push(
            Element::new("ptr")
                .with_attr("type", "wikidata")
                .with_attr("target", wikidata),
        );
    }
}

/// Write coordinates into `location/geo` unless it already holds some.
fn fill_geo(place: &mut Element, geo: &str) {
    if place.first_child("location").is_none() {
        place.push(Element::new("location"));
    }
    let Some(location) = place.first_child_mut("location") else {
        return;
    };
    if location.first_child("geo").is_none() {
        location.push(Element::new("geo"));
    }
    if let Some(el) = location.first_child_mut("geo") {
        if el.text_content().trim().is_empty() {
            el.set_text(geo);
        }
    }
}

/// Mark the main name and add its sort copy directly after it.
fn add_sort_name(place: &mut Element) -> String {
    let Some(pos) = place.child_position("placeName") else {
        return String::new();
    };
    let Node::Element(main) = &mut place.children[pos] else {
        return String::new();
    };
    main.set_attr("type", "main");
    let name = main.normalized_text();
    let sort = Element::new(&main.name)
        .with_attr("type", "sort")
        .with_text(&name);
    place.insert(pos + 1, sort);
    name
}

/// Enrich every `place` of `authority` into the `listPlace` of `output`.
pub fn enrich_places(
    authority: &Document,
    manifest: &PlaceManifest,
    output: &mut Document,
    geonames: Option<&dyn GeoNamesApi>,
    reporter: &dyn EnrichProgressReporter,
) -> Result<PassSummary> {
    let places = authority.root.descendants("place");
    let total = places.len() as u64;
    let mut summary = PassSummary::default();
    let mut enriched = Vec::with_capacity(places.len());

    for (i, place) in places.into_iter().enumerate() {
        let mut place = place.clone();
        let Some(id) = place.attr("xml:id").map(str::to_string) else {
            bail!("place element #{} has no xml:id", i + 1);
        };
        let name = add_sort_name(&mut place);

        reporter.report(EnrichProgressEvent::Processing {
            pass: PASS,
            id: id.clone(),
            label: name,
            n: i as u64 + 1,
            total,
        });

        let entry = manifest.require(&id)?;
        let details = match (&entry.geonames_id, geonames) {
            (Some(geoname_id), Some(client)) => {
                reporter.report(EnrichProgressEvent::Lookup {
                    pass: PASS,
                    source: "geonames".to_string(),
                    id: geoname_id.clone(),
                });
                summary.lookups += 1;
                client.place(geoname_id).with_context(|| {
                    format!("geonames lookup of '{}' failed for {}", geoname_id, id)
                })?
            }
            (Some(_), None) => bail!(
                "place {} has a GeoNames id but geonames.username is not configured",
                id
            ),
            (None, _) => None,
        };

        if details.is_some() || entry.wikidata.is_some() || entry.geonames_id.is_some() {
            summary.enriched += 1;
        }
        enrich_place(&mut place, entry, details.as_ref());
        enriched.push(place);
        summary.processed += 1;
    }

    append_to_list(output, "listPlace", enriched)?;
    Ok(summary)
}

/// `enrich places`: read inputs, enrich, write `places.xml`.
pub fn run_places(config: &Config, reporter: &dyn EnrichProgressReporter) -> Result<PassSummary> {
    let authority = Document::read(&config.input.authority_list)?;
    let manifest = load_place_manifest(&config.input.places_manifest)?;
    let mut output = load_template(config.templates.places.as_deref(), "listPlace")?;

    let client = match &config.geonames.username {
        Some(_) => Some(GeoNamesClient::new(build_client(&config.http)?, &config.geonames)?),
        None => None,
    };
    let geonames = client.as_ref().map(|c| c as &dyn GeoNamesApi);

    let mut summary = enrich_places(&authority, &manifest, &mut output, geonames, reporter)?;

    summary.output = config.output.places_path();
    output.write(&summary.output)?;
    tracing::info!(processed = summary.processed, "places written");
    Ok(summary)
}
