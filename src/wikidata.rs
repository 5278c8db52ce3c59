//! Wikidata source adapter.
//!
//! Describes a person from their Wikidata entity:
//!
//! | Property | Field |
//! |----------|-------|
//! | `P21` sex or gender | `gender` (English label of the target: `male` / `female`) |
//! | `P569` date of birth | `birth` |
//! | `P570` date of death | `death` |
//! | labels + aliases, all languages | `name_variants` |
//! | `P106` occupation | `occupations` (English label, `https://www.wikidata.org/wiki/<Q-id>`) |
//!
//! # Requests
//!
//! One `Special:EntityData/<id>.json` request for the person, plus one
//! batched `wbgetentities` request for the English labels of the gender and
//! occupation targets.
//!
//! # Dates
//!
//! Time values are decoded by precision (11 = day, 10 = month, 9 = year).
//! Julian-calendar values, coarser precisions and impossible calendar dates
//! (`+1850-00-00`) come back as [`ClaimDate::RawFallback`] and are salvaged by
//! the date normalizer, which keeps the components up to the first `00`.

use anyhow::Result;
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::HashMap;

use authority_enrich_core::date::{normalize_claim, ClaimDate, DateValue};
use authority_enrich_core::models::{FactSet, Gender, Occupation, PartialDate};
use authority_enrich_core::source::FactSource;

use crate::config::WikidataConfig;
use crate::http::get_json;

const SERVICE: &str = "wikidata";
const PROP_GENDER: &str = "P21";
const PROP_BIRTH: &str = "P569";
const PROP_DEATH: &str = "P570";
const PROP_OCCUPATION: &str = "P106";
const GREGORIAN: &str = "http://www.wikidata.org/entity/Q1985727";
/// `wbgetentities` accepts at most 50 ids per request.
const LABEL_BATCH: usize = 50;

pub const ENTITY_BASE_URI: &str = "https://www.wikidata.org/wiki/";

/// The requests the adapter needs from Wikidata.
pub trait WikidataApi {
    /// Entity JSON for `id`, or `None` if Wikidata does not know it.
    fn entity(&self, id: &str) -> Result<Option<Value>>;

    /// English labels for `ids`. Ids without an English label are absent
    /// from the map.
    fn english_labels(&self, ids: &[String]) -> Result<HashMap<String, String>>;
}

/// Blocking client for the Wikidata entity and action APIs.
pub struct WikidataClient {
    http: Client,
    config: WikidataConfig,
}

impl WikidataClient {
    pub fn new(http: Client, config: WikidataConfig) -> Self {
        Self { http, config }
    }
}

impl WikidataApi for WikidataClient {
    fn entity(&self, id: &str) -> Result<Option<Value>> {
        let url = format!(
            "{}/{}.json",
            self.config.entity_url.trim_end_matches('/'),
            id
        );
        let Some(json) = get_json(&self.http, SERVICE, &url, &[])? else {
            return Ok(None);
        };
        Ok(select_entity(&json, id))
    }

    fn english_labels(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        let mut labels = HashMap::new();
        for batch in ids.chunks(LABEL_BATCH) {
            let joined = batch.join("|");
            let query = [
                ("action", "wbgetentities"),
                ("ids", joined.as_str()),
                ("props", "labels"),
                ("languages", "en"),
                ("format", "json"),
            ];
            let Some(json) = get_json(&self.http, SERVICE, &self.config.api_url, &query)? else {
                continue;
            };
            labels.extend(parse_label_response(&json));
        }
        Ok(labels)
    }
}

/// Pick the entity out of an `EntityData` payload. A redirected id is keyed
/// under its target, so fall back to the only entity present.
fn select_entity(json: &Value, id: &str) -> Option<Value> {
    let entities = json.get("entities")?.as_object()?;
    entities
        .get(id)
        .or_else(|| entities.values().next())
        .filter(|e| e.get("missing").is_none())
        .cloned()
}

/// English labels keyed by every id an entity answers to. A redirected
/// target may be keyed under its new id, so the requested id is recovered
/// from `redirects.from`.
fn parse_label_response(json: &Value) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    let Some(entities) = json.get("entities").and_then(|e| e.as_object()) else {
        return labels;
    };
    for (key, entity) in entities {
        let Some(label) = entity
            .pointer("/labels/en/value")
            .and_then(|v| v.as_str())
        else {
            continue;
        };
        let aliases = [
            Some(key.as_str()),
            entity.get("id").and_then(|v| v.as_str()),
            entity.pointer("/redirects/from").and_then(|v| v.as_str()),
        ];
        for id in aliases.into_iter().flatten() {
            labels.insert(id.to_string(), label.to_string());
        }
    }
    labels
}

/// [`FactSource`] backed by Wikidata.
pub struct WikidataSource<C> {
    client: C,
}

impl<C: WikidataApi> WikidataSource<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: WikidataApi> FactSource for WikidataSource<C> {
    fn name(&self) -> &str {
        SERVICE
    }

    fn facts(&self, id: &str) -> Result<FactSet> {
        let Some(entity) = self.client.entity(id)? else {
            tracing::info!(id, "wikidata entity not found");
            return Ok(FactSet::default());
        };

        let targets = label_targets(&entity);
        let labels = if targets.is_empty() {
            HashMap::new()
        } else {
            self.client.english_labels(&targets)?
        };

        Ok(facts_from_entity(&entity, &labels))
    }
}

/// Ids whose English labels are needed: the gender target and every
/// occupation target, first occurrence order.
fn label_targets(entity: &Value) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let gender = first_value(entity, PROP_GENDER).and_then(item_id);
    let occupations = values(entity, PROP_OCCUPATION).filter_map(item_id);
    for id in gender.into_iter().chain(occupations) {
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Build a fact set from entity JSON and resolved English labels.
pub fn facts_from_entity(entity: &Value, labels: &HashMap<String, String>) -> FactSet {
    let mut facts = FactSet::default();

    facts.gender = first_value(entity, PROP_GENDER)
        .and_then(item_id)
        .and_then(|id| labels.get(id))
        .and_then(|label| Gender::from_label(label));

    facts.birth = claim_date(entity, PROP_BIRTH);
    facts.death = claim_date(entity, PROP_DEATH);

    if let Some(aliases) = entity.get("aliases").and_then(|a| a.as_object()) {
        for per_language in aliases.values() {
            for alias in per_language.as_array().into_iter().flatten() {
                if let Some(value) = alias.get("value").and_then(|v| v.as_str()) {
                    facts.name_variants.insert(value.to_string());
                }
            }
        }
    }
    if let Some(names) = entity.get("labels").and_then(|l| l.as_object()) {
        for label in names.values() {
            if let Some(value) = label.get("value").and_then(|v| v.as_str()) {
                facts.name_variants.insert(value.to_string());
            }
        }
    }

    for target in values(entity, PROP_OCCUPATION).filter_map(item_id) {
        match labels.get(target) {
            Some(label) => facts.occupations.push(Occupation::new(
                label,
                &format!("{}{}", ENTITY_BASE_URI, target),
            )),
            None => tracing::debug!(target, "occupation without English label dropped"),
        }
    }

    facts
}

fn claim_date(entity: &Value, property: &str) -> Option<PartialDate> {
    let claim = decode_time(first_value(entity, property)?)?;
    if let ClaimDate::RawFallback(raw) = &claim {
        tracing::debug!(property, raw = %raw, "date claim decoded from raw time string");
    }
    normalize_claim(&claim)
}

/// Datavalue `value` objects of the non-deprecated statements of
/// `property`, in statement order. Statements without a value
/// (`somevalue`, `novalue`) are skipped.
fn values<'a>(entity: &'a Value, property: &str) -> impl Iterator<Item = &'a Value> {
    entity
        .get("claims")
        .and_then(|c| c.get(property))
        .and_then(|s| s.as_array())
        .into_iter()
        .flatten()
        .filter(|statement| {
            statement.get("rank").and_then(|r| r.as_str()) != Some("deprecated")
        })
        .filter_map(|statement| statement.pointer("/mainsnak/datavalue/value"))
}

fn first_value<'a>(entity: &'a Value, property: &str) -> Option<&'a Value> {
    values(entity, property).next()
}

fn item_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(|id| id.as_str())
}

/// Decode a Wikidata time value into a typed claim date.
pub fn decode_time(value: &Value) -> Option<ClaimDate> {
    let time = value.get("time")?.as_str()?;
    let precision = value.get("precision").and_then(|p| p.as_u64());
    let calendar = value.get("calendarmodel").and_then(|c| c.as_str());

    let fallback = || Some(ClaimDate::RawFallback(time.to_string()));

    if calendar.is_some_and(|c| c != GREGORIAN) {
        return fallback();
    }
    let Some((year, month, day)) = split_time(time) else {
        return fallback();
    };

    let parsed = match precision {
        Some(11) => NaiveDate::from_ymd_opt(year, month, day).map(DateValue::Full),
        Some(10) if (1..=12).contains(&month) => Some(DateValue::YearMonth(year, month)),
        Some(9) => Some(DateValue::Year(year)),
        _ => None,
    };

    match parsed {
        Some(value) => Some(ClaimDate::Parsed(value)),
        None => fallback(),
    }
}

/// `+1867-11-07T00:00:00Z` → `(1867, 11, 7)`.
fn split_time(time: &str) -> Option<(i32, u32, u32)> {
    let unsigned = time.trim_start_matches('+');
    let (sign, body) = match unsigned.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, unsigned),
    };
    let date = body.split('T').next()?;
    let mut parts = date.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    Some((sign * year, month, day))
}
