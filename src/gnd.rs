//! GND source adapter.
//!
//! Person records are fetched from the DNB SRU endpoint as MARC21-xml:
//!
//! ```text
//! GET {sru_url}?version=1.1&operation=searchRetrieve&recordSchema=MARC21-xml&query=nid=<id>
//! ```
//!
//! | MARC | Field |
//! |------|-------|
//! | `375$a` | `gender` (`1` male, `2` female) |
//! | `100$d` | `birth` / `death` life range |
//! | `100$a$b$c`, `400$a$b$c` | `name_variants` |
//! | `550$0` | `occupations` (label from the `750` fields of the linked record) |
//!
//! Each occupation URI costs one extra SRU request. Within one person the
//! resolved labels are cached by URI, so a URI repeated across `550` fields
//! is only looked up once.

use anyhow::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::blocking::Client;
use std::collections::HashMap;

use authority_enrich_core::date::parse_life_range;
use authority_enrich_core::models::{trailing_segment, FactSet, Gender, Occupation};
use authority_enrich_core::source::FactSource;

use crate::config::GndConfig;
use crate::http::{get_text, LookupError};

const SERVICE: &str = "gnd";
const ENGLISH_MARKER: &str = "L:eng";

/// SRU `searchRetrieve` requests against the DNB authority catalogue.
pub trait SruApi {
    /// Raw MARC21-xml response for `query`.
    fn search(&self, query: &str) -> Result<String>;
}

pub struct SruClient {
    http: Client,
    config: GndConfig,
}

impl SruClient {
    pub fn new(http: Client, config: GndConfig) -> Self {
        Self { http, config }
    }
}

impl SruApi for SruClient {
    fn search(&self, query: &str) -> Result<String> {
        let params = [
            ("version", "1.1"),
            ("operation", "searchRetrieve"),
            ("recordSchema", "MARC21-xml"),
            ("query", query),
        ];
        let body = get_text(&self.http, SERVICE, &self.config.sru_url, &params)?;
        // An unknown id is an empty result set, never a 404; treat one like it.
        Ok(body.unwrap_or_default())
    }
}

/// One `datafield`: its tag and `(code, value)` subfields in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataField {
    pub tag: String,
    pub subfields: Vec<(String, String)>,
}

impl DataField {
    /// First value of subfield `code`.
    pub fn subfield(&self, code: &str) -> Option<&str> {
        self.subfields
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, v)| v.as_str())
    }

    pub fn subfields_of<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.subfields
            .iter()
            .filter(move |(c, _)| c == code)
            .map(|(_, v)| v.as_str())
    }

    /// Subfields `a`, `b`, `c` joined with spaces, e.g. `Friedrich II. Preußen, König`.
    pub fn heading(&self) -> String {
        self.subfields
            .iter()
            .filter(|(code, _)| matches!(code.as_str(), "a" | "b" | "c"))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarcRecord {
    pub fields: Vec<DataField>,
}

impl MarcRecord {
    pub fn fields<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DataField> + 'a {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    pub fn first(&self, tag: &str) -> Option<&DataField> {
        self.fields.iter().find(|f| f.tag == tag)
    }
}

/// Parse the MARC records carried in the `recordData` elements of an SRU
/// response.
///
/// The SRU envelope names its own wrapper `record` too, so only `record`
/// elements inside `recordData` are collected.
pub fn parse_marc_records(xml: &str) -> Result<Vec<MarcRecord>, LookupError> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut in_record_data = false;
    let mut record: Option<MarcRecord> = None;
    let mut field: Option<DataField> = None;
    let mut subfield: Option<(String, String)> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"recordData" => in_record_data = true,
                b"record" if in_record_data => record = Some(MarcRecord::default()),
                b"datafield" if record.is_some() => {
                    field = Some(DataField {
                        tag: attribute(&e, b"tag").map_err(malformed)?,
                        subfields: Vec::new(),
                    });
                }
                b"subfield" if field.is_some() => {
                    let code = attribute(&e, b"code").map_err(malformed)?;
                    subfield = Some((code, String::new()));
                }
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"subfield" {
                    if let Some(field) = field.as_mut() {
                        let code = attribute(&e, b"code").map_err(malformed)?;
                        field.subfields.push((code, String::new()));
                    }
                }
            }
            Event::Text(t) => {
                if let Some((_, value)) = subfield.as_mut() {
                    value.push_str(&t.unescape().map_err(malformed)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"recordData" => in_record_data = false,
                b"record" if in_record_data => {
                    if let Some(done) = record.take() {
                        records.push(done);
                    }
                }
                b"datafield" => {
                    if let (Some(done), Some(record)) = (field.take(), record.as_mut()) {
                        record.fields.push(done);
                    }
                }
                b"subfield" => {
                    if let (Some(done), Some(field)) = (subfield.take(), field.as_mut()) {
                        field.subfields.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

fn malformed(e: impl std::fmt::Display) -> LookupError {
    LookupError::Malformed {
        service: SERVICE,
        message: e.to_string(),
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<String, quick_xml::Error> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(attr.unescape_value()?.into_owned());
        }
    }
    Ok(String::new())
}

/// Pick the display label of an occupation from the `750` fields of its
/// authority records: the first English label, else the first label.
pub fn pick_occupation_label(records: &[MarcRecord]) -> Option<String> {
    let mut first = None;
    for field in records.iter().flat_map(|r| r.fields("750")) {
        let Some(label) = field.subfield("a").map(str::trim).filter(|l| !l.is_empty()) else {
            continue;
        };
        if field.subfields_of("9").any(|m| m.trim() == ENGLISH_MARKER) {
            return Some(label.to_string());
        }
        first.get_or_insert_with(|| label.to_string());
    }
    first
}

/// Build a fact set from a person record. `resolve` maps an occupation URI
/// to its label; `None` drops the occupation.
pub fn facts_from_record<F>(record: &MarcRecord, mut resolve: F) -> Result<FactSet>
where
    F: FnMut(&str) -> Result<Option<String>>,
{
    let mut facts = FactSet::default();

    facts.gender = record
        .first("375")
        .and_then(|f| f.subfield("a"))
        .and_then(Gender::from_code);

    if let Some(heading) = record.first("100") {
        if let Some(range) = heading.subfield("d") {
            let life = parse_life_range(range);
            facts.birth = life.birth;
            facts.death = life.death;
        }
    }

    for field in record.fields("100").take(1).chain(record.fields("400")) {
        let name = field.heading();
        if !name.is_empty() {
            facts.name_variants.insert(name);
        }
    }

    for field in record.fields("550") {
        for uri in field.subfields_of("0").map(str::trim) {
            if !uri.starts_with("http") {
                continue;
            }
            match resolve(uri)? {
                Some(label) => facts.occupations.push(Occupation::new(&label, uri)),
                None => tracing::debug!(uri, "occupation without label dropped"),
            }
        }
    }

    Ok(facts)
}

/// [`FactSource`] backed by the GND.
pub struct GndSource<C> {
    client: C,
}

impl<C: SruApi> GndSource<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    fn occupation_label(&self, uri: &str) -> Result<Option<String>> {
        let xml = self.client.search(trailing_segment(uri))?;
        let records = parse_marc_records(&xml)?;
        Ok(pick_occupation_label(&records))
    }
}

impl<C: SruApi> FactSource for GndSource<C> {
    fn name(&self) -> &str {
        SERVICE
    }

    fn facts(&self, id: &str) -> Result<FactSet> {
        let xml = self.client.search(&format!("nid={}", id))?;
        let records = parse_marc_records(&xml)?;
        let Some(record) = records.first() else {
            tracing::info!(id, "gnd record not found");
            return Ok(FactSet::default());
        };

        let mut cache: HashMap<String, Option<String>> = HashMap::new();
        facts_from_record(record, |uri| {
            if let Some(hit) = cache.get(uri) {
                return Ok(hit.clone());
            }
            let label = self.occupation_label(uri)?;
            cache.insert(uri.to_string(), label.clone());
            Ok(label)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn sru(records: &[&str]) -> String {
        let body: String = records
            .iter()
            .map(|r| {
                format!(
                    r#"<record><recordSchema>MARC21-xml</recordSchema><recordPacking>xml</recordPacking>
<recordData><record xmlns="http://www.loc.gov/MARC21/slim" type="Authority">
<leader>00000nz  a2200000nc 4500</leader>
<controlfield tag="001">x</controlfield>
{}
</record></recordData><recordPosition>1</recordPosition></record>"#,
                    r
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<searchRetrieveResponse xmlns="http://www.loc.gov/zing/srw/">
<version>1.1</version><numberOfRecords>{}</numberOfRecords>
<records>{}</records>
</searchRetrieveResponse>"#,
            records.len(),
            body
        )
    }

    const LISE_MEITNER: &str = r#"
<datafield tag="375" ind1=" " ind2=" "><subfield code="a">2</subfield></datafield>
<datafield tag="100" ind1="1" ind2=" ">
  <subfield code="a">Meitner, Lise</subfield>
  <subfield code="d">1878-1968</subfield>
</datafield>
<datafield tag="400" ind1="1" ind2=" "><subfield code="a">Meitner, Elise</subfield></datafield>
<datafield tag="400" ind1="1" ind2=" ">
  <subfield code="a">Hahn-Meitner</subfield><subfield code="c">Lise</subfield>
</datafield>
<datafield tag="550" ind1=" " ind2=" ">
  <subfield code="0">(DE-101)041745981</subfield>
  <subfield code="0">https://d-nb.info/gnd/4174598-4</subfield>
  <subfield code="a">Physikerin</subfield>
</datafield>
<datafield tag="550" ind1=" " ind2=" ">
  <subfield code="0">https://d-nb.info/gnd/4174598-4</subfield>
</datafield>
<datafield tag="550" ind1=" " ind2=" ">
  <subfield code="0">https://d-nb.info/gnd/4000000-0</subfield>
</datafield>
"#;

    const PHYSICIST: &str = r#"
<datafield tag="150" ind1=" " ind2=" "><subfield code="a">Physikerin</subfield></datafield>
<datafield tag="750" ind1=" " ind2="7">
  <subfield code="a">Physicienne</subfield><subfield code="9">L:fre</subfield>
</datafield>
<datafield tag="750" ind1=" " ind2="7">
  <subfield code="a">Physicists</subfield><subfield code="9">L:eng</subfield>
</datafield>
"#;

    struct FakeSru {
        responses: HashMap<String, String>,
        queries: RefCell<Vec<String>>,
    }

    impl FakeSru {
        fn new(responses: &[(&str, String)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(q, body)| (q.to_string(), body.clone()))
                    .collect(),
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl SruApi for FakeSru {
        fn search(&self, query: &str) -> Result<String> {
            self.queries.borrow_mut().push(query.to_string());
            Ok(self
                .responses
                .get(query)
                .cloned()
                .unwrap_or_else(|| sru(&[])))
        }
    }

    #[test]
    fn parses_records_inside_record_data_only() {
        let records = parse_marc_records(&sru(&[LISE_MEITNER])).unwrap();
        assert_eq!(records.len(), 1);
        let heading = records[0].first("100").unwrap();
        assert_eq!(heading.subfield("d"), Some("1878-1968"));
        assert_eq!(records[0].fields("550").count(), 3);
    }

    #[test]
    fn heading_joins_name_subfields() {
        let field = DataField {
            tag: "100".into(),
            subfields: vec![
                ("a".into(), "Friedrich".into()),
                ("b".into(), "II.".into()),
                ("c".into(), "Preußen, König".into()),
                ("d".into(), "1712-1786".into()),
            ],
        };
        assert_eq!(field.heading(), "Friedrich II. Preußen, König");
    }

    #[test]
    fn english_label_is_preferred() {
        let records = parse_marc_records(&sru(&[PHYSICIST])).unwrap();
        assert_eq!(pick_occupation_label(&records).as_deref(), Some("Physicists"));
    }

    #[test]
    fn first_label_without_english() {
        let records = parse_marc_records(&sru(&[
            r#"<datafield tag="750"><subfield code="a">Physicienne</subfield><subfield code="9">L:fre</subfield></datafield>
               <datafield tag="750"><subfield code="a">Fisica</subfield><subfield code="9">L:ita</subfield></datafield>"#,
        ]))
        .unwrap();
        assert_eq!(pick_occupation_label(&records).as_deref(), Some("Physicienne"));
        assert_eq!(pick_occupation_label(&[]), None);
    }

    #[test]
    fn record_maps_to_fact_set() {
        let client = FakeSru::new(&[
            ("nid=118580485", sru(&[LISE_MEITNER])),
            ("4174598-4", sru(&[PHYSICIST])),
        ]);
        let source = GndSource::new(client);
        let facts = source.facts("118580485").unwrap();

        assert_eq!(facts.gender, Some(Gender::Female));
        assert_eq!(facts.birth.as_ref().map(|d| d.as_str()), Some("1878"));
        assert_eq!(facts.death.as_ref().map(|d| d.as_str()), Some("1968"));
        assert!(facts.name_variants.contains("Meitner, Lise"));
        assert!(facts.name_variants.contains("Meitner, Elise"));
        assert!(facts.name_variants.contains("Hahn-Meitner Lise"));

        // The repeated URI yields two occupations; the unresolvable one is dropped.
        assert_eq!(
            facts.occupations,
            vec![
                Occupation::new("Physicists", "https://d-nb.info/gnd/4174598-4"),
                Occupation::new("Physicists", "https://d-nb.info/gnd/4174598-4"),
            ]
        );
    }

    #[test]
    fn repeated_occupation_uri_is_looked_up_once() {
        let client = FakeSru::new(&[
            ("nid=118580485", sru(&[LISE_MEITNER])),
            ("4174598-4", sru(&[PHYSICIST])),
        ]);
        let source = GndSource::new(client);
        source.facts("118580485").unwrap();

        let queries = source.client.queries.borrow();
        assert_eq!(
            *queries,
            vec!["nid=118580485", "4174598-4", "4000000-0"]
        );
    }

    #[test]
    fn empty_result_set_yields_empty_facts() {
        let source = GndSource::new(FakeSru::new(&[]));
        assert!(source.facts("0000000").unwrap().is_empty());
    }

    #[test]
    fn unusual_life_range_and_gender_code_are_ignored() {
        let records = parse_marc_records(&sru(&[
            r#"<datafield tag="375"><subfield code="a">3</subfield></datafield>
               <datafield tag="100"><subfield code="a">Anonymus</subfield><subfield code="d">ca. 1900</subfield></datafield>"#,
        ]))
        .unwrap();
        let facts = facts_from_record(&records[0], |_| Ok(None)).unwrap();
        assert_eq!(facts.gender, None);
        assert_eq!(facts.birth, None);
        assert_eq!(facts.death, None);
        assert_eq!(facts.name_variants.len(), 1);
    }
}
