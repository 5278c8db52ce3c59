//! `enrich check`: lists the configured inputs and knowledge bases and
//! whether each is usable, without contacting any service.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::manifest::{load_person_manifest, load_place_manifest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub name: String,
    pub status: String,
    pub healthy: bool,
}

impl SourceStatus {
    fn new(name: &str, status: impl Into<String>, healthy: bool) -> Self {
        Self {
            name: name.to_string(),
            status: status.into(),
            healthy,
        }
    }
}

fn file_status(name: &str, path: &Path) -> SourceStatus {
    if path.is_file() {
        SourceStatus::new(name, "OK", true)
    } else {
        SourceStatus::new(name, format!("MISSING ({})", path.display()), false)
    }
}

/// Status rows for every input file and knowledge base.
pub fn source_statuses(config: &Config) -> Vec<SourceStatus> {
    let mut rows = vec![file_status("authority_list", &config.input.authority_list)];

    rows.push(match load_person_manifest(&config.input.persons_manifest) {
        Ok(m) => SourceStatus::new("persons_manifest", format!("OK ({} entries)", m.len()), true),
        Err(_) => file_status("persons_manifest", &config.input.persons_manifest),
    });
    rows.push(match load_place_manifest(&config.input.places_manifest) {
        Ok(m) => SourceStatus::new("places_manifest", format!("OK ({} entries)", m.len()), true),
        Err(_) => file_status("places_manifest", &config.input.places_manifest),
    });

    for (name, template) in [
        ("template:persons", &config.templates.persons),
        ("template:places", &config.templates.places),
        ("template:orgs", &config.templates.organizations),
    ] {
        rows.push(match template {
            Some(path) => file_status(name, path),
            None => SourceStatus::new(name, "DEFAULT", true),
        });
    }

    rows.push(SourceStatus::new("wikidata", config.wikidata.api_url.as_str(), true));
    rows.push(SourceStatus::new("gnd", config.gnd.sru_url.as_str(), true));
    rows.push(match &config.geonames.username {
        Some(_) => SourceStatus::new("geonames", "OK", true),
        None => SourceStatus::new("geonames", "NOT CONFIGURED", false),
    });

    rows
}

pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<18} {:<32} HEALTHY", "SOURCE", "STATUS");
    for row in source_statuses(config) {
        println!("{:<18} {:<32} {}", row.name, row.status, row.healthy);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn statuses_reflect_files_and_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let lists = dir.path().join("lists.xml");
        let persons = dir.path().join("persons.txt");
        std::fs::write(&lists, "<TEI/>").unwrap();
        std::fs::write(&persons, "pers_0001\npers_0002\n").unwrap();

        let config = parse_config(&format!(
            "[input]\nauthority_list = {:?}\npersons_manifest = {:?}\nplaces_manifest = {:?}\n",
            lists,
            persons,
            dir.path().join("missing.txt")
        ))
        .unwrap();

        let rows = source_statuses(&config);
        let by_name = |n: &str| rows.iter().find(|r| r.name == n).unwrap().clone();

        assert!(by_name("authority_list").healthy);
        assert_eq!(by_name("persons_manifest").status, "OK (2 entries)");
        assert!(!by_name("places_manifest").healthy);
        assert_eq!(by_name("template:persons").status, "DEFAULT");
        assert!(!by_name("geonames").healthy);
    }
}
