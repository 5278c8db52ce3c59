//! TOML configuration.
//!
//! Every path and endpoint the enrichment passes touch is read from one
//! file (default `./config/enrich.toml`). Only `[input].authority_list` is
//! required; everything else has a default.
//!
//! ```toml
//! [input]
//! authority_list = "data/auxiliary/authorityLists.xml"
//! persons_manifest = "input/persons.txt"
//! places_manifest = "input/places.txt"
//!
//! [output]
//! dir = "data/auxiliary"
//!
//! [templates]
//! persons = "templates/persons.xml"
//!
//! [geonames]
//! username = "your_geonames_user"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub wikidata: WikidataConfig,
    #[serde(default)]
    pub gnd: GndConfig,
    #[serde(default)]
    pub geonames: GeoNamesConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// TEI document holding the `person`, `place` and `org` records.
    pub authority_list: PathBuf,
    #[serde(default = "default_persons_manifest")]
    pub persons_manifest: PathBuf,
    #[serde(default = "default_places_manifest")]
    pub places_manifest: PathBuf,
}

fn default_persons_manifest() -> PathBuf {
    PathBuf::from("input/persons.txt")
}
fn default_places_manifest() -> PathBuf {
    PathBuf::from("input/places.txt")
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/auxiliary")
}

impl OutputConfig {
    pub fn persons_path(&self) -> PathBuf {
        self.dir.join("persons.xml")
    }

    pub fn places_path(&self) -> PathBuf {
        self.dir.join("places.xml")
    }

    pub fn organizations_path(&self) -> PathBuf {
        self.dir.join("organizations.xml")
    }
}

/// Optional TEI templates the enriched records are appended to. Without a
/// template a minimal TEI skeleton is generated.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TemplatesConfig {
    pub persons: Option<PathBuf>,
    pub places: Option<PathBuf>,
    pub organizations: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WikidataConfig {
    #[serde(default = "default_wikidata_entity_url")]
    pub entity_url: String,
    #[serde(default = "default_wikidata_api_url")]
    pub api_url: String,
}

impl Default for WikidataConfig {
    fn default() -> Self {
        Self {
            entity_url: default_wikidata_entity_url(),
            api_url: default_wikidata_api_url(),
        }
    }
}

fn default_wikidata_entity_url() -> String {
    "https://www.wikidata.org/wiki/Special:EntityData".to_string()
}
fn default_wikidata_api_url() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GndConfig {
    #[serde(default = "default_gnd_sru_url")]
    pub sru_url: String,
}

impl Default for GndConfig {
    fn default() -> Self {
        Self {
            sru_url: default_gnd_sru_url(),
        }
    }
}

fn default_gnd_sru_url() -> String {
    "https://services.dnb.de/sru/authorities".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeoNamesConfig {
    #[serde(default = "default_geonames_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl Default for GeoNamesConfig {
    fn default() -> Self {
        Self {
            url: default_geonames_url(),
            username: None,
        }
    }
}

fn default_geonames_url() -> String {
    "http://api.geonames.org/getJSON".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("authority-enrich/{}", env!("CARGO_PKG_VERSION"))
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;

    Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.http.timeout_secs == 0 {
        bail!("http.timeout_secs must be > 0");
    }

    if config.http.user_agent.trim().is_empty() {
        bail!("http.user_agent must not be empty");
    }

    for (key, url) in [
        ("wikidata.entity_url", &config.wikidata.entity_url),
        ("wikidata.api_url", &config.wikidata.api_url),
        ("gnd.sru_url", &config.gnd.sru_url),
        ("geonames.url", &config.geonames.url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("{} must be an http(s) URL, got '{}'", key, url);
        }
    }

    if let Some(user) = &config.geonames.username {
        if user.trim().is_empty() {
            bail!("geonames.username must not be empty when set");
        }
    }

    Ok(config)
}
