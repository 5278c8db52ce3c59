//! GeoNames lookups for the places pass.
//!
//! `getJSON?geonameId=<id>&username=<user>&style=full` answers with the
//! full gazetteer entry. Only the country, first-level region and
//! coordinates are used. GeoNames reports errors (unknown id, exhausted
//! credits, invalid user) as HTTP 200 with a `status` object; those are
//! surfaced as [`LookupError::Malformed`].

use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::GeoNamesConfig;
use crate::http::{get_json, LookupError};

const SERVICE: &str = "geonames";

/// The subset of a GeoNames entry copied into a `place`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoNamesPlace {
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub admin_name1: Option<String>,
    #[serde(default, deserialize_with = "coordinate")]
    pub lat: Option<String>,
    #[serde(default, deserialize_with = "coordinate")]
    pub lng: Option<String>,
}

impl GeoNamesPlace {
    /// `"<lat> <lng>"` when both coordinates are known.
    pub fn geo(&self) -> Option<String> {
        match (self.lat.as_deref(), self.lng.as_deref()) {
            (Some(lat), Some(lng)) => Some(format!("{} {}", lat, lng)),
            _ => None,
        }
    }
}

/// Coordinates arrive as strings from `getJSON` but as numbers from some
/// mirrors; keep the textual form either way.
fn coordinate<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub trait GeoNamesApi {
    fn place(&self, geoname_id: &str) -> Result<Option<GeoNamesPlace>>;
}

pub struct GeoNamesClient {
    http: Client,
    url: String,
    username: String,
}

impl GeoNamesClient {
    /// Fails when no `geonames.username` is configured.
    pub fn new(http: Client, config: &GeoNamesConfig) -> Result<Self> {
        let Some(username) = config.username.clone() else {
            anyhow::bail!("geonames.username is required to look up GeoNames ids");
        };
        Ok(Self {
            http,
            url: config.url.clone(),
            username,
        })
    }
}

impl GeoNamesApi for GeoNamesClient {
    fn place(&self, geoname_id: &str) -> Result<Option<GeoNamesPlace>> {
        let query = [
            ("geonameId", geoname_id),
            ("username", self.username.as_str()),
            ("style", "full"),
        ];
        let Some(json) = get_json(&self.http, SERVICE, &self.url, &query)? else {
            return Ok(None);
        };
        Ok(Some(parse_place(json)?))
    }
}

pub fn parse_place(json: serde_json::Value) -> Result<GeoNamesPlace, LookupError> {
    if let Some(message) = json.pointer("/status/message").and_then(|m| m.as_str()) {
        return Err(LookupError::Malformed {
            service: SERVICE,
            message: message.to_string(),
        });
    }
    serde_json::from_value(json).map_err(|e| LookupError::Malformed {
        service: SERVICE,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_style_payload() {
        let place = parse_place(json!({
            "geonameId": 2950159,
            "name": "Berlin",
            "countryName": "Germany",
            "adminName1": "Land Berlin",
            "lat": "52.52437",
            "lng": "13.41053",
            "population": 3426354,
        }))
        .unwrap();
        assert_eq!(place.country_name.as_deref(), Some("Germany"));
        assert_eq!(place.admin_name1.as_deref(), Some("Land Berlin"));
        assert_eq!(place.geo().as_deref(), Some("52.52437 13.41053"));
    }

    #[test]
    fn numeric_and_missing_coordinates() {
        let place = parse_place(json!({ "lat": 48.85, "countryName": "France" })).unwrap();
        assert_eq!(place.lat.as_deref(), Some("48.85"));
        assert_eq!(place.lng, None);
        assert_eq!(place.geo(), None);
    }

    #[test]
    fn status_payload_is_an_error() {
        let err = parse_place(json!({
            "status": { "message": "the daily limit of 20000 credits has been exceeded", "value": 18 }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("daily limit"));
    }

    #[test]
    fn client_requires_username() {
        let config = GeoNamesConfig::default();
        assert!(GeoNamesClient::new(Client::new(), &config).is_err());
    }
}
