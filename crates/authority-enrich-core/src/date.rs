//! Date normalization.
//!
//! Knowledge bases report dates in several shapes: fully specified calendar
//! dates, bare years, year-month pairs, raw ISO-like strings with unknown
//! components (`+1901-00-00T00:00:00Z`), and free-form life ranges
//! (`1900-1980`, `-1980`, `19xx-1980`). Everything funnels into a
//! [`PartialDate`]: `YYYY`, `YYYY-MM`, or `YYYY-MM-DD`, with unknown trailing
//! components omitted.
//!
//! # Unknown markers
//!
//! | Source | Marker | Example |
//! |--------|--------|---------|
//! | Wikidata raw time | `00` component | `+1850-00-00T00:00:00Z` → `1850` |
//! | GND life range | `x` / `X` digit | `19xx-1980` → death `1980` only |
//!
//! Years are zero-padded to four digits so that the output always forms a
//! valid `@when` value.

use chrono::{Datelike, NaiveDate};

use crate::models::PartialDate;

/// Wikidata marks unknown month and day components with `00`.
const UNKNOWN_COMPONENT: &str = "00";

/// A typed date value produced by a source client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateValue {
    /// A fully specified calendar date.
    Full(NaiveDate),
    /// Year and month, day unknown.
    YearMonth(i32, u32),
    /// Year only.
    Year(i32),
}

/// Outcome of decoding a date claim.
///
/// Clients that cannot map a claim onto a [`DateValue`] (unsupported
/// precision, impossible calendar date) hand back the raw string instead
/// of failing, and the normalizer salvages whatever components are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimDate {
    Parsed(DateValue),
    RawFallback(String),
}

/// Normalize a typed date value.
pub fn normalize(value: &DateValue) -> Option<PartialDate> {
    let s = match value {
        DateValue::Full(d) => format!("{}-{:02}-{:02}", format_year(d.year()), d.month(), d.day()),
        DateValue::YearMonth(y, m) if (1..=12).contains(m) => {
            format!("{}-{:02}", format_year(*y), m)
        }
        DateValue::YearMonth(y, _) => format_year(*y),
        DateValue::Year(y) => format_year(*y),
    };
    Some(PartialDate::from_canonical(s))
}

/// Normalize a decoded claim, falling back to raw-string salvage.
pub fn normalize_claim(claim: &ClaimDate) -> Option<PartialDate> {
    match claim {
        ClaimDate::Parsed(value) => normalize(value),
        ClaimDate::RawFallback(raw) => normalize_raw(raw),
    }
}

/// Salvage a partial date from an ISO-like string.
///
/// Accepts `+YYYY-MM-DDThh:mm:ssZ`, `YYYY-MM-DD`, `YYYY-MM`, and `YYYY`, with
/// an optional sign. The time part is discarded. Components are kept in
/// order until the first unknown (`00`) component; a component that is not
/// purely numeric makes the whole value unusable.
///
/// Normalizing an already canonical partial date returns it unchanged.
pub fn normalize_raw(raw: &str) -> Option<PartialDate> {
    let trimmed = raw.trim().trim_start_matches('+');
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let date_part = body.split('T').next().unwrap_or_default();
    if date_part.is_empty() {
        return None;
    }

    let components: Vec<&str> = date_part.split('-').collect();
    if components.len() > 3 {
        return None;
    }
    if components
        .iter()
        .any(|c| c.is_empty() || !c.chars().all(|ch| ch.is_ascii_digit()))
    {
        return None;
    }

    let year_raw = components[0];
    if year_raw.chars().all(|c| c == '0') && year_raw.len() <= 2 {
        return None;
    }
    let year: i32 = year_raw.parse().ok()?;
    let year = if negative { -year } else { year };

    let mut parts = vec![format_year(year)];
    for component in &components[1..] {
        if *component == UNKNOWN_COMPONENT {
            break;
        }
        let n: u32 = component.parse().ok()?;
        parts.push(format!("{:02}", n));
    }

    Some(PartialDate::from_canonical(parts.join("-")))
}

/// Birth and death extracted from a life range such as `1900-1980`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifeRange {
    pub birth: Option<PartialDate>,
    pub death: Option<PartialDate>,
}

/// Parse a GND-style life range.
///
/// Accepted shapes are `YYYY-YYYY`, `-YYYY` (death only) and `YYYY-`
/// (birth only). Years may use `x`/`X` for unknown digits, in which case
/// that side is discarded. Anything else (`ca. 1900`, full dates, multiple
/// hyphens) yields an empty range rather than an error.
pub fn parse_life_range(raw: &str) -> LifeRange {
    let parts: Vec<&str> = raw.trim().split('-').map(str::trim).collect();
    if parts.len() != 2 {
        return LifeRange::default();
    }
    if !parts.iter().all(|p| p.is_empty() || is_year_token(p)) {
        return LifeRange::default();
    }
    LifeRange {
        birth: range_year(parts[0]),
        death: range_year(parts[1]),
    }
}

fn is_year_token(token: &str) -> bool {
    (1..=4).contains(&token.len())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || c.eq_ignore_ascii_case(&'x'))
}

fn range_year(token: &str) -> Option<PartialDate> {
    if token.is_empty() || token.chars().any(|c| c.eq_ignore_ascii_case(&'x')) {
        return None;
    }
    let year: i32 = token.parse().ok()?;
    Some(PartialDate::from_canonical(format_year(year)))
}

fn format_year(year: i32) -> String {
    if year < 0 {
        format!("-{:04}", -(year as i64))
    } else {
        format!("{:04}", year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(d: Option<PartialDate>) -> Option<String> {
        d.map(|d| d.as_str().to_string())
    }

    #[test]
    fn full_date_formats_with_all_components() {
        let d = NaiveDate::from_ymd_opt(1889, 4, 26).unwrap();
        assert_eq!(s(normalize(&DateValue::Full(d))), Some("1889-04-26".into()));
    }

    #[test]
    fn year_and_year_month() {
        assert_eq!(s(normalize(&DateValue::Year(1901))), Some("1901".into()));
        assert_eq!(s(normalize(&DateValue::Year(812))), Some("0812".into()));
        assert_eq!(
            s(normalize(&DateValue::YearMonth(1901, 3))),
            Some("1901-03".into())
        );
        assert_eq!(s(normalize(&DateValue::YearMonth(1901, 0))), Some("1901".into()));
    }

    #[test]
    fn raw_fallback_drops_unknown_components() {
        assert_eq!(
            s(normalize_raw("+1850-00-00T00:00:00Z")),
            Some("1850".into())
        );
        assert_eq!(
            s(normalize_raw("+1850-07-00T00:00:00Z")),
            Some("1850-07".into())
        );
        assert_eq!(
            s(normalize_claim(&ClaimDate::RawFallback(
                "+1850-07-14T00:00:00Z".into()
            ))),
            Some("1850-07-14".into())
        );
    }

    #[test]
    fn raw_fallback_rejects_garbage() {
        assert_eq!(normalize_raw(""), None);
        assert_eq!(normalize_raw("ca. 1900"), None);
        assert_eq!(normalize_raw("+00-00-00T00:00:00Z"), None);
        assert_eq!(normalize_raw("1900-01-02-03"), None);
    }

    #[test]
    fn raw_fallback_keeps_era_sign() {
        assert_eq!(
            s(normalize_raw("-0044-03-15T00:00:00Z")),
            Some("-0044-03-15".into())
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        for canonical in ["1900", "1900-05", "1900-05-17", "0812", "-0044-03-15"] {
            let once = normalize_raw(canonical).unwrap();
            assert_eq!(once.as_str(), canonical);
            let twice = normalize_raw(once.as_str()).unwrap();
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn life_range_shapes() {
        let r = parse_life_range("1900-1980");
        assert_eq!(s(r.birth), Some("1900".into()));
        assert_eq!(s(r.death), Some("1980".into()));

        let r = parse_life_range("-1980");
        assert_eq!(r.birth, None);
        assert_eq!(s(r.death), Some("1980".into()));

        let r = parse_life_range("1900-");
        assert_eq!(s(r.birth), Some("1900".into()));
        assert_eq!(r.death, None);
    }

    #[test]
    fn life_range_placeholder_side_is_discarded() {
        let r = parse_life_range("19xx-1980");
        assert_eq!(r.birth, None);
        assert_eq!(s(r.death), Some("1980".into()));

        let r = parse_life_range("1901-19XX");
        assert_eq!(s(r.birth), Some("1901".into()));
        assert_eq!(r.death, None);
    }

    #[test]
    fn unrecognized_life_range_is_dropped() {
        assert_eq!(parse_life_range("ca. 1900"), LifeRange::default());
        assert_eq!(parse_life_range("ca. 1900-1980"), LifeRange::default());
        assert_eq!(parse_life_range("1900-05-12"), LifeRange::default());
        assert_eq!(parse_life_range(""), LifeRange::default());
        assert_eq!(parse_life_range("-"), LifeRange::default());
    }
}
