//! # Authority Enrich
//!
//! Enriches a TEI authority list (persons, places, organizations) with
//! biographical and geographic facts from external knowledge bases and
//! writes one enriched TEI document per entity kind.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │   Manifest   │──▶│   Sources    │──▶│    Merge     │──▶│   Builder   │
//! │ id | wd | gnd│   │ Wikidata/GND │   │ (core crate) │   │ TEI elements│
//! └──────────────┘   └──────────────┘   └──────────────┘   └─────────────┘
//! ```
//!
//! The merge engine, date normalizer and fact models live in
//! `authority-enrich-core`, which performs no I/O. This crate adds the
//! HTTP clients, XML handling and the three passes.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`manifest`] | Person and place manifest reading |
//! | [`document`] | TEI element tree, parsing and serialization |
//! | [`http`] | Shared blocking HTTP client and error type |
//! | [`wikidata`] | Wikidata fact source |
//! | [`gnd`] | GND fact source (DNB SRU, MARC21-xml) |
//! | [`geonames`] | GeoNames lookups for places |
//! | [`builder`] | Enriched person → TEI elements |
//! | [`persons`] | Persons pass |
//! | [`places`] | Places pass |
//! | [`organizations`] | Organizations pass |
//! | [`pass`] | Templates and pass summaries |
//! | [`progress`] | Per-record progress on stderr |
//! | [`sources`] | `enrich check` status listing |

pub mod builder;
pub mod config;
pub mod document;
pub mod geonames;
pub mod gnd;
pub mod http;
pub mod manifest;
pub mod organizations;
pub mod pass;
pub mod persons;
pub mod places;
pub mod progress;
pub mod sources;
pub mod wikidata;
