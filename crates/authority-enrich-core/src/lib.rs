//! # Authority Enrich Core
//!
//! Shared, I/O-free logic for Authority Enrich: person models, the date
//! normalizer, the multi-source merge engine, and the [`source::FactSource`]
//! trait implemented by the knowledge-base adapters.
//!
//! This crate contains no HTTP clients, XML handling, or filesystem access.
//! Everything here is deterministic and can be exercised with in-memory
//! fact sets.

pub mod date;
pub mod merge;
pub mod models;
pub mod source;
