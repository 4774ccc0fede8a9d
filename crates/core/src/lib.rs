//! mapdiff-core
//!
//! Core library for analyzing GCC-style linker map files.
//!
//! This crate defines the section/memory model, the lenient map-file parser,
//! the section aggregator, the two build-to-build comparers (a name-level
//! summary compare and a file-attributed version diff), and a transient
//! result cache for large comparison payloads.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, HTTP glue, etc.).

pub mod aggregate;
pub mod cache;
pub mod compare;
pub mod config;
pub mod diff;
pub mod error;
pub mod format;
pub mod model;
pub mod parser;
pub mod services;

pub use aggregate::aggregate_sections;
pub use compare::{compare, CompareOptions, CompareResult};
pub use diff::{diff_versions, DiffOptions, DiffResult};
pub use model::{AggregatedSection, MemoryRegion, ParsedResult, Region, Section};
pub use parser::{parse_map, MapFileParser};
