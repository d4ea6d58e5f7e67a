//! # SourceFinder Core
//!
//! Pure logic for SourceFinder: source models, citation marker annotation,
//! and citation reports.
//!
//! This crate performs no I/O and holds no global state. Every function is
//! a deterministic transform over its inputs, so it can be called from any
//! thread or render pass without coordination.

pub mod annotate;
pub mod models;
pub mod report;

pub use annotate::{annotate, Annotator, ResolutionPolicy, Segment, SegmentKind};
pub use models::{Provider, SourceRecord};
pub use report::CitationReport;
