//! # SourceFinder
//!
//! Citation annotation for AI research answers.
//!
//! An answer from the research endpoint arrives as text with `[n]` markers
//! plus a list of source records. SourceFinder resolves every marker
//! against that list, renders the answer with linked (or flagged) markers,
//! and builds the source panel that accompanies it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────────┐   ┌──────────────┐
//! │ ChatResponse │──▶│ sourcefinder-   │──▶│   render     │
//! │ (JSON)       │   │ core::annotate  │   │ md/html/json │
//! └──────────────┘   └────────┬────────┘   └──────────────┘
//!                             ▼
//!                     ┌────────────────┐
//!                     │ CitationReport │
//!                     └────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`response`] | Chat response loading |
//! | [`render`] | Answer and source panel rendering |
//! | [`commands`] | `sf` subcommand implementations |
//! | [`logging`] | `tracing` subscriber setup |

pub mod commands;
pub mod config;
pub mod logging;
pub mod render;
pub mod response;
