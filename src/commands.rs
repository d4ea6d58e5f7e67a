//! `sf` subcommands.
//!
//! Each command loads one chat response, annotates it, and prints to
//! stdout. Unresolved markers are logged here rather than in the annotator,
//! which stays free of side effects.

use anyhow::{bail, Result};
use sourcefinder_core::{Annotator, CitationReport, ResolutionPolicy, Segment};
use std::path::Path;
use tracing::{debug, info_span, warn};

use crate::config::{Config, RenderConfig};
use crate::render::{render_segments, render_source_panel, OutputFormat};
use crate::response::{load_response, ChatResponse};

/// Render an answer and, optionally, its source panel.
///
/// JSON output is a single object holding the session id, the segments, and
/// the citation report.
pub fn render_response(
    response: &ChatResponse,
    policy: ResolutionPolicy,
    format: OutputFormat,
    cfg: &RenderConfig,
    with_sources: bool,
) -> Result<String> {
    let segments = Annotator::new(policy).annotate(&response.answer, &response.sources);
    log_unresolved(&segments);
    let report = CitationReport::from_segments(&segments, &response.sources);
    debug!(
        markers = report.total_markers,
        resolved = report.resolved,
        unresolved = report.unresolved,
        "annotated answer"
    );

    if format == OutputFormat::Json {
        let mut doc = serde_json::json!({
            "session_id": response.session_id,
            "segments": segments,
        });
        if with_sources {
            doc["report"] = serde_json::to_value(&report)?;
        }
        return Ok(serde_json::to_string_pretty(&doc)?);
    }

    let mut out = render_segments(&segments, format, cfg)?;
    if !out.ends_with('\n') {
        out.push('\n');
    }
    if with_sources {
        let panel = render_source_panel(&report, format, cfg)?;
        if !panel.is_empty() {
            out.push('\n');
            out.push_str(&panel);
        }
    }
    Ok(out)
}

fn log_unresolved(segments: &[Segment<'_>]) {
    for segment in segments {
        if let Segment::Unresolved { raw, number } = segment {
            warn!(number, marker = *raw, "citation marker has no matching source");
        }
    }
}

pub fn run_annotate(
    config: &Config,
    input: Option<&Path>,
    format: Option<OutputFormat>,
    policy: Option<ResolutionPolicy>,
    with_sources: bool,
) -> Result<()> {
    let response = load_response(input)?;
    let policy = policy.unwrap_or(config.annotate.policy);
    let format = format.unwrap_or(config.render.format);

    let span = info_span!("annotate", session = response.session_label(), %policy, %format);
    let _guard = span.enter();

    let out = render_response(&response, policy, format, &config.render, with_sources)?;
    print!("{}", out);
    Ok(())
}

/// Print the citation report; fail when any marker is unresolved.
pub fn run_check(config: &Config, input: Option<&Path>, policy: Option<ResolutionPolicy>) -> Result<()> {
    let response = load_response(input)?;
    let policy = policy.unwrap_or(config.annotate.policy);

    let span = info_span!("check", session = response.session_label(), %policy);
    let _guard = span.enter();

    let segments = Annotator::new(policy).annotate(&response.answer, &response.sources);
    log_unresolved(&segments);
    let report = CitationReport::from_segments(&segments, &response.sources);

    println!("session:     {}", response.session_label());
    println!("policy:      {}", policy);
    println!("markers:     {}", report.total_markers);
    println!("resolved:    {}", report.resolved);
    println!(
        "unresolved:  {}{}",
        report.unresolved,
        format_numbers(&report.unresolved_numbers)
    );
    println!(
        "cited:       {} of {} sources ({} verified)",
        report.cited.len(),
        response.sources.len(),
        report.verified_cited
    );

    if !report.is_clean() {
        bail!(
            "{} unresolved citation marker(s): {}",
            report.unresolved,
            report
                .unresolved_numbers
                .iter()
                .map(|n| format!("[{}]", n))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    println!("ok");
    Ok(())
}

fn format_numbers(numbers: &[u32]) -> String {
    if numbers.is_empty() {
        return String::new();
    }
    let list: Vec<String> = numbers.iter().map(|n| format!("[{}]", n)).collect();
    format!(" ({})", list.join(", "))
}

/// List the response's source records.
pub fn run_sources(input: Option<&Path>) -> Result<()> {
    let response = load_response(input)?;

    if response.sources.is_empty() {
        println!("No sources.");
        return Ok(());
    }

    println!("{:<5} {:<12} {:<10} TITLE", "NUM", "PROVIDER", "VERIFIED");
    for source in &response.sources {
        println!(
            "{:<5} {:<12} {:<10} {}",
            source.number,
            source.provider.label(),
            if source.verified { "yes" } else { "no" },
            source.title
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::parse_response;

    fn response() -> ChatResponse {
        parse_response(
            r#"{
                "session_id": "s-42",
                "answer": "Borrowing prevents data races [1]. Some disagree [3].",
                "sources": [
                    {"number": 1, "title": "Fearless Concurrency", "link": "https://doc.rust-lang.org/book/ch16-00-concurrency.html",
                     "provider": "Academic", "verified": true},
                    {"number": 2, "title": "HN thread", "provider": "News"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_render_markdown_with_panel() {
        let out = render_response(
            &response(),
            ResolutionPolicy::default(),
            OutputFormat::Markdown,
            &RenderConfig::default(),
            true,
        )
        .unwrap();
        assert!(out.starts_with(
            "Borrowing prevents data races [\\[1\\]](https://doc.rust-lang.org/book/ch16-00-concurrency.html). Some disagree [3]⚠.\n"
        ));
        assert!(out.contains("**Sources**"));
        assert!(out.contains("**Also retrieved**"));
        assert!(out.contains("HN thread · News · unverified"));
    }

    #[test]
    fn test_render_without_panel() {
        let out = render_response(
            &response(),
            ResolutionPolicy::default(),
            OutputFormat::Plain,
            &RenderConfig::default(),
            false,
        )
        .unwrap();
        assert_eq!(
            out,
            "Borrowing prevents data races [1]. Some disagree [3]⚠.\n"
        );
    }

    #[test]
    fn test_render_json_document() {
        let out = render_response(
            &response(),
            ResolutionPolicy::default(),
            OutputFormat::Json,
            &RenderConfig::default(),
            true,
        )
        .unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["session_id"], "s-42");
        assert_eq!(doc["segments"][1]["kind"], "resolved_reference");
        assert_eq!(doc["segments"][3]["kind"], "unresolved_reference");
        assert_eq!(doc["report"]["unresolved_numbers"][0], 3);
        assert_eq!(doc["report"]["cited"][0]["title"], "Fearless Concurrency");
    }

    #[test]
    fn test_positional_policy_changes_resolution() {
        // Positionally, [3] is still out of range and [1] is the first record.
        let out = render_response(
            &response(),
            ResolutionPolicy::Positional,
            OutputFormat::Plain,
            &RenderConfig::default(),
            false,
        )
        .unwrap();
        assert!(out.contains("[1]. "));
        assert!(out.contains("[3]⚠"));
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(format_numbers(&[]), "");
        assert_eq!(format_numbers(&[2, 9]), " ([2], [9])");
    }
}
