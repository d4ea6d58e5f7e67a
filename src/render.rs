//! Presentation of annotated answers and source panels.
//!
//! Maps [`Segment`]s to one of four output formats. Resolved markers become
//! links (when the source has a usable link), unresolved markers keep their
//! text and gain a warning glyph so readers can tell them apart.

use anyhow::Result;
use serde::Deserialize;
use sourcefinder_core::{CitationReport, Segment, SourceRecord};
use std::fmt::{self, Write};
use std::str::FromStr;

use crate::config::RenderConfig;

/// Accepts the same spellings from TOML as from `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    Plain,
    #[default]
    Markdown,
    Html,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(OutputFormat::Plain),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "Unknown output format: '{}'. Use plain, markdown, html, or json.",
                other
            )),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        })
    }
}

/// Render the annotated answer body.
pub fn render_segments(
    segments: &[Segment<'_>],
    format: OutputFormat,
    cfg: &RenderConfig,
) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(segments)?);
    }

    let mut out = String::new();
    for segment in segments {
        match format {
            OutputFormat::Plain => write_plain(&mut out, segment, cfg),
            OutputFormat::Markdown => write_markdown(&mut out, segment, cfg),
            OutputFormat::Html => write_html(&mut out, segment, cfg),
            OutputFormat::Json => unreachable!("handled above"),
        }
    }
    Ok(out)
}

fn write_plain(out: &mut String, segment: &Segment<'_>, cfg: &RenderConfig) {
    out.push_str(segment.raw());
    if let Segment::Unresolved { .. } = segment {
        out.push_str(&cfg.unresolved_glyph);
    }
}

fn write_markdown(out: &mut String, segment: &Segment<'_>, cfg: &RenderConfig) {
    match segment {
        Segment::Text { raw } => out.push_str(raw),
        Segment::Resolved { raw, source, .. } => match source.href() {
            Some(href) => {
                let _ = write!(out, "[\\[{}\\]]({})", marker_digits(raw), markdown_href(href));
            }
            None => out.push_str(raw),
        },
        Segment::Unresolved { raw, .. } => {
            out.push_str(raw);
            out.push_str(&cfg.unresolved_glyph);
        }
    }
}

fn write_html(out: &mut String, segment: &Segment<'_>, cfg: &RenderConfig) {
    match segment {
        Segment::Text { raw } => out.push_str(&escape_html(raw)),
        Segment::Resolved {
            raw,
            number,
            source,
        } => {
            let class = if source.verified {
                "ref ref-verified"
            } else {
                "ref ref-unverified"
            };
            let title = escape_html(&source.title);
            match source.href() {
                Some(href) => {
                    let _ = write!(
                        out,
                        "<a class=\"{}\" href=\"{}\" title=\"{}\" data-ref=\"{}\"{}>{}</a>",
                        class,
                        escape_html(href),
                        title,
                        number,
                        if cfg.open_links_in_new_tab {
                            " target=\"_blank\" rel=\"noopener noreferrer\""
                        } else {
                            ""
                        },
                        escape_html(raw),
                    );
                }
                None => {
                    let _ = write!(
                        out,
                        "<span class=\"{}\" title=\"{}\" data-ref=\"{}\">{}</span>",
                        class,
                        title,
                        number,
                        escape_html(raw),
                    );
                }
            }
        }
        Segment::Unresolved { raw, number } => {
            let _ = write!(
                out,
                "<span class=\"ref ref-unresolved\" title=\"Source not found\" data-ref=\"{}\">{}{}</span>",
                number,
                escape_html(raw),
                escape_html(&cfg.unresolved_glyph),
            );
        }
    }
}

/// Render the source cards for one answer: cited sources first, then the
/// uncited ones when `show_uncited` is set. Empty when there is nothing to
/// show.
pub fn render_source_panel(
    report: &CitationReport<'_>,
    format: OutputFormat,
    cfg: &RenderConfig,
) -> Result<String> {
    let uncited: &[&SourceRecord] = if cfg.show_uncited {
        &report.uncited[..]
    } else {
        &[][..]
    };

    if format == OutputFormat::Json {
        let panel = serde_json::json!({
            "cited": report.cited,
            "uncited": uncited,
        });
        return Ok(serde_json::to_string_pretty(&panel)?);
    }

    if report.cited.is_empty() && uncited.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::new();
    match format {
        OutputFormat::Plain => {
            write_plain_cards(&mut out, "Sources", &report.cited, cfg);
            write_plain_cards(&mut out, "Also retrieved", uncited, cfg);
        }
        OutputFormat::Markdown => {
            write_markdown_cards(&mut out, "Sources", &report.cited, cfg);
            write_markdown_cards(&mut out, "Also retrieved", uncited, cfg);
        }
        OutputFormat::Html => {
            write_html_cards(&mut out, "sources-cited", &report.cited, cfg);
            write_html_cards(&mut out, "sources-uncited", uncited, cfg);
        }
        OutputFormat::Json => unreachable!("handled above"),
    }
    Ok(out)
}

fn badge<'c>(source: &SourceRecord, cfg: &'c RenderConfig) -> &'c str {
    if source.verified {
        &cfg.verified_badge
    } else {
        &cfg.unverified_badge
    }
}

fn write_plain_cards(out: &mut String, heading: &str, cards: &[&SourceRecord], cfg: &RenderConfig) {
    if cards.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", heading);
    for source in cards {
        let _ = writeln!(
            out,
            "  [{}] {} ({}, {})",
            source.number,
            source.title,
            source.provider,
            badge(source, cfg)
        );
        if let Some(href) = source.href() {
            let _ = writeln!(out, "      {}", href);
        }
        if let Some(preview) = preview(source, cfg) {
            let _ = writeln!(out, "      {}", preview);
        }
    }
}

fn write_markdown_cards(
    out: &mut String,
    heading: &str,
    cards: &[&SourceRecord],
    cfg: &RenderConfig,
) {
    if cards.is_empty() {
        return;
    }
    let _ = writeln!(out, "**{}**\n", heading);
    for source in cards {
        let label = escape_markdown_label(&source.title);
        let title = match source.href() {
            Some(href) => format!("[{}]({})", label, markdown_href(href)),
            None => label,
        };
        let _ = writeln!(
            out,
            "- **[{}]** {} · {} · {}",
            source.number,
            title,
            source.provider,
            badge(source, cfg)
        );
        if let Some(preview) = preview(source, cfg) {
            let _ = writeln!(out, "  > {}", preview);
        }
    }
    out.push('\n');
}

fn write_html_cards(out: &mut String, class: &str, cards: &[&SourceRecord], cfg: &RenderConfig) {
    if cards.is_empty() {
        return;
    }
    let _ = writeln!(out, "<ol class=\"sources {}\">", class);
    for source in cards {
        let verification = if source.verified {
            "source-verified"
        } else {
            "source-unverified"
        };
        let _ = write!(
            out,
            "<li class=\"source source-{} {}\" data-ref=\"{}\">",
            source.provider.bucket(),
            verification,
            source.number
        );
        match source.href() {
            Some(href) => {
                let _ = write!(
                    out,
                    "<a href=\"{}\"{}>{}</a>",
                    escape_html(href),
                    if cfg.open_links_in_new_tab {
                        " target=\"_blank\" rel=\"noopener noreferrer\""
                    } else {
                        ""
                    },
                    escape_html(&source.title)
                );
            }
            None => out.push_str(&escape_html(&source.title)),
        }
        let _ = write!(
            out,
            " <span class=\"provider\">{}</span> <span class=\"badge\">{}</span>",
            escape_html(source.provider.label()),
            escape_html(badge(source, cfg))
        );
        if let Some(preview) = preview(source, cfg) {
            let _ = write!(out, "<p class=\"preview\">{}</p>", escape_html(&preview));
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ol>\n");
}

fn preview(source: &SourceRecord, cfg: &RenderConfig) -> Option<String> {
    source
        .preview
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| truncate_chars(p, cfg.max_preview_chars))
}

/// Cut `text` to at most `max` chars, marking the cut with `…`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn marker_digits(raw: &str) -> &str {
    raw.trim_start_matches('[').trim_end_matches(']')
}

/// Backslash-escape the characters that would end or nest a link label.
fn escape_markdown_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Links with spaces or parentheses need angle brackets in CommonMark.
fn markdown_href(href: &str) -> String {
    if href.contains(&[' ', '(', ')'][..]) {
        format!("<{}>", href)
    } else {
        href.to_string()
    }
}
