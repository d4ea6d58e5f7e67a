//! Citation marker annotation.
//!
//! Splits answer text into [`Segment`]s: plain text spans and `[n]`
//! citation markers, each marker resolved against the answer's source list
//! or explicitly flagged as unresolved.
//!
//! # Algorithm
//!
//! 1. Scan the text once, left to right, for non-overlapping matches of
//!    `\[([0-9]+)\]`. Only ASCII digits count.
//! 2. Parse the digits. Numbers above `i32::MAX` are not citations; the
//!    token stays part of the surrounding text.
//! 3. Resolve the number according to the [`ResolutionPolicy`]. The default
//!    tries an exact `number` match first (first record wins on duplicates),
//!    then the 1-based position in the list.
//! 4. Emit the text before each marker (skipping empty spans), the marker
//!    itself, and finally any trailing text.
//!
//! A marker that resolves to nothing is never replaced by an unrelated
//! source; it becomes [`Segment::Unresolved`] with its text intact.
//!
//! # Guarantees
//!
//! - Concatenating [`Segment::raw`] over the output reproduces the input.
//! - Pure and deterministic: no I/O, no global mutable state.
//! - Total: every input yields a result, nothing panics.
//!
//! # Example
//!
//! ```rust
//! use sourcefinder_core::{annotate, SegmentKind, SourceRecord};
//!
//! let sources = vec![SourceRecord::new(1, "Only")];
//! let segments = annotate("[1] and [7] disagree.", &sources);
//! assert_eq!(segments[0].kind(), SegmentKind::ResolvedReference);
//! assert_eq!(segments[2].kind(), SegmentKind::UnresolvedReference);
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::models::SourceRecord;

/// Largest accepted citation number.
const MAX_REFERENCE_NUMBER: u32 = i32::MAX as u32;

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([0-9]+)\]").expect("citation marker pattern is valid"))
}

/// How a citation number is matched to a source record.
///
/// Deserializes through [`FromStr`], so config files accept the same
/// spellings as the command line (`exact-then-positional`, `Exact`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ResolutionPolicy {
    /// Exact `number` match, then 1-based position.
    #[default]
    ExactThenPositional,
    /// Exact `number` match only.
    Exact,
    /// 1-based position only.
    Positional,
}

impl ResolutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::ExactThenPositional => "exact_then_positional",
            ResolutionPolicy::Exact => "exact",
            ResolutionPolicy::Positional => "positional",
        }
    }
}

impl FromStr for ResolutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "exact_then_positional" => Ok(ResolutionPolicy::ExactThenPositional),
            "exact" => Ok(ResolutionPolicy::Exact),
            "positional" => Ok(ResolutionPolicy::Positional),
            other => Err(format!(
                "Unknown resolution policy: '{}'. Use exact_then_positional, exact, or positional.",
                other
            )),
        }
    }
}

impl TryFrom<String> for ResolutionPolicy {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of a [`Segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    ResolvedReference,
    UnresolvedReference,
}

/// A span of annotated text. Borrows from the text and source list it was
/// produced from and lives only as long as one render pass.
///
/// A single lifetime covers both borrows: a `Segment<'a>` is valid only
/// while the text and the source list both are, even for
/// [`Segment::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Segment<'a> {
    #[serde(rename = "text")]
    Text { raw: &'a str },
    #[serde(rename = "resolved_reference")]
    Resolved {
        raw: &'a str,
        #[serde(rename = "reference_number")]
        number: u32,
        source: &'a SourceRecord,
    },
    #[serde(rename = "unresolved_reference")]
    Unresolved {
        raw: &'a str,
        #[serde(rename = "reference_number")]
        number: u32,
    },
}

impl<'a> Segment<'a> {
    /// The exact substring of the input this segment covers.
    pub fn raw(&self) -> &'a str {
        match *self {
            Segment::Text { raw }
            | Segment::Resolved { raw, .. }
            | Segment::Unresolved { raw, .. } => raw,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Text { .. } => SegmentKind::Text,
            Segment::Resolved { .. } => SegmentKind::ResolvedReference,
            Segment::Unresolved { .. } => SegmentKind::UnresolvedReference,
        }
    }

    /// Parsed citation number, for either reference kind.
    pub fn reference_number(&self) -> Option<u32> {
        match self {
            Segment::Text { .. } => None,
            Segment::Resolved { number, .. } | Segment::Unresolved { number, .. } => Some(*number),
        }
    }

    /// The matched source, for resolved references.
    pub fn source(&self) -> Option<&'a SourceRecord> {
        match *self {
            Segment::Resolved { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self, Segment::Text { .. })
    }
}

/// Citation annotator parameterised by a [`ResolutionPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Annotator {
    policy: ResolutionPolicy,
}

impl Annotator {
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Split `text` into segments, resolving each citation marker against
    /// `sources`.
    ///
    /// Both inputs share the lifetime `'a`, so every segment (text spans
    /// included) keeps `sources` borrowed. Bind the source list to a local
    /// before annotating; a temporary is dropped while the segments still
    /// point into it.
    pub fn annotate<'a>(&self, text: &'a str, sources: &'a [SourceRecord]) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();
        // Start of the text span not yet emitted.
        let mut pending = 0;

        for caps in marker_pattern().captures_iter(text) {
            let (Some(marker), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Some(number) = parse_reference_number(digits.as_str()) else {
                continue;
            };

            if marker.start() > pending {
                segments.push(Segment::Text {
                    raw: &text[pending..marker.start()],
                });
            }

            let raw = marker.as_str();
            segments.push(match self.lookup(number, sources) {
                Some(source) => Segment::Resolved {
                    raw,
                    number,
                    source,
                },
                None => Segment::Unresolved { raw, number },
            });
            pending = marker.end();
        }

        if pending < text.len() {
            segments.push(Segment::Text {
                raw: &text[pending..],
            });
        }

        segments
    }

    fn lookup<'a>(&self, number: u32, sources: &'a [SourceRecord]) -> Option<&'a SourceRecord> {
        let exact = || sources.iter().find(|s| s.number == number);
        let positional = || {
            (number as usize)
                .checked_sub(1)
                .and_then(|index| sources.get(index))
        };

        match self.policy {
            ResolutionPolicy::ExactThenPositional => exact().or_else(positional),
            ResolutionPolicy::Exact => exact(),
            ResolutionPolicy::Positional => positional(),
        }
    }
}

/// Annotate with the default exact-then-positional policy.
pub fn annotate<'a>(text: &'a str, sources: &'a [SourceRecord]) -> Vec<Segment<'a>> {
    Annotator::default().annotate(text, sources)
}

fn parse_reference_number(digits: &str) -> Option<u32> {
    digits
        .parse::<u32>()
        .ok()
        .filter(|n| *n <= MAX_REFERENCE_NUMBER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(segments: &[Segment<'_>]) -> String {
        segments.iter().map(|s| s.raw()).collect()
    }

    fn titled(pairs: &[(u32, &str)]) -> Vec<SourceRecord> {
        pairs
            .iter()
            .map(|(n, t)| SourceRecord::new(*n, *t))
            .collect()
    }

    #[test]
    fn test_round_trip_reconstructs_text() {
        let sources = titled(&[(1, "A"), (2, "B")]);
        let inputs = [
            "",
            "no refs at all",
            "[1]",
            "Start [1] middle [2][3] end",
            "[[1]] nested and [abc] and [3 unterminated",
            "unicode ┌─┐ [2] — café [9]",
            "[99999999999999] too big",
        ];
        for input in inputs {
            assert_eq!(joined(&annotate(input, &sources)), input);
            assert_eq!(joined(&annotate(input, &[])), input);
        }
    }

    #[test]
    fn test_no_markers_single_text_segment() {
        let sources: Vec<SourceRecord> = Vec::new();
        let segments = annotate("plain text, no refs", &sources);
        assert_eq!(
            segments,
            vec![Segment::Text {
                raw: "plain text, no refs"
            }]
        );
    }

    #[test]
    fn test_empty_text_no_segments() {
        assert!(annotate("", &titled(&[(1, "A")])).is_empty());
    }

    #[test]
    fn test_exact_number_resolution() {
        let sources = titled(&[(5, "A"), (2, "B")]);
        let segments = annotate("See [5] and [2].", &sources);
        let refs: Vec<_> = segments.iter().filter(|s| s.is_reference()).collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].source().map(|s| s.title.as_str()), Some("A"));
        assert_eq!(refs[1].source().map(|s| s.title.as_str()), Some("B"));
    }

    #[test]
    fn test_positional_fallback() {
        let sources = titled(&[(10, "X"), (20, "Y")]);
        let segments = annotate("[1] claims...", &sources);
        assert_eq!(segments[0].kind(), SegmentKind::ResolvedReference);
        assert_eq!(segments[0].source().map(|s| s.title.as_str()), Some("X"));
        assert_eq!(segments[1], Segment::Text { raw: " claims..." });
    }

    #[test]
    fn test_unmatched_marker_is_not_guessed() {
        let sources = titled(&[(1, "Only")]);
        let segments = annotate("[1] and [7] disagree.", &sources);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].source().map(|s| s.title.as_str()), Some("Only"));
        assert_eq!(
            segments[2],
            Segment::Unresolved {
                raw: "[7]",
                number: 7
            }
        );
        assert!(segments[2].source().is_none());
    }

    #[test]
    fn test_empty_sources_adjacent_markers() {
        let sources: Vec<SourceRecord> = Vec::new();
        let segments = annotate("Evidence [1][2].", &sources);
        assert_eq!(
            segments,
            vec![
                Segment::Text { raw: "Evidence " },
                Segment::Unresolved {
                    raw: "[1]",
                    number: 1
                },
                Segment::Unresolved {
                    raw: "[2]",
                    number: 2
                },
                Segment::Text { raw: "." },
            ]
        );
    }

    #[test]
    fn test_repeated_marker_resolves_each_time() {
        let sources = titled(&[(3, "Three")]);
        let segments = annotate("[3] ... [3] again", &sources);
        let resolved: Vec<_> = segments
            .iter()
            .filter(|s| s.kind() == SegmentKind::ResolvedReference)
            .collect();
        assert_eq!(resolved.len(), 2);
        assert!(std::ptr::eq(
            resolved[0].source().unwrap(),
            resolved[1].source().unwrap()
        ));
        assert!(std::ptr::eq(resolved[0].source().unwrap(), &sources[0]));
    }

    #[test]
    fn test_duplicate_numbers_first_wins() {
        let sources = titled(&[(4, "First"), (4, "Second")]);
        let segments = annotate("[4]", &sources);
        assert_eq!(segments[0].source().map(|s| s.title.as_str()), Some("First"));
    }

    #[test]
    fn test_exact_match_beats_position() {
        // [2] exists as number 2 at position 1; position 2 holds number 1.
        let sources = titled(&[(2, "Two"), (1, "One")]);
        let segments = annotate("[2]", &sources);
        assert_eq!(segments[0].source().map(|s| s.title.as_str()), Some("Two"));
    }

    #[test]
    fn test_zero_is_unresolved() {
        let sources = titled(&[(5, "A")]);
        let segments = annotate("[0]", &sources);
        assert_eq!(segments[0].kind(), SegmentKind::UnresolvedReference);
        assert_eq!(segments[0].reference_number(), Some(0));
    }

    #[test]
    fn test_malformed_markers_pass_through() {
        let sources = titled(&[(3, "A")]);
        let segments = annotate("[abc] and [3 and [] and [ 1 ]", &sources);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind(), SegmentKind::Text);
    }

    #[test]
    fn test_overflowing_number_stays_text() {
        let sources = titled(&[(1, "A")]);
        let segments = annotate("before [99999999999999] after [1]", &sources);
        assert_eq!(
            segments[0],
            Segment::Text {
                raw: "before [99999999999999] after "
            }
        );
        assert_eq!(segments[1].kind(), SegmentKind::ResolvedReference);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_i32_max_boundary() {
        let max = format!("[{}]", i32::MAX);
        let over = format!("[{}]", i32::MAX as u64 + 1);
        assert_eq!(annotate(&max, &[])[0].kind(), SegmentKind::UnresolvedReference);
        assert_eq!(annotate(&over, &[])[0].kind(), SegmentKind::Text);
    }

    #[test]
    fn test_raw_marker_not_normalized() {
        let sources = titled(&[(3, "A")]);
        let segments = annotate("x[003]y", &sources);
        assert_eq!(segments[1].raw(), "[003]");
        assert_eq!(segments[1].reference_number(), Some(3));
        assert_eq!(segments[1].kind(), SegmentKind::ResolvedReference);
    }

    #[test]
    fn test_non_ascii_digits_ignored() {
        let sources = titled(&[(1, "A")]);
        let segments = annotate("[١] arabic-indic one", &sources);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind(), SegmentKind::Text);
    }

    #[test]
    fn test_nested_brackets() {
        let sources = titled(&[(1, "A")]);
        let segments = annotate("[[1]]", &sources);
        assert_eq!(joined(&segments), "[[1]]");
        assert_eq!(segments[0], Segment::Text { raw: "[" });
        assert_eq!(segments[1].raw(), "[1]");
        assert_eq!(segments[2], Segment::Text { raw: "]" });
    }

    #[test]
    fn test_exact_policy_skips_position() {
        let sources = titled(&[(10, "X")]);
        let annotator = Annotator::new(ResolutionPolicy::Exact);
        let segments = annotator.annotate("[1] [10]", &sources);
        assert_eq!(segments[0].kind(), SegmentKind::UnresolvedReference);
        assert_eq!(segments[2].source().map(|s| s.title.as_str()), Some("X"));
    }

    #[test]
    fn test_positional_policy_skips_number() {
        let sources = titled(&[(10, "X"), (1, "Y")]);
        let annotator = Annotator::new(ResolutionPolicy::Positional);
        let segments = annotator.annotate("[1] [10]", &sources);
        assert_eq!(segments[0].source().map(|s| s.title.as_str()), Some("X"));
        assert_eq!(segments[2].kind(), SegmentKind::UnresolvedReference);
    }

    #[test]
    fn test_deterministic() {
        let sources = titled(&[(1, "A"), (2, "B")]);
        let text = "a [1] b [2] c [3]";
        assert_eq!(annotate(text, &sources), annotate(text, &sources));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "exact-then-positional".parse::<ResolutionPolicy>().unwrap(),
            ResolutionPolicy::ExactThenPositional
        );
        assert_eq!("EXACT".parse::<ResolutionPolicy>().unwrap(), ResolutionPolicy::Exact);
        assert!("first".parse::<ResolutionPolicy>().is_err());
    }

    #[test]
    fn test_policy_serde_matches_from_str() {
        let policy: ResolutionPolicy = serde_json::from_str("\"Exact-Then-Positional\"").unwrap();
        assert_eq!(policy, ResolutionPolicy::ExactThenPositional);
        assert_eq!(
            serde_json::to_string(&ResolutionPolicy::ExactThenPositional).unwrap(),
            "\"exact_then_positional\""
        );
        assert!(serde_json::from_str::<ResolutionPolicy>("\"first\"").is_err());
    }

    #[test]
    fn test_segment_json_shape() {
        let sources = titled(&[(1, "A")]);
        let segments = annotate("x [1] [2]", &sources);
        let json = serde_json::to_value(&segments).unwrap();
        assert_eq!(json[0]["kind"], "text");
        assert_eq!(json[1]["kind"], "resolved_reference");
        assert_eq!(json[1]["reference_number"], 1);
        assert_eq!(json[1]["source"]["title"], "A");
        assert_eq!(json[3]["kind"], "unresolved_reference");
        assert_eq!(json[3]["raw"], "[2]");
    }
}
