//! Per-answer citation summary.
//!
//! Built from the segments of one annotation pass. Drives the source panel
//! (which sources the answer actually cites, and in what order) and the
//! unresolved-reference check.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::annotate::Segment;
use crate::models::SourceRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitationReport<'a> {
    /// Number of citation markers, counting repeats.
    pub total_markers: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Distinct numbers of unresolved markers, ascending.
    pub unresolved_numbers: Vec<u32>,
    /// Sources referenced by at least one marker, in first-citation order.
    pub cited: Vec<&'a SourceRecord>,
    /// Sources no marker resolved to, in list order.
    pub uncited: Vec<&'a SourceRecord>,
    /// How many of `cited` passed verification.
    pub verified_cited: usize,
}

impl<'a> CitationReport<'a> {
    /// Summarise `segments`, which must have been annotated against
    /// `sources`.
    pub fn from_segments(segments: &[Segment<'a>], sources: &'a [SourceRecord]) -> Self {
        let mut seen = vec![false; sources.len()];
        let mut cited = Vec::new();
        let mut unresolved_numbers = BTreeSet::new();
        let mut total_markers = 0;
        let mut resolved = 0;

        for segment in segments {
            match segment {
                Segment::Text { .. } => continue,
                Segment::Resolved { source, .. } => {
                    resolved += 1;
                    // Records are matched by identity; two equal records are
                    // still separate cards.
                    if let Some(index) = sources.iter().position(|s| std::ptr::eq(s, *source)) {
                        if !seen[index] {
                            seen[index] = true;
                            cited.push(&sources[index]);
                        }
                    }
                }
                Segment::Unresolved { number, .. } => {
                    unresolved_numbers.insert(*number);
                }
            }
            total_markers += 1;
        }

        let uncited = sources
            .iter()
            .zip(&seen)
            .filter(|(_, seen)| !**seen)
            .map(|(s, _)| s)
            .collect();
        let verified_cited = cited.iter().filter(|s| s.verified).count();

        Self {
            total_markers,
            resolved,
            unresolved: total_markers - resolved,
            unresolved_numbers: unresolved_numbers.into_iter().collect(),
            cited,
            uncited,
            verified_cited,
        }
    }

    /// True when every marker resolved.
    pub fn is_clean(&self) -> bool {
        self.unresolved == 0
    }
}
