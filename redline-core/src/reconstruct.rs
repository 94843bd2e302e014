//! Content reconstruction from segments and decisions.
//!
//! Everything here is a pure function of `(segments, state, mode)`. Callers
//! that want caching key it on those inputs themselves.

use std::collections::BTreeMap;

use crate::decision::{Decision, DecisionState};
use crate::segment::change_blocks;
use crate::types::{LineKind, Segment};

/// Resolves embedded media placeholders to final URLs.
///
/// Only consulted when producing download/copy output. The engine makes no
/// assumption about placeholder syntax.
pub trait PlaceholderResolver {
    fn resolve(&self, text: &str) -> String;
}

/// Resolver for content without placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlaceholders;

impl PlaceholderResolver for NoPlaceholders {
    fn resolve(&self, text: &str) -> String {
        text.to_owned()
    }
}

/// Selection policy for [`reconstruct`].
#[derive(Clone, Copy)]
pub enum Mode<'a> {
    /// Working copy: rejected blocks revert, everything else keeps the proposal.
    Live,
    /// Reviewer view: pending blocks show both sides.
    Preview,
    /// Live selection with placeholders resolved for copying or saving.
    Download(&'a dyn PlaceholderResolver),
}

/// One line of the preview, tagged with its diff type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLine {
    pub content: String,
    pub kind: LineKind,
    /// The change block this line belongs to, if any.
    pub block_id: Option<String>,
}

/// Inclusive 1-based preview line range occupied by a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRange {
    pub id: String,
    pub start: usize,
    pub end: usize,
}

/// Tally of decisions over the blocks of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewStats {
    pub accepted: usize,
    pub rejected: usize,
    pub pending: usize,
}

impl ReviewStats {
    pub fn total(&self) -> usize {
        self.accepted + self.rejected + self.pending
    }
}

pub fn reconstruct(segments: &[Segment], state: &DecisionState, mode: Mode<'_>) -> String {
    match mode {
        Mode::Live => live_lines(segments, state).join("\n"),
        Mode::Preview => preview_lines(segments, state)
            .iter()
            .map(|l| l.content.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        Mode::Download(resolver) => resolver.resolve(&live_lines(segments, state).join("\n")),
    }
}

/// Lines of the working copy, borrowed from the segments.
pub fn live_lines<'a>(segments: &'a [Segment], state: &DecisionState) -> Vec<&'a str> {
    let mut out = Vec::new();
    for seg in segments {
        match seg {
            Segment::Context(lines) => out.extend(lines.iter().map(|l| l.content.as_str())),
            Segment::Change(block) => {
                if state.is_rejected(&block.id) {
                    out.extend(block.removed().map(|l| l.content.as_str()));
                } else {
                    out.extend(block.added().map(|l| l.content.as_str()));
                }
            }
        }
    }
    out
}

pub fn preview_lines(segments: &[Segment], state: &DecisionState) -> Vec<PreviewLine> {
    let mut out = Vec::new();
    for seg in segments {
        match seg {
            Segment::Context(lines) => out.extend(lines.iter().map(|l| PreviewLine {
                content: l.content.clone(),
                kind: LineKind::Context,
                block_id: None,
            })),
            Segment::Change(block) => {
                let decision = state.decision(&block.id);
                let shown = block.lines.iter().filter(|l| match decision {
                    Decision::Accepted => l.kind == LineKind::Added,
                    Decision::Rejected => l.kind == LineKind::Removed,
                    Decision::Pending => true,
                });
                out.extend(shown.map(|l| PreviewLine {
                    content: l.content.clone(),
                    kind: l.kind,
                    block_id: Some(block.id.clone()),
                }));
            }
        }
    }
    out
}

/// Maps each 1-based preview line number to its diff type.
pub fn line_diff_map(segments: &[Segment], state: &DecisionState) -> BTreeMap<usize, LineKind> {
    preview_lines(segments, state)
        .into_iter()
        .enumerate()
        .map(|(i, l)| (i + 1, l.kind))
        .collect()
}

/// Where each block sits in the preview, for placing per-block actions.
///
/// A block whose chosen side is empty (an accepted pure deletion, say) has no
/// preview lines; it is anchored at the line where it would start, with
/// `end == start - 1`.
pub fn block_line_ranges(segments: &[Segment], state: &DecisionState) -> Vec<BlockRange> {
    let mut ranges = Vec::new();
    let mut next_line = 1usize;
    for seg in segments {
        match seg {
            Segment::Context(lines) => next_line += lines.len(),
            Segment::Change(block) => {
                let count = match state.decision(&block.id) {
                    Decision::Accepted => block.added().count(),
                    Decision::Rejected => block.removed().count(),
                    Decision::Pending => block.lines.len(),
                };
                ranges.push(BlockRange {
                    id: block.id.clone(),
                    start: next_line,
                    end: next_line + count - 1,
                });
                next_line += count;
            }
        }
    }
    ranges
}

pub fn review_stats(segments: &[Segment], state: &DecisionState) -> ReviewStats {
    let mut stats = ReviewStats::default();
    for block in change_blocks(segments) {
        match state.decision(&block.id) {
            Decision::Accepted => stats.accepted += 1,
            Decision::Rejected => stats.rejected += 1,
            Decision::Pending => stats.pending += 1,
        }
    }
    stats
}
