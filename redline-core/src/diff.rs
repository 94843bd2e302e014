//! Line-level differ.
//!
//! Both inputs are split into lines and aligned with a Myers minimal edit
//! script (via `similar`). The alignment is shared with the full-file
//! segmenter so hunks and segments always agree on what changed.

use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffOp, DiffTag};

use crate::types::{DiffSummary, Hunk, Line};

/// Context lines carried on each side of a hunk when none is configured.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Splits `text` into lines on `\n`.
///
/// The empty string has no lines at all, so creating or deleting a whole file
/// diffs as pure additions or removals. Any other text keeps a trailing empty
/// line when it ends in a newline; joining the result with `\n` gives back
/// the exact input.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

/// Aligns two line slices. Adjacent delete/insert runs come back as a single
/// `Replace` op.
pub(crate) fn align(old: &[&str], new: &[&str]) -> Vec<DiffOp> {
    capture_diff_slices(Algorithm::Myers, old, new)
}

/// Computes the summary view of the changes from `original` to `proposed`.
///
/// Changes separated by at most `2 * context_lines` unchanged lines share a
/// hunk. Each hunk is padded with up to `context_lines` unchanged lines on
/// either side, clipped at the file boundaries.
pub fn compute_diff_hunks(original: &str, proposed: &str, context_lines: usize) -> DiffSummary {
    let old = split_lines(original);
    let new = split_lines(proposed);
    let ops = align(&old, &new);

    let mut summary = DiffSummary::default();
    for (index, group) in group_diff_ops(ops, context_lines).into_iter().enumerate() {
        for op in &group {
            match op.tag() {
                DiffTag::Equal => {}
                DiffTag::Delete => summary.deletions += op.old_range().len(),
                DiffTag::Insert => summary.additions += op.new_range().len(),
                DiffTag::Replace => {
                    summary.deletions += op.old_range().len();
                    summary.additions += op.new_range().len();
                }
            }
        }
        summary.hunks.push(build_hunk(index, &group, &old, &new));
    }
    summary
}

fn build_hunk(index: usize, group: &[DiffOp], old: &[&str], new: &[&str]) -> Hunk {
    let mut lines = Vec::new();
    for op in group {
        lines.extend(op_lines(op, old, new));
    }

    let old_first = group.first().map(|op| op.old_range().start).unwrap_or(0);
    let old_end = group.last().map(|op| op.old_range().end).unwrap_or(old_first);
    let new_first = group.first().map(|op| op.new_range().start).unwrap_or(0);
    let new_end = group.last().map(|op| op.new_range().end).unwrap_or(new_first);

    let old_lines = old_end.saturating_sub(old_first) as u32;
    let new_lines = new_end.saturating_sub(new_first) as u32;

    Hunk {
        id: format!("hunk-{index}"),
        old_start: unified_start(old_first, old_lines),
        old_lines,
        new_start: unified_start(new_first, new_lines),
        new_lines,
        lines,
    }
}

/// Unified-diff start line: 1-based, except an empty side points at the line
/// before the change.
fn unified_start(first_index: usize, len: u32) -> u32 {
    if len == 0 {
        first_index as u32
    } else {
        lineno(first_index)
    }
}

/// 0-based slice index to 1-based line number.
pub(crate) fn lineno(index: usize) -> u32 {
    (index + 1) as u32
}

/// Expands one alignment op into tagged lines. Replacements list every
/// removed line before the added ones.
pub(crate) fn op_lines(op: &DiffOp, old: &[&str], new: &[&str]) -> Vec<Line> {
    match op.tag() {
        DiffTag::Equal => op
            .old_range()
            .zip(op.new_range())
            .filter_map(|(o, n)| Some(Line::context(old.get(o)?, lineno(o), lineno(n))))
            .collect(),
        DiffTag::Delete => removed_lines(op, old),
        DiffTag::Insert => added_lines(op, new),
        DiffTag::Replace => {
            let mut lines = removed_lines(op, old);
            lines.extend(added_lines(op, new));
            lines
        }
    }
}

fn removed_lines(op: &DiffOp, old: &[&str]) -> Vec<Line> {
    op.old_range()
        .filter_map(|o| Some(Line::removed(old.get(o)?, lineno(o))))
        .collect()
}

fn added_lines(op: &DiffOp, new: &[&str]) -> Vec<Line> {
    op.new_range()
        .filter_map(|n| Some(Line::added(new.get(n)?, lineno(n))))
        .collect()
}
