//! Full-file segmenter.
//!
//! Unlike the hunk summary, the segment list covers every line of the file:
//! each unchanged run becomes one context segment no matter how long, and each
//! changed run becomes exactly one change block.

use similar::DiffTag;

use crate::diff::{align, op_lines, split_lines};
use crate::types::{ChangeBlock, Hunk, Line, LineKind, Segment};

/// Builds the ordered segment list covering the whole of both inputs.
///
/// `hunks` must come from [`crate::diff::compute_diff_hunks`] on the same two
/// inputs; it is only used to tag each block with the hunk it falls in. Block
/// ids depend on line positions alone, not on the hunk grouping.
pub fn compute_full_file_segments(original: &str, proposed: &str, hunks: &[Hunk]) -> Vec<Segment> {
    let old = split_lines(original);
    let new = split_lines(proposed);
    let owners = change_run_owners(hunks);

    let mut segments = Vec::new();
    let mut removed = Vec::new();
    let mut added = Vec::new();
    let mut block_count = 0usize;

    for op in align(&old, &new) {
        let lines = op_lines(&op, &old, &new);
        if op.tag() == DiffTag::Equal {
            if flush_block(&mut segments, &mut removed, &mut added, &owners, block_count) {
                block_count += 1;
            }
            if lines.is_empty() {
                continue;
            }
            match segments.last_mut() {
                Some(Segment::Context(existing)) => existing.extend(lines),
                _ => segments.push(Segment::Context(lines)),
            }
        } else {
            for line in lines {
                if line.kind == LineKind::Removed {
                    removed.push(line);
                } else {
                    added.push(line);
                }
            }
        }
    }
    flush_block(&mut segments, &mut removed, &mut added, &owners, block_count);

    segments
}

/// Emits the pending change run as a block. Returns `false` if there was none.
fn flush_block(
    segments: &mut Vec<Segment>,
    removed: &mut Vec<Line>,
    added: &mut Vec<Line>,
    owners: &[usize],
    block_index: usize,
) -> bool {
    if removed.is_empty() && added.is_empty() {
        return false;
    }
    let id = block_id(removed, added);
    let hunk_index = owners
        .get(block_index)
        .or_else(|| owners.last())
        .copied()
        .unwrap_or(0);

    let mut lines = std::mem::take(removed);
    lines.append(added);
    segments.push(Segment::Change(ChangeBlock { id, hunk_index, lines }));
    true
}

fn block_id(removed: &[Line], added: &[Line]) -> String {
    let first_old = removed.first().and_then(|l| l.old_lineno);
    let first_new = added.first().and_then(|l| l.new_lineno);
    match (first_old, first_new) {
        (Some(n), _) => format!("cb-o{n}"),
        (None, Some(n)) => format!("cb-n{n}"),
        (None, None) => String::from("cb-empty"),
    }
}

/// For every change run across all hunks, in order, the index of its hunk.
fn change_run_owners(hunks: &[Hunk]) -> Vec<usize> {
    let mut owners = Vec::new();
    for (index, hunk) in hunks.iter().enumerate() {
        let mut in_run = false;
        for line in &hunk.lines {
            let changed = line.kind != LineKind::Context;
            if changed && !in_run {
                owners.push(index);
            }
            in_run = changed;
        }
    }
    owners
}

/// Iterates the change blocks of a segment list in file order.
pub fn change_blocks(segments: &[Segment]) -> impl Iterator<Item = &ChangeBlock> {
    segments.iter().filter_map(|seg| match seg {
        Segment::Change(block) => Some(block),
        Segment::Context(_) => None,
    })
}

/// All block ids in file order.
pub fn block_ids(segments: &[Segment]) -> Vec<String> {
    change_blocks(segments).map(|b| b.id.clone()).collect()
}

pub fn find_block<'a>(segments: &'a [Segment], id: &str) -> Option<&'a ChangeBlock> {
    change_blocks(segments).find(|b| b.id == id)
}
