/// The type of a line within a diff or a full-file segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Added,
    Removed,
    Context,
}

/// A single line of either input, tagged with where it lives.
///
/// Context lines carry both line numbers. Added lines only exist in the
/// proposed text (`new_lineno`), removed lines only in the original
/// (`old_lineno`). Numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub content: String,
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
}

impl Line {
    pub fn context(content: &str, old_lineno: u32, new_lineno: u32) -> Self {
        Self {
            kind: LineKind::Context,
            content: content.to_owned(),
            old_lineno: Some(old_lineno),
            new_lineno: Some(new_lineno),
        }
    }

    pub fn added(content: &str, new_lineno: u32) -> Self {
        Self {
            kind: LineKind::Added,
            content: content.to_owned(),
            old_lineno: None,
            new_lineno: Some(new_lineno),
        }
    }

    pub fn removed(content: &str, old_lineno: u32) -> Self {
        Self {
            kind: LineKind::Removed,
            content: content.to_owned(),
            old_lineno: Some(old_lineno),
            new_lineno: None,
        }
    }
}

/// The unit of decision: one contiguous changed region of the file.
///
/// All `Removed` lines come before all `Added` lines. The `id` is derived from
/// the block's position (`cb-o{N}` for the first removed original line, or
/// `cb-n{N}` for a pure insertion at new line `N`), so diffing the same two
/// inputs again reproduces the same ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBlock {
    pub id: String,
    /// Index of the summary hunk this block falls in.
    pub hunk_index: usize,
    pub lines: Vec<Line>,
}

impl ChangeBlock {
    pub fn removed(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(|l| l.kind == LineKind::Removed)
    }

    pub fn added(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(|l| l.kind == LineKind::Added)
    }
}

/// One piece of the full-file view: an unchanged run or a single change block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Context(Vec<Line>),
    Change(ChangeBlock),
}

/// A group of nearby changes plus bounded context, for the summary view.
///
/// Start/length fields follow unified-diff conventions: starts are 1-based,
/// and a side with zero lines reports the line *before* the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub id: String,
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<Line>,
}

impl Hunk {
    /// The `@@ -a,b +c,d @@` header for this hunk.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_lines, self.new_start, self.new_lines
        )
    }
}

/// Hunks plus aggregate line counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub hunks: Vec<Hunk>,
    pub additions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}
