//! The review panel: the whole file in preview mode.
//!
//! Only `lines[scroll..scroll + viewport]` are materialised per frame, so
//! rendering cost follows the viewport, not the file.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
    Frame,
};
use redline_core::reconstruct::PreviewLine;
use redline_core::{LineKind, LoadState};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn render_review(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled(state.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
    ]);
    frame.render_widget(panel_block(title, true, theme), area);
    let inner = inner_rect(area);

    if let Some(message) = load_message(state) {
        frame.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(theme.line_context))
                .wrap(Wrap { trim: false }),
            inner,
        );
        return;
    }

    if state.lines.is_empty() {
        frame.render_widget(
            Paragraph::new("(empty file)")
                .style(Style::default().fg(theme.line_number)),
            inner,
        );
        return;
    }

    let total = state.lines.len();
    let gutter = total.max(1).to_string().len();
    let focused = state.focused_block().map(|r| r.id.as_str());

    let start = state.scroll.min(total.saturating_sub(1));
    let end = (start + inner.height as usize).min(total);
    let items: Vec<ListItem> = state.lines[start..end]
        .iter()
        .enumerate()
        .map(|(offset, line)| {
            let in_focus = focused.is_some() && line.block_id.as_deref() == focused;
            ListItem::new(render_line(start + offset + 1, gutter, line, in_focus, theme))
        })
        .collect();

    frame.render_widget(
        List::new(items).style(Style::default().bg(theme.background)),
        inner,
    );
}

/// Text shown instead of the file while it is not ready.
fn load_message(state: &AppState) -> Option<String> {
    match &state.load {
        LoadState::Ready => None,
        LoadState::Loading => Some(format!(
            "{} Loading {}…",
            SPINNER[state.spinner % SPINNER.len()],
            state.title
        )),
        LoadState::Retrying { attempt } => Some(format!(
            "{} Waiting for {} (attempt {attempt})…",
            SPINNER[state.spinner % SPINNER.len()],
            state.title
        )),
        LoadState::Binary {
            download_url,
            filename,
        } => Some(format!(
            "{filename} is not a text file and cannot be reviewed inline.\n\nDownload: {download_url}"
        )),
        LoadState::Failed(message) => Some(message.clone()),
    }
}

fn render_line<'a>(
    number: usize,
    gutter: usize,
    line: &'a PreviewLine,
    in_focus: bool,
    theme: &Theme,
) -> Line<'a> {
    let (marker, fg) = match line.kind {
        LineKind::Added => ("+", theme.line_added),
        LineKind::Removed => ("-", theme.line_removed),
        LineKind::Context => (" ", theme.line_context),
    };
    let mut style = Style::default().fg(fg);
    if in_focus {
        style = style.bg(theme.block_focus_bg);
    }

    Line::from(vec![
        Span::styled(
            format!("{number:>gutter$} "),
            Style::default().fg(theme.line_number),
        ),
        Span::styled(marker, style.add_modifier(Modifier::BOLD)),
        Span::styled(" ", style),
        Span::styled(line.content.as_str(), style),
    ])
}
