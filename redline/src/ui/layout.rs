//! Screen layout and the status bar.
//!
//! Pure layout arithmetic plus the one-row status bar. Called inside
//! `terminal.draw()` on every render so each frame reflects the current
//! terminal size.

use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
    Frame,
};

use crate::app::{AppState, Mode, SyncStatus};
use crate::theme::Theme;

/// Returns `[review, status_bar]` for the current frame.
pub fn compute_layout(frame: &Frame) -> [Rect; 2] {
    frame
        .area()
        .layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]))
}

/// The inner `Rect` of a bordered panel.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    })
}

/// A bordered panel block; thick borders mark focus.
pub fn panel_block<'a>(title: Line<'a>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused {
        BorderType::Thick
    } else {
        BorderType::Plain
    };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
}

/// Renders the 1-row status bar: mode, diff size, decision tally, focused
/// block, sync state and any one-shot notice.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let mode_text = match state.mode {
        Mode::Normal => " REVIEW ",
        Mode::HelpOverlay => " HELP ",
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut spans = vec![
        Span::styled(mode_text, bold.fg(theme.border_active)),
        Span::raw(" "),
        Span::styled(format!("+{}", state.additions), Style::default().fg(theme.line_added)),
        Span::raw(" "),
        Span::styled(format!("-{}", state.deletions), Style::default().fg(theme.line_removed)),
        Span::raw("  "),
        Span::styled(
            format!("{} accepted", state.stats.accepted),
            Style::default().fg(theme.accepted),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{} rejected", state.stats.rejected),
            Style::default().fg(theme.rejected),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{} pending", state.stats.pending),
            Style::default().fg(theme.pending),
        ),
    ];

    if !state.ranges.is_empty() {
        spans.push(Span::raw(format!(
            "  block {}/{}",
            state.block_cursor + 1,
            state.ranges.len()
        )));
    }

    let (sync_text, sync_fg) = match &state.sync {
        SyncStatus::Idle => (String::new(), theme.status_bar_fg),
        SyncStatus::Syncing => ("saving…".to_owned(), theme.status_sync_busy),
        SyncStatus::Synced => ("saved".to_owned(), theme.status_sync_ok),
        SyncStatus::Failed(e) => (format!("save failed: {e}"), theme.status_sync_error),
    };
    if !sync_text.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(sync_text, Style::default().fg(sync_fg)));
    }

    if let Some(notice) = &state.notice {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(notice.clone(), bold));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
