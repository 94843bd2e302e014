//! Help overlay.
//!
//! Drawn inside the same `terminal.draw()` closure as everything else:
//! `Clear` erases the area, then a bordered `Paragraph` goes on top.

use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

/// Renders the help overlay as a centred modal. Skipped on terminals
/// narrower than 40 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 40 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(70), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help: j/k scroll, ? or Esc to dismiss ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn heading(text: &'static str) -> Line<'static> {
    Line::styled(text, Style::default().add_modifier(Modifier::BOLD))
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        heading("Navigation"),
        Line::from("  j / k         Scroll down / up one line"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Scroll half page down / up"),
        Line::from("  n / N         Next / previous change block  (also ] / [)"),
        Line::from(""),
        heading("Decisions"),
        Line::from("  a             Accept the focused block"),
        Line::from("  r             Reject the focused block"),
        Line::from("  u             Undo the decision on the focused block"),
        Line::from("  A / R / U     Accept / reject / undo every block"),
        Line::from(""),
        Line::from("  Accept-all leaves explicit rejections in place."),
        Line::from("  Pending blocks count as accepted in the reviewed file."),
        Line::from(""),
        heading("General"),
        Line::from("  e             Export a copy (Markdown media tokens resolved)"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q / Esc       Quit once the last write has finished"),
    ])
}
