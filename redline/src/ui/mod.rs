//! UI rendering.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. Layout arithmetic and the status bar live in
//! `layout.rs`; the file itself is drawn by `review_view.rs`.

pub mod help;
pub mod keybindings;
mod layout;
mod review_view;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame.
///
/// The review panel's inner height is written back into `state` so the next
/// keypress can compute half-page distances.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [review, status_bar] = compute_layout(frame);
    state.viewport_height = inner_rect(review).height;

    review_view::render_review(frame, review, state, theme);
    render_status_bar(frame, status_bar, state, theme);

    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
}
