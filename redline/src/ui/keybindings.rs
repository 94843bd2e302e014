//! Keybinding dispatcher.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns
//! a `KeyAction` telling the event loop what else to do. Navigation is
//! handled here; anything that touches the review session is handed back to
//! the loop as an action because it needs to await.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use redline_core::Action;

use crate::app::{AppState, Mode};

/// What the event loop should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    /// Apply a decision to the session.
    Decide(Action),
    /// Write the export copy.
    Export,
    /// Settle the last push and exit.
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    state.notice = None;
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::Normal => handle_normal(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }
    if let Some(action) = handle_decision_key(key, state) {
        return action;
    }

    match key.code {
        KeyCode::Char('n') | KeyCode::Char(']') | KeyCode::Tab => {
            state.next_block();
            KeyAction::Continue
        }
        KeyCode::Char('N') | KeyCode::Char('[') | KeyCode::BackTab => {
            state.prev_block();
            KeyAction::Continue
        }
        KeyCode::Char('e') => KeyAction::Export,
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        _ => KeyAction::Continue,
    }
}

/// a / r / u act on the focused block, A / R / U on every block.
fn handle_decision_key(key: KeyEvent, state: &AppState) -> Option<KeyAction> {
    let action = match key.code {
        KeyCode::Char('A') => Action::AcceptAll,
        KeyCode::Char('R') => Action::RejectAll,
        KeyCode::Char('U') => Action::UndoAll,
        KeyCode::Char('a') => Action::Accept(state.focused_block_id()?),
        KeyCode::Char('r') => Action::Reject(state.focused_block_id()?),
        KeyCode::Char('u') if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Action::Undo(state.focused_block_id()?)
        }
        _ => return None,
    };
    Some(KeyAction::Decide(action))
}

/// j / k / g / G and Ctrl-d / Ctrl-u.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        KeyCode::PageDown => state.half_page_down(),
        KeyCode::PageUp => state.half_page_up(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

/// `?`, `Esc` or `q` dismiss the overlay; j / k scroll it.
fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Scroll wheel moves the review (or the help overlay) by 3 lines.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) {
    let help = state.mode == Mode::HelpOverlay;
    match mouse.kind {
        MouseEventKind::ScrollUp if help => state.help_scroll = state.help_scroll.saturating_sub(3),
        MouseEventKind::ScrollDown if help => {
            state.help_scroll = state.help_scroll.saturating_add(3)
        }
        MouseEventKind::ScrollUp => state.scroll_up(3),
        MouseEventKind::ScrollDown => state.scroll_down(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_core::reconstruct::BlockRange;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn state_with_blocks() -> AppState {
        let mut state = AppState::new("notes.md".into());
        state.ranges = vec![
            BlockRange { id: "cb-o2".into(), start: 2, end: 3 },
            BlockRange { id: "cb-n9".into(), start: 9, end: 9 },
        ];
        state
    }

    #[test]
    fn block_keys_target_the_focused_block() {
        let mut state = state_with_blocks();
        assert_eq!(
            handle_key(key(KeyCode::Char('a')), &mut state),
            KeyAction::Decide(Action::Accept("cb-o2".into()))
        );
        handle_key(key(KeyCode::Char('n')), &mut state);
        assert_eq!(
            handle_key(key(KeyCode::Char('r')), &mut state),
            KeyAction::Decide(Action::Reject("cb-n9".into()))
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('u')), &mut state),
            KeyAction::Decide(Action::Undo("cb-n9".into()))
        );
    }

    #[test]
    fn bulk_keys() {
        let mut state = state_with_blocks();
        assert_eq!(
            handle_key(key(KeyCode::Char('A')), &mut state),
            KeyAction::Decide(Action::AcceptAll)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('R')), &mut state),
            KeyAction::Decide(Action::RejectAll)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('U')), &mut state),
            KeyAction::Decide(Action::UndoAll)
        );
    }

    #[test]
    fn block_keys_without_blocks_do_nothing() {
        let mut state = AppState::new("same.md".into());
        assert_eq!(handle_key(key(KeyCode::Char('a')), &mut state), KeyAction::Continue);
        assert_eq!(handle_key(key(KeyCode::Char('n')), &mut state), KeyAction::Continue);
    }

    #[test]
    fn ctrl_u_scrolls_instead_of_undoing() {
        let mut state = state_with_blocks();
        assert_eq!(handle_key(ctrl('u'), &mut state), KeyAction::Continue);
    }

    #[test]
    fn help_overlay_swallows_review_keys() {
        let mut state = state_with_blocks();
        handle_key(key(KeyCode::Char('?')), &mut state);
        assert_eq!(state.mode, Mode::HelpOverlay);
        assert_eq!(handle_key(key(KeyCode::Char('a')), &mut state), KeyAction::Continue);
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), KeyAction::Quit);
    }

    #[test]
    fn export_key() {
        let mut state = state_with_blocks();
        assert_eq!(handle_key(key(KeyCode::Char('e')), &mut state), KeyAction::Export);
    }
}
