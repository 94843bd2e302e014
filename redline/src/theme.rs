//! Color themes.
//!
//! Two built-in themes are provided:
//!
//! - `dark` uses ANSI 16 colors so it works on any terminal, including
//!   256-color SSH sessions with no truecolor support.
//! - `catppuccin_mocha` uses the Catppuccin Mocha palette in RGB and needs
//!   truecolor.

use ratatui::style::Color;

/// All color values used across the review screen.
#[derive(Debug, Clone)]
pub struct Theme {
    pub border_active: Color,
    pub border_inactive: Color,

    // Review view
    pub line_added: Color,
    pub line_removed: Color,
    pub line_context: Color,
    pub line_number: Color,
    /// Background behind the lines of the focused change block.
    pub block_focus_bg: Color,

    // Decision tally
    pub accepted: Color,
    pub rejected: Color,
    pub pending: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_sync_ok: Color,
    pub status_sync_busy: Color,
    pub status_sync_error: Color,

    pub background: Color,
}

impl Theme {
    /// The built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            line_added: Color::Green,
            line_removed: Color::Red,
            line_context: Color::Reset,
            line_number: Color::DarkGray,
            block_focus_bg: Color::Indexed(236),

            accepted: Color::Green,
            rejected: Color::Red,
            pending: Color::Yellow,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_sync_ok: Color::Green,
            status_sync_busy: Color::Yellow,
            status_sync_error: Color::Red,

            background: Color::Reset,
        }
    }

    /// The Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface0 = Color::Rgb(49, 50, 68); // #313244
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            line_added: green,
            line_removed: red,
            line_context: text,
            line_number: overlay1,
            block_focus_bg: surface0,

            accepted: green,
            rejected: red,
            pending: yellow,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_sync_ok: green,
            status_sync_busy: peach,
            status_sync_error: red,

            background: base,
        }
    }

    /// Resolves a theme name from config. Unknown names fall back to `dark()`
    /// so a typo never prevents startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
