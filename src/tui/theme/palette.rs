//! Color palettes

use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg_primary: Color,
    pub bg_highlight: Color,
    pub fg_primary: Color,
    pub fg_secondary: Color,
    pub accent: Color,
    pub border: Color,
    pub playing: Color,
    pub error: Color,
}

impl Palette {
    /// Default palette: dark blue-gray with a warm accent.
    pub const MIDNIGHT: Self = Self {
        bg_primary: Color::Rgb(16, 18, 28),
        bg_highlight: Color::Rgb(42, 46, 62),
        fg_primary: Color::Rgb(220, 223, 232),
        fg_secondary: Color::Rgb(120, 126, 146),
        accent: Color::Rgb(245, 189, 110),
        border: Color::Rgb(62, 68, 90),
        playing: Color::Rgb(148, 216, 148),
        error: Color::Rgb(232, 112, 112),
    };

    /// Pure grayscale, for terminals without good color support.
    pub const MONO: Self = Self {
        bg_primary: Color::Rgb(0, 0, 0),
        bg_highlight: Color::Rgb(48, 48, 48),
        fg_primary: Color::Rgb(255, 255, 255),
        fg_secondary: Color::Rgb(136, 136, 136),
        accent: Color::Rgb(255, 255, 255),
        border: Color::Rgb(64, 64, 64),
        playing: Color::Rgb(255, 255, 255),
        error: Color::Rgb(255, 255, 255),
    };
}

impl Default for Palette {
    fn default() -> Self {
        Self::MIDNIGHT
    }
}
