//! Theme: palette + icon set, selected by name from config and passed
//! explicitly to every widget.

pub mod icons;
pub mod palette;

pub use icons::{Icons, LoadingSpinner};
pub use palette::Palette;

#[derive(Debug, Clone)]
pub struct Theme {
    pub palette: Palette,
    pub icons: Icons,
}

impl Theme {
    /// Resolve a `[ui] theme` name; unknown names fall back to the default.
    pub fn from_name(name: &str) -> Self {
        let palette = match name {
            "mono" => Palette::MONO,
            _ => Palette::MIDNIGHT,
        };
        Self {
            palette,
            icons: Icons::nerd(),
        }
    }

    pub fn border_set(&self) -> ratatui::symbols::border::Set<'static> {
        ratatui::symbols::border::ROUNDED
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_name("midnight")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_names_fall_back() {
        let t = Theme::from_name("no-such-theme");
        assert_eq!(t.palette.accent, Palette::MIDNIGHT.accent);
    }

    #[test]
    fn mono_is_selectable() {
        let t = Theme::from_name("mono");
        assert_eq!(t.palette.accent, Palette::MONO.accent);
    }
}
