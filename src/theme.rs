//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes,
//! and `StyleMap` resolves role names to concrete styles.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Cycle to the next variant: Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// Every semantic UI role mapped to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Channel list --
    pub channel_normal: Style,
    pub channel_selected: Style,
    pub channel_active: Style,
    pub channel_broken: Style,

    // -- Content --
    pub item_heading: Style,
    pub item_link: Style,
    pub item_body: Style,
    pub item_separator: Style,
    pub content_placeholder: Style,

    // -- Broken channel fallback --
    pub broken_message: Style,
    pub broken_action: Style,

    // -- Filter bar --
    pub filter_label: Style,
    pub filter_input: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub status_error: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub overlay_body: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            channel_normal: Style::default(),
            channel_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            channel_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            channel_broken: Style::default().fg(Color::Red),

            item_heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            item_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            item_body: Style::default(),
            item_separator: Style::default().fg(Color::DarkGray),
            content_placeholder: Style::default().fg(Color::DarkGray),

            broken_message: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            broken_action: Style::default().bg(Color::Red).fg(Color::White),

            filter_label: Style::default().fg(Color::Yellow),
            filter_input: Style::default(),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            overlay_body: Style::default(),
        }
    }

    fn light() -> Self {
        Self {
            channel_normal: Style::default().fg(Color::Black),
            channel_selected: Style::default().bg(Color::Blue).fg(Color::White),
            channel_active: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            channel_broken: Style::default().fg(Color::Red),

            item_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            item_link: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::UNDERLINED),
            item_body: Style::default().fg(Color::Black),
            item_separator: Style::default().fg(Color::Gray),
            content_placeholder: Style::default().fg(Color::DarkGray),

            broken_message: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            broken_action: Style::default().bg(Color::Red).fg(Color::White),

            filter_label: Style::default().fg(Color::Magenta),
            filter_input: Style::default().fg(Color::Black),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
            overlay_body: Style::default().fg(Color::Black),
        }
    }
}

// ============================================================================
// Style Map
// ============================================================================

/// String-keyed style lookup, so widgets can ask for a role by name.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

const ROLE_NAMES: [&str; 19] = [
    "channel_normal",
    "channel_selected",
    "channel_active",
    "channel_broken",
    "item_heading",
    "item_link",
    "item_body",
    "item_separator",
    "content_placeholder",
    "broken_message",
    "broken_action",
    "filter_label",
    "filter_input",
    "status_bar",
    "status_error",
    "panel_border",
    "panel_border_focused",
    "overlay_body",
    "help_heading",
];

impl StyleMap {
    pub fn from_palette(p: &ColorPalette) -> Self {
        let styles: [Style; 19] = [
            p.channel_normal,
            p.channel_selected,
            p.channel_active,
            p.channel_broken,
            p.item_heading,
            p.item_link,
            p.item_body,
            p.item_separator,
            p.content_placeholder,
            p.broken_message,
            p.broken_action,
            p.filter_label,
            p.filter_input,
            p.status_bar,
            p.status_error,
            p.panel_border,
            p.panel_border_focused,
            p.overlay_body,
            // Help section titles reuse the heading style.
            p.item_heading,
        ];

        let map = ROLE_NAMES.iter().copied().zip(styles).collect();
        Self { map }
    }

    /// Resolve a role name to its `Style`. Unknown roles get `Style::default()`.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_channel_is_red_in_both_variants() {
        for variant in [ThemeVariant::Dark, ThemeVariant::Light] {
            assert_eq!(variant.palette().channel_broken.fg, Some(Color::Red));
        }
    }

    #[test]
    fn light_palette_differs_from_dark() {
        let dark = ThemeVariant::Dark.palette();
        let light = ThemeVariant::Light.palette();
        assert_ne!(dark.channel_selected, light.channel_selected);
        assert_ne!(dark.status_bar, light.status_bar);
    }

    #[test]
    fn variant_from_str_name() {
        assert_eq!(ThemeVariant::from_str_name("dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name("Light"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("neon"), None);
    }

    #[test]
    fn variant_cycles() {
        assert_eq!(ThemeVariant::Dark.next(), ThemeVariant::Light);
        assert_eq!(ThemeVariant::Light.next().name(), "Dark");
    }

    #[test]
    fn style_map_resolves_known_roles() {
        let palette = ThemeVariant::Dark.palette();
        let sm = StyleMap::from_palette(&palette);
        assert_eq!(sm.resolve("item_heading"), palette.item_heading);
        assert_eq!(sm.resolve("broken_action"), palette.broken_action);
        assert_eq!(sm.resolve("help_heading"), palette.item_heading);
    }

    #[test]
    fn style_map_has_all_roles() {
        let sm = StyleMap::from_palette(&ThemeVariant::Light.palette());
        assert_eq!(sm.map.len(), ROLE_NAMES.len());
        assert_eq!(sm.resolve("nonexistent_role"), Style::default());
    }
}
