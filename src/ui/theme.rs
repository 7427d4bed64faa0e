//! Theme configuration for the follower display.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use platoon_types::LaneSuggestion;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for titles and highlights.
    pub highlight: Color,
    /// Color for "keep lane" suggestions.
    pub stay: Color,
    /// Color for lane-change suggestions.
    pub lane_change: Color,
    /// Color for stale data and errors.
    pub alert: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for the header bar.
    pub header: Style,
    /// Style for placeholder text while waiting for data.
    pub waiting: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            stay: Color::Green,
            lane_change: Color::Yellow,
            alert: Color::Red,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            waiting: Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            stay: Color::Green,
            lane_change: Color::Magenta,
            alert: Color::Red,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            waiting: Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a lane suggestion.
    pub fn lane_style(&self, lane: LaneSuggestion) -> Style {
        if lane.is_lane_change() {
            Style::default()
                .fg(self.lane_change)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.stay)
        }
    }

    /// Style for stale-data and error indicators.
    pub fn alert_style(&self) -> Style {
        Style::default().fg(self.alert).add_modifier(Modifier::BOLD)
    }
}
