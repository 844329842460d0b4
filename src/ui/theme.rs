//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Color and style theme for the dashboard.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for titles and the help overlay.
    pub highlight: Color,
    /// Alert banner and threshold line.
    pub alert: Color,
    /// "Patient stable" banner.
    pub stable: Color,
    /// Waiting placeholder and degraded link state.
    pub waiting: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Heart rate series.
    pub heart_rate: Color,
    /// SpO2 series.
    pub spo2: Color,
    /// Impact (SVM) series.
    pub impact: Color,
    /// Style for metric tile values.
    pub metric: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            alert: Color::Red,
            stable: Color::Green,
            waiting: Color::Yellow,
            border: Color::Gray,
            heart_rate: Color::Rgb(0xFF, 0x4B, 0x4B),
            spo2: Color::Rgb(0x00, 0xCC, 0x96),
            impact: Color::Rgb(0xFF, 0xA1, 0x5A),
            metric: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            alert: Color::Red,
            stable: Color::Green,
            waiting: Color::Rgb(0xB0, 0x80, 0x00),
            border: Color::DarkGray,
            heart_rate: Color::Rgb(0xD0, 0x20, 0x20),
            spo2: Color::Rgb(0x00, 0x88, 0x60),
            impact: Color::Rgb(0xD0, 0x70, 0x20),
            metric: Style::default().fg(Color::Black).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Banner style for the current alert state
    pub fn banner_style(&self, is_alert: bool) -> Style {
        if is_alert {
            Style::default()
                .fg(Color::White)
                .bg(self.alert)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.stable).add_modifier(Modifier::BOLD)
        }
    }
}
