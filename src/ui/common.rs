//! Common UI components shared across views.
//!
//! This module contains the header bar, status bar, help overlay and the
//! "terminal too small" guard.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::Theme;
use crate::data::{Dashboard, SimulatorState, TickId, View};
use crate::transport::LinkState;

/// Minimum terminal width for a usable dashboard.
pub const MIN_WIDTH: u16 = 60;
/// Minimum terminal height for a usable dashboard.
pub const MIN_HEIGHT: u16 = 16;

/// Whether `area` is too small to lay out the dashboard.
pub fn is_too_small(area: Rect) -> bool {
    area.width < MIN_WIDTH || area.height < MIN_HEIGHT
}

/// Render the resize prompt in place of the dashboard.
pub fn render_too_small(frame: &mut Frame, theme: &Theme, area: Rect) {
    let msg = format!(
        "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
        area.width, area.height, MIN_WIDTH, MIN_HEIGHT
    );
    let paragraph = Paragraph::new(msg)
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.waiting));
    let height = 5.min(area.height);
    let centered = Rect::new(
        area.x,
        area.y + (area.height.saturating_sub(height)) / 2,
        area.width,
        height,
    );
    frame.render_widget(paragraph, centered);
}

/// Render the header bar.
///
/// Displays: title, overall state dot, tick id.
pub fn render_header(frame: &mut Frame, tick: TickId, dashboard: &Dashboard, theme: &Theme, area: Rect) {
    let (dot, dot_style) = match &dashboard.view {
        View::Idle => ("○", Style::default().fg(theme.waiting)),
        View::Active(payload) if payload.alert.is_alert => (
            "●",
            Style::default().fg(theme.alert).add_modifier(Modifier::BOLD),
        ),
        View::Active(_) => ("●", Style::default().fg(theme.stable)),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", dot), dot_style),
        Span::styled(
            "KINTO MONITOR ",
            Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ Real-time wearable telemetry │ "),
        Span::styled(tick.to_string(), Style::default().add_modifier(Modifier::DIM)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, link state, feed counters, simulator state, controls.
pub fn render_status_bar(frame: &mut Frame, dashboard: &Dashboard, theme: &Theme, area: Rect) {
    let feed = &dashboard.feed;

    let link_style = match feed.link {
        LinkState::Connected => Style::default().fg(theme.stable),
        LinkState::Connecting => Style::default().fg(theme.waiting),
        LinkState::Disconnected(_) => Style::default().fg(theme.alert),
    };

    let mut spans = vec![
        Span::raw(format!(" {} │ ", feed.source)),
        Span::styled(feed.link.to_string(), link_style),
        Span::raw(format!(
            " │ rx {} drop {} skip {} │ window {}",
            feed.accepted, feed.dropped, feed.skipped, dashboard.window
        )),
    ];

    let controls = match feed.simulator {
        SimulatorState::Absent => " │ ?:help q:quit",
        SimulatorState::Enabled => {
            spans.push(Span::styled(" │ sim on", Style::default().fg(theme.stable)));
            " │ s:pause sim ?:help q:quit"
        }
        SimulatorState::Paused => {
            spans.push(Span::styled(" │ sim paused", Style::default().fg(theme.waiting)));
            " │ s:resume sim ?:help q:quit"
        }
    };
    spans.push(Span::raw(controls));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, theme: &Theme, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![Span::styled(" General", bold)]),
        Line::from("  ?         Toggle this help"),
        Line::from("  q / Esc   Quit"),
        Line::from("  Ctrl-C    Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(" Simulator", bold)]),
        Line::from("  s         Pause / resume device"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 13u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
