//! The ratatui implementation of the render interface.

use ratatui::{
    backend::Backend,
    layout::{Constraint, Layout},
    Frame, Terminal,
};

use super::{common, dashboard, Theme};
use crate::data::{Dashboard, FeedStatus, TickId, View};
use crate::render::{RenderError, Renderer};

/// Draws each dashboard frame onto a ratatui [`Terminal`].
///
/// Holds the only UI state that is not part of the dashboard itself (the
/// help overlay toggle) plus the last frame drawn, so key presses between
/// ticks can redraw without consuming a new tick id.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    theme: Theme,
    show_help: bool,
    last_frame: Option<(TickId, Dashboard)>,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(terminal: Terminal<B>, theme: Theme) -> Self {
        Self {
            terminal,
            theme,
            show_help: false,
            last_frame: None,
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Tick id of the last frame drawn, if any.
    pub fn last_tick(&self) -> Option<TickId> {
        self.last_frame.as_ref().map(|(tick, _)| *tick)
    }

    /// Replace the feed status of the cached frame, so a redraw between
    /// ticks shows fresh counters and simulator state.
    pub fn update_feed(&mut self, feed: FeedStatus) {
        if let Some((_, dashboard)) = self.last_frame.as_mut() {
            dashboard.feed = feed;
        }
    }

    /// Redraw the last frame, e.g. after a resize or help toggle.
    ///
    /// Does nothing before the first tick.
    pub fn redraw(&mut self) -> Result<(), RenderError> {
        let Some((tick, dashboard)) = self.last_frame.as_ref() else {
            return Ok(());
        };
        let (theme, show_help) = (&self.theme, self.show_help);
        self.terminal
            .draw(|frame| draw(frame, *tick, dashboard, theme, show_help))?;
        Ok(())
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render(&mut self, tick: TickId, dashboard: &Dashboard) -> Result<(), RenderError> {
        self.last_frame = Some((tick, dashboard.clone()));
        self.redraw()
    }
}

fn draw(frame: &mut Frame, tick: TickId, dashboard: &Dashboard, theme: &Theme, show_help: bool) {
    let area = frame.area();

    if common::is_too_small(area) {
        common::render_too_small(frame, theme, area);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Min(12),   // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, tick, dashboard, theme, chunks[0]);

    match &dashboard.view {
        View::Idle => dashboard::render_waiting(frame, dashboard, theme, chunks[1]),
        View::Active(payload) => dashboard::render(frame, payload, theme, chunks[1]),
    }

    common::render_status_bar(frame, dashboard, theme, chunks[2]);

    if show_help {
        common::render_help(frame, theme, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RenderPayload, RollingHistory, SimulatorState};
    use crate::transport::LinkState;
    use kinto_types::Packet;
    use ratatui::backend::TestBackend;

    fn renderer(width: u16, height: u16) -> TerminalRenderer<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        TerminalRenderer::new(terminal, Theme::dark())
    }

    fn screen(renderer: &TerminalRenderer<TestBackend>) -> String {
        let buffer = renderer.terminal().backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn feed(simulator: SimulatorState) -> FeedStatus {
        FeedStatus {
            source: "mqtt://broker.example:1883".to_string(),
            link: LinkState::Connecting,
            accepted: 0,
            dropped: 0,
            skipped: 0,
            simulator,
        }
    }

    fn active(hr: i32, svm: f64, fall: bool) -> Dashboard {
        let mut history = RollingHistory::new();
        for i in 0..10 {
            history.append(Packet {
                timestamp: i as f64,
                heart_rate: 75,
                spo2: 98.0,
                temperature: 36.8,
                impact_force: 1.0,
                fall_detected: false,
            });
        }
        history.append(Packet {
            timestamp: 10.0,
            heart_rate: hr,
            spo2: 97.5,
            temperature: 36.9,
            impact_force: svm,
            fall_detected: fall,
        });
        Dashboard {
            view: View::Active(RenderPayload::from_history(&history).unwrap()),
            feed: feed(SimulatorState::Enabled),
            window: history.len(),
        }
    }

    #[test]
    fn test_idle_shows_placeholder() {
        let mut r = renderer(100, 30);
        let dashboard = Dashboard {
            view: View::Idle,
            feed: feed(SimulatorState::Absent),
            window: 0,
        };
        r.render(TickId(1), &dashboard).unwrap();

        let text = screen(&r);
        assert!(text.contains("Waiting for data stream..."));
        assert!(text.contains("KINTO MONITOR"));
        assert!(text.contains("tick-1"));
        assert!(text.contains("connecting"));
        assert!(!text.contains("Patient Status"));
    }

    #[test]
    fn test_fall_shows_alert_banner() {
        let mut r = renderer(100, 30);
        r.render(TickId(7), &active(80, 4.5, true)).unwrap();

        let text = screen(&r);
        assert!(text.contains("FALL DETECTED! Impact Force: 4.50 G"));
        assert!(text.contains("80 BPM (+5)"));
        assert!(text.contains("Heart Rate & SpO2"));
        assert!(text.contains("Accelerometer (SVM)"));
        assert!(text.contains("sim on"));
        assert!(!text.contains("Waiting for data stream"));
    }

    #[test]
    fn test_stable_shows_status() {
        let mut r = renderer(100, 30);
        r.render(TickId(2), &active(72, 1.1, false)).unwrap();

        let text = screen(&r);
        assert!(text.contains("Patient Status: Stable"));
        assert!(text.contains("72 BPM (-3)"));
        assert!(text.contains("36.90 °C"));
        assert!(text.contains("97.5 %"));
        assert!(!text.contains("FALL DETECTED"));
    }

    #[test]
    fn test_too_small_terminal() {
        let mut r = renderer(40, 10);
        r.render(TickId(1), &active(80, 4.5, true)).unwrap();

        let text = screen(&r);
        assert!(text.contains("Terminal too small: 40x10"));
        assert!(!text.contains("FALL DETECTED"));
    }

    #[test]
    fn test_help_overlay_and_redraw_keep_tick() {
        let mut r = renderer(100, 30);
        assert!(r.redraw().is_ok());
        assert_eq!(r.last_tick(), None);

        r.render(TickId(3), &active(75, 1.0, false)).unwrap();
        r.toggle_help();
        r.redraw().unwrap();

        let text = screen(&r);
        assert!(text.contains("Keyboard Shortcuts"));
        assert!(text.contains("tick-3"));
        assert_eq!(r.last_tick(), Some(TickId(3)));

        r.toggle_help();
        r.redraw().unwrap();
        assert!(!screen(&r).contains("Keyboard Shortcuts"));
    }
}
