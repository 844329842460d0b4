//! Active-state widgets: alert banner, metric tiles and the two charts.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use kinto_types::Packet;

use super::Theme;
use crate::data::{AlertState, Dashboard, RenderPayload, Series, IMPACT_THRESHOLD_G};

/// Resting heart rate the HR tile reports its delta against.
pub const RESTING_HEART_RATE: i32 = 75;

/// Render the full active dashboard into `area`.
pub fn render(frame: &mut Frame, payload: &RenderPayload, theme: &Theme, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Alert banner
        Constraint::Length(3), // Metric tiles
        Constraint::Min(6),    // Charts
    ])
    .split(area);

    render_alert_banner(frame, &payload.alert, theme, chunks[0]);
    render_metrics(frame, &payload.latest, theme, chunks[1]);
    render_charts(frame, &payload.series, theme, chunks[2]);
}

/// Banner text for an alert state.
pub fn banner_text(alert: &AlertState) -> String {
    match alert.reason {
        Some(reason) => format!(
            "{}! Impact Force: {:.2} G",
            reason.as_str().to_uppercase(),
            alert.impact_force
        ),
        None => "Patient Status: Stable".to_string(),
    }
}

fn render_alert_banner(frame: &mut Frame, alert: &AlertState, theme: &Theme, area: Rect) {
    let style = theme.banner_style(alert.is_alert);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(style);
    let paragraph = Paragraph::new(banner_text(alert))
        .alignment(Alignment::Center)
        .style(style)
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Heart rate tile text, e.g. `78 BPM (+3)`.
pub fn heart_rate_text(heart_rate: i32) -> String {
    format!("{} BPM ({:+})", heart_rate, heart_rate - RESTING_HEART_RATE)
}

fn render_metrics(frame: &mut Frame, latest: &Packet, theme: &Theme, area: Rect) {
    let tiles = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);

    let metrics = [
        ("Heart Rate", heart_rate_text(latest.heart_rate), theme.heart_rate),
        ("SpO2", format!("{:.1} %", latest.spo2), theme.spo2),
        ("Body Temp", format!("{:.2} °C", latest.temperature), theme.highlight),
        ("Impact (SVM)", format!("{:.2} G", latest.impact_force), theme.impact),
    ];

    for ((title, value, color), tile) in metrics.into_iter().zip(tiles.iter()) {
        let block = Block::default()
            .title(Span::styled(format!(" {} ", title), Style::default().fg(color)))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border));
        let paragraph = Paragraph::new(value)
            .alignment(Alignment::Center)
            .style(theme.metric)
            .block(block);
        frame.render_widget(paragraph, *tile);
    }
}

fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect()
}

/// Y bounds covering every value with a little headroom.
fn bounds<'a>(series: impl IntoIterator<Item = &'a f64>, floor: Option<f64>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in series {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }
    if let Some(floor) = floor {
        lo = lo.min(floor);
        hi = hi.max(floor);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.1).max(0.5);
    [lo - pad, hi + pad]
}

fn axis_labels(bounds: [f64; 2]) -> Vec<String> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    vec![
        format!("{:.1}", bounds[0]),
        format!("{:.1}", mid),
        format!("{:.1}", bounds[1]),
    ]
}

fn render_charts(frame: &mut Frame, series: &Series, theme: &Theme, area: Rect) {
    let halves = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(area);
    let x_max = (series.len().saturating_sub(1)).max(1) as f64;

    // Heart Rate & SpO2
    let hr = points(&series.hr);
    let spo2 = points(&series.spo2);
    let vitals_y = bounds(series.hr.iter().chain(series.spo2.iter()), None);
    let vitals = Chart::new(vec![
        Dataset::default()
            .name("HR (BPM)")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.heart_rate))
            .data(&hr),
        Dataset::default()
            .name("SpO2 (%)")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.spo2))
            .data(&spo2),
    ])
    .block(chart_block("Heart Rate & SpO2", theme))
    .x_axis(Axis::default().bounds([0.0, x_max]).style(Style::default().fg(theme.border)))
    .y_axis(
        Axis::default()
            .bounds(vitals_y)
            .labels(axis_labels(vitals_y))
            .style(Style::default().fg(theme.border)),
    );
    frame.render_widget(vitals, halves[0]);

    // Accelerometer with the alert threshold drawn as a dotted line
    let svm = points(&series.svm);
    let threshold: Vec<(f64, f64)> = (0..=x_max as usize)
        .map(|i| (i as f64, IMPACT_THRESHOLD_G))
        .collect();
    let svm_y = bounds(series.svm.iter(), Some(IMPACT_THRESHOLD_G));
    let svm_y = [svm_y[0].max(0.0), svm_y[1]];
    let accel = Chart::new(vec![
        Dataset::default()
            .name("SVM (G)")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.impact))
            .data(&svm),
        Dataset::default()
            .name(format!("Threshold {:.1} G", IMPACT_THRESHOLD_G))
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(theme.alert))
            .data(&threshold),
    ])
    .block(chart_block("Accelerometer (SVM)", theme))
    .x_axis(Axis::default().bounds([0.0, x_max]).style(Style::default().fg(theme.border)))
    .y_axis(
        Axis::default()
            .bounds(svm_y)
            .labels(axis_labels(svm_y))
            .style(Style::default().fg(theme.border)),
    );
    frame.render_widget(accel, halves[1]);
}

fn chart_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border))
}

/// Render the Idle placeholder.
pub fn render_waiting(frame: &mut Frame, dashboard: &Dashboard, theme: &Theme, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "Waiting for data stream...",
            Style::default().fg(theme.waiting).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} ({})", dashboard.feed.source, dashboard.feed.link),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let height = 3.min(inner.height);
    let centered = Rect::new(
        inner.x,
        inner.y + (inner.height.saturating_sub(height)) / 2,
        inner.width,
        height,
    );
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), centered);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AlertReason;

    #[test]
    fn test_banner_text() {
        let fall = AlertState {
            is_alert: true,
            reason: Some(AlertReason::FallDetected),
            impact_force: 4.5,
        };
        assert_eq!(banner_text(&fall), "FALL DETECTED! Impact Force: 4.50 G");

        let impact = AlertState {
            is_alert: true,
            reason: Some(AlertReason::ImpactThreshold),
            impact_force: 3.2,
        };
        assert_eq!(
            banner_text(&impact),
            "IMPACT THRESHOLD EXCEEDED! Impact Force: 3.20 G"
        );

        let stable = AlertState {
            is_alert: false,
            reason: None,
            impact_force: 1.0,
        };
        assert_eq!(banner_text(&stable), "Patient Status: Stable");
    }

    #[test]
    fn test_heart_rate_delta() {
        assert_eq!(heart_rate_text(78), "78 BPM (+3)");
        assert_eq!(heart_rate_text(75), "75 BPM (+0)");
        assert_eq!(heart_rate_text(70), "70 BPM (-5)");
    }

    #[test]
    fn test_bounds_include_threshold() {
        let b = bounds([1.0, 1.1].iter(), Some(3.0));
        assert!(b[0] < 1.0);
        assert!(b[1] > 3.0);
    }

    #[test]
    fn test_bounds_empty() {
        assert_eq!(bounds(std::iter::empty(), None), [0.0, 1.0]);
    }
}
