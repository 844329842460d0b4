//! Render interface between the render loop and the presentation layer.
//!
//! The loop hands every tick's [`Dashboard`] to a [`Renderer`] exactly once.
//! Two renderers ship with the crate:
//!
//! - [`crate::ui::TerminalRenderer`]: the interactive ratatui dashboard
//! - [`TextRenderer`]: one line per tick, for headless runs and piping

use std::io::{self, Write};

use thiserror::Error;

use crate::data::{Dashboard, TickId, View};

/// Errors a renderer can report. The loop logs them and carries on.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output failed.
    #[error("Render output failed: {0}")]
    Io(#[from] io::Error),

    /// The renderer refused the frame for another reason.
    #[error("Render failed: {0}")]
    Backend(String),
}

/// Presentation layer consumed by the render loop.
pub trait Renderer {
    /// Draw one frame. `tick` is unique per call from the render loop.
    fn render(&mut self, tick: TickId, dashboard: &Dashboard) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, tick: TickId, dashboard: &Dashboard) -> Result<(), RenderError> {
        (**self).render(tick, dashboard)
    }
}

/// Writes a single summary line per tick.
///
/// ```text
/// [tick-1] waiting for data stream (memory, connected)
/// [tick-2] STABLE hr=78bpm spo2=97.5% temp=36.90C svm=1.02G window=1
/// [tick-3] ALERT fall detected hr=80bpm spo2=98.0% temp=36.80C svm=4.50G window=2
/// ```
#[derive(Debug)]
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TextRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, tick: TickId, dashboard: &Dashboard) -> Result<(), RenderError> {
        match &dashboard.view {
            View::Idle => writeln!(
                self.out,
                "[{}] waiting for data stream ({}, {})",
                tick, dashboard.feed.source, dashboard.feed.link
            )?,
            View::Active(payload) => {
                let latest = &payload.latest;
                let status = match payload.alert.reason {
                    Some(reason) => format!("ALERT {}", reason),
                    None => "STABLE".to_string(),
                };
                writeln!(
                    self.out,
                    "[{}] {} hr={}bpm spo2={:.1}% temp={:.2}C svm={:.2}G window={}",
                    tick,
                    status,
                    latest.heart_rate,
                    latest.spo2,
                    latest.temperature,
                    latest.impact_force,
                    dashboard.window,
                )?
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
