//! Application state and the render loop.
//!
//! [`App`] is the explicit state object owned by the render context: the
//! consumer half of the ingestion channel, the rolling history and the tick
//! counter. Nothing here is shared with the message-arrival context except
//! through the channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::data::{Dashboard, FeedStatus, RenderPayload, RollingHistory, SimulatorState, TickId, View};
use crate::feed::{FeedStats, SimulatorControl};
use crate::ingest::PacketReceiver;
use crate::render::Renderer;
use crate::transport::LinkState;

/// Read-only handles describing where packets come from.
#[derive(Debug, Clone)]
pub struct FeedHandles {
    /// Shown in the status bar, e.g. `mqtt://broker.hivemq.com:1883`.
    pub source: String,
    pub stats: Arc<FeedStats>,
    pub link: watch::Receiver<LinkState>,
    /// Present when this process also runs the simulated wearable.
    pub simulator: Option<SimulatorControl>,
}

impl FeedHandles {
    /// Handles for a feed with no transport behind it (always "connected").
    pub fn detached(source: &str) -> Self {
        let (_, link) = watch::channel(LinkState::Connected);
        Self {
            source: source.to_string(),
            stats: Arc::new(FeedStats::new()),
            link,
            simulator: None,
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,

    // Render-loop owned data
    receiver: PacketReceiver,
    history: RollingHistory,
    ticks: u64,
    skipped: u64,
    render_failures: u64,
    was_active: bool,
    closed_reported: bool,

    // Feed status
    feed: FeedHandles,
}

impl App {
    /// Create a new App draining `receiver` into a fresh 100-packet history.
    pub fn new(receiver: PacketReceiver, feed: FeedHandles) -> Self {
        Self::with_history(receiver, feed, RollingHistory::new())
    }

    pub fn with_history(receiver: PacketReceiver, feed: FeedHandles, history: RollingHistory) -> Self {
        Self {
            running: true,
            receiver,
            history,
            ticks: 0,
            skipped: 0,
            render_failures: 0,
            was_active: false,
            closed_reported: false,
            feed,
        }
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    /// Number of ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of ticks whose render call failed.
    pub fn render_failures(&self) -> u64 {
        self.render_failures
    }

    /// Returns a description of the current feed source.
    pub fn source_description(&self) -> &str {
        &self.feed.source
    }

    /// Drain the ingestion channel into the history.
    ///
    /// Packets that fail validation here (only possible for packets built in
    /// code rather than parsed) are skipped. Returns how many were appended.
    pub fn ingest(&mut self) -> usize {
        let mut appended = 0;
        for packet in self.receiver.drain_all() {
            if let Err(e) = packet.validate() {
                self.skipped += 1;
                warn!(error = %e, "Skipping invalid packet");
                continue;
            }
            self.history.append(packet);
            appended += 1;
        }

        if self.receiver.is_closed() && !self.closed_reported {
            self.closed_reported = true;
            warn!("Feed producer closed, no further packets will arrive");
        }
        appended
    }

    /// Current view derived from the history: Idle until the first packet.
    pub fn view(&self) -> View {
        RenderPayload::from_history(&self.history)
            .map(View::Active)
            .unwrap_or(View::Idle)
    }

    pub fn feed_status(&self) -> FeedStatus {
        let simulator = match &self.feed.simulator {
            None => SimulatorState::Absent,
            Some(control) if control.is_enabled() => SimulatorState::Enabled,
            Some(_) => SimulatorState::Paused,
        };

        FeedStatus {
            source: self.feed.source.clone(),
            link: self.feed.link.borrow().clone(),
            accepted: self.feed.stats.accepted(),
            dropped: self.feed.stats.dropped(),
            skipped: self.skipped,
            simulator,
        }
    }

    /// Run steps 1 and 2 of a tick: drain, append, evaluate.
    ///
    /// Every call yields a fresh [`TickId`].
    pub fn tick(&mut self) -> (TickId, Dashboard) {
        let appended = self.ingest();
        self.ticks += 1;
        let tick = TickId(self.ticks);

        let view = self.view();
        if view.is_active() && !self.was_active {
            self.was_active = true;
            info!(%tick, "First packet received, dashboard active");
        }
        if appended > 0 {
            debug!(%tick, appended, window = self.history.len(), "Ingested packets");
        }

        let dashboard = Dashboard {
            view,
            feed: self.feed_status(),
            window: self.history.len(),
        };
        (tick, dashboard)
    }

    /// Run a full tick and hand the result to `renderer` exactly once.
    ///
    /// A renderer failure is logged and the frame skipped; the loop carries on.
    pub fn render_tick<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> (TickId, Dashboard) {
        let (tick, dashboard) = self.tick();
        if let Err(e) = renderer.render(tick, &dashboard) {
            self.render_failures += 1;
            warn!(%tick, error = %e, "Render failed, skipping frame");
        }
        (tick, dashboard)
    }

    /// Tick on a fixed cadence until `shutdown` flips to `true`, its sender is
    /// dropped, or [`App::quit`] is called.
    ///
    /// Missed ticks are delayed rather than bursted, so a slow render only
    /// pushes back the next tick.
    ///
    /// ```
    /// use std::time::Duration;
    /// use kinto_monitor::{ingest, App, FeedHandles, TextRenderer};
    /// use tokio::sync::watch;
    ///
    /// # tokio_test::block_on(async {
    /// let (_tx, rx) = ingest::channel();
    /// let mut app = App::new(rx, FeedHandles::detached("memory"));
    ///
    /// // Already signalled: returns without rendering
    /// let (_stop, stop_rx) = watch::channel(true);
    /// let mut renderer = TextRenderer::new(Vec::new());
    /// app.run(&mut renderer, Duration::from_millis(500), stop_rx).await;
    /// assert_eq!(app.ticks(), 0);
    /// # });
    /// ```
    pub async fn run<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        cadence: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = time::interval(cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.running && !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.render_tick(renderer);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!(ticks = self.ticks, "Render loop stopped");
    }

    /// Flip the simulator on or off. Returns the new state, or `None` when
    /// this process has no simulator.
    pub fn toggle_simulator(&self) -> Option<bool> {
        let enabled = self.feed.simulator.as_ref()?.toggle();
        info!(enabled, "Simulator toggled");
        Some(enabled)
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}
