use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use kinto_monitor::config::{interval_ms, Settings};
use kinto_monitor::data::duration::parse_duration;
use kinto_monitor::feed::{self, FeedStats, Simulator, SimulatorHandle};
use kinto_monitor::logging::{self, LogTarget};
use kinto_monitor::{
    events, ingest, App, FeedHandles, MemoryBus, MqttTransport, TerminalRenderer, TextRenderer,
    Theme, Transport,
};

/// How long the MQTT driver gets to flush DISCONNECT on exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeChoice {
    Auto,
    Dark,
    Light,
}

#[derive(Parser, Debug)]
#[command(name = "kinto-monitor", version)]
#[command(about = "Real-time terminal dashboard for KINTO wearable telemetry")]
struct Args {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MQTT broker host
    #[arg(long, conflicts_with = "offline")]
    host: Option<String>,

    /// MQTT broker port
    #[arg(long, conflicts_with = "offline")]
    port: Option<u16>,

    /// Telemetry topic
    #[arg(short, long)]
    topic: Option<String>,

    /// Render cadence (e.g., "500ms", "1s")
    #[arg(long, value_parser = parse_duration)]
    tick: Option<Duration>,

    /// Run the simulated wearable in this process
    #[arg(short, long)]
    simulate: bool,

    /// Use an in-process bus instead of a broker (implies --simulate)
    #[arg(long)]
    offline: bool,

    /// Print one line per tick instead of drawing the dashboard
    #[arg(long)]
    headless: bool,

    /// Append logs to this file (the dashboard logs nowhere otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Color theme
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeChoice,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(ref host) = self.host {
            settings.broker.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.broker.port = port;
        }
        if let Some(ref topic) = self.topic {
            settings.topic = topic.clone();
        }
        if let Some(tick) = self.tick {
            settings.tick_interval_ms = interval_ms(tick);
        }
        if self.simulate || self.offline {
            settings.simulator.enabled = true;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = args.settings()?;

    let target = match (&args.log_file, args.headless) {
        (Some(path), _) => LogTarget::File(path),
        (None, true) => LogTarget::Stderr,
        (None, false) => LogTarget::Off,
    };
    logging::init_logging(target, &settings.log_filter)?;

    // Background tasks (MQTT event loop, simulator) run on the runtime while
    // the render loop owns the main thread
    let rt = Runtime::new()?;
    let (mut app, pipeline) = rt.block_on(async { Pipeline::start(&settings, args.offline) })?;

    let result = if args.headless {
        rt.block_on(run_headless(&mut app, settings.tick_interval()))
    } else {
        let theme = match args.theme {
            ThemeChoice::Auto => Theme::auto_detect(),
            ThemeChoice::Dark => Theme::dark(),
            ThemeChoice::Light => Theme::light(),
        };
        run_tui(&mut app, theme, settings.tick_interval())
    };

    rt.block_on(pipeline.shutdown());
    info!(ticks = app.ticks(), "Monitor stopped");

    result
}

/// Everything running in the background for one monitor process.
struct Pipeline {
    mqtt: Option<Arc<MqttTransport>>,
    driver: Option<JoinHandle<()>>,
    simulator: Option<SimulatorHandle>,
}

impl Pipeline {
    /// Wire transport → live feed → ingestion channel → [`App`].
    ///
    /// Must run inside the tokio runtime.
    fn start(settings: &Settings, offline: bool) -> Result<(App, Pipeline)> {
        let mut mqtt = None;
        let mut driver = None;
        let transport: Arc<dyn Transport> = if offline {
            Arc::new(MemoryBus::new())
        } else {
            let (client, mqtt_driver) = MqttTransport::connect(&settings.broker_options());
            let client = Arc::new(client);
            driver = Some(mqtt_driver.spawn());
            mqtt = Some(client.clone());
            client
        };

        let (tx, rx) = ingest::channel();
        let stats = Arc::new(FeedStats::new());
        feed::attach(transport.as_ref(), &settings.topic, tx, stats.clone())
            .context("Failed to subscribe to the telemetry topic")?;

        let simulator = settings.simulator.enabled.then(|| {
            Simulator::new(transport.clone(), &settings.topic, &settings.simulator_options()).spawn()
        });

        let handles = FeedHandles {
            source: format!("{}/{}", transport.description(), settings.topic),
            stats,
            link: transport.link_state(),
            simulator: simulator.as_ref().map(SimulatorHandle::control),
        };

        let pipeline = Pipeline {
            mqtt,
            driver,
            simulator,
        };
        Ok((App::new(rx, handles), pipeline))
    }

    async fn shutdown(self) {
        if let Some(simulator) = self.simulator {
            simulator.abort();
        }
        match (self.mqtt, self.driver) {
            (Some(mqtt), Some(driver)) => mqtt.shutdown(driver, SHUTDOWN_GRACE).await,
            (_, Some(driver)) => driver.abort(),
            _ => {}
        }
    }
}

/// Print one line per tick to stdout until Ctrl-C.
async fn run_headless(app: &mut App, tick: Duration) -> Result<()> {
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    let mut renderer = TextRenderer::stdout();
    app.run(&mut renderer, tick, stop_rx).await;
    Ok(())
}

/// Run the dashboard on the alternate screen
fn run_tui(app: &mut App, theme: Theme, tick: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut renderer = TerminalRenderer::new(terminal, theme);
    let result = run_app(&mut renderer, app, tick);

    // Restore terminal
    disable_raw_mode()?;
    execute!(renderer.terminal_mut().backend_mut(), LeaveAlternateScreen)?;
    renderer.terminal_mut().show_cursor()?;

    result
}

fn run_app(
    renderer: &mut TerminalRenderer<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick: Duration,
) -> Result<()> {
    let mut next_tick = Instant::now();

    while app.running {
        let now = Instant::now();
        if now >= next_tick {
            app.render_tick(renderer);
            next_tick += tick;
            // A slow frame pushes the schedule back instead of bursting
            if next_tick <= now {
                next_tick = now + tick;
            }
        }

        // Wait for input until the next tick is due
        let timeout = next_tick.saturating_duration_since(Instant::now());
        if let Some(event) = events::poll_event(timeout)? {
            let redraw = match event {
                Event::Key(key) => events::handle_key_event(app, renderer, key),
                Event::Resize(_, _) => true,
                _ => false,
            };
            if redraw && app.running {
                if let Err(e) = renderer.redraw() {
                    warn!(error = %e, "Redraw failed");
                }
            }
        }
    }

    Ok(())
}
