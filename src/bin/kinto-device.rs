//! Simulated KINTO wearable.
//!
//! Publishes a synthetic telemetry packet to the broker on a fixed cadence,
//! with an occasional simulated fall, until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use kinto_monitor::config::{interval_ms, Settings};
use kinto_monitor::data::duration::{format_duration, parse_duration};
use kinto_monitor::feed::{SensorModel, Simulator};
use kinto_monitor::logging::{self, LogTarget};
use kinto_monitor::{MqttTransport, Transport};

#[derive(Parser, Debug)]
#[command(name = "kinto-device", version)]
#[command(about = "Simulated KINTO wearable publishing telemetry over MQTT")]
struct Args {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MQTT broker host
    #[arg(long)]
    host: Option<String>,

    /// MQTT broker port
    #[arg(long)]
    port: Option<u16>,

    /// Telemetry topic
    #[arg(short, long)]
    topic: Option<String>,

    /// Publish cadence (e.g., "500ms", "1s")
    #[arg(short, long, value_parser = parse_duration)]
    interval: Option<Duration>,

    /// Chance per packet of a simulated fall, in [0, 1]
    #[arg(long)]
    fall_probability: Option<f64>,

    /// Seed the sensor model for a reproducible stream
    #[arg(long)]
    seed: Option<u64>,
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
        if let Some(interval) = self.interval {
            settings.simulator.interval_ms = interval_ms(interval);
        }
        if let Some(p) = self.fall_probability {
            settings.simulator.fall_probability = p;
        }
        // This process is the device: always publishing
        settings.simulator.enabled = true;
        if settings.broker.client_id.is_empty() {
            settings.broker.client_id = format!("kinto-device-{}", std::process::id());
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = args.settings()?;
    logging::init_logging(LogTarget::Stderr, &settings.log_filter)?;

    let (client, driver) = MqttTransport::connect(&settings.broker_options());
    let client = Arc::new(client);
    let driver = driver.spawn();

    let options = settings.simulator_options();
    let transport: Arc<dyn Transport> = client.clone();
    let simulator = match args.seed {
        Some(seed) => Simulator::with_model(
            transport,
            &settings.topic,
            &options,
            SensorModel::seeded(seed, options.fall_probability),
        ),
        None => Simulator::new(transport, &settings.topic, &options),
    };

    info!(
        broker = client.description(),
        topic = %settings.topic,
        interval = %format_duration(options.interval),
        fall_probability = options.fall_probability,
        "Device online"
    );
    let handle = simulator.spawn();

    tokio::signal::ctrl_c().await?;
    info!("Shutting down device");

    handle.abort();
    client.shutdown(driver, Duration::from_secs(1)).await;

    Ok(())
}
