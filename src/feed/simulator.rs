//! Simulated wearable.
//!
//! Synthesizes plausible vitals on a fixed cadence and publishes them through
//! a [`Transport`], exactly like a real band would. Enabling or pausing the
//! simulator only gates this producer; it never touches the ingestion channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use kinto_types::{Packet, SPO2_MAX};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::transport::{Transport, TransportError};

/// Impact magnitude reported for a simulated fall, in G.
const FALL_IMPACT_G: f64 = 4.5;

/// Synthetic vitals generator.
///
/// Heart rate follows a slow sine around 75 BPM, temperature drifts around
/// 36.8 °C, SpO2 hovers near 98 % and the accelerometer sits at 1 G until a
/// random fall spikes it to 4.5 G.
#[derive(Debug)]
pub struct SensorModel {
    step: f64,
    fall_probability: f64,
    rng: StdRng,
}

impl SensorModel {
    pub fn new(fall_probability: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), fall_probability)
    }

    /// Deterministic generator for tests and reproducible demos.
    pub fn seeded(seed: u64, fall_probability: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), fall_probability)
    }

    fn with_rng(rng: StdRng, fall_probability: f64) -> Self {
        Self {
            step: 0.0,
            fall_probability: fall_probability.clamp(0.0, 1.0),
            rng,
        }
    }

    /// Produce the next sample, stamped with `timestamp` seconds.
    pub fn next_packet(&mut self, timestamp: f64) -> Packet {
        self.step += 0.1;

        let heart_rate =
            (75.0 + 5.0 * (self.step * 0.5).sin() + self.rng.gen_range(-2.0..2.0)) as i32;
        let spo2 = round_to(98.0 + self.rng.gen_range(-1.0..1.0), 1).min(SPO2_MAX);
        let temperature = round_to(
            36.8 + 0.2 * (self.step * 0.1).sin() + self.rng.gen_range(-0.1..0.1),
            2,
        );

        let fall_detected = self.rng.gen_bool(self.fall_probability);
        let impact_force = if fall_detected {
            FALL_IMPACT_G
        } else {
            round_to(1.0 + self.rng.gen_range(-0.1..0.1), 2)
        };

        Packet {
            timestamp,
            heart_rate,
            spo2,
            temperature,
            impact_force,
            fall_detected,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Simulator tuning.
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    /// Publish cadence.
    pub interval: Duration,
    /// Chance per tick of a simulated fall.
    pub fall_probability: f64,
    /// Whether publishing starts immediately.
    pub enabled: bool,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            fall_probability: 0.01,
            enabled: true,
        }
    }
}

/// Shared on/off switch for a running simulator.
#[derive(Debug, Clone)]
pub struct SimulatorControl {
    enabled: Arc<AtomicBool>,
}

impl SimulatorControl {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flip the switch, returning the new state.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }
}

/// A synthetic wearable bound to a transport and topic.
#[derive(Debug)]
pub struct Simulator {
    model: SensorModel,
    transport: Arc<dyn Transport>,
    topic: String,
    interval: Duration,
    control: SimulatorControl,
}

impl Simulator {
    pub fn new(transport: Arc<dyn Transport>, topic: &str, options: &SimulatorOptions) -> Self {
        Self::with_model(
            transport,
            topic,
            options,
            SensorModel::new(options.fall_probability),
        )
    }

    pub fn with_model(
        transport: Arc<dyn Transport>,
        topic: &str,
        options: &SimulatorOptions,
        model: SensorModel,
    ) -> Self {
        Self {
            model,
            transport,
            topic: topic.to_string(),
            interval: options.interval,
            control: SimulatorControl::new(options.enabled),
        }
    }

    pub fn control(&self) -> SimulatorControl {
        self.control.clone()
    }

    /// Synthesize one packet and publish it.
    pub fn publish_once(&mut self) -> Result<Packet, TransportError> {
        let packet = self.model.next_packet(now_secs());
        self.transport.publish(&self.topic, &packet.to_json())?;
        Ok(packet)
    }

    /// Run the publish loop on the current tokio runtime.
    pub fn spawn(self) -> SimulatorHandle {
        let control = self.control.clone();
        let task = tokio::spawn(self.run());
        SimulatorHandle { control, task }
    }

    async fn run(mut self) {
        info!(
            topic = %self.topic,
            interval_ms = self.interval.as_millis() as u64,
            "Simulated wearable started"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.control.is_enabled() {
                continue;
            }

            match self.publish_once() {
                Ok(packet) => {
                    if packet.fall_detected {
                        warn!(svm = packet.impact_force, "Simulated fall event triggered");
                    }
                    debug!(
                        hr = packet.heart_rate,
                        spo2 = packet.spo2,
                        temp = packet.temperature,
                        svm = packet.impact_force,
                        "[TX]"
                    );
                }
                Err(e) => warn!(error = %e, "Simulated packet not published"),
            }
        }
    }
}

/// Handle to a spawned simulator task.
#[derive(Debug)]
pub struct SimulatorHandle {
    control: SimulatorControl,
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    pub fn control(&self) -> SimulatorControl {
        self.control.clone()
    }

    /// Stop the publish loop.
    pub fn abort(&self) {
        self.task.abort();
    }
}
