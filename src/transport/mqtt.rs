//! MQTT transport built on rumqttc.
//!
//! [`MqttTransport::connect`] returns the client-side handle plus an
//! [`MqttDriver`] that owns the rumqttc event loop. The driver must be spawned
//! on a tokio runtime: it connects lazily, re-subscribes after every CONNACK
//! and routes inbound PUBLISH payloads to the registered handlers.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, Incoming, MqttOptions, Outgoing, QoS};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::{dispatch, LinkState, MessageHandler, Route, Transport, TransportError};

/// Outbound request queue depth between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 64;

/// Connection parameters for an MQTT broker.
#[derive(Debug, Clone)]
pub struct BrokerOptions {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
    /// Pause between reconnect attempts after a connection error.
    pub retry_delay: Duration,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            host: "broker.hivemq.com".to_string(),
            port: 1883,
            client_id: format!("kinto-monitor-{}", std::process::id()),
            keep_alive: Duration::from_secs(60),
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Client-side handle to an MQTT broker.
pub struct MqttTransport {
    client: AsyncClient,
    routes: Arc<RwLock<Vec<Route>>>,
    link: watch::Receiver<LinkState>,
    description: String,
}

impl MqttTransport {
    /// Create the transport and the driver that will own the network connection.
    ///
    /// Nothing touches the network until the driver is polled, so this never
    /// fails; connection problems surface through [`Transport::link_state`].
    pub fn connect(options: &BrokerOptions) -> (Self, MqttDriver) {
        let mut mqtt = MqttOptions::new(&options.client_id, &options.host, options.port);
        mqtt.set_keep_alive(options.keep_alive);
        mqtt.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(mqtt, REQUEST_CAPACITY);
        let routes = Arc::new(RwLock::new(Vec::new()));
        let (link_tx, link_rx) = watch::channel(LinkState::Connecting);
        let broker = format!("{}:{}", options.host, options.port);

        let transport = Self {
            client: client.clone(),
            routes: routes.clone(),
            link: link_rx,
            description: format!("mqtt://{}", broker),
        };
        let driver = MqttDriver {
            eventloop,
            client,
            routes,
            link: link_tx,
            broker,
            retry_delay: options.retry_delay,
        };
        (transport, driver)
    }

    /// Ask the broker for a clean disconnect. The driver stops once it is sent.
    pub fn disconnect(&self) {
        if let Err(e) = self.client.try_disconnect() {
            debug!("MQTT disconnect request not queued: {}", e);
        }
    }

    /// Disconnect and give the driver up to `grace` to flush the DISCONNECT
    /// before aborting it.
    pub async fn shutdown(&self, mut driver: JoinHandle<()>, grace: Duration) {
        self.disconnect();
        if tokio::time::timeout(grace, &mut driver).await.is_err() {
            debug!("MQTT driver still running after {:?}, aborting", grace);
            driver.abort();
        }
    }
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("description", &self.description)
            .field("link", &*self.link.borrow())
            .finish()
    }
}

impl Transport for MqttTransport {
    fn subscribe(&self, topic: &str, on_message: MessageHandler) -> Result<(), TransportError> {
        self.routes.write().push(Route::new(topic, on_message));

        // Before the first CONNACK the driver subscribes every route itself.
        if self.link.borrow().is_connected() {
            self.client
                .try_subscribe(topic, QoS::AtMostOnce)
                .map_err(|e| TransportError::Subscribe(e.to_string()))?;
        }
        Ok(())
    }

    fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_string())
            .map_err(|e| TransportError::Publish(e.to_string()))
    }

    fn link_state(&self) -> watch::Receiver<LinkState> {
        self.link.clone()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Owns the rumqttc event loop. Spawn it with [`MqttDriver::spawn`].
pub struct MqttDriver {
    eventloop: EventLoop,
    client: AsyncClient,
    routes: Arc<RwLock<Vec<Route>>>,
    link: watch::Sender<LinkState>,
    broker: String,
    retry_delay: Duration,
}

impl MqttDriver {
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Poll the event loop until the client disconnects or every handle is dropped.
    pub async fn run(mut self) {
        let mut failures: u64 = 0;

        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    failures = 0;
                    info!(broker = %self.broker, "Connected to MQTT broker");
                    self.link.send_replace(LinkState::Connected);
                    self.resubscribe();
                }
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    let delivered = dispatch(&self.routes, &publish.topic, &publish.payload);
                    if delivered == 0 {
                        trace!(topic = %publish.topic, "No route for inbound message");
                    }
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    info!(broker = %self.broker, "Disconnected from MQTT broker");
                    self.link.send_replace(LinkState::Disconnected("closed".to_string()));
                    return;
                }
                Ok(_) => {}
                Err(ConnectionError::RequestsDone) => {
                    debug!("All MQTT client handles dropped, stopping driver");
                    return;
                }
                Err(e) => {
                    failures += 1;
                    if failures == 1 {
                        error!(broker = %self.broker, error = %e, "MQTT connection failed, retrying in background");
                    } else {
                        debug!(broker = %self.broker, error = %e, attempt = failures, "MQTT reconnect failed");
                    }
                    self.link.send_replace(LinkState::Disconnected(e.to_string()));
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Issue SUBSCRIBE for every registered route. Clean sessions forget
    /// subscriptions across reconnects, so this runs after each CONNACK.
    fn resubscribe(&self) {
        for route in self.routes.read().iter() {
            match self.client.try_subscribe(route.filter.as_str(), QoS::AtMostOnce) {
                Ok(()) => debug!(topic = %route.filter, "Subscribed"),
                Err(e) => warn!(topic = %route.filter, error = %e, "Subscribe request failed"),
            }
        }
    }
}

impl std::fmt::Debug for MqttDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttDriver").field("broker", &self.broker).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn options() -> BrokerOptions {
        BrokerOptions {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "kinto-test".to_string(),
            ..BrokerOptions::default()
        }
    }

    #[test]
    fn test_broker_defaults() {
        let opts = BrokerOptions::default();
        assert_eq!(opts.host, "broker.hivemq.com");
        assert_eq!(opts.port, 1883);
        assert!(opts.client_id.starts_with("kinto-monitor-"));
    }

    #[test]
    fn test_transport_starts_connecting() {
        let (transport, _driver) = MqttTransport::connect(&options());
        assert_eq!(transport.description(), "mqtt://localhost:1883");
        assert_eq!(*transport.link_state().borrow(), LinkState::Connecting);
    }

    #[test]
    fn test_subscribe_before_connect_registers_route() {
        let (transport, driver) = MqttTransport::connect(&options());
        transport
            .subscribe("kinto/wearable/v1/data", Box::new(|_| {}))
            .unwrap();

        let routes = driver.routes.read();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].filter, "kinto/wearable/v1/data");
    }

    #[tokio::test]
    async fn test_shutdown_sends_disconnect_to_broker() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Minimal broker: accept CONNECT, answer CONNACK, report whether a
        // DISCONNECT (0xE0) arrives before the socket closes.
        let broker = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0 && buf[0] == 0x10);
            socket.write_all(&[0x20, 0x02, 0x00, 0x00]).await.unwrap();
            loop {
                let n = socket.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    return false;
                }
                if buf[..n].contains(&0xE0) {
                    return true;
                }
            }
        });

        let (transport, driver) = MqttTransport::connect(&BrokerOptions {
            host: "127.0.0.1".to_string(),
            port,
            client_id: "kinto-shutdown".to_string(),
            ..BrokerOptions::default()
        });
        let driver = driver.spawn();

        let mut link = transport.link_state();
        tokio::time::timeout(Duration::from_secs(5), link.wait_for(|s| s.is_connected()))
            .await
            .unwrap()
            .unwrap();

        transport.shutdown(driver, Duration::from_secs(2)).await;

        let saw_disconnect = tokio::time::timeout(Duration::from_secs(5), broker)
            .await
            .unwrap()
            .unwrap();
        assert!(saw_disconnect);
    }
}
