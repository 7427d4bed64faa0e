//! MQTT transport using `rumqttc`.
//!
//! `connect` drives the event loop until the broker acknowledges the
//! session, bounded by the configured handshake timeout. A background task
//! then keeps polling the event loop: it dispatches incoming publishes to the
//! registered handlers, tracks the connected flag and re-subscribes after the
//! client reconnects.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, NetworkOptions, Outgoing,
    Packet, QoS,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{topic_matches, Channel, MessageHandler};
use crate::config::BrokerConfig;
use crate::error::{Error, Result};

/// Request queue depth between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 16;

/// How long shutdown waits for queued requests to flush before aborting.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Fire-and-forget, matching the transport's default delivery.
const QOS: QoS = QoS::AtMostOnce;

#[derive(Default)]
struct Shared {
    connected: AtomicBool,
    handlers: RwLock<Vec<(String, Arc<dyn MessageHandler>)>>,
}

impl Shared {
    fn dispatch(&self, topic: &str, payload: &[u8]) {
        // Snapshot matching handlers so none run under the lock
        let matching: Vec<Arc<dyn MessageHandler>> = self
            .handlers
            .read()
            .iter()
            .filter(|(filter, _)| topic_matches(filter, topic))
            .map(|(_, handler)| handler.clone())
            .collect();

        debug!("Received {} bytes on {} ({} handlers)", payload.len(), topic, matching.len());
        for handler in matching {
            handler.on_message(topic, payload);
        }
    }

    fn filters(&self) -> Vec<String> {
        let mut filters: Vec<String> =
            self.handlers.read().iter().map(|(f, _)| f.clone()).collect();
        filters.sort();
        filters.dedup();
        filters
    }
}

/// A live session with an MQTT broker.
///
/// # Example
///
/// ```no_run
/// use platoon::channel::{Channel, MqttChannel};
/// use platoon::config::BrokerConfig;
///
/// # tokio_test::block_on(async {
/// let channel = MqttChannel::connect(&BrokerConfig::default(), "platoon-demo").await?;
/// channel.publish("platoon/speed", b"{}".to_vec()).await?;
/// channel.shutdown().await;
/// # Ok::<(), platoon::Error>(())
/// # });
/// ```
pub struct MqttChannel {
    client: AsyncClient,
    shared: Arc<Shared>,
    description: String,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MqttChannel {
    /// Connect to the broker described by `broker` under `client_id`.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] if the network connection fails, the broker
    /// refuses the session, or no acknowledgment arrives within the
    /// keep-alive interval.
    pub async fn connect(broker: &BrokerConfig, client_id: &str) -> Result<Self> {
        let mut options = MqttOptions::new(client_id, broker.host.clone(), broker.port);
        options.set_keep_alive(broker.keep_alive());

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        // The handshake would otherwise give up after the client's 5 s default
        let mut network = NetworkOptions::new();
        network.set_connection_timeout(broker.keep_alive_secs);
        eventloop.set_network_options(network);
        let description = format!("mqtt://{}", broker.endpoint());
        info!("Connecting to {} as {}", description, client_id);

        let timeout = broker.keep_alive();
        match tokio::time::timeout(timeout, await_connack(&mut eventloop)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Connection(format!(
                    "no acknowledgment from {} within {:?}",
                    description, timeout
                )))
            }
        }
        info!("Connected to {}", description);

        let shared = Arc::new(Shared::default());
        shared.connected.store(true, Ordering::SeqCst);

        let task = tokio::spawn(run_event_loop(
            eventloop,
            client.clone(),
            shared.clone(),
            description.clone(),
        ));

        Ok(Self {
            client,
            shared,
            description,
            task: Mutex::new(Some(task)),
        })
    }
}

async fn await_connack(eventloop: &mut EventLoop) -> Result<()> {
    loop {
        if let Event::Incoming(Packet::ConnAck(ack)) = eventloop.poll().await? {
            return match ack.code {
                ConnectReturnCode::Success => Ok(()),
                code => Err(Error::Connection(format!(
                    "broker refused connection: {:?}",
                    code
                ))),
            };
        }
    }
}

async fn run_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    shared: Arc<Shared>,
    description: String,
) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                shared.dispatch(&publish.topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                backoff = INITIAL_BACKOFF;
                if !shared.connected.swap(true, Ordering::SeqCst) {
                    info!("Reconnected to {}", description);
                    for filter in shared.filters() {
                        if let Err(e) = client.try_subscribe(filter.clone(), QOS) {
                            warn!("Failed to re-subscribe to {}: {}", filter, e);
                        }
                    }
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                shared.connected.store(false, Ordering::SeqCst);
                info!("Disconnected from {}", description);
                return;
            }
            Ok(_) => {}
            Err(e) => {
                if shared.connected.swap(false, Ordering::SeqCst) {
                    error!("Connection to {} lost: {}", description, e);
                } else {
                    debug!("Reconnect to {} failed: {}", description, e);
                }
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

#[async_trait]
impl Channel for MqttChannel {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::Transport(format!(
                "{} is not connected",
                self.description
            )));
        }
        self.client.publish(topic, QOS, false, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: Arc<dyn MessageHandler>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::Transport(format!(
                "cannot subscribe to {}: {} is not connected",
                topic, self.description
            )));
        }
        self.client.subscribe(topic, QOS).await?;
        self.shared.handlers.write().push((topic.to_string(), handler));
        info!("Subscribed to {} on {}", topic, self.description);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn shutdown(&self) {
        if let Err(e) = self.client.disconnect().await {
            debug!("Disconnect request failed: {}", e);
        }
        self.shared.connected.store(false, Ordering::SeqCst);

        // The event loop returns once it has sent the queued disconnect
        let task = self.task.lock().take();
        if let Some(mut task) = task {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
                warn!("Event loop for {} did not stop in time", self.description);
                task.abort();
            }
        }
    }
}

impl fmt::Debug for MqttChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttChannel")
            .field("description", &self.description)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_routes_by_filter() {
        let shared = Shared::default();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let sink = hits.clone();
        let handler: Arc<dyn MessageHandler> =
            Arc::new(move |topic: &str, _: &[u8]| sink.lock().push(topic.to_string()));
        shared.handlers.write().push(("platoon/speed".to_string(), handler));

        shared.dispatch("platoon/speed", b"{}");
        shared.dispatch("platoon/other", b"{}");

        assert_eq!(*hits.lock(), vec!["platoon/speed".to_string()]);
    }

    #[test]
    fn test_filters_deduplicated() {
        let shared = Shared::default();
        let noop: Arc<dyn MessageHandler> = Arc::new(|_: &str, _: &[u8]| {});
        shared.handlers.write().push(("platoon/speed".into(), noop.clone()));
        shared.handlers.write().push(("platoon/speed".into(), noop));

        assert_eq!(shared.filters(), vec!["platoon/speed".to_string()]);
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let broker = BrokerConfig {
            host: "127.0.0.1".into(),
            // Port 1 is reserved and not listening on test hosts
            port: 1,
            keep_alive_secs: 5,
            client_id: None,
        };

        let result = MqttChannel::connect(&broker, "platoon-test").await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_silent_broker_times_out_after_keep_alive() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // Accept and hold sockets without ever answering CONNECT
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let broker = BrokerConfig {
            host: "127.0.0.1".into(),
            port,
            keep_alive_secs: 7,
            client_id: None,
        };

        let started = std::time::Instant::now();
        let result = MqttChannel::connect(&broker, "platoon-test").await;
        let elapsed = started.elapsed();
        silent.abort();

        assert!(matches!(result, Err(Error::Connection(_))));
        assert!(elapsed >= Duration::from_secs(6), "gave up after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(20), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_failed_subscribe_registers_no_handler() {
        let options = MqttOptions::new("platoon-test", "127.0.0.1", 1883);
        let (client, eventloop) = AsyncClient::new(options, 1);
        // Without an event loop the request queue is closed
        drop(eventloop);

        let shared = Arc::new(Shared::default());
        shared.connected.store(true, Ordering::SeqCst);
        let channel = MqttChannel {
            client,
            shared: shared.clone(),
            description: "mqtt://127.0.0.1:1883".into(),
            task: Mutex::new(None),
        };

        let noop: Arc<dyn MessageHandler> = Arc::new(|_: &str, _: &[u8]| {});
        let result = channel.subscribe("platoon/speed", noop).await;

        assert!(matches!(result, Err(Error::Transport(_))));
        assert!(shared.handlers.read().is_empty());
        assert!(shared.filters().is_empty());
    }
}
