use crate::app_config::Mqtt;
use crate::bwee::{Device, DeviceUpdatePayload, LightUpdatePayload, ResourceRef};
use crate::codec::{self, DecodeError};
use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const REQUEST_CAPACITY: usize = 10;

pub type EventSender = mpsc::Sender<ChannelMessage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    DeviceAdd,
    DeviceRemove,
    DeviceUpdate,
    LightUpdate,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::DeviceAdd, Topic::DeviceRemove, Topic::DeviceUpdate, Topic::LightUpdate];

    pub fn path(self) -> &'static str {
        match self {
            Topic::DeviceAdd => "res/device/add",
            Topic::DeviceRemove => "res/device/remove",
            Topic::DeviceUpdate => "res/device/update",
            Topic::LightUpdate => "res/light/update",
        }
    }

    pub fn from_path(path: &str) -> Option<Topic> {
        Topic::ALL.into_iter().find(|topic| topic.path() == path)
    }
}

/// A decoded batch received on one of the gateway topics.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    DevicesAdded(Vec<Device>),
    DevicesRemoved(Vec<ResourceRef>),
    DevicesUpdated(Vec<DeviceUpdatePayload>),
    LightsUpdated(Vec<LightUpdatePayload>),
}

impl GatewayEvent {
    pub fn decode(topic: Topic, payload: &[u8]) -> Result<Self, DecodeError> {
        let event = match topic {
            Topic::DeviceAdd => GatewayEvent::DevicesAdded(codec::decode_slice(payload)?),
            Topic::DeviceRemove => GatewayEvent::DevicesRemoved(codec::decode_slice(payload)?),
            Topic::DeviceUpdate => GatewayEvent::DevicesUpdated(codec::decode_slice(payload)?),
            Topic::LightUpdate => GatewayEvent::LightsUpdated(codec::decode_slice(payload)?),
        };
        Ok(event)
    }
}

/// What the listener hands over to the task that owns the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Event(GatewayEvent),
    ConnectionLost(String),
}

#[derive(Error, Debug)]
pub enum EventChannelError {
    #[error("connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),
    #[error("client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    #[error("broker refused the connection: {0}")]
    Refused(String),
    #[error("no answer from the broker within {0:?}")]
    Timeout(Duration),
}

/// Push channel the engine subscribes to. Implemented over MQTT by [`EventChannel`].
#[async_trait]
pub trait EventSource: Send {
    /// Registers the sender for a topic, `None` unregisters it.
    async fn set_handler(&mut self, topic: Topic, handler: Option<EventSender>);

    async fn set_disconnect_handler(&mut self, handler: Option<EventSender>);

    async fn connect(&mut self) -> Result<(), EventChannelError>;

    async fn disconnect(&mut self);
}

/// Receives decoded events, one method per topic.
#[async_trait]
pub trait EventSubscriber: Send {
    async fn on_devices_added(&mut self, devices: Vec<Device>);

    async fn on_devices_removed(&mut self, removed: Vec<ResourceRef>);

    async fn on_devices_updated(&mut self, updates: Vec<DeviceUpdatePayload>);

    async fn on_lights_updated(&mut self, updates: Vec<LightUpdatePayload>);
}

pub async fn dispatch<S: EventSubscriber + ?Sized>(event: GatewayEvent, subscriber: &mut S) {
    match event {
        GatewayEvent::DevicesAdded(devices) => subscriber.on_devices_added(devices).await,
        GatewayEvent::DevicesRemoved(removed) => subscriber.on_devices_removed(removed).await,
        GatewayEvent::DevicesUpdated(updates) => subscriber.on_devices_updated(updates).await,
        GatewayEvent::LightsUpdated(updates) => subscriber.on_lights_updated(updates).await,
    }
}

#[derive(Debug, Default)]
struct Handlers {
    topics: HashMap<Topic, EventSender>,
    disconnect: Option<EventSender>,
}

/// MQTT connection to the broker embedded in the gateway.
pub struct EventChannel {
    options: MqttOptions,
    connect_timeout: Duration,
    handlers: Arc<RwLock<Handlers>>,
    closing: Arc<AtomicBool>,
    client: Option<AsyncClient>,
    listener: Option<JoinHandle<()>>,
}

impl EventChannel {
    pub fn new(ip_address: &str, config: &Mqtt) -> Self {
        let mut options = MqttOptions::new(format!("bwee-{}", std::process::id()), ip_address, config.port());
        options.set_keep_alive(KEEP_ALIVE);
        options.set_max_packet_size(config.max_packet_size(), config.max_packet_size());

        EventChannel {
            options,
            connect_timeout: config.connect_timeout(),
            handlers: Arc::new(RwLock::new(Handlers::default())),
            closing: Arc::new(AtomicBool::new(false)),
            client: None,
            listener: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.listener.as_ref().is_some_and(|listener| !listener.is_finished())
    }

    #[cfg(test)]
    pub(crate) async fn handle_message(&self, topic: &str, payload: &[u8]) {
        route(&self.handlers, topic, payload).await;
    }

    async fn teardown(&mut self) {
        self.closing.store(true, Ordering::SeqCst);

        if let Some(client) = self.client.take() {
            if let Err(e) = client.try_disconnect() {
                debug!("Could not queue the disconnect request: {}", e);
            }
        }

        if let Some(mut listener) = self.listener.take() {
            if tokio::time::timeout(self.connect_timeout, &mut listener).await.is_err() {
                listener.abort();
            }
        }
    }
}

#[async_trait]
impl EventSource for EventChannel {
    async fn set_handler(&mut self, topic: Topic, handler: Option<EventSender>) {
        let mut handlers = self.handlers.write().await;
        match handler {
            Some(handler) => handlers.topics.insert(topic, handler),
            None => handlers.topics.remove(&topic),
        };
    }

    async fn set_disconnect_handler(&mut self, handler: Option<EventSender>) {
        self.handlers.write().await.disconnect = handler;
    }

    #[instrument(skip(self))]
    async fn connect(&mut self) -> Result<(), EventChannelError> {
        self.teardown().await;

        let (host, port) = self.options.broker_address();
        info!("📡 Connecting to the event channel at {}:{}...", host, port);

        let (client, mut event_loop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);
        tokio::time::timeout(self.connect_timeout, wait_for_connack(&mut event_loop))
            .await
            .map_err(|_| EventChannelError::Timeout(self.connect_timeout))??;

        for topic in Topic::ALL {
            client.subscribe(topic.path(), QoS::AtLeastOnce).await?;
        }

        let closing = Arc::new(AtomicBool::new(false));
        self.listener = Some(tokio::spawn(listen(event_loop, self.handlers.clone(), closing.clone())));
        self.closing = closing;
        self.client = Some(client);

        info!("📡 Connecting to the event channel at {}:{}... OK", host, port);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.client.is_none() && self.listener.is_none() {
            return;
        }

        self.teardown().await;
        info!("📡 Disconnected from the event channel");
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<(), EventChannelError> {
    loop {
        if let Event::Incoming(Packet::ConnAck(ack)) = event_loop.poll().await? {
            return match ack.code {
                ConnectReturnCode::Success => Ok(()),
                code => Err(EventChannelError::Refused(format!("{:?}", code))),
            };
        }
    }
}

async fn listen(mut event_loop: EventLoop, handlers: Arc<RwLock<Handlers>>, closing: Arc<AtomicBool>) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                route(&handlers, &publish.topic, &publish.payload).await;
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => {}
            Err(e) => {
                if !closing.load(Ordering::SeqCst) {
                    connection_lost(&handlers, e.to_string()).await;
                }
                break;
            }
        }
    }
    debug!("Event channel listener exiting");
}

async fn route(handlers: &RwLock<Handlers>, path: &str, payload: &[u8]) {
    let Some(topic) = Topic::from_path(path) else {
        debug!(topic = path, "Ignoring message on unknown topic");
        return;
    };

    let Some(handler) = handlers.read().await.topics.get(&topic).cloned() else {
        debug!(topic = path, "Ignoring message, no handler registered");
        return;
    };

    match GatewayEvent::decode(topic, payload) {
        Ok(event) => {
            debug!(topic = path, "🔵 Received {:?}", event);
            if handler.send(ChannelMessage::Event(event)).await.is_err() {
                warn!(topic = path, "⚠️ Handler is gone, dropping event");
            }
        }
        Err(e) => error!(topic = path, "❌ Could not decode event: {}", e),
    }
}

async fn connection_lost(handlers: &RwLock<Handlers>, reason: String) {
    warn!("⚠️ Lost the event channel connection: {}", reason);

    let disconnect = handlers.read().await.disconnect.clone();
    if let Some(disconnect) = disconnect {
        if disconnect.send(ChannelMessage::ConnectionLost(reason)).await.is_err() {
            warn!("⚠️ Disconnect handler is gone");
        }
    }
}
