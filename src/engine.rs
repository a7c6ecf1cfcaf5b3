use crate::app_config::AppConfig;
use crate::bwee::resources::{device_control, get_all_devices, get_lights};
use crate::bwee::{
    Ability, ApiClient, ApiResult, ChannelMessage, ControlForm, Device, DeviceUpdatePayload, EventSource,
    EventSubscriber, LightUpdatePayload, ResourceRef, SearchForm, Topic, dispatch,
};
use crate::domain::{Host, LightEntity, LightState, TurnOn};
use crate::store::StateStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, instrument, warn};

const LIGHTING_CATEGORY: i64 = 2;

/// Keeps the store and the host's light entities in line with the gateway.
///
/// All state is owned here and mutated from the task that drives [`SyncEngine::run_until`];
/// the event channel only hands decoded batches over through an mpsc channel.
pub struct SyncEngine<H: Host, S: EventSource> {
    client: ApiClient,
    host: H,
    events: S,
    store: StateStore,
    entities: HashMap<String, LightEntity>,
    tx: mpsc::Sender<ChannelMessage>,
    rx: mpsc::Receiver<ChannelMessage>,
    retry_ms: u64,
    retry_max_delay: Duration,
}

impl<H: Host, S: EventSource> SyncEngine<H, S> {
    pub fn new(client: ApiClient, host: H, events: S, config: &AppConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.core().event_buffer_size());

        SyncEngine {
            client,
            host,
            events,
            store: StateStore::default(),
            entities: HashMap::new(),
            tx,
            rx,
            retry_ms: config.mqtt().retry_ms(),
            retry_max_delay: config.mqtt().retry_max_delay(),
        }
    }

    /// Loads the device snapshot, creates one entity per device and opens the event channel.
    ///
    /// Calling it again starts over: existing entities are removed first. A channel that
    /// cannot be opened is retried from [`SyncEngine::run_until`].
    #[instrument(skip(self))]
    pub async fn start(&mut self) {
        self.load_devices().await;

        for topic in Topic::ALL {
            self.events.set_handler(topic, Some(self.tx.clone())).await;
        }
        self.events.set_disconnect_handler(Some(self.tx.clone())).await;

        if let Err(e) = self.events.connect().await {
            warn!("⚠️ Could not open the event channel: {}", e);
            if self.tx.send(ChannelMessage::ConnectionLost(e.to_string())).await.is_err() {
                warn!("⚠️ Engine inbox is closed");
            }
        }
    }

    async fn load_devices(&mut self) {
        let form = SearchForm {
            cat1_id: Some(LIGHTING_CATEGORY),
            ext_light: Some(1),
            ext_room: Some(1),
            join_status: Some(1),
        };
        let result = get_all_devices(&self.client, &form).await;

        self.remove_all_entities().await;

        if !result.is_ok() {
            warn!("⚠️ Could not load devices, starting without lights: {}", result.message());
            self.store.clear();
            return;
        }

        self.store.replace_all(result.into_objects());

        let mut states = Vec::with_capacity(self.store.len());
        for id in self.store.ids() {
            let entity = LightEntity::new(id.clone());
            if let Some(state) = entity.snapshot(&self.store) {
                states.push(state);
            }
            self.entities.insert(id, entity);
        }

        info!("✅ Created {} light(s)", states.len());
        if !states.is_empty() {
            self.host.add_entities(states).await;
        }
    }

    /// Processes channel messages until `shutdown` completes, then shuts the engine down.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) {
        tokio::pin!(shutdown);

        loop {
            let message = tokio::select! {
                _ = &mut shutdown => break,
                message = self.rx.recv() => message,
            };

            match message {
                Some(ChannelMessage::Event(event)) => dispatch(event, self).await,
                Some(ChannelMessage::ConnectionLost(reason)) => {
                    warn!("🔴 Event channel lost: {}. Reconnecting...", reason);
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = self.reconnect() => {}
                    }
                }
                None => break,
            }
        }

        self.shutdown().await;
    }

    /// Delays between reconnect attempts: `retry_ms`, then doubled per attempt up to the maximum.
    fn reconnect_delays(&self) -> ExponentialBackoff {
        // Each delay is base^n * factor, so a base of 2 doubles from the configured first delay.
        ExponentialBackoff::from_millis(2)
            .factor(self.retry_ms.div_ceil(2))
            .max_delay(self.retry_max_delay)
    }

    async fn reconnect(&mut self) {
        for delay in self.reconnect_delays().map(jitter) {
            match self.events.connect().await {
                Ok(()) => {
                    info!("✅ Event channel reconnected");
                    return;
                }
                Err(e) => {
                    warn!("⚠️ Reconnecting failed: {}. Retrying in {:?}...", e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Removes every entity and record, then closes the event channel.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self) {
        self.remove_all_entities().await;
        self.store.clear();
        self.events.disconnect().await;
        info!("🛑 Engine stopped");
    }

    async fn remove_all_entities(&mut self) {
        let mut ids: Vec<String> = self.entities.drain().map(|(id, _)| id).collect();
        ids.sort();
        for id in ids {
            self.host.remove_entity(&id).await;
        }
    }

    #[instrument(skip(self))]
    pub async fn turn_on(&mut self, device_id: &str, turn_on: TurnOn) -> ApiResult<Value> {
        let ability = self
            .store
            .get(device_id)
            .and_then(Device::canonical_light)
            .and_then(|light| light.ability)
            .map(Ability::from);

        self.control(device_id, turn_on.to_form(ability)).await
    }

    #[instrument(skip(self))]
    pub async fn turn_off(&mut self, device_id: &str) -> ApiResult<Value> {
        let form = ControlForm {
            on: Some(false.into()),
            ..ControlForm::default()
        };
        self.control(device_id, form).await
    }

    async fn control(&mut self, device_id: &str, form: ControlForm) -> ApiResult<Value> {
        if !self.entities.contains_key(device_id) {
            warn!(device_id, "⚠️ Control request for unknown device");
            return ApiResult::failure(format!("unknown device '{}'", device_id));
        }

        let result = device_control(&self.client, device_id, &form).await;
        if !result.is_ok() {
            warn!(device_id, "⚠️ Gateway rejected the control request: {}", result.message());
            return result;
        }

        if let Some(light) = self.store.get_mut(device_id).and_then(Device::canonical_light_mut) {
            light.apply_control(&form);
        }
        self.write_state(device_id).await;
        result
    }

    pub fn light_state(&self, device_id: &str) -> Option<LightState> {
        self.entities.get(device_id)?.snapshot(&self.store)
    }

    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entities.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.store.get(device_id)
    }

    async fn write_state(&mut self, device_id: &str) {
        let Some(state) = self.light_state(device_id) else {
            return;
        };
        self.host.write_state(state).await;
    }
}

#[async_trait]
impl<H: Host, S: EventSource> EventSubscriber for SyncEngine<H, S> {
    async fn on_devices_added(&mut self, devices: Vec<Device>) {
        for mut device in devices {
            let Some(id) = device.id.clone() else {
                warn!("⚠️ Ignoring added device without an id");
                continue;
            };

            if !device.has_lights() {
                let result = get_lights(&self.client, &id).await;
                if result.is_ok() {
                    device.lights = Some(result.into_objects());
                } else {
                    warn!(device_id = %id, "⚠️ Could not fetch lights, adding device without them");
                    device.lights = Some(Vec::new());
                }
            }

            self.store.insert(device);

            if self.entities.contains_key(&id) {
                debug!(device_id = %id, "🔵 Device re-added, replacing its record");
                self.write_state(&id).await;
                continue;
            }

            let entity = LightEntity::new(id.clone());
            let state = entity.snapshot(&self.store);
            self.entities.insert(id.clone(), entity);
            if let Some(state) = state {
                info!(device_id = %id, "🟢 Added light '{}'", state.name.as_deref().unwrap_or_default());
                self.host.add_entities(vec![state]).await;
            }
        }
    }

    async fn on_devices_removed(&mut self, removed: Vec<ResourceRef>) {
        for resource in removed {
            let Some(id) = resource.id else {
                continue;
            };

            if self.entities.remove(&id).is_none() {
                debug!(device_id = %id, "Ignoring removal of unknown device");
                continue;
            }

            self.store.remove(&id);
            self.host.remove_entity(&id).await;
            info!(device_id = %id, "🔴 Removed light");
        }
    }

    async fn on_devices_updated(&mut self, updates: Vec<DeviceUpdatePayload>) {
        for update in updates {
            let Some(id) = update.id.as_deref() else {
                continue;
            };

            if !self.entities.contains_key(id) {
                debug!(device_id = id, "Ignoring update of unknown device");
                continue;
            }
            let Some(device) = self.store.get_mut(id) else {
                continue;
            };

            if let Some(name) = update.name() {
                info!(device_id = id, "🟢 Renamed '{}' to '{}'", device.name.as_deref().unwrap_or_default(), name);
                device.name = Some(name.to_string());
            }
            self.write_state(id).await;
        }
    }

    async fn on_lights_updated(&mut self, updates: Vec<LightUpdatePayload>) {
        for update in updates {
            let (Some(device_id), Some(light_id)) = (update.device_id.as_deref(), update.id.as_deref()) else {
                continue;
            };

            if !self.entities.contains_key(device_id) {
                debug!(device_id, "Ignoring light update of unknown device");
                continue;
            }
            let Some(light) = self.store.canonical_light_mut(device_id, light_id) else {
                debug!(device_id, light_id, "Ignoring update of a light that is not the device's first");
                continue;
            };

            if let Some(value) = &update.value {
                light.apply_update(value);
            }
            debug!(device_id, "🟢 Updated light {:?}", update.value);
            self.write_state(device_id).await;
        }
    }
}
