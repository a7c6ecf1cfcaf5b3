use crate::bwee::{Device, Light};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Devices known to the engine, keyed by device id. Values are kept in gateway units.
#[derive(Debug, Default)]
pub struct StateStore {
    devices: HashMap<String, Device>,
}

impl StateStore {
    /// Drops every record and keeps the devices that carry an id.
    pub fn replace_all(&mut self, devices: Vec<Device>) {
        self.devices.clear();
        for device in devices {
            self.insert(device);
        }
        debug!("🔵 Stored {} device(s)", self.devices.len());
    }

    /// Inserts or replaces a device, returns false when it has no id.
    pub fn insert(&mut self, device: Device) -> bool {
        let Some(id) = device.id.clone() else {
            warn!("⚠️ Ignoring device without an id: {:?}", device.name);
            return false;
        };
        self.devices.insert(id, device);
        true
    }

    pub fn remove(&mut self, device_id: &str) -> Option<Device> {
        self.devices.remove(device_id)
    }

    pub fn get(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    pub fn get_mut(&mut self, device_id: &str) -> Option<&mut Device> {
        self.devices.get_mut(device_id)
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.contains_key(device_id)
    }

    /// The first light of a device, provided its id is `light_id`.
    pub fn canonical_light_mut(&mut self, device_id: &str, light_id: &str) -> Option<&mut Light> {
        self.devices
            .get_mut(device_id)?
            .canonical_light_mut()
            .filter(|light| light.id.as_deref() == Some(light_id))
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.keys().cloned().collect();
        ids.sort();
        ids
    }
}
