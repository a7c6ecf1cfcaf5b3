use crate::bwee::domain::Light;
use crate::codec::Flag;
use serde::{Deserialize, Serialize};

// GET /clip/v2/resource/device
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub id: Option<String>,
    pub name: Option<String>,
    pub r#type: Option<String>,
    pub online: Option<Flag>,
    pub join_status: Option<Flag>,
    pub has_new: Option<i64>,
    pub new_version: Option<String>,
    pub product: Option<Product>,
    #[serde(rename = "ext_room")]
    pub room: Option<Room>,
    // Only the first light is ever addressed, multi-light devices are not supported.
    #[serde(rename = "ext_light")]
    pub lights: Option<Vec<Light>>,
    pub services: Option<Vec<Service>>,
}

impl Device {
    pub fn canonical_light(&self) -> Option<&Light> {
        self.lights.as_ref().and_then(|lights| lights.first())
    }

    pub fn canonical_light_mut(&mut self) -> Option<&mut Light> {
        self.lights.as_mut().and_then(|lights| lights.first_mut())
    }

    pub fn has_lights(&self) -> bool {
        self.lights.as_ref().is_some_and(|lights| !lights.is_empty())
    }

    pub fn is_online(&self) -> bool {
        self.online.is_some_and(Flag::is_set)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub cat1_id: Option<i64>,
    pub cat1_name: Option<String>,
    pub cat2_id: Option<i64>,
    pub cat2_name: Option<String>,
    pub cat3_id: Option<i64>,
    pub cat3_name: Option<String>,
    pub hardware_version: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub software_version: Option<String>,
    pub zigbee_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Room {
    pub id: Option<String>,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub background: Option<i64>,
    pub room_kind: Option<i64>,
    pub room_type: Option<String>,
    pub sequence: Option<i64>,
    pub r#type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub rid: Option<String>,
    pub rtype: Option<String>,
}
