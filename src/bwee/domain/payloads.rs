use crate::bwee::domain::ColorXy;
use crate::codec::Flag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// Payload of res/device/remove
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRef {
    pub id: Option<String>,
    pub r#type: Option<String>,
}

// Payload of res/device/update, `value` only holds the fields that changed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceUpdatePayload {
    pub id: Option<String>,
    pub value: Option<HashMap<String, Value>>,
}

impl DeviceUpdatePayload {
    pub fn name(&self) -> Option<&str> {
        self.value.as_ref().and_then(|value| value.get("name")).and_then(Value::as_str)
    }
}

// Payload of res/light/update
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightUpdatePayload {
    pub device_id: Option<String>,
    pub id: Option<String>,
    pub value: Option<LightUpdateValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightUpdateValue {
    pub on: Option<Flag>,
    pub brightness: Option<u8>,
    #[serde(rename = "color_cw")]
    pub color_temp: Option<u32>,
    pub color_x: Option<u16>,
    pub color_y: Option<u16>,
    pub color_arr: Option<Vec<ColorXy>>,
    pub color_len: Option<u32>,
    pub color_mode: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DecodeError, decode_str};

    #[test]
    fn device_update_exposes_a_changed_name() -> Result<(), DecodeError> {
        let payloads: Vec<DeviceUpdatePayload> = decode_str(r#"[{ "id": "d1", "value": { "name": "Hallway" } }]"#)?;

        assert_eq!(payloads[0].name(), Some("Hallway"));
        Ok(())
    }

    #[test]
    fn device_update_without_a_name_has_none() -> Result<(), DecodeError> {
        let payloads: Vec<DeviceUpdatePayload> = decode_str(r#"[{ "id": "d1", "value": { "online": 1 } }, { "id": "d2" }]"#)?;

        assert_eq!(payloads[0].name(), None);
        assert_eq!(payloads[1].name(), None);
        Ok(())
    }

    #[test]
    fn light_update_only_sets_the_fields_present() -> Result<(), DecodeError> {
        let payloads: Vec<LightUpdatePayload> = decode_str(include_str!("../../../tests/resources/light_update_event.json"))?;

        let value = payloads[0].value.as_ref().unwrap();
        assert_eq!(payloads[0].device_id.as_deref(), Some("dev-1"));
        assert_eq!(value.brightness, Some(50));
        assert_eq!(value.on, Some(Flag::from(true)));
        assert_eq!(value.color_temp, None);
        assert_eq!(value.color_x, None);
        Ok(())
    }
}
