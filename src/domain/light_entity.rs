use crate::bwee::{Ability, COLOR_MODE_TEMP, COLOR_MODE_XY, ControlForm, DeviceClass, Light};
use crate::extensions::scale_ext::{BrightnessScale, ChromaticityScale, ChromaticityWire};
use crate::store::StateStore;

pub const MIN_COLOR_TEMP_KELVIN: u32 = 2000;
pub const MAX_COLOR_TEMP_KELVIN: u32 = 6500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Unknown,
    OnOff,
    Brightness,
    ColorTemp,
    Xy,
}

impl ColorMode {
    pub fn from_wire(color_mode: Option<u8>) -> Self {
        match color_mode {
            Some(COLOR_MODE_XY) => ColorMode::Xy,
            Some(COLOR_MODE_TEMP) => ColorMode::ColorTemp,
            _ => ColorMode::Unknown,
        }
    }

    pub fn supported_by(class: DeviceClass) -> Vec<ColorMode> {
        match class {
            DeviceClass::ColorAndTemp => vec![ColorMode::ColorTemp, ColorMode::Xy],
            DeviceClass::Color => vec![ColorMode::Xy],
            DeviceClass::ColorTemp => vec![ColorMode::ColorTemp],
            DeviceClass::Brightness => vec![ColorMode::Brightness],
            DeviceClass::OnOff => vec![ColorMode::OnOff],
            DeviceClass::None => vec![ColorMode::Unknown],
        }
    }
}

/// Registry details of the physical device behind an entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub model_id: Option<String>,
    pub sw_version: Option<String>,
    pub hw_version: Option<String>,
    pub suggested_area: Option<String>,
}

/// What a host sees of a light, in host units: brightness 0-255, xy 0.0-1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct LightState {
    pub unique_id: String,
    pub name: Option<String>,
    pub available: bool,
    pub is_on: bool,
    pub brightness: Option<u8>,
    pub color_mode: ColorMode,
    pub supported_color_modes: Vec<ColorMode>,
    pub color_temp_kelvin: Option<u32>,
    pub min_color_temp_kelvin: u32,
    pub max_color_temp_kelvin: u32,
    pub xy_color: Option<(f64, f64)>,
    pub device_info: DeviceInfo,
}

/// The engine's handle on a light entity. Holds no state of its own, every read goes through the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightEntity {
    unique_id: String,
}

impl LightEntity {
    pub fn new(unique_id: impl Into<String>) -> Self {
        LightEntity {
            unique_id: unique_id.into(),
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Reads the current state of the entity's device, `None` once the device left the store.
    pub fn snapshot(&self, store: &StateStore) -> Option<LightState> {
        let device = store.get(&self.unique_id)?;
        let product = device.product.as_ref();
        let light = device.canonical_light();

        Some(LightState {
            unique_id: self.unique_id.clone(),
            name: device.name.clone(),
            available: device.is_online(),
            is_on: light.is_some_and(Light::is_on),
            brightness: light.and_then(|l| l.brightness).map(BrightnessScale::percent_to_byte),
            color_mode: ColorMode::from_wire(light.and_then(|l| l.color_mode)),
            supported_color_modes: ColorMode::supported_by(DeviceClass::of_category(product.and_then(|p| p.cat3_id))),
            color_temp_kelvin: light.and_then(|l| l.color_temp),
            min_color_temp_kelvin: MIN_COLOR_TEMP_KELVIN,
            max_color_temp_kelvin: MAX_COLOR_TEMP_KELVIN,
            xy_color: light.and_then(|l| Some((l.color_x?.to_unit(), l.color_y?.to_unit()))),
            device_info: DeviceInfo {
                identifier: self.unique_id.clone(),
                name: device.name.clone(),
                manufacturer: product.and_then(|p| p.manufacturer.clone()),
                model: product.and_then(|p| p.cat3_name.clone()),
                model_id: product.and_then(|p| p.model.clone()),
                sw_version: product.and_then(|p| p.software_version.clone()),
                hw_version: product.and_then(|p| p.hardware_version.clone()),
                suggested_area: device.room.as_ref().and_then(|room| room.name.clone()),
            },
        })
    }
}

/// A host's request to switch a light on, in host units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TurnOn {
    pub brightness: Option<u8>,
    pub color_temp_kelvin: Option<u32>,
    pub xy_color: Option<(f64, f64)>,
}

impl TurnOn {
    /// Builds the gateway request. Without a known ability every field is sent.
    pub fn to_form(&self, ability: Option<Ability>) -> ControlForm {
        let supports = |check: fn(Ability) -> bool| ability.is_none_or(check);

        ControlForm {
            on: Some(true.into()),
            brightness: self
                .brightness
                .filter(|_| supports(Ability::supports_brightness))
                .map(BrightnessScale::byte_to_percent),
            color_temp: self
                .color_temp_kelvin
                .filter(|_| supports(Ability::supports_color_temp))
                .map(|kelvin| kelvin.clamp(MIN_COLOR_TEMP_KELVIN, MAX_COLOR_TEMP_KELVIN)),
            color_x: self.xy_color.filter(|_| supports(Ability::supports_color)).map(|(x, _)| x.to_wire()),
            color_y: self.xy_color.filter(|_| supports(Ability::supports_color)).map(|(_, y)| y.to_wire()),
            ..ControlForm::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bwee::{ApiResult, Device};
    use crate::codec::{Flag, decode_str};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn store() -> StateStore {
        let result: ApiResult<Device> = decode_str(include_str!("../../tests/resources/device_list_response.json")).unwrap();
        let mut store = StateStore::default();
        store.replace_all(result.into_objects());
        store
    }

    #[rstest]
    #[case(Some(1), ColorMode::Xy)]
    #[case(Some(2), ColorMode::ColorTemp)]
    #[case(Some(3), ColorMode::Unknown)]
    #[case(None, ColorMode::Unknown)]
    fn color_mode_from_wire(#[case] wire: Option<u8>, #[case] expected: ColorMode) {
        assert_eq!(ColorMode::from_wire(wire), expected);
    }

    #[test]
    fn snapshot_of_a_color_light() {
        let state = LightEntity::new("dev-1").snapshot(&store()).unwrap();

        assert_eq!(state.name.as_deref(), Some("Living room"));
        assert!(state.available);
        assert!(state.is_on);
        assert_eq!(state.brightness, Some(204));
        assert_eq!(state.color_mode, ColorMode::ColorTemp);
        assert_eq!(state.supported_color_modes, vec![ColorMode::ColorTemp, ColorMode::Xy]);
        assert_eq!(state.color_temp_kelvin, Some(4000));
        assert_eq!(state.xy_color, Some((32768.0 / 65535.0, 16384.0 / 65535.0)));
        assert_eq!((state.min_color_temp_kelvin, state.max_color_temp_kelvin), (2000, 6500));
        assert_eq!(state.device_info.model.as_deref(), Some("Color bulb"));
        assert_eq!(state.device_info.model_id.as_deref(), Some("BW-A19-RGBCW"));
        assert_eq!(state.device_info.suggested_area.as_deref(), Some("Living room"));
    }

    #[test]
    fn snapshot_of_an_offline_switch() {
        let state = LightEntity::new("dev-2").snapshot(&store()).unwrap();

        assert!(!state.available);
        assert!(!state.is_on);
        assert_eq!(state.brightness, Some(255));
        assert_eq!(state.color_mode, ColorMode::Unknown);
        assert_eq!(state.supported_color_modes, vec![ColorMode::OnOff]);
        assert_eq!(state.xy_color, None);
    }

    #[test]
    fn snapshot_of_a_device_without_lights() {
        let mut store = StateStore::default();
        store.insert(Device {
            id: Some("dev-9".to_string()),
            online: Some(Flag::from(true)),
            ..Device::default()
        });

        let state = LightEntity::new("dev-9").snapshot(&store).unwrap();

        assert!(!state.is_on);
        assert_eq!(state.brightness, None);
        assert_eq!(state.supported_color_modes, vec![ColorMode::Unknown]);
    }

    #[test]
    fn snapshot_of_a_removed_device() {
        assert_eq!(LightEntity::new("dev-404").snapshot(&store()), None);
    }

    #[test]
    fn turn_on_converts_to_wire_units() {
        let turn_on = TurnOn {
            brightness: Some(128),
            color_temp_kelvin: Some(9000),
            xy_color: Some((0.5, 0.25)),
        };

        let form = turn_on.to_form(None);

        assert_eq!(form.on, Some(Flag::from(true)));
        assert_eq!(form.brightness, Some(50));
        assert_eq!(form.color_temp, Some(6500));
        assert_eq!(form.color_x, Some(32768));
        assert_eq!(form.color_y, Some(16384));
    }

    #[test]
    fn turn_on_drops_what_the_light_cannot_do() {
        let turn_on = TurnOn {
            brightness: Some(255),
            color_temp_kelvin: Some(3000),
            xy_color: Some((0.3, 0.3)),
        };

        let form = turn_on.to_form(Some(Ability::new(Ability::POWER | Ability::BRIGHTNESS | Ability::COLOR_TEMP)));

        assert_eq!(form.brightness, Some(100));
        assert_eq!(form.color_temp, Some(3000));
        assert_eq!(form.color_x, None);
        assert_eq!(form.color_y, None);
    }
}
