mod host;
mod light_entity;

pub use host::{Host, LogHost};
pub use light_entity::{
    ColorMode, DeviceInfo, LightEntity, LightState, MAX_COLOR_TEMP_KELVIN, MIN_COLOR_TEMP_KELVIN, TurnOn,
};
