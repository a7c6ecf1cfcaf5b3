mod device;
mod forms;
mod gateway;
mod light;
mod payloads;

pub use device::{Device, Product, Room, Service};
pub use forms::{ControlForm, SearchForm};
pub use gateway::{GatewayInfo, User};
pub use light::{COLOR_MODE_TEMP, COLOR_MODE_XY, ColorXy, Light, PowerOn};
pub use payloads::{DeviceUpdatePayload, LightUpdatePayload, LightUpdateValue, ResourceRef};
