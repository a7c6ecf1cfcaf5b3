use crate::bwee::domain::{ControlForm, LightUpdateValue};
use crate::codec::Flag;
use serde::{Deserialize, Serialize};

pub const COLOR_MODE_XY: u8 = 1;
pub const COLOR_MODE_TEMP: u8 = 2;

// GET /clip/v2/resource/light
// Brightness is 1-100, color_x/color_y are 0-65535 and color_cw is in Kelvin.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Light {
    pub id: Option<String>,
    pub name: Option<String>,
    pub r#type: Option<String>,
    pub on: Option<Flag>,
    pub brightness: Option<u8>,
    #[serde(rename = "color_cw")]
    pub color_temp: Option<u32>,
    pub color_x: Option<u16>,
    pub color_y: Option<u16>,
    pub color_arr: Option<Vec<ColorXy>>,
    pub color_len: Option<u32>,
    pub color_mode: Option<u8>,
    pub ability: Option<u32>,
    pub support_segment: Option<Flag>,
    pub sync_status: Option<i64>,
    pub power_on: Option<PowerOn>,
    pub pack: Option<Vec<String>>,
    pub position_x: Option<i64>,
    pub position_y: Option<i64>,
    pub positions: Option<String>,
}

impl Light {
    pub fn is_on(&self) -> bool {
        self.on.is_some_and(Flag::is_set)
    }

    /// Merges a pushed update. Fields the update leaves out keep their value.
    pub fn apply_update(&mut self, update: &LightUpdateValue) {
        merge(&mut self.on, update.on);
        merge(&mut self.brightness, update.brightness);
        merge(&mut self.color_temp, update.color_temp);
        merge(&mut self.color_x, update.color_x);
        merge(&mut self.color_y, update.color_y);
        merge(&mut self.color_arr, update.color_arr.clone());
        merge(&mut self.color_mode, update.color_mode);
    }

    /// Applies a control request the gateway accepted, before it echoes the change back.
    pub fn apply_control(&mut self, form: &ControlForm) {
        merge(&mut self.on, form.on);
        merge(&mut self.brightness, form.brightness);
        merge(&mut self.color_temp, form.color_temp);
        merge(&mut self.color_x, form.color_x);
        merge(&mut self.color_y, form.color_y);
        merge(&mut self.color_arr, form.color_arr.clone());

        if form.color_x.is_some() || form.color_y.is_some() {
            self.color_mode = Some(COLOR_MODE_XY);
        } else if form.color_temp.is_some() {
            self.color_mode = Some(COLOR_MODE_TEMP);
        }
    }
}

fn merge<T>(field: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *field = value;
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorXy {
    pub x: Option<u16>,
    pub y: Option<u16>,
}

/// What the light does after power is restored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerOn {
    pub on: Option<Flag>,
    pub on_mode: Option<i64>,
    pub mode: Option<i64>,
    pub brightness: Option<u8>,
    pub brightness_mode: Option<i64>,
    #[serde(rename = "color_cw")]
    pub color_temp: Option<u32>,
    pub color_mode: Option<u8>,
    pub color_x: Option<u16>,
    pub color_y: Option<u16>,
}
