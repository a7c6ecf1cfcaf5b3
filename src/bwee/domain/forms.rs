use crate::bwee::domain::ColorXy;
use crate::codec::Flag;
use serde::{Deserialize, Serialize};

// PUT /clip/v2/resource/device/{id}/light and /clip/v2/resource/light/{id}
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlForm {
    pub on: Option<Flag>,
    pub brightness: Option<u8>,
    #[serde(rename = "color_cw")]
    pub color_temp: Option<u32>,
    pub color_x: Option<u16>,
    pub color_y: Option<u16>,
    pub color_arr: Option<Vec<ColorXy>>,
    pub name: Option<String>,
}

// Query of GET /clip/v2/resource/device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub ext_light: Option<u8>,
    pub ext_room: Option<u8>,
    pub join_status: Option<u8>,
    pub cat1_id: Option<i64>,
}

impl Default for SearchForm {
    fn default() -> Self {
        SearchForm {
            ext_light: None,
            ext_room: None,
            join_status: Some(1),
            cat1_id: None,
        }
    }
}
