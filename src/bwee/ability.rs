/// Capability bitmask a light reports in its `ability` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ability(u32);

impl Ability {
    pub const POWER: u32 = 1;
    pub const BRIGHTNESS: u32 = 2;
    pub const COLOR_TEMP: u32 = 4;
    pub const COLOR: u32 = 8;
    pub const SEGMENT: u32 = 16;

    pub fn new(bits: u32) -> Self {
        Ability(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn supports_power(self) -> bool {
        self.has(Self::POWER)
    }

    pub fn supports_brightness(self) -> bool {
        self.has(Self::BRIGHTNESS)
    }

    pub fn supports_color_temp(self) -> bool {
        self.has(Self::COLOR_TEMP)
    }

    pub fn supports_color(self) -> bool {
        self.has(Self::COLOR)
    }

    pub fn supports_segment(self) -> bool {
        self.has(Self::SEGMENT)
    }

    fn has(self, bit: u32) -> bool {
        self.0 & bit == bit
    }
}

impl From<u32> for Ability {
    fn from(bits: u32) -> Self {
        Ability(bits)
    }
}

/// What kind of light a product is, read from the hundreds digit of its third-level category id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    None,
    OnOff,
    Brightness,
    ColorTemp,
    Color,
    ColorAndTemp,
}

impl DeviceClass {
    pub fn of_category(cat3_id: Option<i64>) -> Self {
        let Some(id) = cat3_id else {
            return DeviceClass::None;
        };

        match (id / 100) % 10 {
            1 => DeviceClass::OnOff,
            2 => DeviceClass::Brightness,
            3 => DeviceClass::ColorTemp,
            4 => DeviceClass::Color,
            5 => DeviceClass::ColorAndTemp,
            _ => DeviceClass::None,
        }
    }
}
