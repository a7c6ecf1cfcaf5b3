/// Converts brightness between the gateway's percentage (1-100) and the host's byte scale (0-255).
pub trait BrightnessScale {
    /// Returns the host brightness by treating `self` as a gateway percentage, rounding up.
    fn percent_to_byte(self) -> u8;

    /// Returns the gateway percentage by treating `self` as a host brightness, truncating.
    /// The gateway has no 0%, so the result is at least 1.
    fn byte_to_percent(self) -> u8;
}

impl BrightnessScale for u8 {
    fn percent_to_byte(self) -> u8 {
        let percent = u32::from(self.min(100));
        ((percent * 255).div_ceil(100)) as u8
    }

    fn byte_to_percent(self) -> u8 {
        let percent = u32::from(self) * 100 / 255;
        percent.clamp(1, 100) as u8
    }
}

/// Converts a CIE xy coordinate between the gateway's 16-bit integers and the host's 0.0-1.0 range.
pub trait ChromaticityScale {
    fn to_unit(self) -> f64;
}

impl ChromaticityScale for u16 {
    fn to_unit(self) -> f64 {
        f64::from(self) / f64::from(u16::MAX)
    }
}

pub trait ChromaticityWire {
    /// Nearest 16-bit value, values outside 0.0-1.0 are clamped.
    fn to_wire(self) -> u16;
}

impl ChromaticityWire for f64 {
    fn to_wire(self) -> u16 {
        (self.clamp(0.0, 1.0) * f64::from(u16::MAX)).round() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 3)]
    #[case(50, 128)]
    #[case(80, 204)]
    #[case(100, 255)]
    #[case(0, 0)]
    #[case(200, 255)]
    fn percent_to_byte(#[case] input: u8, #[case] expected: u8) {
        assert_eq!(input.percent_to_byte(), expected);
    }

    #[rstest]
    #[case(255, 100)]
    #[case(128, 50)]
    #[case(204, 80)]
    #[case(3, 1)]
    #[case(0, 1)]
    fn byte_to_percent(#[case] input: u8, #[case] expected: u8) {
        assert_eq!(input.byte_to_percent(), expected);
    }

    #[test]
    fn every_percentage_survives_a_round_trip() {
        for percent in 1..=100u8 {
            assert_eq!(percent.percent_to_byte().byte_to_percent(), percent);
        }
    }

    #[rstest]
    #[case(0, 0.0)]
    #[case(65535, 1.0)]
    #[case(32768, 32768.0 / 65535.0)]
    fn to_unit(#[case] input: u16, #[case] expected: f64) {
        assert_eq!(input.to_unit(), expected);
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(1.0, 65535)]
    #[case(0.5, 32768)]
    #[case(1.5, 65535)]
    #[case(-0.1, 0)]
    fn to_wire(#[case] input: f64, #[case] expected: u16) {
        assert_eq!(input.to_wire(), expected);
    }

    #[test]
    fn every_coordinate_survives_a_round_trip() {
        for value in (0..=u16::MAX).step_by(257) {
            assert_eq!(value.to_unit().to_wire(), value);
        }
    }
}
