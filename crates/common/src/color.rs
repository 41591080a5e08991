use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors from parsing colour strings.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("expected a `#rrggbb` colour, got {0:?}")]
    InvalidHex(String),
}

/// Linear RGB colour.
///
/// Hex strings are authored in sRGB and converted to linear on parse, so
/// lighting and fog math operate in linear space. The surface applies the
/// sRGB encode on output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (sRGB) into a linear colour.
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let digits = hex
            .strip_prefix('#')
            .filter(|d| d.len() == 6)
            .ok_or_else(|| ColorError::InvalidHex(hex.to_string()))?;
        let value =
            u32::from_str_radix(digits, 16).map_err(|_| ColorError::InvalidHex(hex.to_string()))?;
        let channel = |shift: u32| srgb_to_linear(((value >> shift) & 0xff) as f32 / 255.0);
        Ok(Self::rgb(channel(16), channel(8), channel(0)))
    }

    /// Encode back to `#rrggbb` (sRGB).
    pub fn to_hex(&self) -> String {
        let byte = |c: f32| (linear_to_srgb(c).clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self::rgb(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.077_399_38
    } else {
        (c * 0.947_867_3 + 0.052_132_7).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c < 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(0.416_666_66) - 0.055
    }
}

// Colours round-trip through config files as hex strings.
impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primaries() {
        let cyan = Color::from_hex("#00ffff").unwrap();
        assert_eq!(cyan, Color::rgb(0.0, 1.0, 1.0));
        assert_eq!(Color::from_hex("#000000").unwrap(), Color::BLACK);
    }

    #[test]
    fn converts_to_linear() {
        let c = Color::from_hex("#808080").unwrap();
        // sRGB 0.5 is roughly 0.216 linear.
        assert!((c.r - 0.2159).abs() < 1e-3);
    }

    #[test]
    fn hex_round_trip() {
        for hex in ["#86cdff", "#ff7d46", "#06343f", "#89c854"] {
            assert_eq!(Color::from_hex(hex).unwrap().to_hex(), hex);
        }
    }

    #[test]
    fn rejects_malformed() {
        assert!(Color::from_hex("86cdff").is_err());
        assert!(Color::from_hex("#86cdf").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }
}
