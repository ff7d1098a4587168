//! RGBA colors with integer "over" compositing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An 8-bit-per-channel color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    pub const RED: Self = Self::opaque(255, 0, 0);
    pub const GREEN: Self = Self::opaque(0, 255, 0);
    pub const BLUE: Self = Self::opaque(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, u8::MAX)
    }

    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    pub const fn is_opaque(self) -> bool {
        self.a == u8::MAX
    }

    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Paint `paint` over `self`: `out = base * (1 - a) + paint * a`, per
    /// channel and for alpha, where `a` is the paint's alpha.
    #[must_use]
    pub fn over(self, paint: Self) -> Self {
        let a = u32::from(paint.a);
        Self {
            r: blend_channel(self.r, paint.r, a),
            g: blend_channel(self.g, paint.g, a),
            b: blend_channel(self.b, paint.b, a),
            a: blend_channel(self.a, paint.a, a),
        }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (with or without `#`).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        let channel = |range: std::ops::Range<usize>| -> Option<u8> {
            u8::from_str_radix(hex.get(range)?, 16).ok()
        };
        match hex.len() {
            6 => Some(Self::opaque(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// `#RRGGBB` for opaque colors, `#RRGGBBAA` otherwise.
    pub fn to_hex(self) -> String {
        if self.is_opaque() {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

fn blend_channel(base: u8, paint: u8, alpha: u32) -> u8 {
    let max = u32::from(u8::MAX);
    let value = (u32::from(base) * (max - alpha) + u32::from(paint) * alpha + max / 2) / max;
    u8::try_from(value).unwrap_or(u8::MAX)
}

impl Serialize for Rgba {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color: {s}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgba::from_hex("#FF0000"), Some(Rgba::RED));
        assert_eq!(Rgba::from_hex("0000ff80"), Some(Rgba::BLUE.with_alpha(0x80)));
        assert_eq!(Rgba::from_hex("#FFF"), None);
        assert_eq!(Rgba::from_hex("#GG0000"), None);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(Rgba::GREEN.to_hex(), "#00FF00");
        assert_eq!(Rgba::GREEN.with_alpha(0x10).to_hex(), "#00FF0010");
    }

    #[test]
    fn test_over_opaque_replaces() {
        assert_eq!(Rgba::RED.over(Rgba::BLUE), Rgba::BLUE);
        assert_eq!(Rgba::TRANSPARENT.over(Rgba::BLUE), Rgba::BLUE);
    }

    #[test]
    fn test_over_transparent_keeps_base() {
        assert_eq!(Rgba::RED.over(Rgba::TRANSPARENT), Rgba::RED);
    }

    #[test]
    fn test_over_half_alpha() {
        let out = Rgba::BLUE.over(Rgba::GREEN.with_alpha(128));
        assert_eq!(out, Rgba::new(0, 128, 127, 191));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Rgba::RED).unwrap();
        assert_eq!(json, "\"#FF0000\"");
        let back: Rgba = serde_json::from_str("\"#00FF0080\"").unwrap();
        assert_eq!(back, Rgba::GREEN.with_alpha(0x80));
    }
}
