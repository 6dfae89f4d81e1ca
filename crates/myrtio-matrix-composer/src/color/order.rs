use core::fmt;
use core::str::FromStr;

use crate::error::CodecError;

/// Color component of a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Red,
    Green,
    Blue,
    White,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Red,
        Component::Green,
        Component::Blue,
        Component::White,
    ];
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Red => "red",
            Component::Green => "green",
            Component::Blue => "blue",
            Component::White => "white",
        };
        f.write_str(name)
    }
}

/// Order in which the LED chip receives its color fields
///
/// The first letter is the first field shifted out on the wire and occupies
/// bits 16..24 of the packed word, the second bits 8..16 and the third bits
/// 0..8. Four field orders keep white in bits 24..32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum ColorOrder {
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
    Rgbw,
    Rbgw,
    Grbw,
    Gbrw,
    Brgw,
    Bgrw,
}

impl ColorOrder {
    pub const ALL: [ColorOrder; 12] = [
        ColorOrder::Rgb,
        ColorOrder::Rbg,
        ColorOrder::Grb,
        ColorOrder::Gbr,
        ColorOrder::Brg,
        ColorOrder::Bgr,
        ColorOrder::Rgbw,
        ColorOrder::Rbgw,
        ColorOrder::Grbw,
        ColorOrder::Gbrw,
        ColorOrder::Brgw,
        ColorOrder::Bgrw,
    ];

    /// Color components in wire order (white excluded)
    const fn sequence(self) -> [Component; 3] {
        use Component::{Blue, Green, Red};
        match self {
            ColorOrder::Rgb | ColorOrder::Rgbw => [Red, Green, Blue],
            ColorOrder::Rbg | ColorOrder::Rbgw => [Red, Blue, Green],
            ColorOrder::Grb | ColorOrder::Grbw => [Green, Red, Blue],
            ColorOrder::Gbr | ColorOrder::Gbrw => [Green, Blue, Red],
            ColorOrder::Brg | ColorOrder::Brgw => [Blue, Red, Green],
            ColorOrder::Bgr | ColorOrder::Bgrw => [Blue, Green, Red],
        }
    }

    /// Whether the order carries a white field
    pub const fn has_white(self) -> bool {
        matches!(
            self,
            ColorOrder::Rgbw
                | ColorOrder::Rbgw
                | ColorOrder::Grbw
                | ColorOrder::Gbrw
                | ColorOrder::Brgw
                | ColorOrder::Bgrw
        )
    }

    /// Number of 8-bit fields per pixel
    pub const fn channel_count(self) -> usize {
        if self.has_white() { 4 } else { 3 }
    }

    /// Bit offset of `component`, `None` when the order has no such field
    #[allow(clippy::cast_possible_truncation)]
    pub fn shift(self, component: Component) -> Option<u32> {
        if component == Component::White {
            return self.has_white().then_some(24);
        }
        let position = self.sequence().iter().position(|c| *c == component)?;
        // Wire position 0 is the most significant color byte
        Some(16 - 8 * position as u32)
    }

    /// Bit mask of `component` inside the packed word
    pub fn field_mask(self, component: Component) -> Option<u32> {
        self.shift(component).map(|shift| 0xFF << shift)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ColorOrder::Rgb => "RGB",
            ColorOrder::Rbg => "RBG",
            ColorOrder::Grb => "GRB",
            ColorOrder::Gbr => "GBR",
            ColorOrder::Brg => "BRG",
            ColorOrder::Bgr => "BGR",
            ColorOrder::Rgbw => "RGBW",
            ColorOrder::Rbgw => "RBGW",
            ColorOrder::Grbw => "GRBW",
            ColorOrder::Gbrw => "GBRW",
            ColorOrder::Brgw => "BRGW",
            ColorOrder::Bgrw => "BGRW",
        }
    }
}

impl fmt::Display for ColorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorOrder {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorOrder::ALL
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodecError::UnknownOrder(s.to_owned()))
    }
}

/// Letter name in any case, like `FromStr`
#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ColorOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = <&str>::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
