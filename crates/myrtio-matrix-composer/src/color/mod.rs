mod codec;
mod order;

use smart_leds::RGB8;

pub use codec::{decode, decode_rgbw, encode, encode_rgbw, try_encode, try_encode_rgbw};
pub use order::{ColorOrder, Component};

pub type Rgb = RGB8;

/// LED word with the color order baked in at encode time
///
/// Field positions are not stored in the word, decoding requires the
/// order of the owning channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PackedPixel(u32);

impl PackedPixel {
    /// All fields zero, dark in every color order
    pub const DARK: Self = Self(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Scale every field by `scale` (255 keeps the value, 0 turns it dark)
    ///
    /// Fields are byte aligned in every order, so scaling does not need to
    /// know the order.
    #[must_use]
    pub fn scaled(self, scale: u8) -> Self {
        if scale == u8::MAX {
            return self;
        }
        let mut bytes = self.0.to_le_bytes();
        for byte in &mut bytes {
            *byte = crate::math8::scale8(*byte, scale);
        }
        Self(u32::from_le_bytes(bytes))
    }
}
