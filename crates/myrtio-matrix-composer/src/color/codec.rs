//! Packing of color components into LED words

use super::{ColorOrder, Component, PackedPixel, Rgb};
use crate::error::CodecError;

/// Pack an RGB color for `order`
///
/// Orders with a white field get white set to zero.
pub fn encode(color: Rgb, order: ColorOrder) -> PackedPixel {
    encode_rgbw(color, 0, order)
}

/// Pack an RGB color plus white for `order`
///
/// White is dropped for three field orders.
pub fn encode_rgbw(color: Rgb, white: u8, order: ColorOrder) -> PackedPixel {
    let mut word = 0u32;
    for (component, value) in [
        (Component::Red, color.r),
        (Component::Green, color.g),
        (Component::Blue, color.b),
        (Component::White, white),
    ] {
        if let Some(shift) = order.shift(component) {
            word |= u32::from(value) << shift;
        }
    }
    PackedPixel::from_raw(word)
}

/// Pack unchecked component values, rejecting anything outside `0..=255`
pub fn try_encode(
    red: i64,
    green: i64,
    blue: i64,
    order: ColorOrder,
) -> Result<PackedPixel, CodecError> {
    try_encode_rgbw(red, green, blue, 0, order)
}

/// Pack unchecked component values plus white, rejecting anything outside `0..=255`
pub fn try_encode_rgbw(
    red: i64,
    green: i64,
    blue: i64,
    white: i64,
    order: ColorOrder,
) -> Result<PackedPixel, CodecError> {
    let color = Rgb::new(
        component(Component::Red, red)?,
        component(Component::Green, green)?,
        component(Component::Blue, blue)?,
    );
    let white = component(Component::White, white)?;
    Ok(encode_rgbw(color, white, order))
}

/// Unpack the RGB fields of a word packed for `order`
pub fn decode(pixel: PackedPixel, order: ColorOrder) -> Rgb {
    decode_rgbw(pixel, order).0
}

/// Unpack RGB and white fields, white is zero for three field orders
#[allow(clippy::cast_possible_truncation)]
pub fn decode_rgbw(pixel: PackedPixel, order: ColorOrder) -> (Rgb, u8) {
    let field = |component| {
        order
            .shift(component)
            .map_or(0, |shift| (pixel.raw() >> shift) as u8)
    };
    (
        Rgb::new(
            field(Component::Red),
            field(Component::Green),
            field(Component::Blue),
        ),
        field(Component::White),
    )
}

fn component(component: Component, value: i64) -> Result<u8, CodecError> {
    u8::try_from(value).map_err(|_| CodecError::OutOfRange { component, value })
}
