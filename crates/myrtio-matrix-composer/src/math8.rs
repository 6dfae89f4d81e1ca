/// Scale an 8-bit value by a factor (0 = off, 255 = unchanged)
///
/// Uses integer math, `value * (scale + 1) / 256`.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn scale8(value: u8, scale: u8) -> u8 {
    ((u16::from(value) * (u16::from(scale) + 1)) >> 8) as u8
}
