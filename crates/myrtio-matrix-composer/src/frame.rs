//! Frame buffers
//!
//! One buffer per enabled channel, holding packed words in string order. A
//! matrix is laid out row-major on the string, `index = y * width + x`.
//!
//! The length is fixed at allocation and always matches the channel's pixel
//! count. A different length needs a new channel configuration.

use crate::color::{self, ColorOrder, PackedPixel, Rgb};
use crate::error::EngineError;

/// Width and height of a matrix mapped onto a linear string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixLayout {
    pub width: usize,
    pub height: usize,
}

impl MatrixLayout {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered by the layout
    pub const fn len(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear string index of `(x, y)`, `None` outside the matrix
    pub const fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }
}

/// Packed pixels of one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    order: ColorOrder,
    pixels: Vec<PackedPixel>,
}

impl FrameBuffer {
    /// Create a dark buffer of `len` pixels
    pub fn new(len: usize, order: ColorOrder) -> Self {
        Self {
            order,
            pixels: vec![PackedPixel::DARK; len],
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Color order the words of this buffer are packed with
    pub fn order(&self) -> ColorOrder {
        self.order
    }

    /// Set every pixel to `value`
    pub fn fill(&mut self, value: PackedPixel) {
        self.pixels.fill(value);
    }

    /// Pack `color` with the buffer order and fill with it
    pub fn fill_rgb(&mut self, color: Rgb) {
        self.fill(color::encode(color, self.order));
    }

    /// Turn every pixel dark
    pub fn clear(&mut self) {
        self.fill(color::encode(Rgb::default(), self.order));
    }

    pub fn set(&mut self, index: usize, value: PackedPixel) -> Result<(), EngineError> {
        let len = self.pixels.len();
        let pixel = self
            .pixels
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })?;
        *pixel = value;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<PackedPixel, EngineError> {
        self.pixels
            .get(index)
            .copied()
            .ok_or(EngineError::IndexOutOfRange {
                index,
                len: self.pixels.len(),
            })
    }

    /// Set the pixel at matrix position `(x, y)`
    pub fn set_xy(
        &mut self,
        layout: MatrixLayout,
        x: usize,
        y: usize,
        value: PackedPixel,
    ) -> Result<(), EngineError> {
        let index = self.matrix_index(layout, x, y)?;
        self.set(index, value)
    }

    /// Read the pixel at matrix position `(x, y)`
    pub fn get_xy(
        &self,
        layout: MatrixLayout,
        x: usize,
        y: usize,
    ) -> Result<PackedPixel, EngineError> {
        let index = self.matrix_index(layout, x, y)?;
        self.get(index)
    }

    /// Push `value` into the start of the string, every pixel moves one step down
    ///
    /// The last pixel falls off the end.
    pub fn shift_in(&mut self, value: PackedPixel) {
        if self.pixels.is_empty() {
            return;
        }
        self.pixels.rotate_right(1);
        self.pixels[0] = value;
    }

    pub fn as_slice(&self) -> &[PackedPixel] {
        &self.pixels
    }

    fn matrix_index(&self, layout: MatrixLayout, x: usize, y: usize) -> Result<usize, EngineError> {
        layout.index(x, y).ok_or(EngineError::IndexOutOfRange {
            index: y.saturating_mul(layout.width).saturating_add(x),
            len: self.pixels.len(),
        })
    }
}
