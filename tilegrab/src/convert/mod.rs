//! Image re-encoding for downloaded tiles.

mod palette;

pub use palette::{to_8bit_png, ConvertError, PALETTE_SIZE};
