//! 8-bit palette conversion.
//!
//! Tiles are decoded with `image`, quantized to at most 256 colours with
//! NeuQuant and written back as an indexed PNG. Indexed tiles are typically
//! a third the size of their RGBA originals.

use thiserror::Error;
use tracing::trace;

/// Number of palette entries produced.
pub const PALETTE_SIZE: usize = 256;

/// NeuQuant sampling factor: 1 is slowest and best, 30 fastest.
const SAMPLE_FACTOR: i32 = 10;

/// Errors raised while converting a tile.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to encode indexed PNG: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("image has no pixels")]
    Empty,
}

/// Re-encodes an image as an 8-bit indexed PNG.
///
/// Transparency survives through a `tRNS` chunk, written only when the
/// source has a pixel that is not fully opaque.
pub fn to_8bit_png(data: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let rgba = image::load_from_memory(data)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(ConvertError::Empty);
    }

    let translucent = rgba.pixels().any(|px| px[3] < u8::MAX);
    let pixels = rgba.as_raw();
    let quant = color_quant::NeuQuant::new(SAMPLE_FACTOR, PALETTE_SIZE, pixels);

    let indices: Vec<u8> = pixels
        .chunks_exact(4)
        .map(|px| quant.index_of(px) as u8)
        .collect();

    let color_map = quant.color_map_rgba();
    let mut palette = Vec::with_capacity(PALETTE_SIZE * 3);
    let mut alpha = Vec::with_capacity(PALETTE_SIZE);
    for entry in color_map.chunks_exact(4) {
        palette.extend_from_slice(&entry[..3]);
        alpha.push(entry[3]);
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(palette);
        if translucent {
            encoder.set_trns(alpha);
        }

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&indices)?;
        writer.finish()?;
    }

    trace!(
        width,
        height,
        original = data.len(),
        converted = out.len(),
        "Tile converted to 8-bit"
    );
    Ok(out)
}
