//! PNG encoding for exported frames.

use crate::surface::{RenderError, RenderResult};

/// Encode straight-alpha RGBA8 pixels as PNG.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let expected = width as usize * height as usize * 4;
    if rgba_data.len() != expected {
        return Err(RenderError::Encode(format!(
            "Expected {} bytes for {}x{}, got {}",
            expected,
            width,
            height,
            rgba_data.len()
        )));
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(|e| {
            log::error!("Failed to write PNG header: {:?}", e);
            RenderError::Encode(e.to_string())
        })?;

        writer.write_image_data(rgba_data).map_err(|e| {
            log::error!("Failed to write PNG data: {:?}", e);
            RenderError::Encode(e.to_string())
        })?;
    }

    Ok(png_data)
}
