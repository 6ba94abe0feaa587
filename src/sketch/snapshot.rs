use crate::sketch::background::BackgroundRef;
use anyhow::{anyhow, Context, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat, RgbaImage};
use std::sync::Arc;

/// Immutable capture of the drawing surface plus its background selection.
///
/// Pixels are kept PNG-encoded, so every entry costs one compressed full
/// frame. Clones share the encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pixel_data: Arc<[u8]>,
    size: (u32, u32),
    background: Option<BackgroundRef>,
}

impl Snapshot {
    pub fn capture(buffer: &RgbaImage, background: Option<BackgroundRef>) -> Result<Self> {
        let pixel_data = encode_png(buffer)?;
        Ok(Self {
            pixel_data: pixel_data.into(),
            size: buffer.dimensions(),
            background,
        })
    }

    pub fn from_encoded(
        pixel_data: Vec<u8>,
        size: (u32, u32),
        background: Option<BackgroundRef>,
    ) -> Self {
        Self {
            pixel_data: pixel_data.into(),
            size,
            background,
        }
    }

    pub fn pixel_data(&self) -> &[u8] {
        &self.pixel_data
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn background(&self) -> Option<&BackgroundRef> {
        self.background.as_ref()
    }

    pub fn decode(&self) -> Result<RgbaImage> {
        decode_png(&self.pixel_data, self.size)
    }

    /// True when every decoded pixel is fully transparent.
    pub fn is_blank(&self) -> Result<bool> {
        Ok(crate::sketch::composite::is_blank(&self.decode()?))
    }
}

/// Encodes `buffer` as PNG. Zero-sized buffers encode to no bytes.
pub fn encode_png(buffer: &RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = buffer.dimensions();
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(buffer.as_raw(), width, height, ColorType::Rgba8)
        .with_context(|| format!("encode {width}x{height} png"))?;
    Ok(out)
}

pub fn decode_png(bytes: &[u8], size: (u32, u32)) -> Result<RgbaImage> {
    if bytes.is_empty() {
        return Ok(RgbaImage::new(size.0, size.1));
    }
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .context("decode snapshot png")?
        .to_rgba8();
    if decoded.dimensions() != size {
        return Err(anyhow!(
            "snapshot size mismatch: expected {}x{}, decoded {}x{}",
            size.0,
            size.1,
            decoded.width(),
            decoded.height()
        ));
    }
    Ok(decoded)
}
