//! Glyph atlas: a horizontal strip of equally sized glyph cells, darkest
//! glyph first.

use std::path::Path;

use crate::error::AsciiError;

/// Characters of the built-in ramp, from empty to dense.
pub const BUILTIN_RAMP: &str = " .:-=+*#%@";

const BUILTIN_GLYPH_SIZE: u32 = 8;

/// 8×8 bitmaps for [`BUILTIN_RAMP`], one byte per row, MSB on the left.
const BUILTIN_BITMAPS: [[u8; 8]; 10] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00],
    [0x00, 0x18, 0x18, 0x00, 0x00, 0x18, 0x18, 0x00],
    [0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x7E, 0x00, 0x00, 0x7E, 0x00, 0x00],
    [0x00, 0x18, 0x18, 0x7E, 0x18, 0x18, 0x00, 0x00],
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00],
    [0x36, 0x36, 0x7F, 0x36, 0x7F, 0x36, 0x36, 0x00],
    [0x62, 0x66, 0x0C, 0x18, 0x30, 0x66, 0x46, 0x00],
    [0x3C, 0x66, 0x6E, 0x6E, 0x60, 0x62, 0x3C, 0x00],
];

/// CPU-side glyph atlas in RGBA8; coverage is stored in every channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    glyph_count: u32,
    pixels: Vec<u8>,
}

impl GlyphAtlas {
    /// The built-in 10-glyph ramp.
    #[must_use]
    pub fn builtin() -> Self {
        let size = BUILTIN_GLYPH_SIZE;
        let glyph_count = BUILTIN_BITMAPS.len() as u32;
        let width = size * glyph_count;
        let mut pixels = vec![0u8; (width * size * 4) as usize];
        for (glyph, bitmap) in BUILTIN_BITMAPS.iter().enumerate() {
            for (y, row) in bitmap.iter().enumerate() {
                for x in 0..size as usize {
                    if row & (0x80 >> x) == 0 {
                        continue;
                    }
                    let px = glyph * size as usize + x;
                    let offset = (y * width as usize + px) * 4;
                    pixels[offset..offset + 4].copy_from_slice(&[255; 4]);
                }
            }
        }
        Self {
            width,
            height: size,
            glyph_count,
            pixels,
        }
    }

    /// Wrap RGBA8 pixels holding `glyph_count` cells side by side.
    ///
    /// # Errors
    ///
    /// Returns [`AsciiError::GlyphAtlas`] when the dimensions do not
    /// describe a strip of `glyph_count` cells.
    pub fn from_rgba8(
        width: u32,
        height: u32,
        glyph_count: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, AsciiError> {
        if glyph_count == 0 || width == 0 || height == 0 {
            return Err(AsciiError::GlyphAtlas(format!(
                "glyph atlas {width}x{height} with {glyph_count} glyphs \
                 is empty"
            )));
        }
        if width % glyph_count != 0 {
            return Err(AsciiError::GlyphAtlas(format!(
                "glyph atlas width {width} is not a multiple of \
                 {glyph_count} glyphs"
            )));
        }
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(AsciiError::GlyphAtlas(format!(
                "glyph atlas expected {} bytes, got {}",
                width as usize * height as usize * 4,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            glyph_count,
            pixels,
        })
    }

    /// Load a PNG strip of `glyph_count` glyphs.
    ///
    /// # Errors
    ///
    /// Returns [`AsciiError::Image`] if decoding fails, or
    /// [`AsciiError::GlyphAtlas`] if the strip does not divide into
    /// `glyph_count` cells.
    pub fn load(path: &Path, glyph_count: u32) -> Result<Self, AsciiError> {
        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        let atlas =
            Self::from_rgba8(width, height, glyph_count, image.into_raw())?;
        log::info!(
            "loaded glyph atlas {} ({width}x{height}, {glyph_count} glyphs)",
            path.display()
        );
        Ok(atlas)
    }

    /// Atlas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Atlas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of glyph cells.
    #[must_use]
    pub fn glyph_count(&self) -> u32 {
        self.glyph_count
    }

    /// Width of one glyph cell.
    #[must_use]
    pub fn glyph_width(&self) -> u32 {
        self.width / self.glyph_count
    }

    /// Raw RGBA8 pixels.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Fraction of lit pixels in `glyph`, from the red channel.
    #[must_use]
    pub fn coverage(&self, glyph: u32) -> f32 {
        if glyph >= self.glyph_count {
            return 0.0;
        }
        let gw = self.glyph_width() as usize;
        let x0 = glyph as usize * gw;
        let mut sum = 0u64;
        for y in 0..self.height as usize {
            let row = y * self.width as usize;
            for x in x0..x0 + gw {
                sum += u64::from(self.pixels[(row + x) * 4]);
            }
        }
        sum as f32 / (255.0 * (gw * self.height as usize) as f32)
    }

    /// Upload as an `Rgba8Unorm` sampled texture.
    #[must_use]
    pub fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> wgpu::Texture {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Glyph Atlas"),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            texture.size(),
        );
        texture
    }
}
