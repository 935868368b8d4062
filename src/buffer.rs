//! Host pixel buffers (RGBA_8888 and RGB_565) and their conversion to RGBA images.

use crate::error::PreconditionError;
use image::{Rgba, RgbaImage};

/// Pixel layouts accepted from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 4 bytes per pixel in R, G, B, A order
    Rgba8888,
    /// 16-bit little-endian `rrrrrggg gggbbbbb`
    Rgb565,
}

impl PixelFormat {
    pub const RGBA_8888_CODE: u32 = 1;
    pub const RGB_565_CODE: u32 = 4;

    /// Map the host's bitmap format code
    pub fn from_code(code: u32) -> Result<Self, PreconditionError> {
        match code {
            Self::RGBA_8888_CODE => Ok(PixelFormat::Rgba8888),
            Self::RGB_565_CODE => Ok(PixelFormat::Rgb565),
            other => Err(PreconditionError::UnsupportedFormat(other)),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            PixelFormat::Rgba8888 => Self::RGBA_8888_CODE,
            PixelFormat::Rgb565 => Self::RGB_565_CODE,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8888 => 4,
            PixelFormat::Rgb565 => 2,
        }
    }
}

/// A locked host bitmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

fn expand(value: u16, bits: u32) -> u8 {
    let max = (1u16 << bits) - 1;
    ((value as u32 * 255 + max as u32 / 2) / max as u32) as u8
}

fn unpack_565(raw: u16) -> [u8; 3] {
    [
        expand((raw >> 11) & 0x1f, 5),
        expand((raw >> 5) & 0x3f, 6),
        expand(raw & 0x1f, 5),
    ]
}

fn pack_565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

fn premultiply(c: u8, a: u8) -> u8 {
    ((c as u32 * a as u32 + 127) / 255) as u8
}

fn unpremultiply(c: u8, a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8
}

impl PixelBuffer {
    /// Zero-filled buffer
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            data: vec![0; len],
        }
    }

    /// Buffer holding `image` (straight alpha)
    pub fn from_rgba(image: &RgbaImage, format: PixelFormat) -> Self {
        let mut buffer = Self::new(image.width(), image.height(), format);
        buffer.encode(image, false);
        buffer
    }

    fn required_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Non-zero size and enough bytes for it
    pub fn validate(&self) -> Result<(), PreconditionError> {
        if self.width == 0 || self.height == 0 {
            return Err(PreconditionError::ZeroDimensions);
        }
        let expected = self.required_len();
        if self.data.len() < expected {
            return Err(PreconditionError::BufferTooSmall {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Fail unless `other` has the same width and height
    pub fn ensure_same_size(&self, other: &PixelBuffer) -> Result<(), PreconditionError> {
        if (self.width, self.height) != (other.width, other.height) {
            return Err(PreconditionError::DimensionMismatch {
                width: other.width,
                height: other.height,
                expected_width: self.width,
                expected_height: self.height,
            });
        }
        Ok(())
    }

    /// Decode to straight-alpha RGBA. `unpremultiply` only affects RGBA_8888.
    pub fn to_rgba(&self, unpremultiply_alpha: bool) -> Result<RgbaImage, PreconditionError> {
        self.validate()?;
        let bpp = self.format.bytes_per_pixel();
        let width = self.width as usize;
        let image = RgbaImage::from_fn(self.width, self.height, |x, y| {
            let offset = (y as usize * width + x as usize) * bpp;
            let px = &self.data[offset..offset + bpp];
            match self.format {
                PixelFormat::Rgba8888 => {
                    let a = px[3];
                    if unpremultiply_alpha && a < 255 {
                        Rgba([
                            unpremultiply(px[0], a),
                            unpremultiply(px[1], a),
                            unpremultiply(px[2], a),
                            a,
                        ])
                    } else {
                        Rgba([px[0], px[1], px[2], a])
                    }
                }
                PixelFormat::Rgb565 => {
                    let [r, g, b] = unpack_565(u16::from_le_bytes([px[0], px[1]]));
                    Rgba([r, g, b, 255])
                }
            }
        });
        Ok(image)
    }

    /// Encode `image` into this buffer. `premultiply` only affects RGBA_8888;
    /// RGB_565 drops alpha.
    pub fn write_rgba(&mut self, image: &RgbaImage, premultiply_alpha: bool) -> Result<(), PreconditionError> {
        self.validate()?;
        if image.dimensions() != (self.width, self.height) {
            return Err(PreconditionError::DimensionMismatch {
                width: image.width(),
                height: image.height(),
                expected_width: self.width,
                expected_height: self.height,
            });
        }
        self.encode(image, premultiply_alpha);
        Ok(())
    }

    /// Caller guarantees matching dimensions and a long enough `data`
    fn encode(&mut self, image: &RgbaImage, premultiply_alpha: bool) {
        let bpp = self.format.bytes_per_pixel();
        for (i, p) in image.pixels().enumerate() {
            let offset = i * bpp;
            let [r, g, b, a] = p.0;
            match self.format {
                PixelFormat::Rgba8888 => {
                    let out = if premultiply_alpha {
                        [premultiply(r, a), premultiply(g, a), premultiply(b, a), a]
                    } else {
                        [r, g, b, a]
                    };
                    self.data[offset..offset + 4].copy_from_slice(&out);
                }
                PixelFormat::Rgb565 => {
                    let raw = pack_565(r, g, b).to_le_bytes();
                    self.data[offset..offset + 2].copy_from_slice(&raw);
                }
            }
        }
    }
}
