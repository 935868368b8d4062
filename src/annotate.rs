use crate::models::BoundingBox;
use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;

/// Outline thickness in pixels
pub const STROKE_WIDTH: i32 = 3;
/// Label height in pixels
pub const TEXT_SCALE: f32 = 20.0;
/// Gap between a label's baseline and the rectangle it names
pub const LABEL_GAP: i32 = 10;
/// Outline color of the garment bounds
pub const GARMENT_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Draws outlines and labels onto an RGBA working image
#[derive(Clone, Default)]
pub struct Annotator {
    font: Option<FontArc>,
}

impl Annotator {
    /// Outlines only; labels are skipped
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font(font: FontArc) -> Self {
        Self { font: Some(font) }
    }

    /// Load a TrueType/OpenType font for labels
    pub fn load<P: AsRef<Path>>(font_path: P) -> anyhow::Result<Self> {
        let path = font_path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Failed to read font {}: {}", path.display(), e))?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| anyhow::anyhow!("Invalid font {}: {}", path.display(), e))?;
        Ok(Self::with_font(font))
    }

    /// Outline `bbox`; the stroke is centered on the rectangle's edge
    pub fn draw_rect(&self, image: &mut RgbaImage, bbox: &BoundingBox, color: Rgba<u8>) {
        let half = STROKE_WIDTH / 2;
        for offset in -half..=half {
            let width = bbox.width as i32 - 2 * offset;
            let height = bbox.height as i32 - 2 * offset;
            if width <= 0 || height <= 0 {
                continue;
            }
            let rect = Rect::at(bbox.x as i32 + offset, bbox.y as i32 + offset)
                .of_size(width as u32, height as u32);
            draw_hollow_rect_mut(image, rect, color);
        }
    }

    /// Write `text` with its top-left corner at `anchor`
    pub fn draw_label(&self, image: &mut RgbaImage, text: &str, anchor: (i32, i32), color: Rgba<u8>) {
        match &self.font {
            Some(font) => draw_text_mut(image, color, anchor.0, anchor.1, TEXT_SCALE, font, text),
            None => tracing::debug!("No font configured, skipping label {:?}", text),
        }
    }

    /// Label placed just above the rectangle's top-left corner
    pub fn draw_caption(&self, image: &mut RgbaImage, bbox: &BoundingBox, text: &str, color: Rgba<u8>) {
        let top = (bbox.y as i32 - LABEL_GAP - TEXT_SCALE as i32).max(0);
        self.draw_label(image, text, (bbox.x as i32, top), color);
    }
}
