//! Rendered frames and the renderer / output sink seams

use anyhow::Result;
use homelab_hud_types::{SlideConfig, SlideData};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// One fully rendered frame at display resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Solid black frame
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb([0, 0, 0])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.image.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

/// Draws slides into frames
///
/// Must produce a valid frame when `data` is `None` (a placeholder).
pub trait SlideRenderer: Send + Sync {
    fn render(&self, slide_type: &str, data: Option<&SlideData>, slide: &SlideConfig) -> Result<Frame>;
}

/// Destination for rendered frames (physical display, PNG export, ...)
pub trait OutputSink: Send + Sync {
    fn name(&self) -> &str;

    /// Show a frame. Returns false on failure; callers log and carry on.
    fn display_frame(&self, frame: &Frame, slide_id: u32) -> bool;
}
