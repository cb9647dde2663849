//! Output sinks for rendered frames

use anyhow::{Context, Result};
use homelab_hud_core::{Frame, OutputSink};
use log::{debug, error, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes every frame as `slide_{frame:06}_{id}.png` into a directory
pub struct FrameExportSink {
    dir: PathBuf,
    frame_count: AtomicU64,
}

impl FrameExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create frame export directory {}", dir.display()))?;
        info!("Exporting frames to {}", dir.display());
        Ok(Self {
            dir,
            frame_count: AtomicU64::new(0),
        })
    }

    fn write(&self, frame: &Frame, slide_id: u32) -> Result<PathBuf> {
        let n = self.frame_count.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(format!("slide_{:06}_{}.png", n, slide_id));
        std::fs::write(&path, frame.to_png()?)?;
        Ok(path)
    }
}

impl OutputSink for FrameExportSink {
    fn name(&self) -> &str {
        "frame-export"
    }

    fn display_frame(&self, frame: &Frame, slide_id: u32) -> bool {
        match self.write(frame, slide_id) {
            Ok(path) => {
                debug!("Wrote {}", path.display());
                true
            }
            Err(e) => {
                error!("Failed to export frame for slide {}: {:#}", slide_id, e);
                false
            }
        }
    }
}

/// Pack RGB888 pixels into little-endian RGB565
pub fn to_rgb565(frame: &Frame) -> Vec<u8> {
    let mut raw = Vec::with_capacity((frame.width() * frame.height() * 2) as usize);
    for pixel in frame.image().pixels() {
        let [r, g, b] = pixel.0;
        let mut rgb565: u16 = (r as u16 & 0b11111000) << 8;
        rgb565 |= (g as u16 & 0b11111100) << 3;
        rgb565 |= (b as u16) >> 3;
        raw.extend(rgb565.to_le_bytes());
    }
    raw
}

/// Linux framebuffer device (e.g. `/dev/fb0`) in 16-bit mode
pub struct FramebufferSink {
    device: PathBuf,
}

impl FramebufferSink {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self { device: device.into() }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    fn write(&self, frame: &Frame) -> Result<()> {
        let mut fb = OpenOptions::new()
            .write(true)
            .open(&self.device)
            .with_context(|| format!("Failed to open framebuffer {}", self.device.display()))?;
        fb.write_all(&to_rgb565(frame))?;
        Ok(())
    }
}

impl OutputSink for FramebufferSink {
    fn name(&self) -> &str {
        "framebuffer"
    }

    fn display_frame(&self, frame: &Frame, slide_id: u32) -> bool {
        match self.write(frame) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write slide {} to framebuffer: {:#}", slide_id, e);
                false
            }
        }
    }
}
