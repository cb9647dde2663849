//! Default slide renderer
//!
//! Draws a fixed-resolution frame per slide: a header band, then a body that
//! depends on what the slide carries. Percentage-like values become gauges,
//! image slides show their picture, clocks show an analog face. Anything
//! without data gets a "no data" marker. Rendering never fails for lack of
//! data.

use anyhow::Result;
use chrono::{Local, Timelike};
use homelab_hud_core::{Frame, SlideRenderer};
use homelab_hud_types::{SlideConfig, SlideData};
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use log::warn;
use serde_json::Value;

const HEADER_HEIGHT: u32 = 32;
const PADDING: u32 = 8;
const GAUGE_HEIGHT: u32 = 14;
const MAX_GAUGES: usize = 8;

/// Monochrome CRT palette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Rgb<u8>,
    pub foreground: Rgb<u8>,
    pub header: Rgb<u8>,
    pub dim: Rgb<u8>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgb([0, 0, 0]),
            foreground: Rgb([255, 255, 255]),
            header: Rgb([64, 64, 64]),
            dim: Rgb([128, 128, 128]),
        }
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).max(1);
    for i in 0..=steps {
        let x = from.0 + (to.0 - from.0) * i / steps;
        let y = from.1 + (to.1 - from.1) * i / steps;
        if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn is_percent_key(key: &str) -> bool {
    key.contains("percent") || key == "progress"
}

/// Percentage-like values in document order, two levels deep
pub(crate) fn percent_values(data: &SlideData) -> Vec<f64> {
    fn walk(key: &str, value: &Value, depth: usize, out: &mut Vec<f64>) {
        match value {
            Value::Number(n) if is_percent_key(key) => {
                if let Some(v) = n.as_f64() {
                    out.push(v.clamp(0.0, 100.0));
                }
            }
            Value::Object(map) if depth < 2 => {
                for (k, v) in map {
                    walk(k, v, depth + 1, out);
                }
            }
            Value::Array(items) if depth < 2 => {
                for item in items {
                    walk(key, item, depth + 1, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    for (key, value) in data {
        walk(key, value, 0, &mut out);
    }
    out.truncate(MAX_GAUGES);
    out
}

/// Renderer that needs nothing but the `image` crate
#[derive(Debug, Clone)]
pub struct PlaceholderRenderer {
    width: u32,
    height: u32,
    theme: Theme,
}

impl PlaceholderRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            theme: Theme::default(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    fn body(&self) -> (u32, u32, u32, u32) {
        let top = HEADER_HEIGHT + PADDING;
        (
            PADDING,
            top,
            self.width.saturating_sub(2 * PADDING),
            self.height.saturating_sub(top + PADDING),
        )
    }

    fn draw_header(&self, img: &mut RgbImage, slide: &SlideConfig) {
        fill_rect(img, 0, 0, self.width, HEADER_HEIGHT, self.theme.header);
        fill_rect(img, 0, HEADER_HEIGHT - 2, self.width, 2, self.theme.dim);
        // Title length indicator until a text backend exists
        let title_width = (slide.title.chars().count() as u32 * 8).min(self.width.saturating_sub(2 * PADDING));
        fill_rect(img, PADDING, 12, title_width, 8, self.theme.foreground);
    }

    fn draw_no_data(&self, img: &mut RgbImage) {
        let (x, y, w, h) = self.body();
        let size = w.min(h) / 2;
        let left = (x + (w - size) / 2) as i64;
        let top = (y + (h - size) / 2) as i64;
        let size = size as i64;
        let color = self.theme.dim;
        draw_line(img, (left, top), (left + size, top + size), color);
        draw_line(img, (left, top + size), (left + size, top), color);
        draw_line(img, (left, top), (left + size, top), color);
        draw_line(img, (left, top + size), (left + size, top + size), color);
        draw_line(img, (left, top), (left, top + size), color);
        draw_line(img, (left + size, top), (left + size, top + size), color);
    }

    fn draw_gauges(&self, img: &mut RgbImage, values: &[f64]) {
        let (x, mut y, w, h) = self.body();
        let bottom = y + h;
        for value in values {
            if y + GAUGE_HEIGHT > bottom {
                break;
            }
            fill_rect(img, x, y, w, GAUGE_HEIGHT, self.theme.header);
            let filled = (w as f64 * value / 100.0).round() as u32;
            fill_rect(img, x, y, filled, GAUGE_HEIGHT, self.theme.foreground);
            y += GAUGE_HEIGHT + PADDING;
        }
    }

    /// Scaled picture in the body; false when it cannot be loaded
    fn draw_picture(&self, img: &mut RgbImage, path: &str) -> bool {
        let (x, y, w, h) = self.body();
        match image::open(path) {
            Ok(picture) => {
                let scaled = picture.resize(w, h, FilterType::Triangle).to_rgb8();
                let left = x + (w - scaled.width().min(w)) / 2;
                let top = y + (h - scaled.height().min(h)) / 2;
                image::imageops::overlay(img, &scaled, left as i64, top as i64);
                true
            }
            Err(e) => {
                warn!("Cannot load slide image {}: {}", path, e);
                false
            }
        }
    }

    fn draw_clock(&self, img: &mut RgbImage) {
        let (x, y, w, h) = self.body();
        let radius = (w.min(h) / 2) as f64;
        let cx = (x + w / 2) as f64;
        let cy = (y + h / 2) as f64;
        let point = |fraction: f64, length: f64| {
            let angle = fraction * std::f64::consts::TAU;
            ((cx + angle.sin() * length) as i64, (cy - angle.cos() * length) as i64)
        };
        let center = (cx as i64, cy as i64);

        for tick in 0..12 {
            let fraction = tick as f64 / 12.0;
            draw_line(img, point(fraction, radius * 0.85), point(fraction, radius), self.theme.dim);
        }

        let now = Local::now();
        let minutes = now.minute() as f64 + now.second() as f64 / 60.0;
        let hours = (now.hour() % 12) as f64 + minutes / 60.0;
        draw_line(img, center, point(hours / 12.0, radius * 0.5), self.theme.foreground);
        draw_line(img, center, point(minutes / 60.0, radius * 0.8), self.theme.foreground);
    }
}

impl SlideRenderer for PlaceholderRenderer {
    fn render(&self, slide_type: &str, data: Option<&SlideData>, slide: &SlideConfig) -> Result<Frame> {
        let mut img = RgbImage::from_pixel(self.width, self.height, self.theme.background);
        self.draw_header(&mut img, slide);

        match slide_type {
            "clock" => self.draw_clock(&mut img),
            "image" => {
                let shown = slide
                    .image_path
                    .as_deref()
                    .is_some_and(|path| self.draw_picture(&mut img, path));
                if !shown {
                    self.draw_no_data(&mut img);
                }
            }
            "static_text" if slide.text.as_deref().is_some_and(|t| !t.trim().is_empty()) => {
                // One bar per line of text
                let lines: Vec<f64> = slide
                    .text
                    .iter()
                    .flat_map(|t| t.lines())
                    .map(|line| (line.chars().count() as f64 / 40.0 * 100.0).min(100.0))
                    .collect();
                self.draw_gauges(&mut img, &lines);
            }
            _ => match data {
                Some(data) => self.draw_gauges(&mut img, &percent_values(data)),
                None => self.draw_no_data(&mut img),
            },
        }

        Ok(Frame::new(img))
    }
}
