//! Adaptive text colors derived from the photo underneath.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, Rgba};

use crate::constants::{AVERAGE_SAMPLE_SIZE, CONTRAST_ALPHA};

/// Hue, saturation and lightness, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub fn from_rgb(r: f64, g: f64, b: f64) -> Self {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let sum = max + min;
        let range = max - min;
        let l = sum / 2.0;
        if range == 0.0 {
            return Self { h: 0.0, s: 0.0, l };
        }

        let s = if l <= 0.5 { range / sum } else { range / (2.0 - sum) };
        let rc = (max - r) / range;
        let gc = (max - g) / range;
        let bc = (max - b) / range;
        let h = if r == max {
            bc - gc
        } else if g == max {
            2.0 + rc - bc
        } else {
            4.0 + gc - rc
        };
        Self { h: (h / 6.0).rem_euclid(1.0), s, l }
    }

    pub fn to_rgb(self) -> (f64, f64, f64) {
        let Self { h, s, l } = self;
        if s == 0.0 {
            return (l, l, l);
        }
        let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let m1 = 2.0 * l - m2;
        (
            hue_channel(m1, m2, h + 1.0 / 3.0),
            hue_channel(m1, m2, h),
            hue_channel(m1, m2, h - 1.0 / 3.0),
        )
    }

    /// Opposite hue, saturation boosted by 0.3 and lightness pushed half the
    /// scale away from the source, kept inside `[0.2, 0.9]`.
    pub fn complement(self) -> Self {
        let l = if self.l < 0.5 { (self.l + 0.5).min(0.9) } else { (self.l - 0.5).max(0.2) };
        Self {
            h: (self.h + 0.5).rem_euclid(1.0),
            s: (self.s + 0.3).min(1.0),
            l,
        }
    }

    /// Dark colors lose half their lightness, light ones move halfway to white.
    pub fn with_doubled_contrast(self) -> Self {
        let l = if self.l < 0.5 { (self.l * 0.5).max(0.0) } else { (self.l + (1.0 - self.l) * 0.5).min(1.0) };
        Self { l, ..self }
    }
}

fn hue_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

fn to_rgba(hsl: Hsl, alpha: u8) -> Rgba<u8> {
    let (r, g, b) = hsl.to_rgb();
    let channel = |v: f64| (v * 255.0).clamp(0.0, 255.0) as u8;
    Rgba([channel(r), channel(g), channel(b), alpha])
}

/// Mean color of a set of pixels as an HSL value.
fn mean_hsl<'a>(pixels: impl Iterator<Item = &'a Rgb<u8>>) -> Option<Hsl> {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for pixel in pixels {
        for (acc, channel) in sum.iter_mut().zip(pixel.0) {
            *acc += channel as u64;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let mean = |v: u64| v as f64 / count as f64 / 255.0;
    Some(Hsl::from_rgb(mean(sum[0]), mean(sum[1]), mean(sum[2])))
}

/// Whole-frame average color with doubled lightness contrast.
pub fn average_image_color(image: &RgbImage) -> Rgba<u8> {
    let small = imageops::resize(image, AVERAGE_SAMPLE_SIZE, AVERAGE_SAMPLE_SIZE, FilterType::Lanczos3);
    match mean_hsl(small.pixels()) {
        Some(hsl) => to_rgba(hsl.with_doubled_contrast(), CONTRAST_ALPHA),
        None => Rgba([255, 255, 255, CONTRAST_ALPHA]),
    }
}

/// Complementary color of the region `(x, y, width, height)`, clipped to the
/// frame. An empty region yields white.
pub fn contrast_color(image: &RgbImage, x: i64, y: i64, width: i64, height: i64) -> Rgba<u8> {
    let x2 = (x + width).min(image.width() as i64);
    let y2 = (y + height).min(image.height() as i64);
    let (x1, y1) = (x.max(0), y.max(0));
    if x2 <= x1 || y2 <= y1 {
        return Rgba([255, 255, 255, CONTRAST_ALPHA]);
    }

    let region = imageops::crop_imm(image, x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32).to_image();
    match mean_hsl(region.pixels()) {
        Some(hsl) => to_rgba(hsl.complement(), CONTRAST_ALPHA),
        None => Rgba([255, 255, 255, CONTRAST_ALPHA]),
    }
}

/// Multiplies the color channels by `factor`, saturating at 255.
pub fn brighten(color: Rgba<u8>, factor: f64, alpha: u8) -> Rgba<u8> {
    let [r, g, b, _] = color.0;
    let scale = |v: u8| (v as f64 * factor).min(255.0) as u8;
    Rgba([scale(r), scale(g), scale(b), alpha])
}
