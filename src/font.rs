//! Overlay text rendering: TrueType through fontdue, with a built-in bitmap
//! font when no font file can be loaded.

use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};
use tracing::{debug, info, warn};

use crate::error::FrameError;

const BUILTIN_FONT: &MonoFont<'static> = &FONT_10X20;

const SYSTEM_FONT_PATHS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
];

pub enum OverlayFont {
    TrueType { font: Font, path: PathBuf },
    Builtin,
}

impl std::fmt::Debug for OverlayFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayFont::TrueType { path, .. } => f.debug_tuple("TrueType").field(path).finish(),
            OverlayFont::Builtin => f.write_str("Builtin"),
        }
    }
}

impl OverlayFont {
    /// Configured font first, then common system fonts, then the built-in one.
    pub fn load(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match Self::from_path(path) {
                Ok(font) => return font,
                Err(e) => warn!(error = %e, "falling back from configured font"),
            }
        }

        for path in SYSTEM_FONT_PATHS {
            match Self::from_path(Path::new(path)) {
                Ok(font) => return font,
                Err(e) => debug!(error = %e, "system font unavailable"),
            }
        }

        warn!("no TrueType font found, using built-in bitmap font");
        OverlayFont::Builtin
    }

    pub fn from_path(path: &Path) -> Result<Self, FrameError> {
        let font_error = |reason: String| FrameError::FontLoad { path: path.to_path_buf(), reason };

        let font_data = fs::read(path).map_err(|e| font_error(e.to_string()))?;
        let font = Font::from_bytes(font_data, FontSettings::default()).map_err(|e| font_error(e.to_string()))?;

        info!(path = %path.display(), "loaded overlay font");
        Ok(OverlayFont::TrueType { font, path: path.to_path_buf() })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            OverlayFont::TrueType { path, .. } => Some(path),
            OverlayFont::Builtin => None,
        }
    }

    /// Width and height of the inked box `text` occupies at `size` pixels.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        match self {
            OverlayFont::TrueType { font, .. } => {
                let layout = GlyphLayout::new(font, text, size, false);
                (layout.width, layout.height)
            }
            OverlayFont::Builtin => {
                let scale = builtin_scale(size);
                let count = text.chars().count() as u32;
                if count == 0 {
                    return (0, 0);
                }
                let glyph = BUILTIN_FONT.character_size;
                let width = count * glyph.width + (count - 1) * BUILTIN_FONT.character_spacing;
                (width * scale, glyph.height * scale)
            }
        }
    }

    /// Draws `text` with its top-left corner at `(x, y)`, clipped to the canvas.
    pub fn draw(&self, canvas: &mut RgbaImage, (x, y): (i32, i32), text: &str, size: f32, color: Rgba<u8>) {
        match self {
            OverlayFont::TrueType { font, .. } => {
                let layout = GlyphLayout::new(font, text, size, true);
                for glyph in &layout.glyphs {
                    let top = y + layout.ascent - (glyph.metrics.height as i32 + glyph.metrics.ymin);
                    let left = x + glyph.x + glyph.metrics.xmin;
                    for gy in 0..glyph.metrics.height {
                        for gx in 0..glyph.metrics.width {
                            let coverage = glyph.bitmap[gy * glyph.metrics.width + gx] as f32 / 255.0;
                            if coverage > 0.0 {
                                blend(canvas, (left + gx as i32) as i64, (top + gy as i32) as i64, color, coverage);
                            }
                        }
                    }
                }
            }
            OverlayFont::Builtin => {
                let scale = builtin_scale(size) as i32;
                let mut target = CanvasTarget { canvas, color, origin: Point::new(x, y), scale };
                let style = MonoTextStyle::new(BUILTIN_FONT, BinaryColor::On);
                // Drawing into the canvas cannot fail
                let _ = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut target);
            }
        }
    }
}

fn builtin_scale(size: f32) -> u32 {
    (size / BUILTIN_FONT.character_size.height as f32).round().max(1.0) as u32
}

struct PlacedGlyph {
    x: i32,
    metrics: fontdue::Metrics,
    bitmap: Vec<u8>,
}

struct GlyphLayout {
    glyphs: Vec<PlacedGlyph>,
    width: u32,
    height: u32,
    ascent: i32,
}

impl GlyphLayout {
    fn new(font: &Font, text: &str, size: f32, rasterize: bool) -> Self {
        let mut glyphs = Vec::new();
        let mut x = 0.0f32;
        let mut max_ascent = 0i32;
        let mut max_descent = 0i32;

        for ch in text.chars() {
            let (metrics, bitmap) = if rasterize {
                font.rasterize(ch, size)
            } else {
                (font.metrics(ch, size), Vec::new())
            };

            max_ascent = max_ascent.max(metrics.height as i32 + metrics.ymin);
            max_descent = max_descent.max(-metrics.ymin);

            glyphs.push(PlacedGlyph { x: x as i32, metrics, bitmap });
            x += metrics.advance_width;
        }

        Self {
            glyphs,
            width: x.ceil().max(0.0) as u32,
            height: (max_ascent + max_descent).max(0) as u32,
            ascent: max_ascent,
        }
    }
}

/// Source-over blend of `color` at `coverage` onto one canvas pixel.
pub fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = color.0[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in pixel.0.iter_mut().zip(color.0).take(3) {
        *dst = (*dst as f32 * (1.0 - alpha) + src as f32 * alpha).round() as u8;
    }
}

/// Lets embedded-graphics draw the built-in font onto an RGBA canvas.
struct CanvasTarget<'a> {
    canvas: &'a mut RgbaImage,
    color: Rgba<u8>,
    origin: Point,
    scale: i32,
}

impl OriginDimensions for CanvasTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.canvas.width(), self.canvas.height())
    }
}

impl DrawTarget for CanvasTarget<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if !color.is_on() {
                continue;
            }
            let x = self.origin.x + point.x * self.scale;
            let y = self.origin.y + point.y * self.scale;
            for dy in 0..self.scale {
                for dx in 0..self.scale {
                    blend(self.canvas, (x + dx) as i64, (y + dy) as i64, self.color, 1.0);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_builtin_measure_scales_with_size() {
        let font = OverlayFont::Builtin;
        assert_eq!(font.measure("12:34", 20.0), (50, 20));
        assert_eq!(font.measure("12:34", 40.0), (100, 40));
        assert_eq!(font.measure("12:34", 4.0), (50, 20));
        assert_eq!(font.measure("", 20.0), (0, 0));
    }

    #[test]
    fn test_builtin_draw_stays_inside_measured_box() {
        let font = OverlayFont::Builtin;
        let mut canvas = black(200, 100);
        let (w, h) = font.measure("Hello", 20.0);
        font.draw(&mut canvas, (30, 40), "Hello", 20.0, Rgba([255, 255, 255, 255]));

        let mut inked = 0;
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if pixel.0[0] > 0 {
                inked += 1;
                assert!((30..30 + w).contains(&x) && (40..40 + h).contains(&y), "ink at {x},{y}");
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn test_draw_is_clipped_to_canvas() {
        let font = OverlayFont::Builtin;
        let mut canvas = black(20, 10);
        font.draw(&mut canvas, (-15, -5), "XXXX", 40.0, Rgba([255, 255, 255, 255]));
        font.draw(&mut canvas, (15, 8), "XXXX", 40.0, Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.dimensions(), (20, 10));
    }

    #[test]
    fn test_blend_honours_alpha() {
        let mut canvas = black(1, 1);
        blend(&mut canvas, 0, 0, Rgba([255, 255, 255, 255]), 0.5);
        assert_eq!(canvas.get_pixel(0, 0).0, [128, 128, 128, 255]);

        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([200, 200, 200, 255]));
        blend(&mut canvas, 0, 0, Rgba([0, 0, 0, 0]), 1.0);
        assert_eq!(canvas.get_pixel(0, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn test_missing_font_file_is_font_error() {
        let result = OverlayFont::from_path(Path::new("/nonexistent/arial.ttf"));
        assert!(matches!(result, Err(FrameError::FontLoad { .. })));
    }

    #[test]
    fn test_invalid_font_file_is_font_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.ttf");
        fs::write(&path, b"not a font").unwrap();
        assert!(matches!(OverlayFont::from_path(&path), Err(FrameError::FontLoad { .. })));
    }

    #[test]
    fn test_load_never_fails() {
        let font = OverlayFont::load(Some(Path::new("/nonexistent/arial.ttf")));
        let (w, h) = font.measure("12:00", 32.0);
        assert!(w > 0 && h > 0);
    }
}
