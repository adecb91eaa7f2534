use std::cell::OnceCell;
use std::fmt::{self, Write};

use chrono::{DateTime, TimeZone, Timelike};
use image::buffer::ConvertBuffer;
use image::{Rgba, RgbImage, RgbaImage};
use tracing::debug;

use crate::color::{average_image_color, brighten, contrast_color};
use crate::config::{
    OverlaySettings, Position, PositionedOverlay, TextContrast, TextOverlay, DEFAULT_CLOCK_FORMAT, DEFAULT_DATE_FORMAT,
};
use crate::constants::*;
use crate::font::{blend, OverlayFont};

pub const WEATHER_PLACEHOLDER: &str = "Weather API not configured";
pub const SYSTEM_STATS_PLACEHOLDER: &str = "System Stats";

/// A display-sized photo plus lazily computed color statistics.
#[derive(Debug)]
pub struct PreparedFrame {
    image: RgbImage,
    average: OnceCell<Rgba<u8>>,
}

impl PreparedFrame {
    pub fn new(image: RgbImage) -> Self {
        Self { image, average: OnceCell::new() }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn average_color(&self) -> Rgba<u8> {
        *self.average.get_or_init(|| average_image_color(&self.image))
    }
}

pub struct OverlayCompositor {
    font: OverlayFont,
}

struct BarText {
    text: String,
    size: f32,
    contrast: TextContrast,
    x: i32,
    width: u32,
    height: u32,
}

impl OverlayCompositor {
    pub fn new(font: OverlayFont) -> Self {
        Self { font }
    }

    pub fn font(&self) -> &OverlayFont {
        &self.font
    }

    pub fn set_font(&mut self, font: OverlayFont) {
        self.font = font;
    }

    /// Draws every enabled overlay onto a copy of `frame`.
    pub fn compose<Tz>(&self, frame: &PreparedFrame, overlays: &OverlaySettings, now: &DateTime<Tz>) -> RgbaImage
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut canvas: RgbaImage = frame.image().convert();

        self.draw_top_bar(&mut canvas, frame, overlays, now);

        let weather = &overlays.weather;
        if weather.enabled && weather.api_key.as_deref().is_some_and(|key| !key.is_empty()) {
            self.draw_positioned(&mut canvas, WEATHER_PLACEHOLDER, weather);
        }
        if overlays.system_stats.enabled {
            self.draw_positioned(&mut canvas, SYSTEM_STATS_PLACEHOLDER, &overlays.system_stats);
        }

        canvas
    }

    fn bar_text(&self, overlay: &TextOverlay, text: String, anchor_right: Option<u32>) -> BarText {
        let (width, height) = self.font.measure(&text, overlay.font_size);
        let x = match anchor_right {
            Some(frame_width) => frame_width as i32 - width as i32 - OVERLAY_MARGIN,
            None => OVERLAY_MARGIN,
        };
        BarText { text, size: overlay.font_size, contrast: overlay.contrast, x, width, height }
    }

    /// Clock on the right and date on the left, over one translucent bar as tall
    /// as the taller of the two.
    fn draw_top_bar<Tz>(&self, canvas: &mut RgbaImage, frame: &PreparedFrame, overlays: &OverlaySettings, now: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let frame_width = canvas.width();
        let clock = overlays.clock.enabled.then(|| {
            let format = overlays.clock.format.as_deref().unwrap_or(DEFAULT_CLOCK_FORMAT);
            self.bar_text(&overlays.clock, clock_text(format, now), Some(frame_width))
        });
        let date = overlays.date.enabled.then(|| {
            let format = overlays.date.format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
            self.bar_text(&overlays.date, format_time(format, DEFAULT_DATE_FORMAT, now), None)
        });

        let texts: Vec<BarText> = clock.into_iter().chain(date).collect();
        let Some(text_height) = texts.iter().map(|t| t.height).max() else {
            return;
        };

        let bar_height = text_height + BAR_PADDING * 2;
        fill_rect(canvas, (0, 0), (frame_width, bar_height), Rgba([0, 0, 0, BAR_ALPHA]));

        // Text hugs the top edge; the padding all ends up below it
        let text_y = BAR_TEXT_TOP;
        for text in &texts {
            let color = text_color(frame, text.contrast, (text.x, text_y), (text.width, text.height));
            self.font.draw(canvas, (text.x, text_y), &text.text, text.size, color);
        }
    }

    fn draw_positioned(&self, canvas: &mut RgbaImage, text: &str, overlay: &PositionedOverlay) {
        let text_size = self.font.measure(text, overlay.font_size);
        let origin = resolve_position(overlay.position, canvas.dimensions(), text_size);
        self.font.draw(canvas, origin, text, overlay.font_size, Rgba(overlay.color));
    }
}

/// Fill color for top bar text over the region `origin`/`size` of the photo.
pub fn text_color(frame: &PreparedFrame, contrast: TextContrast, origin: (i32, i32), size: (u32, u32)) -> Rgba<u8> {
    match contrast {
        TextContrast::White => Rgba([255, 255, 255, TEXT_ALPHA]),
        TextContrast::Average => brighten(frame.average_color(), AVERAGE_BRIGHTEN, TEXT_ALPHA),
        TextContrast::Complementary => contrast_color(
            frame.image(),
            origin.0 as i64,
            origin.1 as i64,
            size.0 as i64,
            size.1 as i64,
        ),
    }
}

/// Formats `now` with `pattern`, or with `fallback` if the pattern is invalid.
pub fn format_time<Tz>(pattern: &str, fallback: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut text = String::new();
    if write!(text, "{}", now.format(pattern)).is_ok() {
        return text;
    }
    debug!(pattern, "invalid time format, using default");
    now.format(fallback).to_string()
}

/// Clock text with the `:` separators blanked on odd seconds.
pub fn clock_text<Tz>(pattern: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let text = format_time(pattern, DEFAULT_CLOCK_FORMAT, now);
    if now.second() % 2 == 1 { text.replace(':', " ") } else { text }
}

pub fn resolve_position(position: Position, (width, height): (u32, u32), (text_w, text_h): (u32, u32)) -> (i32, i32) {
    let (width, height) = (width as i32, height as i32);
    let (text_w, text_h) = (text_w as i32, text_h as i32);
    let right = width - text_w - OVERLAY_MARGIN;
    let bottom = height - text_h - OVERLAY_MARGIN;
    match position {
        Position::TopLeft => (OVERLAY_MARGIN, OVERLAY_MARGIN),
        Position::TopRight => (right, OVERLAY_MARGIN),
        Position::BottomLeft => (OVERLAY_MARGIN, bottom),
        Position::BottomRight => (right, bottom),
        Position::Center => ((width - text_w) / 2, (height - text_h) / 2),
    }
}

fn fill_rect(canvas: &mut RgbaImage, (x, y): (u32, u32), (width, height): (u32, u32), color: Rgba<u8>) {
    let x_end = (x + width).min(canvas.width());
    let y_end = (y + height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            blend(canvas, px as i64, py as i64, color, 1.0);
        }
    }
}
