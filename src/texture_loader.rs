use std::fs;
use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag, Value};
use image::error::{ParameterError, ParameterErrorKind};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, RgbImage};
use tracing::debug;

use crate::constants::DIM_FACTOR;
use crate::error::FrameError;

// --- Load one catalog entry as a display-sized, dimmed RGB frame ---
pub fn prepare_frame(image_path: &Path, target: (u32, u32)) -> Result<RgbImage, FrameError> {
    debug!(path = %image_path.display(), "loading image");
    let image = load_with_exif_rotation(image_path)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(FrameError::ImageDecode {
            path: image_path.to_path_buf(),
            source: ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::DimensionMismatch)),
        });
    }

    let mut frame = cover_fit(&image.into_rgb8(), target);
    dim(&mut frame, DIM_FACTOR);
    debug!(path = %image_path.display(), width = frame.width(), height = frame.height(), "prepared frame");
    Ok(frame)
}

// --- Load Image, Apply EXIF Orientation ---
pub fn load_with_exif_rotation(image_path: &Path) -> Result<DynamicImage, FrameError> {
    let decode_error = |source| FrameError::ImageDecode { path: image_path.to_path_buf(), source };

    let file_bytes = fs::read(image_path).map_err(|e| decode_error(ImageError::IoError(e)))?;
    let orientation = read_orientation(&file_bytes);
    let image = image::load_from_memory(&file_bytes).map_err(decode_error)?;

    if orientation != 1 {
        debug!(path = %image_path.display(), orientation, "applying EXIF orientation");
    }
    Ok(apply_orientation(image, orientation))
}

/// EXIF orientation tag of an encoded image, 1 (normal) when absent.
pub fn read_orientation(file_bytes: &[u8]) -> u16 {
    match Reader::new().read_from_container(&mut Cursor::new(file_bytes)) {
        Ok(exif) => {
            if let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) {
                if let Value::Short(values) = &field.value {
                    if let Some(&orientation) = values.first() {
                        return orientation;
                    }
                }
            }
            1
        }
        Err(e) => {
            // Most PNG/GIF/BMP files carry no EXIF at all
            debug!(error = %e, "no EXIF data");
            1
        }
    }
}

// 1 = Normal           2 = Mirrored horizontally
// 3 = Rotated 180      4 = Mirrored vertically
// 5 = Transposed       6 = Rotated 90 CW
// 7 = Transversed      8 = Rotated 90 CCW
pub fn apply_orientation(image: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// Scaled size and crop offset that make a source cover the target exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverGeometry {
    pub scaled: (u32, u32),
    pub offset: (u32, u32),
}

impl CoverGeometry {
    pub fn new((width, height): (u32, u32), (target_w, target_h): (u32, u32)) -> Self {
        let (w, h) = (width as u64, height as u64);
        let (tw, th) = (target_w as u64, target_h as u64);

        // Compare width/height against target_w/target_h without rounding
        let scaled = if w * th > tw * h {
            ((w * th / h) as u32, target_h)
        } else {
            (target_w, (h * tw / w) as u32)
        };
        let scaled = (scaled.0.max(target_w), scaled.1.max(target_h));

        let offset = ((scaled.0 - target_w) / 2, (scaled.1 - target_h) / 2);
        Self { scaled, offset }
    }
}

pub fn cover_fit(image: &RgbImage, target: (u32, u32)) -> RgbImage {
    let geometry = CoverGeometry::new(image.dimensions(), target);
    let (scaled_w, scaled_h) = geometry.scaled;
    let (left, top) = geometry.offset;

    let scaled = if image.dimensions() == geometry.scaled {
        image.clone()
    } else {
        imageops::resize(image, scaled_w, scaled_h, FilterType::Lanczos3)
    };
    imageops::crop_imm(&scaled, left, top, target.0, target.1).to_image()
}

/// Scales every channel by `factor`, truncating toward zero.
pub fn dim(image: &mut RgbImage, factor: f32) {
    let table: [u8; 256] = std::array::from_fn(|v| (v as f32 * factor).clamp(0.0, 255.0) as u8);
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = table[*channel as usize];
        }
    }
}
