pub const FPS: u32 = 30;                          // Render loop tick rate

pub const DIM_FACTOR: f32 = 0.5;                  // Brightness multiplier applied to every prepared frame

pub const OVERLAY_MARGIN: i32 = 20;               // Distance between overlay text and the frame edge (pixels)
pub const BAR_PADDING: u32 = 8;                   // Bar height beyond the text is twice this (pixels)
pub const BAR_TEXT_TOP: i32 = 0;                  // Top bar text offset from the frame's top edge (pixels)
pub const BAR_ALPHA: u8 = 120;                    // Opacity of the black top bar
pub const TEXT_ALPHA: u8 = 250;                   // Opacity of top bar text
pub const CONTRAST_ALPHA: u8 = 230;               // Opacity returned by the adaptive color computations

pub const AVERAGE_SAMPLE_SIZE: u32 = 100;         // Side of the thumbnail used for average color sampling
pub const AVERAGE_BRIGHTEN: f64 = 1.8;            // Extra brightening of the average color before use as text

pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];
