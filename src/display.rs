use anyhow::{anyhow, Result};
use image::RgbaImage;
use raylib::prelude::*;
use tracing::{debug, info, warn};

use crate::constants::FPS;
use crate::engine::{InputEvent, Screen};

/// Fullscreen (or windowed) raylib output. Frames are uploaded into one
/// streaming texture the size of the configured resolution.
pub struct RaylibScreen {
    rl: RaylibHandle,
    thread: RaylibThread,
    texture: Texture2D,
    resolution: (u32, u32),
}

impl RaylibScreen {
    pub fn open((width, height): (u32, u32), fullscreen: bool) -> Result<Self> {
        let mut builder = raylib::init();
        builder.size(width as i32, height as i32).title("Photo Frame");
        if fullscreen {
            builder.fullscreen();
        }
        let (mut rl, thread) = builder.build();

        rl.set_target_fps(FPS);
        rl.set_trace_log(TraceLogLevel::LOG_ERROR);
        rl.set_exit_key(None);
        rl.hide_cursor();

        let canvas = Image::gen_image_color(width as i32, height as i32, Color::BLACK);
        let texture = rl
            .load_texture_from_image(&thread, &canvas)
            .map_err(|e| anyhow!("failed to create frame texture: {e}"))?;

        info!(width, height, fullscreen, "display opened");
        Ok(Self { rl, thread, texture, resolution: (width, height) })
    }
}

fn map_key(key: KeyboardKey) -> InputEvent {
    match key {
        KeyboardKey::KEY_ESCAPE => InputEvent::Quit,
        KeyboardKey::KEY_SPACE => InputEvent::Advance,
        KeyboardKey::KEY_B => InputEvent::ToggleBlank,
        KeyboardKey::KEY_R => InputEvent::Reload,
        _ => InputEvent::Other,
    }
}

impl Screen for RaylibScreen {
    fn poll_input(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        if self.rl.window_should_close() {
            events.push(InputEvent::Quit);
        }
        while let Some(key) = self.rl.get_key_pressed() {
            debug!(?key, "key pressed");
            events.push(map_key(key));
        }
        events
    }

    fn present(&mut self, frame: Option<&RgbaImage>) {
        let uploaded = match frame {
            Some(canvas) if canvas.dimensions() == self.resolution => {
                match self.texture.update_texture(canvas.as_raw()) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "frame upload failed");
                        false
                    }
                }
            }
            Some(canvas) => {
                warn!(frame = ?canvas.dimensions(), texture = ?self.resolution, "frame size mismatch, skipping");
                false
            }
            None => false,
        };

        let mut d = self.rl.begin_drawing(&self.thread);
        d.clear_background(Color::BLACK);
        if uploaded {
            let sw = d.get_screen_width() as f32;
            let sh = d.get_screen_height() as f32;
            d.draw_texture_pro(
                &self.texture,
                Rectangle::new(0.0, 0.0, self.texture.width() as f32, self.texture.height() as f32),
                Rectangle::new(0.0, 0.0, sw, sh),
                Vector2::new(0.0, 0.0),
                0.0,
                Color::WHITE,
            );
        }
    }

    fn restore(&mut self) {
        self.rl.show_cursor();
        info!("display closed");
    }
}
