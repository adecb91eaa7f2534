use std::ops::ControlFlow;
use std::time::Instant;

use chrono::{DateTime, Local, TimeZone};
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::catalog::ImageCatalog;
use crate::config::{Config, ConfigWatermark};
use crate::error::FrameError;
use crate::font::OverlayFont;
use crate::monitor::MonitorPower;
use crate::overlay::{OverlayCompositor, PreparedFrame};
use crate::state::{Mode, ModeScheduler, PowerSave};
use crate::texture_loader::prepare_frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    Advance,
    ToggleBlank,
    Reload,
    /// Any other key; only wakes the display.
    Other,
}

/// Window side of the render loop.
pub trait Screen {
    fn poll_input(&mut self) -> Vec<InputEvent>;
    /// Shows `frame`, or a black screen for `None`, and paces to the tick rate.
    fn present(&mut self, frame: Option<&RgbaImage>);
    /// Gives back host UI affordances (cursor) before exit.
    fn restore(&mut self);
}

/// Everything the render loop carries from one tick to the next.
pub struct Slideshow {
    config: Config,
    watermark: ConfigWatermark,
    catalog: ImageCatalog,
    frame: Option<PreparedFrame>,
    /// Set after a hot reload: the next advance shows entry 0, not entry 1.
    catalog_unshown: bool,
    scheduler: ModeScheduler,
    compositor: OverlayCompositor,
    monitor: Box<dyn MonitorPower>,
    resolution: (u32, u32),
}

impl Slideshow {
    pub fn new(
        config: Config,
        watermark: ConfigWatermark,
        catalog: ImageCatalog,
        compositor: OverlayCompositor,
        monitor: Box<dyn MonitorPower>,
        now: Instant,
    ) -> Self {
        let scheduler = ModeScheduler::new(PowerSave::from_settings(&config.display), now);
        let resolution = config.display.resolution;
        let mut slideshow =
            Self {
            config,
            watermark,
            catalog,
            frame: None,
            catalog_unshown: false,
            scheduler,
            compositor,
            monitor,
            resolution,
        };
        slideshow.load_current();
        slideshow
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &ImageCatalog {
        &self.catalog
    }

    pub fn frame(&self) -> Option<&PreparedFrame> {
        self.frame.as_ref()
    }

    pub fn scheduler(&self) -> &ModeScheduler {
        &self.scheduler
    }

    /// One pass of the loop: input, config check, mode timers, image timer,
    /// compositing. `Continue(None)` means show a black frame.
    pub fn tick<Tz>(&mut self, events: Vec<InputEvent>, now: Instant, wall: &DateTime<Tz>) -> ControlFlow<(), Option<RgbaImage>>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        for event in events {
            self.handle_input(event, now)?;
        }

        self.check_config();
        self.monitor.reap();
        self.scheduler.tick(now, self.monitor.as_mut());

        if self.scheduler.mode() == Mode::Blank {
            return ControlFlow::Continue(None);
        }

        if self.scheduler.image_due(now, self.config.display.slideshow_interval()) {
            self.advance(now);
        }
        ControlFlow::Continue(self.frame.as_ref().map(|frame| self.compositor.compose(frame, &self.config.overlays, wall)))
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) -> ControlFlow<()> {
        if event == InputEvent::Quit {
            info!("quit requested");
            return ControlFlow::Break(());
        }

        // Waking consumes a blank toggle; other keys still act after waking
        if self.scheduler.wake(now, self.monitor.as_mut()) && event == InputEvent::ToggleBlank {
            return ControlFlow::Continue(());
        }

        match event {
            InputEvent::Advance => self.advance(now),
            InputEvent::ToggleBlank => {
                self.scheduler.toggle(now, self.monitor.as_mut());
            }
            InputEvent::Reload => self.force_reload(now),
            InputEvent::Other | InputEvent::Quit => {}
        }
        ControlFlow::Continue(())
    }

    /// Moves to the next catalog entry and restarts the image timer.
    pub fn advance(&mut self, now: Instant) {
        self.scheduler.mark_image_change(now);
        let next = if std::mem::take(&mut self.catalog_unshown) {
            self.catalog.current()
        } else {
            self.catalog.advance()
        };
        if next.is_none() {
            debug!("no images in catalog");
            return;
        }
        info!(index = self.catalog.index() + 1, total = self.catalog.len(), "advancing image");
        self.load_current();
    }

    /// Reloads config and catalog when the file's mtime moved. A failed load
    /// keeps the previous settings and is retried on the next call.
    pub fn check_config(&mut self) -> bool {
        let Some(mtime) = self.watermark.poll() else {
            return false;
        };

        match Config::load(self.watermark.path()) {
            Ok(config) => {
                info!(path = %self.watermark.path().display(), "config file changed, reloading");
                self.watermark.mark_loaded(mtime);
                self.apply_config(config);
                true
            }
            Err(e) => {
                if self.watermark.mark_failed(mtime) {
                    warn!(error = %e, "config reload failed, keeping previous settings");
                }
                false
            }
        }
    }

    /// Manual reload: config (when readable), catalog, and the first image.
    pub fn force_reload(&mut self, now: Instant) {
        let mtime = self.watermark.modified();
        match Config::load(self.watermark.path()) {
            Ok(config) => {
                if let Some(mtime) = mtime {
                    self.watermark.mark_loaded(mtime);
                }
                self.apply_config(config);
            }
            Err(e) => {
                warn!(error = %e, "manual reload could not read config, rescanning sources only");
                self.catalog = ImageCatalog::from_sources(&self.config.sources);
            }
        }
        self.catalog_unshown = false;
        self.scheduler.mark_image_change(now);
        self.load_current();
    }

    fn apply_config(&mut self, config: Config) {
        if config.display.resolution != self.resolution {
            warn!(
                configured = ?config.display.resolution,
                active = ?self.resolution,
                "resolution changes need a restart, keeping the active one"
            );
        }
        if config.display.font != self.config.display.font {
            self.compositor.set_font(OverlayFont::load(config.display.font.as_deref()));
            info!(font = ?self.compositor.font().path(), "overlay font reloaded");
        }

        self.scheduler.set_power_save(PowerSave::from_settings(&config.display));
        self.catalog = ImageCatalog::from_sources(&config.sources);
        // The old frame may stay up until the next change, but only while
        // there is a next image to change to
        if self.catalog.is_empty() {
            self.frame = None;
        }
        self.catalog_unshown = !self.catalog.is_empty();
        info!(
            interval = config.display.slideshow_interval,
            power_save = config.display.enable_power_save,
            images = self.catalog.len(),
            "config applied"
        );
        self.config = config;
    }

    /// Prepares the current catalog entry. A decode failure keeps the
    /// previous frame; an empty catalog leaves nothing to show.
    fn load_current(&mut self) {
        match self.prepare_current() {
            Ok(frame) => self.frame = Some(frame),
            Err(FrameError::EmptyCatalog) => {
                warn!("no images to display");
                self.frame = None;
            }
            Err(e) => warn!(error = %e, "keeping previous frame"),
        }
    }

    /// Turns the monitor back on if the run ends while blank.
    pub fn shutdown(&mut self) {
        if self.scheduler.mode() != Mode::Blank {
            return;
        }
        info!("quitting while blank, powering monitor back on");
        if let Err(e) = self.monitor.power_on() {
            warn!(error = %e, "monitor power control failed");
        }
    }

    fn prepare_current(&self) -> Result<PreparedFrame, FrameError> {
        let path = self.catalog.current().ok_or(FrameError::EmptyCatalog)?;
        debug!(path = %path.display(), "preparing frame");
        prepare_frame(path, self.resolution).map(PreparedFrame::new)
    }
}

/// Drives `slideshow` until quit, then restores the monitor and the screen.
pub fn run(slideshow: &mut Slideshow, screen: &mut dyn Screen) {
    loop {
        let events = screen.poll_input();
        match slideshow.tick(events, Instant::now(), &Local::now()) {
            ControlFlow::Break(()) => break,
            ControlFlow::Continue(frame) => screen.present(frame.as_ref()),
        }
    }
    slideshow.shutdown();
    screen.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::CountingMonitor;
    use chrono::Utc;
    use image::{Rgb, RgbImage};
    use std::fs::{self, File};
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const RED: [u8; 3] = [200, 0, 0];
    const GREEN: [u8; 3] = [0, 200, 0];
    const BLUE: [u8; 3] = [0, 0, 200];

    struct Fixture {
        dir: TempDir,
        config_path: PathBuf,
        monitor: CountingMonitor,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir(dir.path().join("photos")).unwrap();
            let config_path = dir.path().join("config.json");
            let fixture = Self { dir, config_path, monitor: CountingMonitor::default() };
            fixture.write_config(10, false, 0);
            fixture
        }

        fn photos(&self) -> PathBuf {
            self.dir.path().join("photos")
        }

        fn photo(&self, name: &str, color: [u8; 3]) -> PathBuf {
            let path = self.photos().join(name);
            RgbImage::from_pixel(32, 24, Rgb(color)).save(&path).unwrap();
            path
        }

        fn write_raw(&self, contents: &str, stamp: u64) {
            fs::write(&self.config_path, contents).unwrap();
            let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + stamp);
            File::options().write(true).open(&self.config_path).unwrap().set_modified(mtime).unwrap();
        }

        fn write_config(&self, interval: u64, power_save: bool, stamp: u64) {
            let json = format!(
                r#"{{
                    "display": {{
                        "resolution": [64, 48],
                        "slideshow_interval": {interval},
                        "enable_power_save": {power_save},
                        "power_save_slideshow_duration": 60,
                        "power_save_blank_duration": 30
                    }},
                    "sources": {{ "local_paths": [{:?}] }}
                }}"#,
                self.photos().display().to_string()
            );
            self.write_raw(&json, stamp);
        }

        fn write_without_sources(&self, stamp: u64) {
            self.write_raw(
                r#"{ "display": { "resolution": [64, 48] }, "sources": { "local_paths": [] } }"#,
                stamp,
            );
        }

        fn slideshow(&self, catalog: ImageCatalog, now: Instant) -> Slideshow {
            let config = Config::load(&self.config_path).unwrap();
            let mut watermark = ConfigWatermark::new(&self.config_path, None);
            watermark.mark_loaded(watermark.modified().unwrap());
            Slideshow::new(
                config,
                watermark,
                catalog,
                OverlayCompositor::new(OverlayFont::Builtin),
                Box::new(self.monitor.clone()),
                now,
            )
        }
    }

    fn center(slideshow: &Slideshow) -> [u8; 3] {
        slideshow.frame().expect("frame").image().get_pixel(32, 24).0
    }

    fn dimmed(color: [u8; 3]) -> [u8; 3] {
        color.map(|c| c / 2)
    }

    fn catalog_of(paths: &[&Path]) -> ImageCatalog {
        ImageCatalog::new(paths.iter().map(|p| p.to_path_buf()).collect())
    }

    #[test]
    fn test_startup_prepares_first_image() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let slideshow = fixture.slideshow(catalog_of(&[&a]), Instant::now());

        let frame = slideshow.frame().unwrap();
        assert_eq!(frame.image().dimensions(), (64, 48));
        assert_eq!(center(&slideshow), dimmed(RED));
    }

    #[test]
    fn test_advance_from_last_wraps_and_resets_timer() {
        let fixture = Fixture::new();
        let (a, b, c) = (fixture.photo("a.png", RED), fixture.photo("b.png", GREEN), fixture.photo("c.png", BLUE));
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a, &b, &c]), t0);

        slideshow.advance(t0 + Duration::from_secs(1));
        slideshow.advance(t0 + Duration::from_secs(2));
        assert_eq!(slideshow.catalog().index(), 2);
        assert_eq!(center(&slideshow), dimmed(BLUE));

        let now = t0 + Duration::from_secs(3);
        slideshow.advance(now);
        assert_eq!(slideshow.catalog().index(), 0);
        assert_eq!(slideshow.scheduler().last_image_change_at(), now);
        assert_eq!(center(&slideshow), dimmed(RED));
    }

    #[test]
    fn test_interval_elapsing_advances_image() {
        let fixture = Fixture::new();
        let (a, b) = (fixture.photo("a.png", RED), fixture.photo("b.png", GREEN));
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a, &b]), t0);

        let out = slideshow.tick(vec![], t0 + Duration::from_secs(9), &Utc::now());
        assert!(matches!(out, ControlFlow::Continue(Some(_))));
        assert_eq!(slideshow.catalog().index(), 0);

        let later = t0 + Duration::from_secs(10);
        let out = slideshow.tick(vec![], later, &Utc::now());
        assert!(matches!(out, ControlFlow::Continue(Some(ref canvas)) if canvas.dimensions() == (64, 48)));
        assert_eq!(slideshow.catalog().index(), 1);
        assert_eq!(slideshow.scheduler().last_image_change_at(), later);
    }

    #[test]
    fn test_manual_advance_restarts_interval() {
        let fixture = Fixture::new();
        let (a, b, c) = (fixture.photo("a.png", RED), fixture.photo("b.png", GREEN), fixture.photo("c.png", BLUE));
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a, &b, &c]), t0);

        let _ = slideshow.tick(vec![InputEvent::Advance], t0 + Duration::from_secs(8), &Utc::now());
        assert_eq!(slideshow.catalog().index(), 1);
        // Original deadline passes without a second change
        let _ = slideshow.tick(vec![], t0 + Duration::from_secs(12), &Utc::now());
        assert_eq!(slideshow.catalog().index(), 1);
        let _ = slideshow.tick(vec![], t0 + Duration::from_secs(18), &Utc::now());
        assert_eq!(slideshow.catalog().index(), 2);
    }

    #[test]
    fn test_corrupt_image_keeps_previous_frame() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let bad = fixture.photos().join("bad.jpg");
        fs::write(&bad, b"garbage").unwrap();
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a, &bad]), t0);

        slideshow.advance(t0 + Duration::from_secs(1));
        assert_eq!(slideshow.catalog().index(), 1);
        assert_eq!(center(&slideshow), dimmed(RED));
    }

    #[test]
    fn test_empty_catalog_shows_nothing() {
        let fixture = Fixture::new();
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(ImageCatalog::default(), t0);
        assert!(slideshow.frame().is_none());

        let out = slideshow.tick(vec![InputEvent::Advance], t0 + Duration::from_secs(60), &Utc::now());
        assert!(matches!(out, ControlFlow::Continue(None)));
    }

    #[test]
    fn test_quit_stops_the_loop() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), t0);

        let out = slideshow.tick(vec![InputEvent::Quit, InputEvent::Advance], t0, &Utc::now());
        assert!(out.is_break());
    }

    #[test]
    fn test_blank_shows_black_and_key_wakes() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), t0);

        let out = slideshow.tick(vec![InputEvent::ToggleBlank], t0 + Duration::from_secs(1), &Utc::now());
        assert!(matches!(out, ControlFlow::Continue(None)));
        assert_eq!(slideshow.scheduler().mode(), Mode::Blank);
        assert_eq!(fixture.monitor.off.get(), 1);

        let woke_at = t0 + Duration::from_secs(5);
        let out = slideshow.tick(vec![InputEvent::Other], woke_at, &Utc::now());
        assert!(matches!(out, ControlFlow::Continue(Some(_))));
        assert_eq!(slideshow.scheduler().mode(), Mode::Slideshow);
        assert_eq!(slideshow.scheduler().last_image_change_at(), woke_at);
        assert_eq!(fixture.monitor.on.get(), 1);
    }

    #[test]
    fn test_toggle_key_while_blank_only_wakes() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), t0);

        let _ = slideshow.handle_input(InputEvent::ToggleBlank, t0);
        let _ = slideshow.handle_input(InputEvent::ToggleBlank, t0 + Duration::from_secs(1));
        assert_eq!(slideshow.scheduler().mode(), Mode::Slideshow);
        assert_eq!(fixture.monitor.off.get(), 1);
        assert_eq!(fixture.monitor.on.get(), 1);
    }

    #[test]
    fn test_unchanged_watermark_does_not_reload() {
        let fixture = Fixture::new();
        for (i, color) in [RED, GREEN, BLUE, RED, GREEN].into_iter().enumerate() {
            fixture.photo(&format!("{i}.png"), color);
        }
        let config = Config::load(&fixture.config_path).unwrap();
        let catalog = ImageCatalog::from_sources(&config.sources);
        let mut slideshow = fixture.slideshow(catalog, Instant::now());
        let before = slideshow.catalog().clone();

        assert!(!slideshow.check_config());
        assert!(!slideshow.check_config());
        assert_eq!(slideshow.catalog(), &before);
    }

    #[test]
    fn test_changed_config_reloads_without_changing_mode() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), t0);
        let _ = slideshow.handle_input(InputEvent::ToggleBlank, t0);

        fixture.photo("b.png", GREEN);
        fixture.write_config(3, true, 60);
        assert!(slideshow.check_config());
        assert_eq!(slideshow.config().display.slideshow_interval, 3.0);
        assert!(slideshow.config().display.enable_power_save);
        assert_eq!(slideshow.scheduler().power_save().slideshow, Some(Duration::from_secs(60)));
        assert_eq!(slideshow.catalog().len(), 2);
        assert_eq!(slideshow.scheduler().mode(), Mode::Blank);
        assert!(!slideshow.check_config());
    }

    #[test]
    fn test_malformed_config_keeps_previous_and_retries() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), Instant::now());

        fixture.write_raw(r#"{ "display": { "resolution": [64, 4"#, 30);
        assert!(!slideshow.check_config());
        assert!(!slideshow.check_config());
        assert_eq!(slideshow.config().display.slideshow_interval, 10.0);
        assert_eq!(slideshow.catalog().len(), 1);

        fixture.write_config(7, false, 31);
        assert!(slideshow.check_config());
        assert_eq!(slideshow.config().display.slideshow_interval, 7.0);
    }

    #[test]
    fn test_force_reload_rescans_and_shows_first_image() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), t0);

        fs::remove_file(&a).unwrap();
        fixture.photo("only.png", BLUE);
        let now = t0 + Duration::from_secs(4);
        let _ = slideshow.handle_input(InputEvent::Reload, now);

        assert_eq!(slideshow.catalog().len(), 1);
        assert_eq!(slideshow.catalog().index(), 0);
        assert_eq!(center(&slideshow), dimmed(BLUE));
        assert_eq!(slideshow.scheduler().last_image_change_at(), now);
        // The reload consumed the on-disk change
        assert!(!slideshow.check_config());
    }

    #[test]
    fn test_hot_reload_to_empty_sources_clears_frame() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), t0);
        assert!(slideshow.frame().is_some());

        fixture.write_without_sources(60);
        assert!(slideshow.check_config());
        assert!(slideshow.catalog().is_empty());
        assert!(slideshow.frame().is_none());

        let out = slideshow.tick(vec![], t0 + Duration::from_secs(3600), &Utc::now());
        assert!(matches!(out, ControlFlow::Continue(None)));
    }

    #[test]
    fn test_force_reload_to_empty_sources_clears_frame() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), t0);

        fixture.write_without_sources(60);
        let _ = slideshow.handle_input(InputEvent::Reload, t0 + Duration::from_secs(1));
        assert!(slideshow.catalog().is_empty());
        assert!(slideshow.frame().is_none());

        let out = slideshow.tick(vec![], t0 + Duration::from_secs(100), &Utc::now());
        assert!(matches!(out, ControlFlow::Continue(None)));
    }

    #[test]
    fn test_hot_reload_shows_first_entry_of_new_catalog_next() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), t0);
        fixture.photo("b.png", GREEN);
        fixture.photo("c.png", BLUE);

        fixture.write_config(10, false, 60);
        assert!(slideshow.check_config());
        assert_eq!(slideshow.catalog().len(), 3);
        // Current photo stays until the interval elapses
        assert_eq!(center(&slideshow), dimmed(RED));

        let color_of = |slideshow: &Slideshow| {
            match slideshow.catalog().current().and_then(|p| p.file_name()).and_then(|n| n.to_str()) {
                Some("a.png") => RED,
                Some("b.png") => GREEN,
                Some("c.png") => BLUE,
                other => panic!("unexpected entry {other:?}"),
            }
        };

        let _ = slideshow.tick(vec![], t0 + Duration::from_secs(10), &Utc::now());
        assert_eq!(slideshow.catalog().index(), 0);
        assert_eq!(center(&slideshow), dimmed(color_of(&slideshow)));

        let _ = slideshow.tick(vec![], t0 + Duration::from_secs(20), &Utc::now());
        assert_eq!(slideshow.catalog().index(), 1);
        assert_eq!(center(&slideshow), dimmed(color_of(&slideshow)));
    }

    #[test]
    fn test_shutdown_powers_monitor_on_only_when_blank() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let t0 = Instant::now();
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), t0);

        slideshow.shutdown();
        assert_eq!(fixture.monitor.on.get(), 0);

        let _ = slideshow.handle_input(InputEvent::ToggleBlank, t0);
        slideshow.shutdown();
        assert_eq!(fixture.monitor.off.get(), 1);
        assert_eq!(fixture.monitor.on.get(), 1);
    }

    #[derive(Default)]
    struct ScriptedScreen {
        script: Vec<Vec<InputEvent>>,
        presented: Vec<bool>,
        restored: bool,
    }

    impl Screen for ScriptedScreen {
        fn poll_input(&mut self) -> Vec<InputEvent> {
            if self.script.is_empty() { vec![InputEvent::Quit] } else { self.script.remove(0) }
        }

        fn present(&mut self, frame: Option<&RgbaImage>) {
            self.presented.push(frame.is_some());
        }

        fn restore(&mut self) {
            self.restored = true;
        }
    }

    #[test]
    fn test_run_presents_until_quit_then_restores() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), Instant::now());
        let mut screen = ScriptedScreen {
            script: vec![vec![], vec![InputEvent::ToggleBlank], vec![InputEvent::Other], vec![InputEvent::Quit]],
            ..ScriptedScreen::default()
        };

        run(&mut slideshow, &mut screen);
        assert_eq!(screen.presented, vec![true, false, true]);
        assert!(screen.restored);
        // Woken by a key, so quitting leaves the monitor alone
        assert_eq!(fixture.monitor.on.get(), 1);
    }

    #[test]
    fn test_quit_while_blank_turns_monitor_back_on() {
        let fixture = Fixture::new();
        let a = fixture.photo("a.png", RED);
        let mut slideshow = fixture.slideshow(catalog_of(&[&a]), Instant::now());
        let mut screen = ScriptedScreen {
            script: vec![vec![InputEvent::ToggleBlank], vec![InputEvent::Quit]],
            ..ScriptedScreen::default()
        };

        run(&mut slideshow, &mut screen);
        assert_eq!(screen.presented, vec![false]);
        assert_eq!(fixture.monitor.off.get(), 1);
        assert_eq!(fixture.monitor.on.get(), 1);
        assert!(screen.restored);
    }
}
