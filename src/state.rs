use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::DisplaySettings;
use crate::monitor::MonitorPower;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    Slideshow, // Photos on screen, monitor on
    Blank,     // Black frame, monitor commanded off
}

/// How long each mode lasts before the scheduler switches on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerSave {
    /// `None` keeps the slideshow running forever.
    pub slideshow: Option<Duration>,
    pub blank: Duration,
}

impl PowerSave {
    pub fn from_settings(display: &DisplaySettings) -> Self {
        Self {
            slideshow: display.enable_power_save.then(|| display.power_save_slideshow_duration()),
            blank: display.power_save_blank_duration(),
        }
    }
}

/// Slideshow / blank state machine. Owns the mode and image-change timers.
#[derive(Debug)]
pub struct ModeScheduler {
    mode: Mode,
    mode_entered_at: Instant,
    last_image_change_at: Instant,
    power_save: PowerSave,
}

impl ModeScheduler {
    pub fn new(power_save: PowerSave, now: Instant) -> Self {
        Self { mode: Mode::Slideshow, mode_entered_at: now, last_image_change_at: now, power_save }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mode_entered_at(&self) -> Instant {
        self.mode_entered_at
    }

    pub fn last_image_change_at(&self) -> Instant {
        self.last_image_change_at
    }

    pub fn power_save(&self) -> PowerSave {
        self.power_save
    }

    /// New thresholds apply from the next tick; the current mode and its
    /// entry time are kept.
    pub fn set_power_save(&mut self, power_save: PowerSave) {
        self.power_save = power_save;
    }

    /// Applies any timer-driven transition. Returns the mode entered, if any.
    pub fn tick(&mut self, now: Instant, monitor: &mut dyn MonitorPower) -> Option<Mode> {
        let time_in_mode = now.saturating_duration_since(self.mode_entered_at);
        match self.mode {
            Mode::Slideshow => {
                let threshold = self.power_save.slideshow?;
                if time_in_mode >= threshold {
                    info!(after = ?time_in_mode, "entering blank mode");
                    self.enter(Mode::Blank, now, monitor);
                    return Some(Mode::Blank);
                }
            }
            Mode::Blank => {
                if time_in_mode >= self.power_save.blank {
                    info!(after = ?time_in_mode, "leaving blank mode, resuming slideshow");
                    self.enter(Mode::Slideshow, now, monitor);
                    return Some(Mode::Slideshow);
                }
            }
        }
        None
    }

    /// Key press while blank wakes the display. Returns true when it did.
    pub fn wake(&mut self, now: Instant, monitor: &mut dyn MonitorPower) -> bool {
        if self.mode != Mode::Blank {
            return false;
        }
        info!("input received, waking display");
        self.enter(Mode::Slideshow, now, monitor);
        true
    }

    /// Manual blank toggle.
    pub fn toggle(&mut self, now: Instant, monitor: &mut dyn MonitorPower) -> Mode {
        let next = match self.mode {
            Mode::Slideshow => Mode::Blank,
            Mode::Blank => Mode::Slideshow,
        };
        info!(mode = ?next, "manual mode toggle");
        self.enter(next, now, monitor);
        next
    }

    pub fn image_due(&self, now: Instant, interval: Duration) -> bool {
        now.saturating_duration_since(self.last_image_change_at) >= interval
    }

    pub fn mark_image_change(&mut self, now: Instant) {
        self.last_image_change_at = now;
    }

    fn enter(&mut self, mode: Mode, now: Instant, monitor: &mut dyn MonitorPower) {
        let result = match mode {
            Mode::Blank => monitor.power_off(),
            Mode::Slideshow => monitor.power_on(),
        };
        if let Err(e) = result {
            warn!(error = %e, "monitor power control failed");
        }

        self.mode = mode;
        self.mode_entered_at = now;
        if mode == Mode::Slideshow {
            // The photo shown before blanking gets a full interval again
            self.last_image_change_at = now;
        }
    }
}
