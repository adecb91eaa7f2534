use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use crate::config::MonitorCommands;
use crate::error::FrameError;

/// Physical monitor power control.
pub trait MonitorPower {
    fn power_off(&mut self) -> Result<(), FrameError>;
    fn power_on(&mut self) -> Result<(), FrameError>;

    /// Collects finished background work. Called once per tick.
    fn reap(&mut self) {}
}

/// Leaves the monitor alone; blank mode then only shows a black frame.
#[derive(Debug, Default)]
pub struct NoopMonitor;

impl MonitorPower for NoopMonitor {
    fn power_off(&mut self) -> Result<(), FrameError> {
        debug!("monitor control disabled, not powering off");
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), FrameError> {
        debug!("monitor control disabled, not powering on");
        Ok(())
    }
}

/// Runs external commands (`xset dpms force off|on` by default) without
/// waiting for them. Exit statuses are checked on later ticks.
#[derive(Debug)]
pub struct CommandMonitor {
    commands: MonitorCommands,
    running: Vec<RunningCommand>,
}

#[derive(Debug)]
struct RunningCommand {
    command: String,
    child: Child,
}

impl CommandMonitor {
    pub fn new(commands: MonitorCommands) -> Self {
        Self { commands, running: Vec::new() }
    }

    fn spawn(argv: &[String]) -> Result<RunningCommand, FrameError> {
        let command = argv.join(" ");
        let Some((program, args)) = argv.split_first() else {
            return Err(FrameError::PlatformCall { command, reason: "empty command".into() });
        };

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| FrameError::PlatformCall { command: command.clone(), reason: e.to_string() })?;

        debug!(command, pid = child.id(), "monitor command started");
        Ok(RunningCommand { command, child })
    }

    /// Removes commands that have exited and returns the ones that failed.
    pub fn finished_failures(&mut self) -> Vec<FrameError> {
        let mut failures = Vec::new();
        self.running.retain_mut(|running| match running.child.try_wait() {
            Ok(Some(status)) if status.success() => false,
            Ok(Some(status)) => {
                failures.push(FrameError::PlatformCall { command: running.command.clone(), reason: status.to_string() });
                false
            }
            Ok(None) => true,
            Err(e) => {
                failures.push(FrameError::PlatformCall { command: running.command.clone(), reason: e.to_string() });
                false
            }
        });
        failures
    }

    pub fn pending(&self) -> usize {
        self.running.len()
    }

    fn start(&mut self, argv: &[String]) -> Result<(), FrameError> {
        self.reap();
        let running = Self::spawn(argv)?;
        self.running.push(running);
        Ok(())
    }
}

impl MonitorPower for CommandMonitor {
    fn power_off(&mut self) -> Result<(), FrameError> {
        let argv = self.commands.off.clone();
        self.start(&argv)?;
        info!("monitor power off requested");
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), FrameError> {
        let argv = self.commands.on.clone();
        self.start(&argv)?;
        info!("monitor power on requested");
        Ok(())
    }

    fn reap(&mut self) {
        for failure in self.finished_failures() {
            warn!(error = %failure, "monitor power control failed");
        }
    }
}

pub fn from_settings(commands: Option<&MonitorCommands>) -> Box<dyn MonitorPower> {
    match commands {
        Some(commands) => Box::new(CommandMonitor::new(commands.clone())),
        None => Box::new(NoopMonitor),
    }
}
