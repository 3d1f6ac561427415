//! Bringing a consumer surface into existence.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LaunchError {
    /// The host has no way to perform this action.
    #[error("surface action unavailable: {0}")]
    Unavailable(String),
    #[error("failed to open consumer surface: {0}")]
    Failed(String),
}

/// Size of the standalone consumer window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            width: 360,
            height: 520,
        }
    }
}

pub trait SurfaceLauncher: Send + Sync {
    /// Present the consumer in the host's own UI panel.
    fn open_panel(&self) -> Result<(), LaunchError>;

    /// Open a standalone window hosting the consumer surface.
    fn open_window(&self, spec: &WindowSpec) -> Result<(), LaunchError>;
}

/// Launches the consumer as a separate process.
///
/// The panel is an optional shell command (`sh -c`); the standalone window
/// is this binary's own `consume` subcommand.
pub struct ProcessLauncher {
    panel_command: Option<String>,
    program: Option<PathBuf>,
}

impl ProcessLauncher {
    pub fn new(panel_command: Option<String>) -> Self {
        Self {
            panel_command,
            program: std::env::current_exe().ok(),
        }
    }
}

impl SurfaceLauncher for ProcessLauncher {
    fn open_panel(&self) -> Result<(), LaunchError> {
        let command = self
            .panel_command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LaunchError::Unavailable("no panel command configured".to_string()))?;

        std::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .spawn()
            .map_err(|e| LaunchError::Failed(format!("`{}`: {}", command, e)))?;
        log::info!("[RELAY] Opened consumer panel via `{}`", command);
        Ok(())
    }

    fn open_window(&self, spec: &WindowSpec) -> Result<(), LaunchError> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| LaunchError::Unavailable("current executable unknown".to_string()))?;

        std::process::Command::new(program)
            .arg("consume")
            .arg("--width")
            .arg(spec.width.to_string())
            .arg("--height")
            .arg(spec.height.to_string())
            .spawn()
            .map_err(|e| LaunchError::Failed(format!("{}: {}", program.display(), e)))?;
        log::info!(
            "[RELAY] Opened standalone consumer window ({}x{})",
            spec.width,
            spec.height
        );
        Ok(())
    }
}
