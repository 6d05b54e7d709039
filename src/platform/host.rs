use super::{HostControl, PlatformDisplay};
use crate::error::InterceptError;
use log::{debug, info, warn};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

/// `HostControl` for desktop sessions.
///
/// Home is the window manager's "show desktop"; the controller and settings
/// surfaces are external programs configured as argv vectors. Without a
/// controller command the controller is the process already attached to the
/// method channel, so there is nothing to raise.
pub struct DesktopHost {
    display: Arc<dyn PlatformDisplay>,
    controller_command: Option<Vec<String>>,
    settings_command: Option<Vec<String>>,
}

impl DesktopHost {
    pub fn new(
        display: Arc<dyn PlatformDisplay>,
        controller_command: Option<Vec<String>>,
        settings_command: Option<Vec<String>>,
    ) -> Self {
        Self {
            display,
            controller_command,
            settings_command,
        }
    }
}

fn spawn_detached(argv: &[String]) -> std::io::Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty command",
        ));
    };

    // stdout belongs to the method channel
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .spawn()?;

    // Reap in the background so the launched surface never blocks us
    thread::spawn(move || {
        if let Err(e) = child.wait() {
            warn!("Failed to wait for launched process: {e}");
        }
    });
    Ok(())
}

impl HostControl for DesktopHost {
    fn navigate_home(&self) {
        if !self.display.show_desktop() {
            warn!("Host could not navigate home");
        }
    }

    fn launch_controller(&self) -> Result<(), InterceptError> {
        let Some(argv) = self.controller_command.as_deref() else {
            debug!("No controller command, relying on the attached controller");
            return Ok(());
        };
        if argv.is_empty() {
            return Err(InterceptError::NoLaunchTarget);
        }

        info!("Launching controller surface: {}", argv.join(" "));
        spawn_detached(argv).map_err(|e| InterceptError::LaunchFailed(e.to_string()))
    }

    fn open_accessibility_settings(&self) -> bool {
        let Some(argv) = self.settings_command.as_deref() else {
            warn!("No accessibility settings command configured");
            return false;
        };

        match spawn_detached(argv) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to open accessibility settings: {e}");
                false
            }
        }
    }
}
