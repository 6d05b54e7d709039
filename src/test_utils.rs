//! Shared test doubles for the platform and control seams.

use crate::channel::{read_frame, Message, MonitorControl};
use crate::error::InterceptError;
use crate::platform::{ActiveWindow, HostControl, PlatformDisplay};
use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Host that records every command it receives.
#[derive(Default)]
pub struct RecordingHost {
    pub calls: Mutex<Vec<&'static str>>,
    pub no_launch_target: bool,
    pub settings_ok: bool,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn home_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == "home").count()
    }
}

impl HostControl for RecordingHost {
    fn navigate_home(&self) {
        self.calls.lock().expect("calls lock").push("home");
    }

    fn launch_controller(&self) -> Result<(), InterceptError> {
        self.calls.lock().expect("calls lock").push("launch");
        if self.no_launch_target {
            Err(InterceptError::NoLaunchTarget)
        } else {
            Ok(())
        }
    }

    fn open_accessibility_settings(&self) -> bool {
        self.calls.lock().expect("calls lock").push("settings");
        self.settings_ok
    }
}

/// Display that replays a script of foreground apps, then holds the last one.
pub struct ScriptedDisplay {
    script: Mutex<VecDeque<Option<&'static str>>>,
    current: Mutex<Option<&'static str>>,
}

impl ScriptedDisplay {
    pub fn new(script: &[Option<&'static str>]) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            current: Mutex::new(None),
        }
    }
}

impl PlatformDisplay for ScriptedDisplay {
    fn get_active_window(&self) -> Option<ActiveWindow> {
        let mut current = self.current.lock().expect("display lock");
        if let Some(next) = self.script.lock().expect("display lock").pop_front() {
            *current = next;
        }
        current.map(|id| ActiveWindow {
            app_id: id.to_string(),
        })
    }

    fn show_desktop(&self) -> bool {
        true
    }
}

/// Monitor that only flips a flag.
#[derive(Default)]
pub struct FlagMonitor(pub AtomicBool);

impl MonitorControl for FlagMonitor {
    fn start(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    fn stop(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Writer whose bytes stay inspectable after being boxed into a channel.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Every complete frame written so far.
    pub fn messages(&self) -> Vec<Message> {
        let bytes = self.0.lock().expect("buffer lock").clone();
        let mut cursor = Cursor::new(bytes);
        let mut out = Vec::new();
        while let Ok(message) = read_frame(&mut cursor) {
            out.push(message);
        }
        out
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
