pub mod host;
pub mod types;

pub use host::DesktopHost;
pub use types::{ActiveWindow, HostControl, PlatformDisplay};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::LinuxDisplay as NativeDisplay;

// Stub for development on platforms without a display backend
#[cfg(not(target_os = "linux"))]
pub struct NativeDisplay;

#[cfg(not(target_os = "linux"))]
impl PlatformDisplay for NativeDisplay {
    fn get_active_window(&self) -> Option<ActiveWindow> {
        None
    }

    fn show_desktop(&self) -> bool {
        false
    }
}

#[cfg(not(target_os = "linux"))]
impl NativeDisplay {
    pub fn new() -> Self {
        log::warn!("No display backend for this platform, foreground tracking disabled");
        Self
    }
}

#[cfg(not(target_os = "linux"))]
impl Default for NativeDisplay {
    fn default() -> Self {
        Self::new()
    }
}
