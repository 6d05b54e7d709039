use crate::error::InterceptError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveWindow {
    pub app_id: String,
}

/// Read access to the display server plus the one write the monitor needs.
pub trait PlatformDisplay: Send + Sync {
    fn get_active_window(&self) -> Option<ActiveWindow>;

    /// Hide every window and show the desktop. Returns false when unsupported.
    fn show_desktop(&self) -> bool;
}

/// Commands the interception pipeline and control plane issue to the host.
pub trait HostControl: Send + Sync {
    /// Move the blocked app out of the foreground. Fire-and-forget.
    fn navigate_home(&self);

    /// Bring our own controller surface to the foreground.
    fn launch_controller(&self) -> Result<(), InterceptError>;

    fn open_accessibility_settings(&self) -> bool;
}
