// src/constants.rs

/// Identity the monitor reports for its own windows
pub const DEFAULT_SELF_IDENTITY: &str = "appwarden";

/// Apps blocked when no config file says otherwise, as X11 WM_CLASS
/// instance names
pub const DEFAULT_BLOCKED_APPS: [&str; 4] = ["discord", "telegram-desktop", "steam", "spotify"];

/// Same-app re-trigger window (milliseconds)
pub const DEFAULT_COOLDOWN_MS: u64 = 3000;

/// Delay between going home and raising the controller surface (milliseconds)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 300;

/// Delay between raising the controller surface and the blocker handoff (milliseconds)
pub const DEFAULT_HANDOFF_DELAY_MS: u64 = 1000;

/// Foreground poll interval (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Upper bound for either orchestration delay (milliseconds)
pub const MAX_STEP_DELAY_MS: u64 = 60_000;

/// Poll interval bounds (milliseconds)
pub const MIN_POLL_INTERVAL_MS: u64 = 10;
pub const MAX_POLL_INTERVAL_MS: u64 = 10_000;

/// Maximum length of an app identifier
pub const MAX_IDENTITY_LEN: usize = 256;

/// Largest frame accepted on the method channel (1 MiB)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Method names on the channel
pub const METHOD_SHOW_BLOCKER_SCREEN: &str = "showBlockerScreen";
pub const METHOD_START_MONITORING: &str = "startBlockerService";
pub const METHOD_STOP_MONITORING: &str = "stopBlockerService";
pub const METHOD_OPEN_ACCESSIBILITY_SETTINGS: &str = "openAccessibilitySettings";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "APPWARDEN_CONFIG";
