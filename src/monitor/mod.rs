use crate::interceptor::Interceptor;
use crate::platform::PlatformDisplay;
use crate::policy::ForegroundChangeEvent;
use crate::safe_lock;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct MonitorConfig {
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(crate::constants::DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Turns successive foreground samples into change events.
#[derive(Default)]
pub struct ForegroundWatcher {
    last_seen: Option<String>,
}

impl ForegroundWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample the display; an event is produced only when the app changed.
    ///
    /// A sample with no app (desktop shown, nothing focused) forgets the last
    /// app, so returning to it counts as a new foreground change.
    pub fn poll(&mut self, display: &dyn PlatformDisplay) -> Option<ForegroundChangeEvent> {
        let Some(app_id) = display
            .get_active_window()
            .map(|w| w.app_id)
            .filter(|id| !id.is_empty())
        else {
            self.last_seen = None;
            return None;
        };

        if self.last_seen.as_deref() == Some(app_id.as_str()) {
            return None;
        }

        self.last_seen = Some(app_id.clone());
        Some(ForegroundChangeEvent::now(app_id))
    }
}

/// Background service that feeds foreground changes to the interceptor.
pub struct MonitorService {
    config: MonitorConfig,
    running: Arc<AtomicBool>,
    display: Arc<dyn PlatformDisplay>,
    interceptor: Arc<Mutex<Interceptor>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MonitorService {
    pub fn new(
        display: Arc<dyn PlatformDisplay>,
        interceptor: Arc<Mutex<Interceptor>>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            display,
            interceptor,
            handle: Mutex::new(None),
        }
    }

    /// Start polling. Returns false if already running.
    pub fn start(&self) -> bool {
        let mut handle = safe_lock(&self.handle, "Monitor handle");
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        let running = Arc::clone(&self.running);
        let display = Arc::clone(&self.display);
        let interceptor = Arc::clone(&self.interceptor);
        let poll_interval = self.config.poll_interval;

        let spawned = thread::Builder::new()
            .name("appwarden-monitor".into())
            .spawn(move || {
                let mut watcher = ForegroundWatcher::new();
                while running.load(Ordering::SeqCst) {
                    if let Some(event) = watcher.poll(display.as_ref()) {
                        safe_lock(&interceptor, "Interceptor").on_foreground_changed(&event);
                    }
                    thread::sleep(poll_interval);
                }
            });

        match spawned {
            Ok(h) => {
                info!("Foreground monitor started");
                *handle = Some(h);
                true
            }
            Err(e) => {
                warn!("Failed to spawn monitor thread: {e}");
                self.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Stop polling and wait for the thread to exit. Returns false if not running.
    pub fn stop(&self) -> bool {
        let mut handle = safe_lock(&self.handle, "Monitor handle");
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }

        if let Some(h) = handle.take() {
            if h.join().is_err() {
                warn!("Monitor thread panicked");
            }
        }
        info!("Foreground monitor stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for MonitorService {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{Orchestrator, OrchestratorConfig};
    use crate::policy::{BlockedSet, InterceptionPolicy};
    use crate::presentation::PresentationSlot;
    use crate::scheduler::ManualScheduler;
    use crate::test_utils::{RecordingHost, ScriptedDisplay};

    #[test]
    fn test_watcher_reports_only_changes() {
        let display = ScriptedDisplay::new(&[
            Some("firefox"),
            Some("firefox"),
            Some("slack"),
            Some("slack"),
            Some("firefox"),
        ]);
        let mut watcher = ForegroundWatcher::new();

        let seen: Vec<Option<String>> = (0..5)
            .map(|_| watcher.poll(&display).map(|e| e.identity))
            .collect();

        assert_eq!(
            seen,
            vec![
                Some("firefox".to_string()),
                None,
                Some("slack".to_string()),
                None,
                Some("firefox".to_string()),
            ]
        );
    }

    #[test]
    fn test_watcher_reports_return_after_desktop() {
        let display = ScriptedDisplay::new(&[
            Some("com.instagram.android"),
            None,
            Some("com.instagram.android"),
            Some(""),
            Some("com.instagram.android"),
        ]);
        let mut watcher = ForegroundWatcher::new();

        let seen: Vec<Option<String>> = (0..5)
            .map(|_| watcher.poll(&display).map(|e| e.identity))
            .collect();

        let instagram = Some("com.instagram.android".to_string());
        assert_eq!(
            seen,
            vec![instagram.clone(), None, instagram.clone(), None, instagram]
        );
    }

    fn service(display: ScriptedDisplay, host: Arc<RecordingHost>) -> MonitorService {
        let policy = InterceptionPolicy::new(
            BlockedSet::new(["com.instagram.android"], "appwarden"),
            "appwarden",
            Duration::from_millis(3000),
        );
        let orchestrator = Orchestrator::new(
            host,
            Arc::new(PresentationSlot::new()),
            Arc::new(ManualScheduler::new()),
            OrchestratorConfig::default(),
        );
        MonitorService::new(
            Arc::new(display),
            Arc::new(Mutex::new(Interceptor::new(policy, orchestrator))),
            MonitorConfig {
                poll_interval: Duration::from_millis(5),
            },
        )
    }

    #[test]
    fn test_monitor_starts_and_stops() {
        let monitor = service(ScriptedDisplay::new(&[]), Arc::new(RecordingHost::default()));

        assert!(!monitor.is_running());
        assert!(monitor.start());
        assert!(monitor.is_running());
        assert!(!monitor.start());

        thread::sleep(Duration::from_millis(20));

        assert!(monitor.stop());
        assert!(!monitor.is_running());
        assert!(!monitor.stop());

        assert!(monitor.start());
        assert!(monitor.stop());
    }

    #[test]
    fn test_monitor_intercepts_blocked_foreground() {
        let host = Arc::new(RecordingHost::default());
        let monitor = service(
            ScriptedDisplay::new(&[Some("firefox"), Some("com.instagram.android")]),
            Arc::clone(&host),
        );

        monitor.start();
        for _ in 0..200 {
            if host.home_count() > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        monitor.stop();

        assert_eq!(host.home_count(), 1);
    }
}
