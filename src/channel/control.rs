use crate::constants::{
    METHOD_OPEN_ACCESSIBILITY_SETTINGS, METHOD_START_MONITORING, METHOD_STOP_MONITORING,
};
use crate::monitor::MonitorService;
use crate::platform::HostControl;
use crate::presentation::MethodResult;
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    StartMonitoring,
    StopMonitoring,
    OpenAccessibilitySettings,
}

impl ControlCommand {
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            METHOD_START_MONITORING => Some(Self::StartMonitoring),
            METHOD_STOP_MONITORING => Some(Self::StopMonitoring),
            METHOD_OPEN_ACCESSIBILITY_SETTINGS => Some(Self::OpenAccessibilitySettings),
            _ => None,
        }
    }
}

/// Start/stop hooks for whatever produces foreground events.
pub trait MonitorControl: Send + Sync {
    fn start(&self) -> bool;
    fn stop(&self) -> bool;
    fn is_running(&self) -> bool;
}

impl MonitorControl for MonitorService {
    fn start(&self) -> bool {
        MonitorService::start(self)
    }

    fn stop(&self) -> bool {
        MonitorService::stop(self)
    }

    fn is_running(&self) -> bool {
        MonitorService::is_running(self)
    }
}

/// Answers control-plane calls from the external controller.
pub struct ControlHandler {
    monitor: Arc<dyn MonitorControl>,
    host: Arc<dyn HostControl>,
}

impl ControlHandler {
    pub fn new(monitor: Arc<dyn MonitorControl>, host: Arc<dyn HostControl>) -> Self {
        Self { monitor, host }
    }

    pub fn handle(&self, method: &str) -> MethodResult {
        let Some(command) = ControlCommand::from_method(method) else {
            debug!("Unknown control method: {method}");
            return MethodResult::NotImplemented;
        };

        let ok = match command {
            ControlCommand::StartMonitoring => {
                if !self.monitor.start() {
                    info!("Monitor already running");
                }
                self.monitor.is_running()
            }
            ControlCommand::StopMonitoring => {
                self.monitor.stop();
                !self.monitor.is_running()
            }
            ControlCommand::OpenAccessibilitySettings => self.host.open_accessibility_settings(),
        };

        MethodResult::Success(Value::Bool(ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FlagMonitor, RecordingHost};

    fn host(settings_ok: bool) -> Arc<RecordingHost> {
        Arc::new(RecordingHost {
            settings_ok,
            ..RecordingHost::default()
        })
    }

    #[test]
    fn test_start_and_stop_acknowledge() {
        let monitor = Arc::new(FlagMonitor::default());
        let handler = ControlHandler::new(Arc::clone(&monitor) as Arc<dyn MonitorControl>, host(true));

        assert_eq!(handler.handle("startBlockerService"), MethodResult::Success(Value::Bool(true)));
        assert!(monitor.is_running());
        // Starting twice still acknowledges
        assert_eq!(handler.handle("startBlockerService"), MethodResult::Success(Value::Bool(true)));

        assert_eq!(handler.handle("stopBlockerService"), MethodResult::Success(Value::Bool(true)));
        assert!(!monitor.is_running());
    }

    #[test]
    fn test_settings_result_passes_through() {
        let settings_host = host(false);
        let handler = ControlHandler::new(Arc::new(FlagMonitor::default()), Arc::clone(&settings_host) as Arc<dyn HostControl>);
        assert_eq!(
            handler.handle("openAccessibilitySettings"),
            MethodResult::Success(Value::Bool(false))
        );
        assert_eq!(settings_host.calls(), vec!["settings"]);
    }

    #[test]
    fn test_unknown_method_not_implemented() {
        let handler = ControlHandler::new(Arc::new(FlagMonitor::default()), host(true));
        assert_eq!(handler.handle("rebootDevice"), MethodResult::NotImplemented);
        assert_eq!(ControlCommand::from_method("showBlockerScreen"), None);
    }
}
