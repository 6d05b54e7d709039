pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod interceptor;
pub mod monitor;
pub mod orchestrator;
pub mod platform;
pub mod policy;
pub mod presentation;
pub mod scheduler;
#[cfg(test)]
mod test_utils;
pub mod validation;

use crate::channel::{ControlHandler, MethodChannel, MonitorControl};
use crate::config::{get_config_path, AgentConfig};
use crate::error::{AppError, ChannelError};
use crate::interceptor::Interceptor;
use crate::monitor::{MonitorConfig, MonitorService};
use crate::orchestrator::Orchestrator;
use crate::platform::{DesktopHost, HostControl, NativeDisplay, PlatformDisplay};
use crate::policy::{BlockedSet, InterceptionPolicy};
use crate::presentation::{PresentationChannel, PresentationSlot};
use crate::scheduler::{Scheduler, TimerScheduler};
use log::{info, warn};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

/// Lock a mutex, recovering from poisoning if necessary
pub(crate) fn safe_lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> std::sync::MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("{context} mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// A fully wired monitor: display, interceptor, scheduler and channel.
pub struct Agent {
    monitor: Arc<MonitorService>,
    channel: Arc<MethodChannel>,
    control: ControlHandler,
    presentation: Arc<PresentationSlot>,
    scheduler: Arc<TimerScheduler>,
}

impl Agent {
    /// Build an agent on the native display, talking to the controller
    /// through `writer`.
    pub fn new(config: &AgentConfig, writer: impl Write + Send + 'static) -> Self {
        Self::with_display(config, Arc::new(NativeDisplay::new()), writer)
    }

    pub fn with_display(
        config: &AgentConfig,
        display: Arc<dyn PlatformDisplay>,
        writer: impl Write + Send + 'static,
    ) -> Self {
        let host: Arc<dyn HostControl> = Arc::new(DesktopHost::new(
            Arc::clone(&display),
            config.controller_command.clone(),
            config.settings_command.clone(),
        ));
        let presentation = Arc::new(PresentationSlot::new());
        let scheduler = Arc::new(TimerScheduler::new());

        let policy = InterceptionPolicy::new(
            BlockedSet::new(config.blocked_apps.iter().cloned(), &config.self_identity),
            config.self_identity.clone(),
            config.cooldown(),
        );
        let orchestrator = Orchestrator::new(
            Arc::clone(&host),
            Arc::clone(&presentation),
            Arc::clone(&scheduler) as Arc<dyn Scheduler>,
            config.orchestrator(),
        );
        let interceptor = Arc::new(Mutex::new(Interceptor::new(policy, orchestrator)));

        let monitor = Arc::new(MonitorService::new(
            display,
            interceptor,
            MonitorConfig {
                poll_interval: config.poll_interval(),
            },
        ));

        let channel = Arc::new(MethodChannel::new(writer));
        // The controller at the other end of the channel renders the blocker.
        presentation.set(Arc::clone(&channel) as Arc<dyn PresentationChannel>);

        let control = ControlHandler::new(
            Arc::clone(&monitor) as Arc<dyn MonitorControl>,
            host,
        );

        if config.autostart {
            monitor.start();
        }

        Self {
            monitor,
            channel,
            control,
            presentation,
            scheduler,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_running()
    }

    /// Serve the controller until it disconnects.
    pub fn serve<R: Read>(&self, reader: &mut R) -> Result<(), ChannelError> {
        self.channel.serve(reader, &self.control)
    }

    /// Stop monitoring and drop pending delayed steps.
    pub fn shutdown(&self) {
        self.monitor.stop();
        self.scheduler.shutdown();
        self.presentation.clear();
        info!("Agent shut down");
    }
}

/// Load config, then serve the controller over stdin/stdout until EOF.
pub fn run() -> Result<(), AppError> {
    let config_path = get_config_path()?;
    let config = AgentConfig::load(&config_path)?;
    info!(
        "Blocking {} app(s), cooldown {} ms",
        config.blocked_apps.len(),
        config.cooldown_ms
    );

    let agent = Agent::new(&config, std::io::stdout());
    let result = agent.serve(&mut std::io::stdin().lock());
    agent.shutdown();

    result.map_err(AppError::from)
}
