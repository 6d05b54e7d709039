//! Side effects of an interception.
//!
//! Per firing decision: go home now, raise the controller surface after the
//! settle delay, hand the blocked identity to the presentation layer after
//! the handoff delay. Each step may end the attempt; nothing is retried.

use crate::constants::METHOD_SHOW_BLOCKER_SCREEN;
use crate::error::InterceptError;
use crate::platform::HostControl;
use crate::policy::InterceptionDecision;
use crate::presentation::{MethodResult, PresentationSlot};
use crate::scheduler::Scheduler;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub settle_delay: Duration,
    pub handoff_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(crate::constants::DEFAULT_SETTLE_DELAY_MS),
            handoff_delay: Duration::from_millis(crate::constants::DEFAULT_HANDOFF_DELAY_MS),
        }
    }
}

/// Where an interception attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptionOutcome {
    /// The presentation layer accepted the blocker screen.
    Delivered,
    /// The controller surface could not be raised.
    LaunchFailed(InterceptError),
    /// The presentation layer was unreachable, failed or refused.
    PresentationFailed(InterceptError),
}

/// Receives each attempt's terminal outcome exactly once.
pub trait InterceptionObserver: Send + Sync {
    fn on_outcome(&self, identity: &str, outcome: &InterceptionOutcome);
}

struct Shared {
    host: Arc<dyn HostControl>,
    presentation: Arc<PresentationSlot>,
    scheduler: Arc<dyn Scheduler>,
    observer: Option<Arc<dyn InterceptionObserver>>,
    config: OrchestratorConfig,
}

pub struct Orchestrator {
    shared: Arc<Shared>,
}

impl Orchestrator {
    pub fn new(
        host: Arc<dyn HostControl>,
        presentation: Arc<PresentationSlot>,
        scheduler: Arc<dyn Scheduler>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                host,
                presentation,
                scheduler,
                observer: None,
                config,
            }),
        }
    }

    /// Attach an observer. Must be called before the first decision.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn InterceptionObserver>) -> Self {
        match Arc::get_mut(&mut self.shared) {
            Some(shared) => shared.observer = Some(observer),
            None => warn!("Observer attached after interceptions started, ignoring it"),
        }
        self
    }

    pub fn on_decision(&self, decision: &InterceptionDecision) {
        let InterceptionDecision::Intercept { identity } = decision else {
            return;
        };

        info!("Blocking {identity}: going home");
        self.shared.host.navigate_home();

        let shared = Arc::clone(&self.shared);
        let identity = identity.clone();
        self.shared.scheduler.schedule(
            self.shared.config.settle_delay,
            Box::new(move || launch_controller(&shared, identity)),
        );
    }
}

fn launch_controller(shared: &Arc<Shared>, identity: String) {
    debug!("Raising controller surface for {identity}");

    if let Err(e) = shared.host.launch_controller() {
        error!("Could not raise controller surface: {e}");
        shared.report(&identity, InterceptionOutcome::LaunchFailed(e));
        return;
    }

    let next = Arc::clone(shared);
    shared.scheduler.schedule(
        shared.config.handoff_delay,
        Box::new(move || show_blocker_screen(&next, &identity)),
    );
}

fn show_blocker_screen(shared: &Arc<Shared>, identity: &str) {
    let Some(channel) = shared.presentation.get() else {
        error!("Presentation layer not connected, cannot show blocker for {identity}");
        shared.report(
            identity,
            InterceptionOutcome::PresentationFailed(InterceptError::PresentationUnreachable),
        );
        return;
    };

    debug!("Invoking {METHOD_SHOW_BLOCKER_SCREEN} for {identity}");

    // Set by whichever of the reply and the failure path reports first.
    let reported = Arc::new(AtomicBool::new(false));

    let reply_shared = Arc::clone(shared);
    let reply_reported = Arc::clone(&reported);
    let reply_identity = identity.to_string();
    let on_reply = Box::new(move |result: MethodResult| {
        let outcome = match result.into_delivery() {
            Ok(()) => {
                info!("Blocker screen shown for {reply_identity}");
                InterceptionOutcome::Delivered
            }
            Err(e) => {
                error!("Blocker screen failed for {reply_identity}: {e}");
                InterceptionOutcome::PresentationFailed(e)
            }
        };
        reply_shared.report_once(&reply_reported, &reply_identity, outcome);
    });

    // A misbehaving channel must not take the timer thread down with it.
    let invoked = panic::catch_unwind(AssertUnwindSafe(|| {
        channel.invoke(
            METHOD_SHOW_BLOCKER_SCREEN,
            Value::String(identity.to_string()),
            on_reply,
        )
    }));

    let failure = match invoked {
        Ok(Ok(())) => return,
        Ok(Err(e)) => InterceptError::invocation_failed("CHANNEL_ERROR", Some(e.to_string())),
        Err(payload) => InterceptError::invocation_failed("PANIC", panic_message(payload.as_ref())),
    };

    error!("Blocker screen invocation failed for {identity}: {failure}");
    shared.report_once(&reported, identity, InterceptionOutcome::PresentationFailed(failure));
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

impl Shared {
    fn report(&self, identity: &str, outcome: InterceptionOutcome) {
        if let Some(observer) = &self.observer {
            observer.on_outcome(identity, &outcome);
        }
    }

    fn report_once(&self, reported: &AtomicBool, identity: &str, outcome: InterceptionOutcome) {
        if reported.swap(true, Ordering::SeqCst) {
            debug!("Outcome for {identity} already reported, dropping {outcome:?}");
            return;
        }
        self.report(identity, outcome);
    }
}
