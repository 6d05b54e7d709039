use crate::orchestrator::Orchestrator;
use crate::policy::{ForegroundChangeEvent, InterceptionDecision, InterceptionPolicy};
use log::trace;

/// Entry point for foreground changes: decide, then act.
///
/// Takes `&mut self`, so whoever owns it serializes event delivery.
pub struct Interceptor {
    policy: InterceptionPolicy,
    orchestrator: Orchestrator,
}

impl Interceptor {
    pub fn new(policy: InterceptionPolicy, orchestrator: Orchestrator) -> Self {
        Self {
            policy,
            orchestrator,
        }
    }

    pub fn on_foreground_changed(&mut self, event: &ForegroundChangeEvent) -> InterceptionDecision {
        if event.identity.is_empty() {
            return InterceptionDecision::Pass;
        }

        trace!("Foreground changed: {} at {}", event.identity, event.timestamp);
        let decision = self.policy.decide(event);
        self.orchestrator.on_decision(&decision);
        decision
    }

    pub fn policy(&self) -> &InterceptionPolicy {
        &self.policy
    }
}
