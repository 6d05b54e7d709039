use log::{debug, info};
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

pub fn current_timestamp() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_millis()).ok())
        .unwrap_or(0)
}

/// A foreground identity change reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundChangeEvent {
    pub identity: String,
    pub timestamp: Timestamp,
}

impl ForegroundChangeEvent {
    pub fn new(identity: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            identity: identity.into(),
            timestamp,
        }
    }

    pub fn now(identity: impl Into<String>) -> Self {
        Self::new(identity, current_timestamp())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptionDecision {
    Pass,
    Intercept { identity: String },
}

impl InterceptionDecision {
    pub fn should_intercept(&self) -> bool {
        matches!(self, InterceptionDecision::Intercept { .. })
    }
}

/// Set of app identities that trigger interception.
///
/// Built once; the monitor's own identity is never a member.
#[derive(Debug, Clone)]
pub struct BlockedSet {
    apps: HashSet<String>,
}

impl BlockedSet {
    pub fn new<I, S>(apps: I, self_identity: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut apps: HashSet<String> = apps.into_iter().map(Into::into).collect();
        if apps.remove(self_identity) {
            log::warn!("Own identity '{self_identity}' was listed as blocked, ignoring it");
        }
        Self { apps }
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.apps.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// The most recent firing decision. Identity and time only ever move together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastBlock {
    pub identity: String,
    pub at: Timestamp,
}

/// Decides whether a foreground change should be intercepted.
///
/// Calls must be serialized by the caller; the engine holds no lock.
pub struct InterceptionPolicy {
    blocked: BlockedSet,
    self_identity: String,
    cooldown: Duration,
    last: Option<LastBlock>,
}

impl InterceptionPolicy {
    pub fn new(blocked: BlockedSet, self_identity: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            blocked,
            self_identity: self_identity.into(),
            cooldown,
            last: None,
        }
    }

    pub fn last_block(&self) -> Option<&LastBlock> {
        self.last.as_ref()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn is_blocked(&self, identity: &str) -> bool {
        identity != self.self_identity && self.blocked.contains(identity)
    }

    pub fn decide(&mut self, event: &ForegroundChangeEvent) -> InterceptionDecision {
        if !self.is_blocked(&event.identity) {
            return InterceptionDecision::Pass;
        }

        if let Some(last) = &self.last {
            if last.identity == event.identity && !self.cooldown_elapsed(last.at, event.timestamp) {
                debug!("Cooldown active, ignoring: {}", event.identity);
                return InterceptionDecision::Pass;
            }
        }

        info!("Blocked app detected: {}", event.identity);
        self.last = Some(LastBlock {
            identity: event.identity.clone(),
            at: event.timestamp,
        });

        InterceptionDecision::Intercept {
            identity: event.identity.clone(),
        }
    }

    fn cooldown_elapsed(&self, since: Timestamp, now: Timestamp) -> bool {
        // A clock that went backwards counts as still inside the window.
        let Some(elapsed) = now.checked_sub(since).and_then(|e| u128::try_from(e).ok()) else {
            return false;
        };
        elapsed > self.cooldown.as_millis()
    }
}
