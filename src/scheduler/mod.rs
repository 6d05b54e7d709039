//! Delayed task execution for the interception pipeline.
//!
//! Both schedulers run tasks one at a time, ordered by deadline and then by
//! the order they were scheduled in.

use log::{debug, warn};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task);
}

struct Entry<T> {
    due: T,
    seq: u64,
    task: Task,
}

impl<T: Ord> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T: Ord> Eq for Entry<T> {}

impl<T: Ord> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

// Reversed so BinaryHeap pops the earliest deadline first.
impl<T: Ord> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

enum Command {
    Schedule(Duration, Task),
    Shutdown,
}

/// Runs delayed tasks on one dedicated worker thread.
pub struct TimerScheduler {
    sender: Mutex<Sender<Command>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerScheduler {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("appwarden-timer".into())
            .spawn(move || run_timer_loop(&receiver))
            .map_err(|e| warn!("Failed to spawn timer thread: {e}"))
            .ok();

        Self {
            sender: Mutex::new(sender),
            worker: Mutex::new(worker),
        }
    }

    /// Stop the worker. Tasks that are not yet due are dropped.
    pub fn shutdown(&self) {
        let sender = self.sender.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        // The worker may already be gone.
        let _ = sender.send(Command::Shutdown);
        drop(sender);

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Timer thread panicked");
            }
        }
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Scheduler for TimerScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let sender = self.sender.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if sender.send(Command::Schedule(delay, task)).is_err() {
            warn!("Timer thread is not running, dropping scheduled task");
        }
    }
}

fn run_timer_loop(receiver: &Receiver<Command>) {
    let mut queue: BinaryHeap<Entry<Instant>> = BinaryHeap::new();
    let mut seq: u64 = 0;

    loop {
        let command = match queue.peek() {
            Some(next) => {
                let wait = next.due.saturating_duration_since(Instant::now());
                match receiver.recv_timeout(wait) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
            None => match receiver.recv() {
                Ok(command) => Some(command),
                Err(_) => return,
            },
        };

        match command {
            Some(Command::Schedule(delay, task)) => {
                queue.push(Entry {
                    due: Instant::now() + delay,
                    seq,
                    task,
                });
                seq += 1;
            }
            Some(Command::Shutdown) => {
                debug!("Timer thread shutting down with {} pending task(s)", queue.len());
                return;
            }
            None => {}
        }

        let now = Instant::now();
        while queue.peek().is_some_and(|e| e.due <= now) {
            if let Some(entry) = queue.pop() {
                run_isolated(entry.task);
            }
        }
    }
}

/// Run one task; a panic is logged and the worker keeps going.
fn run_isolated(task: Task) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!("Scheduled task panicked: {reason}");
    }
}

/// Scheduler driven by a virtual clock. Nothing runs until `advance`.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Entry<Duration>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.lock().now
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Move the clock forward, running every task that falls due, including
    /// tasks scheduled by those tasks.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now + by;

        loop {
            let task = {
                let mut state = self.lock();
                match state.queue.peek() {
                    Some(next) if next.due <= target => {
                        let entry = state.queue.pop();
                        if let Some(entry) = &entry {
                            state.now = entry.due;
                        }
                        entry.map(|e| e.task)
                    }
                    Some(_) | None => None,
                }
            };

            // Run outside the lock so tasks can schedule follow-ups.
            match task {
                Some(task) => task(),
                None => break,
            }
        }

        self.lock().now = target;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut state = self.lock();
        let due = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        state.queue.push(Entry { due, seq, task });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_for_task = Arc::clone(&log);
        let make = move |name: &'static str| -> Task {
            let log = Arc::clone(&log_for_task);
            Box::new(move || log.lock().unwrap().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_manual_runs_in_deadline_then_insertion_order() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule(Duration::from_millis(300), task("b"));
        scheduler.schedule(Duration::from_millis(100), task("a"));
        scheduler.schedule(Duration::from_millis(300), task("c"));

        scheduler.advance(Duration::from_millis(99));
        assert!(log.lock().unwrap().is_empty());

        scheduler.advance(Duration::from_millis(201));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now(), Duration::from_millis(300));
    }

    #[test]
    fn test_manual_runs_chained_tasks_inside_window() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        let chained = scheduler.clone();
        let second = task("second");
        let first_log = Arc::clone(&log);
        scheduler.schedule(
            Duration::from_millis(300),
            Box::new(move || {
                first_log.lock().unwrap().push("first");
                chained.schedule(Duration::from_millis(1000), second);
            }),
        );

        scheduler.advance(Duration::from_millis(1299));
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_timer_scheduler_runs_tasks_in_order() {
        let scheduler = TimerScheduler::new();
        let (sender, receiver) = mpsc::channel();

        for (delay, name) in [(40, "late"), (5, "early"), (5, "early-2")] {
            let sender = sender.clone();
            scheduler.schedule(
                Duration::from_millis(delay),
                Box::new(move || {
                    let _ = sender.send(name);
                }),
            );
        }

        let got: Vec<_> = (0..3)
            .map(|_| receiver.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        assert_eq!(got, vec!["early", "early-2", "late"]);
    }

    #[test]
    fn test_timer_scheduler_survives_panicking_task() {
        let scheduler = TimerScheduler::new();
        let (sender, receiver) = mpsc::channel();

        scheduler.schedule(Duration::from_millis(1), Box::new(|| panic!("step failed")));
        scheduler.schedule(
            Duration::from_millis(20),
            Box::new(move || {
                let _ = sender.send("after");
            }),
        );

        assert_eq!(receiver.recv_timeout(Duration::from_secs(2)), Ok("after"));
    }

    #[test]
    fn test_timer_scheduler_shutdown_drops_pending() {
        let scheduler = TimerScheduler::new();
        let (sender, receiver) = mpsc::channel::<()>();
        scheduler.schedule(
            Duration::from_secs(60),
            Box::new(move || {
                let _ = sender.send(());
            }),
        );
        scheduler.shutdown();
        assert!(receiver.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
