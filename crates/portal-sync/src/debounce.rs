//! Keyed debouncing with four policies.
//!
//! Each id owns at most one job. A job is `Pending` while its window is
//! open and `Queued` when a `QueueLast` call is buffered behind it; an id
//! with no job is `Idle`. Timers are tokio tasks and tasks always run with
//! the registry unlocked, so a task may debounce again.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

use crate::lock;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebouncePolicy {
    /// Every call restarts the timer; only the last call runs.
    ResetOnNew,
    /// Run now, then drop calls until the window elapses.
    ImmediateThenWait,
    /// Run the first call after the wait; drop calls made meanwhile.
    IgnoreNew,
    /// Run now; keep the most recent call made during the window and run
    /// it when the window elapses, which opens a new window.
    QueueLast,
}

/// What a single `debounce` call did with its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceOutcome {
    Executed,
    Scheduled,
    Queued,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Pending,
    Queued,
}

struct QueuedCall {
    wait: Duration,
    task: Task,
}

struct Job {
    generation: u64,
    policy: DebouncePolicy,
    timer: JoinHandle<()>,
    queued: Option<QueuedCall>,
}

#[derive(Default)]
struct Registry {
    jobs: HashMap<String, Job>,
    next_generation: u64,
}

/// Shared, cloneable debounce registry. Must be used inside a tokio
/// runtime.
#[derive(Clone, Default)]
pub struct Debouncer {
    inner: Arc<Mutex<Registry>>,
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let jobs = lock(&self.inner).jobs.len();
        f.debug_struct("Debouncer").field("jobs", &jobs).finish()
    }
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debounce<F>(
        &self,
        id: &str,
        wait: Duration,
        policy: DebouncePolicy,
        task: F,
    ) -> DebounceOutcome
    where
        F: FnOnce() + Send + 'static,
    {
        self.debounce_boxed(id.to_string(), wait, policy, Box::new(task))
    }

    fn debounce_boxed(
        &self,
        id: String,
        wait: Duration,
        policy: DebouncePolicy,
        task: Task,
    ) -> DebounceOutcome {
        let mut registry = lock(&self.inner);

        match policy {
            DebouncePolicy::ResetOnNew => {
                if let Some(old) = registry.jobs.remove(&id) {
                    old.timer.abort();
                }
                let generation = registry.bump();
                let timer = self.spawn_timer(id.clone(), generation, wait, Some(task));
                registry.jobs.insert(id.clone(), Job::new(generation, policy, timer));
                drop(registry);
                trace!(id = %id, "debounce rescheduled");
                DebounceOutcome::Scheduled
            }
            DebouncePolicy::IgnoreNew => {
                if registry.jobs.contains_key(&id) {
                    trace!(id = %id, "debounce dropped new call");
                    return DebounceOutcome::Dropped;
                }
                let generation = registry.bump();
                let timer = self.spawn_timer(id.clone(), generation, wait, Some(task));
                registry.jobs.insert(id, Job::new(generation, policy, timer));
                DebounceOutcome::Scheduled
            }
            DebouncePolicy::ImmediateThenWait => {
                if registry.jobs.contains_key(&id) {
                    trace!(id = %id, "debounce dropped call inside window");
                    return DebounceOutcome::Dropped;
                }
                let generation = registry.bump();
                let timer = self.spawn_timer(id.clone(), generation, wait, None);
                registry.jobs.insert(id, Job::new(generation, policy, timer));
                drop(registry);
                task();
                DebounceOutcome::Executed
            }
            DebouncePolicy::QueueLast => {
                if let Some(job) = registry.jobs.get_mut(&id) {
                    job.queued = Some(QueuedCall { wait, task });
                    trace!(id = %id, "debounce queued call");
                    return DebounceOutcome::Queued;
                }
                let generation = registry.bump();
                let timer = self.spawn_timer(id.clone(), generation, wait, None);
                registry.jobs.insert(id, Job::new(generation, policy, timer));
                drop(registry);
                task();
                DebounceOutcome::Executed
            }
        }
    }

    /// Cancel the job for `id`, including any buffered call. Returns
    /// whether a job existed.
    pub fn clear_debounce(&self, id: &str) -> bool {
        let removed = lock(&self.inner).jobs.remove(id);
        match removed {
            Some(job) => {
                job.timer.abort();
                trace!(id = %id, "debounce cleared");
                true
            }
            None => false,
        }
    }

    pub fn clear_all_debounces(&self) {
        let jobs: Vec<Job> = lock(&self.inner).jobs.drain().map(|(_, job)| job).collect();
        for job in jobs {
            job.timer.abort();
        }
    }

    pub fn job_state(&self, id: &str) -> JobState {
        match lock(&self.inner).jobs.get(id) {
            None => JobState::Idle,
            Some(job) if job.queued.is_some() => JobState::Queued,
            Some(_) => JobState::Pending,
        }
    }

    fn spawn_timer(
        &self,
        id: String,
        generation: u64,
        wait: Duration,
        task: Option<Task>,
    ) -> JoinHandle<()> {
        let registry = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            window_elapsed(registry, id, generation, task);
        })
    }
}

/// Timer expiry: retire the job if it is still the current one, then run
/// the deferred task or re-enter with the buffered call.
fn window_elapsed(
    registry: Weak<Mutex<Registry>>,
    id: String,
    generation: u64,
    task: Option<Task>,
) {
    let Some(inner) = registry.upgrade() else {
        return;
    };

    let job = {
        let mut guard = lock(&inner);
        let current = guard
            .jobs
            .get(&id)
            .map_or(false, |job| job.generation == generation);
        if current {
            guard.jobs.remove(&id)
        } else {
            None
        }
    };
    let Some(job) = job else {
        return;
    };

    if let Some(task) = task {
        trace!(id = %id, policy = ?job.policy, "debounce fired");
        task();
    }

    if let Some(next) = job.queued {
        let debouncer = Debouncer { inner };
        debouncer.debounce_boxed(id, next.wait, DebouncePolicy::QueueLast, next.task);
    }
}

impl Registry {
    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

impl Job {
    fn new(generation: u64, policy: DebouncePolicy, timer: JoinHandle<()>) -> Self {
        Self {
            generation,
            policy,
            timer,
            queued: None,
        }
    }
}
