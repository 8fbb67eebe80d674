// Scheduler module - Periodic task contract and the tick loop driving it

use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A task the host invokes on a fixed cadence
pub trait PeriodicTask {
    /// Name the task is registered under
    fn task_name(&self) -> String;

    /// Whether the host should invoke the task at all
    fn is_task_enabled(&self) -> bool;

    /// Run one invocation
    ///
    /// # Arguments
    /// * `elapsed_ms` - Milliseconds since the previous invocation
    fn run_task(&mut self, elapsed_ms: u64);
}

/// Accumulates elapsed time and fires once a period has passed
#[derive(Debug, Clone, Default)]
pub struct PeriodicTrigger {
    accumulated_ms: u64,
}

impl PeriodicTrigger {
    /// Create a trigger with nothing accumulated
    pub fn new() -> Self {
        Self::default()
    }

    /// Add elapsed time and report whether the period has passed
    ///
    /// Firing resets the accumulator to zero.
    pub fn advance(&mut self, elapsed_ms: u64, period_ms: u64) -> bool {
        self.accumulated_ms = self.accumulated_ms.saturating_add(elapsed_ms);
        if self.accumulated_ms >= period_ms {
            self.accumulated_ms = 0;
            true
        } else {
            false
        }
    }

    /// Drop any accumulated time
    pub fn reset(&mut self) {
        self.accumulated_ms = 0;
    }

    /// Milliseconds accumulated since the last firing
    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }
}

/// Drives a periodic task from a tokio interval until shutdown
pub struct TaskRunner {
    tick: Duration,
}

impl TaskRunner {
    /// Create a runner that wakes every `tick`
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    /// Get the tick interval
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Invoke the task on every tick until `shutdown` resolves
    ///
    /// The task receives the real time elapsed between ticks, so a slow
    /// invocation does not stretch the sampling period.
    pub async fn run<T, F>(&self, task: Arc<Mutex<T>>, shutdown: F) -> Result<()>
    where
        T: PeriodicTask + Send,
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.tick);
        // Skip missed ticks to avoid a burst of samples after a stall
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tokio::pin!(shutdown);

        // The first tick completes immediately
        interval.tick().await;
        let mut last_tick = Instant::now();

        {
            let task = task.lock().await;
            tracing::info!(
                "Running task '{}' every {}ms",
                task.task_name(),
                self.tick.as_millis()
            );
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Task runner shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let now = Instant::now();
                    let elapsed_ms = now.duration_since(last_tick).as_millis() as u64;
                    last_tick = now;

                    let mut task = task.lock().await;
                    if task.is_task_enabled() {
                        task.run_task(elapsed_ms);
                    }
                }
            }
        }

        Ok(())
    }
}
