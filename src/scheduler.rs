//! Scheduler module - Cooperative multi-rate task dispatch
//!
//! Every task shares the caller's thread. On each `tick` the tasks are
//! checked in registration order against a fresh clock reading, so an action
//! that takes a while pushes back the comparison time of every task after it
//! in the same tick. A task fires when strictly more than its period has
//! passed since its last fire, and the new fire time is read from the clock
//! after the action returns. Irregular ticks therefore coalesce into a
//! single fire per elapsed period; a late tick delays the next fire but
//! never drops it.

use tracing::debug;

use crate::clock::Clock;
use crate::error::ConfigError;

pub type TaskAction<C> = Box<dyn FnMut(&mut C, f64)>;

pub struct ScheduledTask<C> {
    name: &'static str,
    period: f64,
    last_fire: f64,
    fires: u64,
    action: TaskAction<C>,
}

impl<C> ScheduledTask<C> {
    pub fn last_fire(&self) -> f64 {
        self.last_fire
    }

    pub fn fires(&self) -> u64 {
        self.fires
    }
}

pub struct RateScheduler<C> {
    tasks: Vec<ScheduledTask<C>>,
}

impl<C> Default for RateScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> RateScheduler<C> {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Register a task whose first period is measured from `started_at`.
    pub fn add_task<F>(&mut self, name: &'static str, period: f64, started_at: f64, action: F) -> Result<(), ConfigError>
    where
        F: FnMut(&mut C, f64) + 'static,
    {
        if !period.is_finite() {
            return Err(ConfigError::NonFinite { name, value: period });
        }
        if period <= 0.0 {
            return Err(ConfigError::NonPositive { name, value: period });
        }

        self.tasks.push(ScheduledTask {
            name,
            period,
            last_fire: started_at,
            fires: 0,
            action: Box::new(action),
        });
        Ok(())
    }

    /// Run every due task once. Returns how many fired.
    pub fn tick(&mut self, clock: &impl Clock, ctx: &mut C) -> usize {
        let mut fired = 0;
        for task in &mut self.tasks {
            let now = clock.now();
            if now - task.last_fire > task.period {
                (task.action)(ctx, now);
                task.last_fire = clock.now();
                task.fires += 1;
                fired += 1;
                debug!(task = task.name, now, "scheduled task fired");
            }
        }
        fired
    }

    pub fn task(&self, name: &str) -> Option<&ScheduledTask<C>> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
