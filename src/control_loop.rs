//! Control loop - sample, update, map, drive, then rate-gated side work
//!
//! Each tick runs, in order: sensor sample and decimation, PID update, output
//! mapping, actuator write, and a scheduler pass that may emit telemetry or
//! regenerate the target. Everything mutable lives in a single
//! [`LoopContext`] owned by the loop and lent to scheduled tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::actuator::{ActuatorSink, OutputMapper, PIDController};
use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::error::{ConfigError, ControlError, Result};
use crate::metrics::{LoopMetrics, MetricsReport};
use crate::scheduler::RateScheduler;
use crate::sensor::{SensorSampler, SensorSource};
use crate::target::TargetGenerator;
use crate::telemetry::{TelemetrySample, TelemetrySink};

pub const TELEMETRY_TASK: &str = "telemetry";
pub const TARGET_TASK: &str = "target_regen";

// ============================================================================
// LOOP CONTEXT - State shared with scheduled tasks
// ============================================================================

pub struct LoopContext {
    pub pid: PIDController,
    pub target: TargetGenerator,
    telemetry: Box<dyn TelemetrySink>,
    measured: u16,
    throttle: f64,
    pending_retarget: Option<f64>,
    retargets: u64,
}

impl LoopContext {
    fn emit_telemetry(&mut self, now: f64) {
        let sample = TelemetrySample {
            time: now,
            measured: self.measured,
            set_point: self.pid.set_point(),
            control_variable: self.pid.control_variable(),
            throttle: self.throttle,
        };
        self.telemetry.emit(&sample);
    }

    fn regenerate_target(&mut self, now: f64) {
        let update = self.target.advance(now);
        if self.target.pauses_on_retarget() {
            // applied by the loop after the scheduler pass, it blocks
            if update.changed {
                self.pending_retarget = Some(update.value);
            }
        } else {
            self.pid.set_set_point(update.value);
            if update.changed {
                self.retargets += 1;
            }
        }
    }

    pub fn retargets(&self) -> u64 {
        self.retargets
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub time: f64,
    pub measured: u16,
    pub control_variable: f64,
    pub throttle: f64,
    pub tasks_fired: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub telemetry_emitted: u64,
    pub retargets: u64,
    pub final_set_point: f64,
    pub metrics: MetricsReport,
}

// ============================================================================
// CONTROL LOOP
// ============================================================================

pub struct ControlLoop<S, A, C> {
    sampler: SensorSampler<S>,
    actuator: A,
    clock: C,
    mapper: OutputMapper,
    scheduler: RateScheduler<LoopContext>,
    ctx: LoopContext,
    tick_delay: f64,
    hold_pause: f64,
    metrics: LoopMetrics,
    last_tick_start: Option<f64>,
    ticks: u64,
}

impl<S, A, C> ControlLoop<S, A, C>
where
    S: SensorSource,
    A: ActuatorSink,
    C: Clock,
{
    pub fn new(
        config: &ControllerConfig,
        sensor: S,
        actuator: A,
        clock: C,
        telemetry: Box<dyn TelemetrySink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let started_at = clock.now();
        let mut pid = config.build_pid(started_at);
        pid.set_set_point(config.set_point_initial);
        let target = TargetGenerator::from_config(&config.target, started_at)?;

        let mut scheduler = RateScheduler::new();
        scheduler.add_task(TELEMETRY_TASK, config.telemetry_period, started_at, |ctx: &mut LoopContext, now| {
            ctx.emit_telemetry(now)
        })?;
        scheduler.add_task(TARGET_TASK, config.target_regen_period, started_at, |ctx: &mut LoopContext, now| {
            ctx.regenerate_target(now)
        })?;

        Ok(Self {
            sampler: SensorSampler::new(sensor),
            actuator,
            clock,
            mapper: config.mapper(),
            scheduler,
            ctx: LoopContext {
                pid,
                target,
                telemetry,
                measured: 0,
                throttle: 0.0,
                pending_retarget: None,
                retargets: 0,
            },
            tick_delay: config.tick_delay,
            hold_pause: config.target.hold_duration,
            metrics: LoopMetrics::new(),
            last_tick_start: None,
            ticks: 0,
        })
    }

    /// One pass of the loop. Does not wait afterwards.
    pub fn tick(&mut self) -> Result<TickReport> {
        let started = Instant::now();
        let now = self.clock.now();
        if let Some(previous) = self.last_tick_start {
            self.metrics.record_interval(now - previous);
        }
        self.last_tick_start = Some(now);

        let measured = self.sampler.sample()?;
        let control_variable = self.ctx.pid.update(measured as f64, now);
        let throttle = self.mapper.apply(control_variable);
        self.actuator.write(throttle)?;

        self.ctx.measured = measured;
        self.ctx.throttle = throttle;

        let tasks_fired = self.scheduler.tick(&self.clock, &mut self.ctx);
        if let Some(target) = self.ctx.pending_retarget.take() {
            self.begin_hold(target)?;
        }

        self.ticks += 1;
        self.metrics.record_tick(started.elapsed());

        Ok(TickReport {
            time: now,
            measured,
            control_variable,
            throttle,
            tasks_fired,
        })
    }

    /// Stop the drive, discard controller history, adopt `target`, then
    /// pause before the convergence window starts.
    fn begin_hold(&mut self, target: f64) -> Result<()> {
        self.actuator.write(0.0)?;
        self.ctx.throttle = 0.0;
        if self.ctx.retargets > 0 {
            info!(set_point = self.ctx.pid.set_point(), measured = self.ctx.measured, "convergence complete");
        }

        self.ctx.pid.clear();
        self.ctx.pid.set_set_point(target);
        self.ctx.retargets += 1;
        info!(set_point = target, pause = self.hold_pause, "new target, convergence starts after pause");

        self.clock.sleep(self.hold_pause);
        self.ctx.target.restart_hold(self.clock.now());
        self.last_tick_start = None;
        Ok(())
    }

    /// Tick until `shutdown` is set or a collaborator fails. The actuator is
    /// commanded to 0 on startup, on shutdown and before any error returns.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<LoopSummary> {
        info!(
            mode = %self.ctx.target.mode(),
            set_point = self.ctx.pid.set_point(),
            tick_delay = self.tick_delay,
            "control loop starting"
        );
        self.actuator.write(0.0)?;

        let outcome = self.run_until(shutdown);
        let neutral = self.actuator.write(0.0);
        self.ctx.throttle = 0.0;

        match (outcome, neutral) {
            (Ok(()), Ok(())) => {
                info!(ticks = self.ticks, "actuator neutralized, control loop stopped");
                Ok(self.summary())
            }
            (Ok(()), Err(e)) => {
                error!(error = %e, "failed to neutralize actuator on shutdown");
                Err(e.into())
            }
            (Err(e), Ok(())) => {
                error!(error = %e, "control loop failed, actuator neutralized");
                Err(e)
            }
            (Err(e), Err(neutral_err)) => {
                error!(error = %e, neutral_error = %neutral_err, "control loop failed and actuator could not be neutralized");
                Err(e)
            }
        }
    }

    fn run_until(&mut self, shutdown: &AtomicBool) -> Result<()> {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested");
                return Ok(());
            }
            let report = self.tick()?;
            if self.ticks % 1000 == 0 {
                debug!(ticks = self.ticks, measured = report.measured, throttle = report.throttle, "loop heartbeat");
            }
            self.clock.sleep(self.tick_delay);
        }
    }

    /// Command the actuator to 0 without running the loop, for callers
    /// driving `tick` by hand.
    pub fn neutralize(&mut self) -> Result<()> {
        self.ctx.throttle = 0.0;
        self.actuator.write(0.0).map_err(|e| {
            warn!(error = %e, "neutral command rejected");
            ControlError::from(e)
        })
    }

    pub fn summary(&self) -> LoopSummary {
        LoopSummary {
            ticks: self.ticks,
            telemetry_emitted: self.scheduler.task(TELEMETRY_TASK).map_or(0, |t| t.fires()),
            retargets: self.ctx.retargets,
            final_set_point: self.ctx.pid.set_point(),
            metrics: self.metrics.report(),
        }
    }

    pub fn pid(&self) -> &PIDController {
        &self.ctx.pid
    }

    pub fn context(&self) -> &LoopContext {
        &self.ctx
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
