//! Target module - Set-point trajectory generators

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::config::{TargetConfig, TargetMode};
use crate::error::ConfigError;

/// Result of querying a generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetUpdate {
    pub value: f64,
    /// True when the generator moved to a new target on this call.
    pub changed: bool,
}

// ============================================================================
// RANDOM HOLD - Pick a target, hold it for a fixed time, repeat
// ============================================================================

#[derive(Debug, Clone)]
pub struct RandomHold {
    min: i64,
    max: i64,
    hold_duration: f64,
    hold_start: f64,
    current: Option<i64>,
    rng: StdRng,
}

impl RandomHold {
    pub fn new(min: i64, max: i64, hold_duration: f64, seed: Option<u64>) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvertedRange {
                name: "random target range",
                min: min as f64,
                max: max as f64,
            });
        }
        check_positive("hold_duration", hold_duration)?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            min,
            max,
            hold_duration,
            hold_start: 0.0,
            current: None,
            rng,
        })
    }

    pub fn advance(&mut self, now: f64) -> TargetUpdate {
        if let Some(target) = self.current {
            if now - self.hold_start < self.hold_duration {
                return TargetUpdate {
                    value: target as f64,
                    changed: false,
                };
            }
        }

        let target = self.rng.gen_range(self.min..=self.max);
        self.current = Some(target);
        self.hold_start = now;
        TargetUpdate {
            value: target as f64,
            changed: true,
        }
    }

    /// Start the hold window over at `now` without drawing a new target.
    pub fn restart_hold(&mut self, now: f64) {
        self.hold_start = now;
    }
}

// ============================================================================
// SINUSOID - Continuously varying set-point
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sinusoid {
    value_min: f64,
    value_max: f64,
    cycles: f64,
}

impl Sinusoid {
    pub fn new(value_min: f64, value_max: f64, cycles: f64) -> Result<Self, ConfigError> {
        if value_min > value_max {
            return Err(ConfigError::InvertedRange {
                name: "sinusoid range",
                min: value_min,
                max: value_max,
            });
        }
        check_finite("cycles", cycles)?;
        Ok(Self {
            value_min,
            value_max,
            cycles,
        })
    }

    pub fn at(&self, t: f64) -> f64 {
        0.5 * (self.value_max - self.value_min) * (2.0 * PI * self.cycles * t / 2.0).sin()
            + (self.value_max + self.value_min) / 2.0
    }
}

// ============================================================================
// STEPPED CYCLE - Fixed sequence, one step per period
// ============================================================================

#[derive(Debug, Clone)]
pub struct SteppedCycle {
    values: Vec<f64>,
    index: usize,
    period: f64,
    last_step: f64,
}

impl SteppedCycle {
    pub fn new(values: Vec<f64>, period: f64, started_at: f64) -> Result<Self, ConfigError> {
        if values.is_empty() {
            return Err(ConfigError::EmptyStepSequence);
        }
        check_positive("step_period", period)?;
        Ok(Self {
            values,
            index: 0,
            period,
            last_step: started_at,
        })
    }

    pub fn advance(&mut self, now: f64) -> TargetUpdate {
        let changed = now - self.last_step >= self.period;
        if changed {
            self.index = (self.index + 1) % self.values.len();
            self.last_step = now;
        }
        TargetUpdate {
            value: self.values[self.index],
            changed,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

// ============================================================================
// TARGET GENERATOR - Variant selected at assembly
// ============================================================================

#[derive(Debug, Clone)]
pub enum TargetGenerator {
    RandomHold(RandomHold),
    Sinusoid(Sinusoid),
    SteppedCycle(SteppedCycle),
}

impl TargetGenerator {
    pub fn from_config(config: &TargetConfig, started_at: f64) -> Result<Self, ConfigError> {
        let generator = match config.mode {
            TargetMode::RandomHold => TargetGenerator::RandomHold(RandomHold::new(
                config.random_min,
                config.random_max,
                config.convergence_window,
                config.seed,
            )?),
            TargetMode::Sinusoid => TargetGenerator::Sinusoid(Sinusoid::new(
                config.value_min,
                config.value_max,
                config.cycles,
            )?),
            TargetMode::SteppedCycle => TargetGenerator::SteppedCycle(SteppedCycle::new(
                config.step_values.clone(),
                config.step_period,
                started_at,
            )?),
        };
        Ok(generator)
    }

    pub fn next(&mut self, now: f64) -> f64 {
        self.advance(now).value
    }

    pub fn advance(&mut self, now: f64) -> TargetUpdate {
        match self {
            TargetGenerator::RandomHold(g) => g.advance(now),
            TargetGenerator::Sinusoid(g) => TargetUpdate {
                value: g.at(now),
                changed: true,
            },
            TargetGenerator::SteppedCycle(g) => g.advance(now),
        }
    }

    /// Whether a new target should be followed by the idle pause before
    /// convergence starts.
    pub fn pauses_on_retarget(&self) -> bool {
        matches!(self, TargetGenerator::RandomHold(_))
    }

    pub fn restart_hold(&mut self, now: f64) {
        if let TargetGenerator::RandomHold(g) = self {
            g.restart_hold(now);
        }
    }

    pub fn mode(&self) -> TargetMode {
        match self {
            TargetGenerator::RandomHold(_) => TargetMode::RandomHold,
            TargetGenerator::Sinusoid(_) => TargetMode::Sinusoid,
            TargetGenerator::SteppedCycle(_) => TargetMode::SteppedCycle,
        }
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(name, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { name, value });
    }
    Ok(())
}

fn check_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinusoid_starts_at_midpoint() {
        let wave = Sinusoid::new(100.0, 923.0, 1.0).unwrap();
        assert_eq!(wave.at(0.0), 511.5);
    }

    #[test]
    fn sinusoid_peaks_at_value_max() {
        // sin(pi * t) peaks at t = 0.5 for one cycle per second
        let wave = Sinusoid::new(100.0, 923.0, 1.0).unwrap();
        assert!((wave.at(0.5) - 923.0).abs() < 1e-9);
        assert!((wave.at(1.5) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stepped_cycle_wraps_after_full_sequence() {
        let mut steps = SteppedCycle::new(vec![100.0, 500.0, 900.0, 500.0], 1.0, 0.0).unwrap();
        let fired: Vec<f64> = (1..=5).map(|t| steps.advance(t as f64).value).collect();
        assert_eq!(fired, vec![500.0, 900.0, 500.0, 100.0, 500.0]);
    }

    #[test]
    fn stepped_cycle_holds_value_between_periods() {
        let mut steps = SteppedCycle::new(vec![100.0, 500.0], 2.0, 0.0).unwrap();
        let update = steps.advance(1.0);
        assert_eq!(update, TargetUpdate { value: 100.0, changed: false });
        assert_eq!(steps.index(), 0);
        assert!(steps.advance(2.0).changed);
        assert_eq!(steps.index(), 1);
    }

    #[test]
    fn empty_step_sequence_is_rejected() {
        assert!(matches!(
            SteppedCycle::new(Vec::new(), 1.0, 0.0),
            Err(ConfigError::EmptyStepSequence)
        ));
    }

    #[test]
    fn random_hold_draws_within_inclusive_range() {
        let mut hold = RandomHold::new(200, 823, 0.5, Some(11)).unwrap();
        for step in 0..200 {
            let value = hold.advance(step as f64).value;
            assert!((200.0..=823.0).contains(&value));
        }
    }

    #[test]
    fn random_hold_keeps_target_until_expiry() {
        let mut hold = RandomHold::new(200, 823, 5.0, Some(42)).unwrap();
        let first = hold.advance(10.0);
        assert!(first.changed);

        let held = hold.advance(14.9);
        assert!(!held.changed);
        assert_eq!(held.value, first.value);

        assert!(hold.advance(15.0).changed);
    }

    #[test]
    fn restart_hold_extends_current_target() {
        let mut hold = RandomHold::new(0, 10, 5.0, Some(1)).unwrap();
        hold.advance(0.0);
        hold.restart_hold(5.0);
        assert!(!hold.advance(9.0).changed);
        assert!(hold.advance(10.0).changed);
    }

    #[test]
    fn degenerate_range_always_returns_same_target() {
        let mut hold = RandomHold::new(512, 512, 1.0, None).unwrap();
        assert_eq!(hold.advance(0.0).value, 512.0);
        assert_eq!(hold.advance(3.0).value, 512.0);
    }

    #[test]
    fn inverted_hold_range_fails_fast() {
        assert!(matches!(
            RandomHold::new(823, 200, 5.0, None),
            Err(ConfigError::InvertedRange { .. })
        ));
        assert!(RandomHold::new(200, 823, 0.0, None).is_err());
    }

    #[test]
    fn generator_dispatches_through_next() {
        let mut gen = TargetGenerator::Sinusoid(Sinusoid::new(100.0, 923.0, 1.0).unwrap());
        assert_eq!(gen.next(0.0), 511.5);
        assert!(!gen.pauses_on_retarget());
        assert_eq!(gen.mode(), TargetMode::Sinusoid);
    }
}
