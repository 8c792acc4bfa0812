/// PID controller driven by externally supplied timestamps.
///
/// The integral term accumulates `error * dt` without clamping unless an
/// integral limit is configured with [`PIDController::with_integral_limit`].
/// Callers that retarget after a long idle period are expected to `clear()`
/// first to discard history gathered against the previous set-point.
#[derive(Debug, Clone)]
pub struct PIDController {
    // Gains
    kp: f64, // Proportional
    ki: f64, // Integral
    kd: f64, // Derivative

    // State
    set_point: f64,
    p_term: f64,
    i_term: f64,
    d_term: f64,
    last_error: f64,
    last_time: f64,
    control_variable: f64,

    // Anti-windup, disabled by default
    integral_limit: Option<f64>,
}

impl PIDController {
    /// `started_at` seeds `last_time`, so the first update measures its
    /// elapsed time from construction.
    pub fn new(kp: f64, ki: f64, kd: f64, started_at: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            set_point: 0.0,
            p_term: 0.0,
            i_term: 0.0,
            d_term: 0.0,
            last_error: 0.0,
            last_time: started_at,
            control_variable: 0.0,
            integral_limit: None,
        }
    }

    /// Clamp the accumulated integral to `[-limit, limit]`.
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }

    pub fn update(&mut self, measured: f64, now: f64) -> f64 {
        let error = self.set_point - measured;
        let dt = now - self.last_time;

        // Proportional term
        self.p_term = self.kp * error;

        // Integral term
        self.i_term += error * dt;
        if let Some(limit) = self.integral_limit {
            self.i_term = self.i_term.clamp(-limit, limit);
        }

        // Derivative term, zero on simultaneous or out-of-order timestamps
        self.d_term = if dt > 0.0 {
            (error - self.last_error) / dt
        } else {
            0.0
        };

        self.last_time = now;
        self.last_error = error;

        self.control_variable = self.p_term + self.ki * self.i_term + self.kd * self.d_term;
        self.control_variable
    }

    pub fn set_set_point(&mut self, set_point: f64) {
        self.set_point = set_point;
    }

    /// Zero every term and the set-point. `last_time` is kept so the next
    /// update still measures a real elapsed time.
    pub fn clear(&mut self) {
        self.set_point = 0.0;
        self.p_term = 0.0;
        self.i_term = 0.0;
        self.d_term = 0.0;
        self.last_error = 0.0;
        self.control_variable = 0.0;
    }

    pub fn set_point(&self) -> f64 {
        self.set_point
    }

    pub fn control_variable(&self) -> f64 {
        self.control_variable
    }

    pub fn p_term(&self) -> f64 {
        self.p_term
    }

    pub fn i_term(&self) -> f64 {
        self.i_term
    }

    pub fn d_term(&self) -> f64 {
        self.d_term
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    pub fn last_time(&self) -> f64 {
        self.last_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPS * b.abs().max(1.0), "{a} != {b}");
    }

    #[test]
    fn output_matches_independent_oracle() {
        let (kp, ki, kd) = (21.0, 1.6, 0.195);
        let mut pid = PIDController::new(kp, ki, kd, 0.0);
        pid.set_set_point(200.0);

        let samples = [(0.01, 150.0), (0.025, 170.0), (0.03, 185.0), (0.05, 199.0), (0.09, 204.0)];
        let mut integral = 0.0;
        let mut last_t = 0.0;
        let mut last_err = 0.0;

        for (t, measured) in samples {
            let cv = pid.update(measured, t);

            let err = 200.0 - measured;
            let dt = t - last_t;
            integral += err * dt;
            let expected = kp * err + ki * integral + kd * (err - last_err) / dt;
            assert_close(cv, expected);
            assert_close(pid.control_variable(), expected);

            last_t = t;
            last_err = err;
        }
    }

    #[test]
    fn control_variable_is_sum_of_weighted_terms() {
        let mut pid = PIDController::new(2.0, 0.5, 0.25, 0.0);
        pid.set_set_point(10.0);
        pid.update(4.0, 0.5);
        let expected = pid.p_term() + 0.5 * pid.i_term() + 0.25 * pid.d_term();
        assert_close(pid.control_variable(), expected);
    }

    #[test]
    fn identical_timestamps_zero_the_derivative() {
        let mut pid = PIDController::new(1.0, 1.0, 1.0, 0.0);
        pid.set_set_point(100.0);
        pid.update(10.0, 1.0);
        assert!(pid.d_term() != 0.0);

        let i_before = pid.i_term();
        pid.update(50.0, 1.0);
        assert_eq!(pid.d_term(), 0.0);
        assert_eq!(pid.i_term(), i_before);
    }

    #[test]
    fn out_of_order_timestamp_zeroes_derivative() {
        let mut pid = PIDController::new(1.0, 0.0, 1.0, 0.0);
        pid.set_set_point(5.0);
        pid.update(0.0, 2.0);
        pid.update(1.0, 1.5);
        assert_eq!(pid.d_term(), 0.0);
    }

    #[test]
    fn clear_resets_terms_but_keeps_last_time() {
        let mut pid = PIDController::new(3.0, 1.0, 0.5, 0.0);
        pid.set_set_point(300.0);
        pid.update(100.0, 1.0);
        pid.clear();

        assert_eq!(pid.set_point(), 0.0);
        assert_eq!(pid.i_term(), 0.0);
        assert_eq!(pid.control_variable(), 0.0);
        assert_eq!(pid.last_time(), 1.0);

        pid.update(40.0, 1.5);
        assert_close(pid.p_term(), 3.0 * (0.0 - 40.0));
        // derivative measured against the pre-clear timestamp
        assert_close(pid.d_term(), -40.0 / 0.5);
    }

    #[test]
    fn set_point_after_clear_drives_proportional_term() {
        let mut pid = PIDController::new(2.0, 0.0, 0.0, 0.0);
        pid.update(10.0, 1.0);
        pid.clear();
        pid.set_set_point(25.0);
        pid.update(10.0, 2.0);
        assert_close(pid.p_term(), 30.0);
    }

    #[test]
    fn set_point_change_keeps_history() {
        let mut pid = PIDController::new(1.0, 1.0, 0.0, 0.0);
        pid.set_set_point(10.0);
        pid.update(0.0, 1.0);
        let integral = pid.i_term();
        pid.set_set_point(20.0);
        assert_eq!(pid.i_term(), integral);
        assert_eq!(pid.last_error(), 10.0);
    }

    #[test]
    fn integral_winds_up_without_limit() {
        let mut pid = PIDController::new(0.0, 1.0, 0.0, 0.0);
        pid.set_set_point(100.0);
        for step in 1..=100 {
            pid.update(0.0, step as f64);
        }
        assert_close(pid.i_term(), 10_000.0);
    }

    #[test]
    fn integral_limit_clamps_accumulation() {
        let mut pid = PIDController::new(0.0, 1.0, 0.0, 0.0).with_integral_limit(50.0);
        pid.set_set_point(100.0);
        for step in 1..=10 {
            pid.update(0.0, step as f64);
        }
        assert_eq!(pid.i_term(), 50.0);

        pid.set_set_point(-100.0);
        for step in 11..=20 {
            pid.update(0.0, step as f64);
        }
        assert_eq!(pid.i_term(), -50.0);
    }
}
