/// Symmetric clamp band applied to the PID output before it is mapped.
pub const PID_RANGE: f64 = 1536.0;

/// Clamp `value` into `input`, rescale into `output`, then flip the sign
/// when `invert` is set. Values outside `input` saturate.
pub fn map(value: f64, input: (f64, f64), output: (f64, f64), invert: bool) -> f64 {
    let (in_min, in_max) = input;
    let (out_min, out_max) = output;

    let clamped = value.clamp(in_min.min(in_max), in_min.max(in_max));
    let span = in_max - in_min;
    let scaled = if span == 0.0 {
        out_min
    } else {
        out_min + (clamped - in_min) * (out_max - out_min) / span
    };

    if invert {
        -scaled
    } else {
        scaled
    }
}

/// Loop-side mapping from control variable to throttle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputMapper {
    pub input_range: (f64, f64),
    pub output_range: (f64, f64),
    pub invert: bool,
    /// Control variables with magnitude at or below this map to exactly 0.
    pub deadband: f64,
}

impl Default for OutputMapper {
    fn default() -> Self {
        Self::symmetric(PID_RANGE)
    }
}

impl OutputMapper {
    pub fn symmetric(pid_range: f64) -> Self {
        Self {
            input_range: (-pid_range, pid_range),
            output_range: (-1.0, 1.0),
            invert: true,
            deadband: 0.0,
        }
    }

    pub fn apply(&self, control_variable: f64) -> f64 {
        if control_variable.abs() <= self.deadband {
            return 0.0;
        }
        map(control_variable, self.input_range, self.output_range, self.invert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IN: (f64, f64) = (-PID_RANGE, PID_RANGE);
    const OUT: (f64, f64) = (-1.0, 1.0);

    #[test]
    fn zero_maps_to_zero() {
        assert_eq!(map(0.0, IN, OUT, true), 0.0);
        assert_eq!(map(0.0, IN, OUT, false), 0.0);
    }

    #[test]
    fn band_edge_maps_to_full_throttle() {
        assert_eq!(map(1536.0, IN, OUT, false), 1.0);
        assert_eq!(map(-1536.0, IN, OUT, false), -1.0);
        assert_eq!(map(1536.0, IN, OUT, true), -1.0);
    }

    #[test]
    fn values_outside_band_saturate() {
        assert_eq!(map(2000.0, IN, OUT, false), 1.0);
        assert_eq!(map(-9000.0, IN, OUT, false), -1.0);
    }

    #[test]
    fn midpoint_scales_linearly() {
        assert_eq!(map(768.0, IN, OUT, false), 0.5);
        assert_eq!(map(768.0, IN, OUT, true), -0.5);
    }

    #[test]
    fn default_mapper_inverts() {
        let mapper = OutputMapper::default();
        assert_eq!(mapper.apply(384.0), -0.25);
    }

    #[test]
    fn deadband_forces_neutral_command() {
        let mapper = OutputMapper {
            deadband: 10.0,
            ..OutputMapper::default()
        };
        assert_eq!(mapper.apply(9.5), 0.0);
        assert_eq!(mapper.apply(-10.0), 0.0);
        assert!(mapper.apply(11.0) < 0.0);
    }
}
