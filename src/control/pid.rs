//! PID controller for heater power
//!
//! Proportional-integral-derivative controller with a feedforward input.
//! The trajectory planner writes `target`, `d_target` and `feedforward`
//! before every call to [`PidController::command`]; the output is a heater
//! duty fraction.

/// Gains and clamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Integral term clamp (anti-windup).
    pub i_min: f32,
    pub i_max: f32,
    /// Output clamp.
    pub command_min: f32,
    pub command_max: f32,
}

impl From<&crate::config::ControlConfig> for PidGains {
    fn from(c: &crate::config::ControlConfig) -> Self {
        Self {
            kp: c.kp,
            ki: c.ki,
            kd: c.kd,
            i_min: c.i_min,
            i_max: c.i_max,
            command_min: 0.0,
            command_max: 1.0,
        }
    }
}

/// Individual contributions of the last command, for telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidTerms {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub ff: f32,
}

/// PID controller
pub struct PidController {
    gains: PidGains,
    /// Live setpoint (°C).
    pub target: f32,
    /// Desired rate of change of the setpoint (°C/s).
    pub d_target: f32,
    /// Open-loop bias added to the output.
    pub feedforward: f32,
    integral: f32,
    last_ms: Option<u64>,
    terms: PidTerms,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            target: 0.0,
            d_target: 0.0,
            feedforward: 0.0,
            integral: 0.0,
            last_ms: None,
            terms: PidTerms::default(),
        }
    }

    /// Replace gains (runtime tuning).  Integrator state is kept but
    /// re-clamped to the new range.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
        self.integral = self.integral.clamp(gains.i_min, gains.i_max);
    }

    /// Compute the bounded actuation command.
    ///
    /// `temp` is the measured temperature, `d_temp` its measured rate of
    /// change and `now_ms` the sample time.  The first call after
    /// [`initialize`](Self::initialize) does not integrate.
    pub fn command(&mut self, temp: f32, d_temp: f32, now_ms: u64) -> f32 {
        let error = self.target - temp;

        let dt = match self.last_ms {
            Some(last) if now_ms > last => (now_ms - last) as f32 * 1.0e-3,
            _ => 0.0,
        };
        self.last_ms = Some(now_ms);

        // Proportional
        let p = self.gains.kp * error;

        // Integral (clamped, so it cannot wind up past the I-range)
        let integral = self.integral + self.gains.ki * error * dt;
        if integral.is_finite() {
            self.integral = integral.clamp(self.gains.i_min, self.gains.i_max);
        }

        // Derivative acts on the rate error, not on the temperature error
        let d = self.gains.kd * (self.d_target - d_temp);

        self.terms = PidTerms {
            p,
            i: self.integral,
            d,
            ff: self.feedforward,
        };

        let output = p + self.integral + d + self.feedforward;
        if output.is_finite() {
            output.clamp(self.gains.command_min, self.gains.command_max)
        } else {
            self.gains.command_min
        }
    }

    /// Reset integrator and timing (called on every state transition).
    pub fn initialize(&mut self) {
        self.integral = 0.0;
        self.last_ms = None;
        self.terms = PidTerms::default();
    }

    /// Contributions of the last [`command`](Self::command) call.
    pub fn terms(&self) -> PidTerms {
        self.terms
    }
}
