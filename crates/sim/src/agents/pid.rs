use glam::Vec2;
use quadsim_shared::*;

use crate::agent::Agent;
use crate::agents::flight::FlightState;

// Outer loop: desired acceleration from position/velocity error.
const POSITION_GAIN: f32 = 0.0004;
const VELOCITY_GAIN: f32 = 0.04;
const INTEGRAL_GAIN: f32 = 0.000005;
const INTEGRAL_LIMIT: f32 = 0.05;
// Inner loop: tilt tracking through differential thrust.
const MAX_TILT_DEG: f32 = 25.0;
const TILT_GAIN: f32 = 0.04;
const TILT_RATE_GAIN: f32 = 0.9;
const MIN_COS_TILT: f32 = 0.3;

/// Cascaded PID controller. Tracks the target through a tilt set-point on the
/// horizontal axis and collective thrust on the vertical axis. The integral
/// term soaks up steady wind, which the observation does not expose.
#[derive(Debug, Clone, Default)]
pub struct PidAgent {
    integral: Vec2,
}

impl PidAgent {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Agent for PidAgent {
    fn name(&self) -> &str {
        "pid"
    }

    fn act(&mut self, obs: &Observation) -> Action {
        let s = FlightState::from_observation(obs);

        self.integral = (self.integral + s.error * INTEGRAL_GAIN)
            .clamp(Vec2::splat(-INTEGRAL_LIMIT), Vec2::splat(INTEGRAL_LIMIT));
        let desired = s.error * POSITION_GAIN - s.velocity * VELOCITY_GAIN + self.integral;

        // Positive tilt pushes toward -x, so a rightward demand needs a negative set-point
        let tilt_setpoint = (-(desired.x / GRAVITY).atan().to_degrees())
            .clamp(-MAX_TILT_DEG, MAX_TILT_DEG);
        let differential =
            TILT_GAIN * (s.angle_deg - tilt_setpoint) + TILT_RATE_GAIN * s.angular_velocity;

        // Solve GRAVITY - T cos(tilt) = desired.y for the collective command
        let cos_tilt = s.angle_deg.to_radians().cos().max(MIN_COS_TILT);
        let total_thrust = (GRAVITY - desired.y) / cos_tilt;
        let collective = total_thrust / (2.0 * THRUSTER_AMPLITUDE) - THRUSTER_MEAN / THRUSTER_AMPLITUDE;

        let action = Action::from_raw([collective, differential]);
        if action.is_finite() {
            action
        } else {
            Action::none()
        }
    }

    fn reset(&mut self) {
        self.integral = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::observe_clean;

    fn level_drone() -> DroneState {
        DroneState::spawn()
    }

    #[test]
    fn test_target_right_tilts_right() {
        let mut agent = PidAgent::new();
        let obs = observe_clean(&level_drone(), Vec2::new(550.0, 400.0));
        let action = agent.act(&obs);
        // Positive differential lowers the angle, tilting thrust toward +x
        assert!(action.differential > 0.0);
    }

    #[test]
    fn test_target_above_climbs() {
        let mut agent = PidAgent::new();
        let obs = observe_clean(&level_drone(), Vec2::new(400.0, 250.0));
        let action = agent.act(&obs);
        assert!(action.collective > 0.0);
        assert!(action.differential.abs() < 1e-3);
    }

    #[test]
    fn test_on_target_at_rest_hovers() {
        let mut agent = PidAgent::new();
        let obs = observe_clean(&level_drone(), Vec2::new(400.0, 400.0));
        let action = agent.act(&obs);
        assert!(action.collective.abs() < 1e-4);
        assert!(action.differential.abs() < 1e-4);
    }

    #[test]
    fn test_reset_clears_integral() {
        let mut agent = PidAgent::new();
        let obs = observe_clean(&level_drone(), Vec2::new(600.0, 200.0));
        let first = agent.act(&obs);
        for _ in 0..50 {
            agent.act(&obs);
        }
        agent.reset();
        assert_eq!(agent.act(&obs), first);
    }
}
