use glam::Vec2;
use quadsim_shared::*;

/// Force produced by each rotor for one sub-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thrust {
    pub left: f32,
    pub right: f32,
}

impl Thrust {
    /// Map a normalised action onto rotor forces: `collective` moves both rotors
    /// together, `differential` moves them apart.
    pub fn from_action(action: &Action) -> Self {
        let collective = action.collective * THRUSTER_AMPLITUDE;
        let differential = action.differential * DIFF_AMPLITUDE;
        Self {
            left: THRUSTER_MEAN + collective + differential,
            right: THRUSTER_MEAN + collective - differential,
        }
    }

    pub fn total(&self) -> f32 {
        self.left + self.right
    }
}

/// Advance the drone by one fixed sub-step using semi-implicit Euler.
///
/// `wind` is added straight to the linear acceleration; it exerts no torque.
pub fn advance(drone: &mut DroneState, thrust: Thrust, wind: Vec2) {
    let angle_rad = drone.angle.to_radians();
    let total = thrust.total();

    drone.acceleration = Vec2::new(
        -total * angle_rad.sin() / MASS,
        GRAVITY - total * angle_rad.cos() / MASS,
    ) + wind;
    drone.angular_acceleration = ARM * (thrust.right - thrust.left) / MASS;

    drone.velocity += drone.acceleration;
    drone.angular_velocity += drone.angular_acceleration;

    drone.position += drone.velocity;
    drone.angle += drone.angular_velocity;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cut_engines() -> Thrust {
        Thrust::from_action(&Action {
            collective: -1.0,
            differential: 0.0,
        })
    }

    #[test]
    fn test_neutral_action_hovers() {
        let mut drone = DroneState::spawn();
        let thrust = Thrust::from_action(&Action::none());
        assert!((thrust.total() - GRAVITY).abs() < 1e-7);

        for _ in 0..120 {
            advance(&mut drone, thrust, Vec2::ZERO);
        }
        assert!((drone.position - Vec2::new(SPAWN_X, SPAWN_Y)).length() < 1e-3);
        assert_eq!(drone.angle, 0.0);
    }

    #[test]
    fn test_free_fall_one_substep() {
        let mut drone = DroneState::spawn();
        advance(&mut drone, cut_engines(), Vec2::ZERO);

        assert_eq!(cut_engines().total(), 0.0);
        assert!((drone.acceleration.y - GRAVITY).abs() < 1e-7);
        assert!((drone.velocity.y - GRAVITY).abs() < 1e-7);
        assert!((drone.position.y - (SPAWN_Y + GRAVITY)).abs() < 1e-4);
        assert_eq!(drone.position.x, SPAWN_X);
    }

    #[test]
    fn test_semi_implicit_integration_order() {
        let mut drone = DroneState::spawn();
        advance(&mut drone, cut_engines(), Vec2::ZERO);
        advance(&mut drone, cut_engines(), Vec2::ZERO);
        // v1 = g, x1 = g; v2 = 2g, x2 = 3g
        assert!((drone.position.y - (SPAWN_Y + 3.0 * GRAVITY)).abs() < 1e-4);
    }

    #[test]
    fn test_differential_produces_torque() {
        let mut drone = DroneState::spawn();
        let thrust = Thrust::from_action(&Action {
            collective: 0.0,
            differential: 1.0,
        });
        assert!(thrust.left > thrust.right);
        advance(&mut drone, thrust, Vec2::ZERO);
        let expected = ARM * (-2.0 * DIFF_AMPLITUDE) / MASS;
        assert!((drone.angular_acceleration - expected).abs() < 1e-6);
        assert!(drone.angle < 0.0);
        // Collective is unchanged by the differential split
        assert!((thrust.total() - 2.0 * THRUSTER_MEAN).abs() < 1e-7);
    }

    #[test]
    fn test_tilt_drives_sideways() {
        let mut drone = DroneState {
            angle: 30.0,
            ..DroneState::spawn()
        };
        advance(&mut drone, Thrust::from_action(&Action::none()), Vec2::ZERO);
        // Positive angle leans the thrust vector toward -x
        assert!(drone.velocity.x < 0.0);
    }

    #[test]
    fn test_wind_adds_acceleration_without_torque() {
        let mut calm = DroneState::spawn();
        let mut windy = DroneState::spawn();
        let thrust = Thrust::from_action(&Action::none());
        let wind = Vec2::new(0.03, -0.01);

        advance(&mut calm, thrust, Vec2::ZERO);
        advance(&mut windy, thrust, wind);

        let delta = windy.acceleration - calm.acceleration;
        assert!((delta - wind).length() < 1e-7);
        assert_eq!(windy.angular_acceleration, calm.angular_acceleration);
        assert_eq!(windy.angle, calm.angle);
    }

    #[test]
    fn test_acceleration_reset_each_substep() {
        let mut drone = DroneState::spawn();
        advance(&mut drone, cut_engines(), Vec2::new(0.5, 0.5));
        advance(&mut drone, cut_engines(), Vec2::ZERO);
        assert!((drone.acceleration - Vec2::new(0.0, GRAVITY)).length() < 1e-7);
    }
}
