use glam::Vec2;
use quadsim_shared::*;

/// Kinematic state recovered from the 7-channel observation.
/// Positions are relative to the drone, in world units (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    /// Body tilt in degrees, positive = rotated so thrust pushes toward -x.
    pub angle_deg: f32,
    /// Degrees per sub-step.
    pub angular_velocity: f32,
    pub velocity: Vec2,
    /// Vector from the drone to the target.
    pub error: Vec2,
    pub distance: f32,
}

impl FlightState {
    pub fn from_observation(obs: &Observation) -> Self {
        let distance = obs.distance_to_target() * OBS_DISTANCE_SCALE;
        let bearing = obs.angle_to_target();
        let error = Vec2::new(bearing.cos(), bearing.sin()) * distance;

        // angle_target_velocity = bearing - heading
        let heading = bearing - obs.angle_target_velocity();
        let velocity = Vec2::new(heading.cos(), heading.sin()) * obs.speed();

        Self {
            angle_deg: obs.angle_to_up().to_degrees(),
            angular_velocity: obs.angular_velocity(),
            velocity,
            error,
            distance,
        }
    }
}
