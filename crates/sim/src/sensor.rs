use glam::Vec2;
use quadsim_shared::*;
use rand::Rng;
use rand_distr::StandardNormal;

/// Noise-free 7-channel observation of the drone relative to its target.
pub fn observe_clean(drone: &DroneState, target: Vec2) -> Observation {
    let to_target = target - drone.position;
    let distance = to_target.length() / OBS_DISTANCE_SCALE;
    let angle_to_target = f32::atan2(to_target.y, to_target.x);
    let velocity_heading = f32::atan2(drone.velocity.y, drone.velocity.x);

    Observation {
        data: [
            drone.angle.to_radians(),
            drone.velocity.length(),
            drone.angular_velocity,
            distance,
            angle_to_target,
            // Not wrapped: trained policies saw the raw difference in [-2π, 2π]
            angle_to_target - velocity_heading,
            distance,
        ],
    }
}

/// Observation with i.i.d. additive Gaussian noise when `noise.enabled`.
/// Draws exactly `OBS_SIZE` samples from `rng` when noisy and none otherwise.
pub fn observe<R: Rng + ?Sized>(
    drone: &DroneState,
    target: Vec2,
    noise: &SensorNoiseConfig,
    rng: &mut R,
) -> Observation {
    let mut obs = observe_clean(drone, target);
    if noise.enabled {
        for (value, std) in obs.data.iter_mut().zip(noise.std.iter()) {
            let z: f32 = rng.sample(StandardNormal);
            *value += z * std;
        }
    }
    obs
}
