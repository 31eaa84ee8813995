use glam::Vec2;
use quadsim_shared::*;
use rand::Rng;
use rand_distr::StandardNormal;
use std::f32::consts::TAU;

/// Wind for one simulation context: randomised per episode, then drifting by
/// a bounded random walk every `update_every` sub-steps.
#[derive(Debug, Clone)]
pub struct WindModel {
    config: WindConfig,
    state: WindState,
    step_counter: u32,
}

impl WindModel {
    pub fn new(config: WindConfig) -> Self {
        Self {
            config,
            state: WindState::calm(),
            step_counter: 0,
        }
    }

    pub fn config(&self) -> &WindConfig {
        &self.config
    }

    pub fn state(&self) -> &WindState {
        &self.state
    }

    /// Acceleration the wind currently exerts; exactly zero when disabled.
    pub fn accel(&self) -> Vec2 {
        if self.config.enabled {
            self.state.accel
        } else {
            Vec2::ZERO
        }
    }

    /// Draw a fresh "weather" for a new episode.
    pub fn sample_episode_wind<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.step_counter = 0;
        if !self.config.enabled {
            self.state = WindState::calm();
            return;
        }

        let dir_deg = rng.gen_range(self.config.dir_min_deg..=self.config.dir_max_deg);
        let speed = rng.gen_range(self.config.speed_min..=self.config.speed_max);
        self.state = WindState::from_polar(wrap_direction(dir_deg.to_radians()), speed);

        tracing::debug!(
            direction_deg = dir_deg,
            speed,
            "sampled episode wind"
        );
    }

    /// Advance the internal sub-step counter and perturb the wind on update
    /// boundaries. Returns the acceleration to apply this sub-step.
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec2 {
        if !self.config.enabled {
            return Vec2::ZERO;
        }

        self.step_counter += 1;
        if self.step_counter % self.config.update_every != 0 {
            return self.state.accel;
        }

        let dir_noise: f32 = rng.sample(StandardNormal);
        let speed_noise: f32 = rng.sample(StandardNormal);

        let direction =
            wrap_direction(self.state.direction + (dir_noise * self.config.dir_rw_std_deg).to_radians());
        let speed = (self.state.speed + speed_noise * self.config.speed_rw_std)
            .clamp(self.config.speed_min, self.config.speed_max);
        self.state = WindState::from_polar(direction, speed);

        tracing::trace!(
            counter = self.step_counter,
            direction = self.state.direction,
            speed = self.state.speed,
            "wind random-walk update"
        );

        self.state.accel
    }
}

/// Wrap an angle into [0, 2π).
fn wrap_direction(rad: f32) -> f32 {
    let wrapped = rad.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
