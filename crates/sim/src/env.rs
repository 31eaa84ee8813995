use glam::Vec2;
use quadsim_shared::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::episode::{self, EpisodeClock};
use crate::physics::{self, Thrust};
use crate::render::{NullRenderer, RenderMode, Renderer};
use crate::sensor;
use crate::wind::WindModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeStatus {
    Uninitialized,
    Running,
    Done,
}

/// Independent random streams so that, e.g., toggling sensor noise leaves
/// the wind and target sequences of a seed untouched.
#[derive(Debug, Clone)]
struct RngStreams {
    targets: Pcg64,
    wind: Pcg64,
    sensor: Pcg64,
}

impl RngStreams {
    fn from_seed(seed: u64) -> Self {
        let mut root = Pcg64::seed_from_u64(seed);
        Self {
            targets: Pcg64::seed_from_u64(root.gen()),
            wind: Pcg64::seed_from_u64(root.gen()),
            sensor: Pcg64::seed_from_u64(root.gen()),
        }
    }
}

/// Single-drone target-reaching environment.
///
/// Usage:
///     let mut env = DroneEnv::new(EnvConfig::default(), 42)?;
///     let obs = env.reset();
///     let result = env.step(Action::none())?;
pub struct DroneEnv<R: Renderer = NullRenderer> {
    config: EnvConfig,
    seed: u64,
    rngs: RngStreams,
    drone: DroneState,
    target: TargetState,
    wind: WindModel,
    clock: EpisodeClock,
    status: EpisodeStatus,
    pointer: Option<Vec2>,
    episode_reward: f32,
    renderer: R,
}

impl DroneEnv<NullRenderer> {
    pub fn new(config: EnvConfig, seed: u64) -> SimResult<Self> {
        Self::with_renderer(config, seed, NullRenderer)
    }
}

impl<R: Renderer> DroneEnv<R> {
    pub fn with_renderer(config: EnvConfig, seed: u64, renderer: R) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            seed,
            rngs: RngStreams::from_seed(seed),
            drone: DroneState::spawn(),
            target: TargetState::new(Vec2::new(SPAWN_X, SPAWN_Y)),
            wind: WindModel::new(config.wind),
            clock: EpisodeClock::new(config.time_limit_ticks()),
            status: EpisodeStatus::Uninitialized,
            pointer: None,
            episode_reward: 0.0,
            renderer,
        })
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    pub fn drone(&self) -> &DroneState {
        &self.drone
    }

    /// Direct state access for scenario setup and interactive tools.
    pub fn drone_mut(&mut self) -> &mut DroneState {
        &mut self.drone
    }

    pub fn target(&self) -> &TargetState {
        &self.target
    }

    pub fn set_target(&mut self, position: Vec2) {
        self.target.position = position;
    }

    pub fn wind(&self) -> &WindState {
        self.wind.state()
    }

    pub fn clock(&self) -> &EpisodeClock {
        &self.clock
    }

    /// Reward accumulated since the last reset.
    pub fn episode_reward(&self) -> f32 {
        self.episode_reward
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Latest pointer position; in mouse-target mode the target follows it
    /// every sub-step.
    pub fn set_pointer(&mut self, position: Vec2) {
        self.pointer = Some(position);
    }

    /// Swap the configuration used by subsequent resets (curriculum stages).
    pub fn set_config(&mut self, config: EnvConfig) -> SimResult<()> {
        config.validate()?;
        self.config = config;
        self.wind = WindModel::new(config.wind);
        self.clock = EpisodeClock::new(config.time_limit_ticks());
        self.status = EpisodeStatus::Uninitialized;
        Ok(())
    }

    /// Start a new episode, continuing the current random streams.
    pub fn reset(&mut self) -> Observation {
        self.drone = DroneState::spawn();
        self.target = TargetState::new(episode::random_target_position(&mut self.rngs.targets));
        self.clock = EpisodeClock::new(self.config.time_limit_ticks());
        self.episode_reward = 0.0;
        self.wind.sample_episode_wind(&mut self.rngs.wind);
        self.status = EpisodeStatus::Running;

        tracing::debug!(
            seed = self.seed,
            target_x = self.target.position.x,
            target_y = self.target.position.y,
            wind_speed = self.wind.state().speed,
            "episode reset"
        );

        self.observe()
    }

    /// Re-seed every random stream, then reset.
    pub fn reset_with_seed(&mut self, seed: u64) -> Observation {
        self.seed = seed;
        self.rngs = RngStreams::from_seed(seed);
        self.reset()
    }

    /// Current observation, with sensor noise if configured.
    pub fn observe(&mut self) -> Observation {
        sensor::observe(
            &self.drone,
            self.target.position,
            &self.config.sensor_noise,
            &mut self.rngs.sensor,
        )
    }

    /// Checked step for actions from a dynamic boundary (wrong arity or NaN is rejected).
    pub fn step_raw(&mut self, action: &[f32]) -> SimResult<StepResult> {
        let action = Action::try_from_slice(action)?;
        self.step(action)
    }

    /// Run `SUBSTEPS_PER_STEP` physics sub-steps with the same action.
    pub fn step(&mut self, action: Action) -> SimResult<StepResult> {
        match self.status {
            EpisodeStatus::Uninitialized => return Err(SimError::NotReset),
            EpisodeStatus::Done => return Err(SimError::EpisodeFinished),
            EpisodeStatus::Running => {}
        }
        if !action.is_finite() {
            return Err(SimError::InvalidAction(format!(
                "action components must be finite, got {:?}",
                action.to_raw()
            )));
        }

        let thrust = Thrust::from_action(&Action::from_raw(action.to_raw()));
        let captures_before = self.target.captures;
        let mut reward = 0.0f32;
        let mut distance = self.drone.position.distance(self.target.position);
        let mut termination = None;

        for _ in 0..SUBSTEPS_PER_STEP {
            self.clock.tick();

            if self.config.mouse_target {
                if let Some(pointer) = self.pointer {
                    self.target.position = pointer;
                }
            }

            let wind = self.wind.update(&mut self.rngs.wind);
            physics::advance(&mut self.drone, thrust, wind);

            let outcome = episode::evaluate_substep(
                &self.drone,
                &mut self.target,
                &self.clock,
                &mut self.rngs.targets,
            );
            reward += outcome.reward;
            distance = outcome.distance;

            if outcome.termination.is_some() {
                termination = outcome.termination;
                break;
            }

            if self.config.render_every_frame {
                self.render(RenderMode::Human);
            }
        }

        self.episode_reward += reward;
        let done = termination.is_some();
        if let Some(reason) = termination {
            self.status = EpisodeStatus::Done;
            tracing::debug!(
                ?reason,
                tick = self.clock.ticks(),
                captures = self.target.captures,
                episode_reward = self.episode_reward,
                "episode finished"
            );
        }

        let observation = self.observe();
        Ok(StepResult {
            observation,
            reward,
            done,
            info: StepInfo {
                captures: self.target.captures,
                captured_this_step: self.target.captures - captures_before,
                elapsed_secs: self.clock.elapsed_secs(),
                distance_to_target: distance,
                wind: *self.wind.state(),
                termination,
            },
        })
    }

    pub fn snapshot(&self) -> ReplayFrame {
        let accel = self.wind.accel();
        ReplayFrame {
            tick: self.clock.ticks(),
            drone: DroneSnapshot::from(&self.drone),
            target: TargetSnapshot::from(&self.target),
            wind_ax: accel.x,
            wind_ay: accel.y,
        }
    }

    /// Hand the current frame to the attached renderer. A `NullRenderer`
    /// makes this a no-op.
    pub fn render(&mut self, mode: RenderMode) {
        let frame = self.snapshot();
        self.renderer.render(&frame, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FrameRecorder;

    fn nominal_env(seed: u64) -> DroneEnv {
        DroneEnv::new(EnvConfig::nominal(), seed).unwrap()
    }

    #[test]
    fn test_step_before_reset_fails() {
        let mut env = nominal_env(0);
        assert_eq!(env.status(), EpisodeStatus::Uninitialized);
        assert_eq!(env.step(Action::none()).unwrap_err(), SimError::NotReset);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = EnvConfig::default();
        config.wind.speed_min = 1.0;
        config.wind.speed_max = 0.5;
        assert!(matches!(
            DroneEnv::new(config, 0),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn test_reset_initial_state() {
        let mut env = nominal_env(3);
        let obs = env.reset();
        assert_eq!(env.status(), EpisodeStatus::Running);
        assert_eq!(*env.drone(), DroneState::spawn());
        assert_eq!(env.target().captures, 0);
        assert_eq!(env.clock().ticks(), 0);
        let t = env.target().position;
        assert!((200.0..600.0).contains(&t.x) && (200.0..600.0).contains(&t.y));
        assert_eq!(obs.angle_to_up(), 0.0);
        assert_eq!(obs.speed(), 0.0);
    }

    #[test]
    fn test_step_advances_five_substeps() {
        let mut env = nominal_env(0);
        env.reset();
        let result = env.step(Action::none()).unwrap();
        assert_eq!(env.clock().ticks(), SUBSTEPS_PER_STEP);
        assert!((result.info.elapsed_secs - 5.0 / 60.0).abs() < 1e-6);
        assert!(!result.done);
    }

    #[test]
    fn test_nan_action_rejected_without_corrupting_state() {
        let mut env = nominal_env(0);
        env.reset();
        let before = *env.drone();
        let err = env.step_raw(&[f32::NAN, 0.0]).unwrap_err();
        assert!(matches!(err, SimError::InvalidAction(_)));
        let err = env
            .step(Action {
                collective: 0.0,
                differential: f32::NAN,
            })
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidAction(_)));
        assert_eq!(*env.drone(), before);
        assert_eq!(env.clock().ticks(), 0);
    }

    #[test]
    fn test_out_of_range_action_is_clamped() {
        let mut a = nominal_env(5);
        let mut b = nominal_env(5);
        a.reset();
        b.reset();
        let ra = a.step_raw(&[5.0, -3.0]).unwrap();
        let rb = b.step_raw(&[1.0, -1.0]).unwrap();
        assert_eq!(ra.observation, rb.observation);
        assert_eq!(ra.reward, rb.reward);
    }

    #[test]
    fn test_time_limit_ends_episode() {
        let mut env = nominal_env(1);
        env.reset();
        // Hover far from the capture radius so only the clock can end the episode
        env.set_target(Vec2::new(400.0, 520.0));
        let mut steps = 0;
        loop {
            let result = env.step(Action::none()).unwrap();
            steps += 1;
            if result.done {
                assert_eq!(result.info.termination, Some(Termination::TimeLimit));
                break;
            }
            assert!(steps < 1000, "episode should end by the time limit");
        }
        // The limit trips on tick 1200, the last sub-step of step 240
        assert_eq!(steps, 240);
        assert_eq!(env.clock().ticks(), 1200);
        assert_eq!(env.status(), EpisodeStatus::Done);
        assert_eq!(env.step(Action::none()).unwrap_err(), SimError::EpisodeFinished);
    }

    #[test]
    fn test_mouse_target_follows_pointer() {
        let config = EnvConfig {
            mouse_target: true,
            ..EnvConfig::nominal()
        };
        let mut env = DroneEnv::new(config, 0).unwrap();
        assert_eq!(env.clock().limit_ticks(), 60_000);
        env.reset();
        env.set_pointer(Vec2::new(700.0, 120.0));
        env.step(Action::none()).unwrap();
        assert_eq!(env.target().position, Vec2::new(700.0, 120.0));
    }

    #[test]
    fn test_render_every_frame_calls_hook() {
        let config = EnvConfig {
            render_every_frame: true,
            ..EnvConfig::nominal()
        };
        let mut env = DroneEnv::with_renderer(config, 0, FrameRecorder::new(1)).unwrap();
        env.reset();
        env.set_target(Vec2::new(400.0, 520.0));
        env.step(Action::none()).unwrap();
        let ticks: Vec<u32> = env.renderer().frames().iter().map(|f| f.tick).collect();
        assert_eq!(ticks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_render_disabled_skips_hook() {
        let mut env = DroneEnv::with_renderer(EnvConfig::nominal(), 0, FrameRecorder::new(1)).unwrap();
        env.reset();
        env.step(Action::none()).unwrap();
        assert!(env.renderer().frames().is_empty());
    }

    #[test]
    fn test_set_config_requires_reset() {
        let mut env = nominal_env(0);
        env.reset();
        env.set_config(EnvConfig::curriculum(1)).unwrap();
        assert_eq!(env.step(Action::none()).unwrap_err(), SimError::NotReset);
        env.reset();
        assert!(env.step(Action::none()).is_ok());
        assert!(env.set_config(EnvConfig {
            wind: WindConfig {
                update_every: 0,
                ..WindConfig::default()
            },
            ..EnvConfig::default()
        })
        .is_err());
    }

    #[test]
    fn test_episode_reward_accumulates_and_resets() {
        let mut env = nominal_env(2);
        env.reset();
        let mut total = 0.0;
        for _ in 0..4 {
            total += env.step(Action::none()).unwrap().reward;
        }
        assert_eq!(env.episode_reward(), total);
        env.reset();
        assert_eq!(env.episode_reward(), 0.0);
    }

    #[test]
    fn test_reset_with_seed_reproduces_targets() {
        let mut env = nominal_env(0);
        env.reset_with_seed(99);
        let first = env.target().position;
        env.reset();
        env.reset_with_seed(99);
        assert_eq!(env.target().position, first);
    }
}
