use glam::Vec2;
use quadsim_shared::*;
use rand::Rng;

/// Simulated time, counted in whole sub-steps so limits are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeClock {
    ticks: u32,
    limit_ticks: u32,
}

impl EpisodeClock {
    pub fn new(limit_ticks: u32) -> Self {
        Self {
            ticks: 0,
            limit_ticks,
        }
    }

    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn limit_ticks(&self) -> u32 {
        self.limit_ticks
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.ticks as f32 * DT
    }

    /// True from the tick that reaches the limit, so a 20 s episode is
    /// exactly 240 full steps.
    pub fn is_expired(&self) -> bool {
        self.ticks >= self.limit_ticks
    }
}

/// What happened during one sub-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubstepOutcome {
    pub reward: f32,
    pub distance: f32,
    pub captured: bool,
    pub termination: Option<Termination>,
}

/// Uniform integer position in [TARGET_MIN, TARGET_MAX)².
pub fn random_target_position<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.gen_range(TARGET_MIN..TARGET_MAX) as f32,
        rng.gen_range(TARGET_MIN..TARGET_MAX) as f32,
    )
}

/// Dense per-sub-step reward: survival bonus minus distance penalty.
pub fn shaping_reward(distance: f32) -> f32 {
    SURVIVAL_REWARD_PER_TICK - distance / DISTANCE_PENALTY_SCALE
}

/// Score one sub-step and apply its side effects on the target.
///
/// Capture is checked first and relocates the target; the time limit then
/// ends the episode without penalty, otherwise divergence past
/// `CRASH_DISTANCE` ends it with `CRASH_PENALTY`.
pub fn evaluate_substep<R: Rng + ?Sized>(
    drone: &DroneState,
    target: &mut TargetState,
    clock: &EpisodeClock,
    rng: &mut R,
) -> SubstepOutcome {
    let distance = drone.position.distance(target.position);
    let diverged = !drone.is_finite() || !distance.is_finite();
    let mut reward = if diverged {
        SURVIVAL_REWARD_PER_TICK
    } else {
        shaping_reward(distance)
    };

    let captured = !diverged && distance < CAPTURE_RADIUS;
    if captured {
        target.position = random_target_position(rng);
        target.captures += 1;
        reward += CAPTURE_REWARD;
        tracing::debug!(
            captures = target.captures,
            tick = clock.ticks(),
            next_x = target.position.x,
            next_y = target.position.y,
            "target captured"
        );
    }

    let termination = if clock.is_expired() {
        Some(Termination::TimeLimit)
    } else if diverged || distance > CRASH_DISTANCE {
        reward -= CRASH_PENALTY;
        Some(Termination::Crash)
    } else {
        None
    };

    SubstepOutcome {
        reward,
        distance,
        captured,
        termination,
    }
}
