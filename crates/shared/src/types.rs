use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::EnvConfig;
use crate::constants::*;
use crate::error::{SimError, SimResult};

/// Planar rigid-body state of the drone. Angles are in degrees, rates per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DroneState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Recomputed from scratch every sub-step.
    pub acceleration: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub angular_acceleration: f32,
}

impl DroneState {
    /// At rest, level, at the spawn point.
    pub fn spawn() -> Self {
        Self {
            position: Vec2::new(SPAWN_X, SPAWN_Y),
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
        }
    }

    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::spawn()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.angle.is_finite()
            && self.angular_velocity.is_finite()
    }
}

impl Default for DroneState {
    fn default() -> Self {
        Self::spawn()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    pub position: Vec2,
    /// Targets acquired so far this episode.
    pub captures: u32,
}

impl TargetState {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            captures: 0,
        }
    }
}

/// Current wind. `direction` is in radians within [0, 2π).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindState {
    pub direction: f32,
    pub speed: f32,
    /// Cartesian acceleration applied to the drone each sub-step.
    pub accel: Vec2,
}

impl WindState {
    pub fn calm() -> Self {
        Self::default()
    }

    pub fn from_polar(direction: f32, speed: f32) -> Self {
        Self {
            direction,
            speed,
            accel: Vec2::new(speed * direction.cos(), speed * direction.sin()),
        }
    }
}

/// Normalised control input. `collective` raises or lowers both rotors,
/// `differential` pushes the rotors apart to produce torque.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub collective: f32,
    pub differential: f32,
}

impl Action {
    pub fn none() -> Self {
        Self {
            collective: 0.0,
            differential: 0.0,
        }
    }

    /// Out-of-range components are clamped to [-1, 1].
    pub fn from_raw(raw: [f32; ACTION_SIZE]) -> Self {
        Self {
            collective: raw[0].clamp(-1.0, 1.0),
            differential: raw[1].clamp(-1.0, 1.0),
        }
    }

    /// Checked conversion for actions crossing a dynamic boundary.
    pub fn try_from_slice(raw: &[f32]) -> SimResult<Self> {
        if raw.len() != ACTION_SIZE {
            return Err(SimError::InvalidAction(format!(
                "action must have {} elements, got {}",
                ACTION_SIZE,
                raw.len()
            )));
        }
        if let Some(bad) = raw.iter().find(|v| !v.is_finite()) {
            return Err(SimError::InvalidAction(format!(
                "action components must be finite, got {bad}"
            )));
        }
        Ok(Self::from_raw([raw[0], raw[1]]))
    }

    pub fn to_raw(&self) -> [f32; ACTION_SIZE] {
        [self.collective, self.differential]
    }

    pub fn is_finite(&self) -> bool {
        self.collective.is_finite() && self.differential.is_finite()
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::none()
    }
}

/// The 7-channel observation vector fed to agents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub data: [f32; OBS_SIZE],
}

impl Observation {
    pub const ANGLE_TO_UP: usize = 0;
    pub const SPEED: usize = 1;
    pub const ANGULAR_VELOCITY: usize = 2;
    pub const DISTANCE_TO_TARGET: usize = 3;
    pub const ANGLE_TO_TARGET: usize = 4;
    pub const ANGLE_TARGET_VELOCITY: usize = 5;
    /// Duplicate of `DISTANCE_TO_TARGET`, kept for trained-policy input compatibility.
    pub const DISTANCE_TO_TARGET_DUP: usize = 6;

    pub fn zeros() -> Self {
        Self {
            data: [0.0; OBS_SIZE],
        }
    }

    pub fn angle_to_up(&self) -> f32 {
        self.data[Self::ANGLE_TO_UP]
    }

    pub fn speed(&self) -> f32 {
        self.data[Self::SPEED]
    }

    pub fn angular_velocity(&self) -> f32 {
        self.data[Self::ANGULAR_VELOCITY]
    }

    /// Distance to target divided by `OBS_DISTANCE_SCALE`.
    pub fn distance_to_target(&self) -> f32 {
        self.data[Self::DISTANCE_TO_TARGET]
    }

    pub fn angle_to_target(&self) -> f32 {
        self.data[Self::ANGLE_TO_TARGET]
    }

    pub fn angle_target_velocity(&self) -> f32 {
        self.data[Self::ANGLE_TARGET_VELOCITY]
    }
}

impl serde::Serialize for Observation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.as_slice().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Observation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v: Vec<f32> = Vec::deserialize(deserializer)?;
        if v.len() != OBS_SIZE {
            return Err(serde::de::Error::custom(format!(
                "expected {} floats, got {}",
                OBS_SIZE,
                v.len()
            )));
        }
        let mut data = [0.0f32; OBS_SIZE];
        data.copy_from_slice(&v);
        Ok(Observation { data })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    TimeLimit,
    Crash,
}

/// Diagnostics returned alongside every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub captures: u32,
    pub captured_this_step: u32,
    pub elapsed_secs: f32,
    pub distance_to_target: f32,
    pub wind: WindState,
    pub termination: Option<Termination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DroneSnapshot {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

impl From<&DroneState> for DroneSnapshot {
    fn from(s: &DroneState) -> Self {
        Self {
            x: s.position.x,
            y: s.position.y,
            angle: s.angle,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub x: f32,
    pub y: f32,
    pub captures: u32,
}

impl From<&TargetState> for TargetSnapshot {
    fn from(t: &TargetState) -> Self {
        Self {
            x: t.position.x,
            y: t.position.y,
            captures: t.captures,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub tick: u32,
    pub drone: DroneSnapshot,
    pub target: TargetSnapshot,
    pub wind_ax: f32,
    pub wind_ay: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub total_reward: f32,
    pub steps: u32,
    pub final_tick: u32,
    pub captures: u32,
    pub termination: Option<Termination>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeReplay {
    pub seed: u64,
    pub agent: String,
    pub config: EnvConfig,
    pub frames: Vec<ReplayFrame>,
    pub result: EpisodeResult,
}

/// Final standing of one arena player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerScore {
    pub name: String,
    /// Targets collected.
    pub score: u32,
    pub deaths: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaResult {
    pub scores: Vec<PlayerScore>,
    /// Index into `scores`; the earliest player wins ties.
    pub winner: usize,
    pub final_tick: u32,
}

impl ArenaResult {
    pub fn winner_name(&self) -> &str {
        self.scores.get(self.winner).map_or("", |s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_clamps_out_of_range() {
        let action = Action::from_raw([3.0, -7.5]);
        assert_eq!(action.collective, 1.0);
        assert_eq!(action.differential, -1.0);
    }

    #[test]
    fn test_action_rejects_nan_and_wrong_arity() {
        assert!(matches!(
            Action::try_from_slice(&[f32::NAN, 0.0]),
            Err(SimError::InvalidAction(_))
        ));
        assert!(matches!(
            Action::try_from_slice(&[0.0, f32::INFINITY]),
            Err(SimError::InvalidAction(_))
        ));
        assert!(Action::try_from_slice(&[0.0]).is_err());
        assert!(Action::try_from_slice(&[0.0, 0.0, 0.0]).is_err());
        let ok = Action::try_from_slice(&[0.5, 2.0]).unwrap();
        assert_eq!(ok.to_raw(), [0.5, 1.0]);
    }

    #[test]
    fn test_wind_from_polar() {
        let w = WindState::from_polar(std::f32::consts::FRAC_PI_2, 0.02);
        assert!(w.accel.x.abs() < 1e-6);
        assert!((w.accel.y - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_observation_serde_length_checked() {
        let obs = Observation {
            data: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 4.0],
        };
        let json = serde_json::to_string(&obs).unwrap();
        let back: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obs);
        assert!(serde_json::from_str::<Observation>("[1.0, 2.0]").is_err());
    }
}
