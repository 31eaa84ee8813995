use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{SimError, SimResult};

/// Per-episode wind randomisation and intra-episode random walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    pub enabled: bool,
    pub dir_min_deg: f32,
    pub dir_max_deg: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    /// Sub-steps between random-walk perturbations.
    pub update_every: u32,
    pub dir_rw_std_deg: f32,
    pub speed_rw_std: f32,
}

impl WindConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        let finite = [
            ("dir_min_deg", self.dir_min_deg),
            ("dir_max_deg", self.dir_max_deg),
            ("speed_min", self.speed_min),
            ("speed_max", self.speed_max),
            ("dir_rw_std_deg", self.dir_rw_std_deg),
            ("speed_rw_std", self.speed_rw_std),
        ];
        for (name, v) in finite {
            if !v.is_finite() {
                return Err(SimError::Configuration(format!("wind {name} must be finite, got {v}")));
            }
        }
        let spans = [
            ("dir", self.dir_max_deg - self.dir_min_deg),
            ("speed", self.speed_max - self.speed_min),
        ];
        for (name, span) in spans {
            if !span.is_finite() {
                return Err(SimError::Configuration(format!(
                    "wind {name} range width overflows f32"
                )));
            }
        }
        if self.dir_min_deg > self.dir_max_deg {
            return Err(SimError::Configuration(format!(
                "wind_dir_min_deg ({}) > wind_dir_max_deg ({})",
                self.dir_min_deg, self.dir_max_deg
            )));
        }
        if self.speed_min < 0.0 {
            return Err(SimError::Configuration(format!(
                "wind_speed_min must be >= 0, got {}",
                self.speed_min
            )));
        }
        if self.speed_min > self.speed_max {
            return Err(SimError::Configuration(format!(
                "wind_speed_min ({}) > wind_speed_max ({})",
                self.speed_min, self.speed_max
            )));
        }
        if self.update_every == 0 {
            return Err(SimError::Configuration("wind_update_every must be >= 1".into()));
        }
        if self.dir_rw_std_deg < 0.0 || self.speed_rw_std < 0.0 {
            return Err(SimError::Configuration(format!(
                "wind random-walk stds must be >= 0, got dir={} speed={}",
                self.dir_rw_std_deg, self.speed_rw_std
            )));
        }
        Ok(())
    }
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir_min_deg: WIND_DIR_MIN_DEG,
            dir_max_deg: WIND_DIR_MAX_DEG,
            speed_min: WIND_SPEED_MIN,
            speed_max: WIND_SPEED_MAX,
            update_every: WIND_UPDATE_EVERY,
            dir_rw_std_deg: WIND_DIR_RW_STD_DEG,
            speed_rw_std: WIND_SPEED_RW_STD,
        }
    }
}

/// Additive i.i.d. Gaussian noise on each observation channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorNoiseConfig {
    pub enabled: bool,
    pub std: [f32; OBS_SIZE],
}

impl SensorNoiseConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_std(std: [f32; OBS_SIZE]) -> Self {
        Self { enabled: true, std }
    }

    /// Build from a dynamically sized std vector (e.g. coming from Python).
    pub fn from_slice(enabled: bool, std: &[f32]) -> SimResult<Self> {
        let std: [f32; OBS_SIZE] = std.try_into().map_err(|_| {
            SimError::Configuration(format!(
                "sensor_noise_std must have {} elements, got {}",
                OBS_SIZE,
                std.len()
            ))
        })?;
        Ok(Self { enabled, std })
    }

    pub fn validate(&self) -> SimResult<()> {
        for (i, s) in self.std.iter().enumerate() {
            if !s.is_finite() || *s < 0.0 {
                return Err(SimError::Configuration(format!(
                    "sensor_noise_std[{i}] must be finite and >= 0, got {s}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SensorNoiseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            std: DEFAULT_SENSOR_NOISE_STD,
        }
    }
}

/// Construction options for a single drone environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub render_every_frame: bool,
    /// Target follows an external pointer; the time limit becomes effectively unbounded.
    pub mouse_target: bool,
    pub wind: WindConfig,
    pub sensor_noise: SensorNoiseConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            render_every_frame: false,
            mouse_target: false,
            wind: WindConfig::default(),
            sensor_noise: SensorNoiseConfig::default(),
        }
    }
}

impl EnvConfig {
    /// No wind, no sensor noise.
    pub fn nominal() -> Self {
        Self {
            wind: WindConfig::disabled(),
            sensor_noise: SensorNoiseConfig::disabled(),
            ..Self::default()
        }
    }

    /// Curriculum stage: 0 = light wind and clean sensors, 1 = medium wind and
    /// moderate noise, 2+ = the full noisy environment.
    pub fn curriculum(level: u32) -> Self {
        match level {
            0 => Self {
                wind: WindConfig {
                    speed_max: 0.01,
                    speed_rw_std: 0.002,
                    ..WindConfig::default()
                },
                sensor_noise: SensorNoiseConfig::disabled(),
                ..Self::default()
            },
            1 => Self {
                wind: WindConfig {
                    speed_max: 0.02,
                    ..WindConfig::default()
                },
                sensor_noise: SensorNoiseConfig::with_std([
                    0.005, 0.01, 0.005, 0.01, 0.005, 0.005, 0.01,
                ]),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    pub fn time_limit_secs(&self) -> f32 {
        if self.mouse_target {
            MOUSE_TIME_LIMIT_SECS
        } else {
            TIME_LIMIT_SECS
        }
    }

    /// Time limit expressed in physics sub-steps.
    pub fn time_limit_ticks(&self) -> u32 {
        (self.time_limit_secs() * FPS as f32).round() as u32
    }

    pub fn validate(&self) -> SimResult<()> {
        self.wind.validate()?;
        self.sensor_noise.validate()
    }
}

/// Headless multi-drone game settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub seed: u64,
    pub time_limit_secs: f32,
    pub respawn_secs: f32,
    pub target_count: usize,
    pub wind: WindConfig,
    pub sensor_noise: SensorNoiseConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            time_limit_secs: ARENA_TIME_LIMIT_SECS,
            respawn_secs: ARENA_RESPAWN_SECS,
            target_count: ARENA_TARGET_COUNT,
            wind: WindConfig {
                speed_min: ARENA_WIND_SPEED_MIN,
                speed_max: ARENA_WIND_SPEED_MAX,
                ..WindConfig::default()
            },
            sensor_noise: SensorNoiseConfig::default(),
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.time_limit_secs.is_finite() && self.time_limit_secs > 0.0) {
            return Err(SimError::Configuration(format!(
                "arena time_limit_secs must be > 0, got {}",
                self.time_limit_secs
            )));
        }
        if !(self.respawn_secs.is_finite() && self.respawn_secs >= 0.0) {
            return Err(SimError::Configuration(format!(
                "arena respawn_secs must be >= 0, got {}",
                self.respawn_secs
            )));
        }
        if self.target_count == 0 {
            return Err(SimError::Configuration("arena target_count must be >= 1".into()));
        }
        self.wind.validate()?;
        self.sensor_noise.validate()
    }
}
