// Tick rate
pub const FPS: u32 = 60;
pub const DT: f32 = 1.0 / FPS as f32;
pub const SUBSTEPS_PER_STEP: u32 = 5;

// Episode
pub const TIME_LIMIT_SECS: f32 = 20.0;
pub const MOUSE_TIME_LIMIT_SECS: f32 = 1000.0;

// Arena (screen coordinates: X=right, Y=down)
pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 800.0;
pub const SPAWN_X: f32 = 400.0;
pub const SPAWN_Y: f32 = 400.0;
pub const TARGET_MIN: i32 = 200;
pub const TARGET_MAX: i32 = 600; // exclusive

// Drone
pub const GRAVITY: f32 = 0.08;
pub const THRUSTER_MEAN: f32 = 0.04;
pub const THRUSTER_AMPLITUDE: f32 = 0.04; // collective (lift) authority per rotor
pub const DIFF_AMPLITUDE: f32 = 0.003; // differential (torque) authority per rotor
pub const MASS: f32 = 1.0;
pub const ARM: f32 = 25.0;

// Target / termination
pub const CAPTURE_RADIUS: f32 = 50.0;
pub const CRASH_DISTANCE: f32 = 1000.0;

// Reward
pub const SURVIVAL_REWARD_PER_TICK: f32 = 1.0 / FPS as f32;
pub const DISTANCE_PENALTY_SCALE: f32 = 100.0 * FPS as f32;
pub const CAPTURE_REWARD: f32 = 100.0;
pub const CRASH_PENALTY: f32 = 1000.0;

// Observation
pub const OBS_SIZE: usize = 7;
pub const ACTION_SIZE: usize = 2;
pub const OBS_DISTANCE_SCALE: f32 = 500.0;
pub const DEFAULT_SENSOR_NOISE_STD: [f32; OBS_SIZE] = [0.01, 0.02, 0.01, 0.02, 0.01, 0.01, 0.02];

// Wind defaults (noisy training environment)
pub const WIND_DIR_MIN_DEG: f32 = 0.0;
pub const WIND_DIR_MAX_DEG: f32 = 360.0;
pub const WIND_SPEED_MIN: f32 = 0.0;
pub const WIND_SPEED_MAX: f32 = 0.04;
pub const WIND_UPDATE_EVERY: u32 = 30;
pub const WIND_DIR_RW_STD_DEG: f32 = 2.0;
pub const WIND_SPEED_RW_STD: f32 = 0.003;

// Multi-drone arena
pub const ARENA_TIME_LIMIT_SECS: f32 = 100.0;
pub const ARENA_RESPAWN_SECS: f32 = 3.0;
pub const ARENA_TARGET_COUNT: usize = 100;
pub const ARENA_WIND_SPEED_MIN: f32 = 0.01;
pub const ARENA_WIND_SPEED_MAX: f32 = 0.05;

// Replay recording
pub const FRAME_INTERVAL: u32 = 2; // every 2nd sub-step = 30fps
