use glam::Vec2;
use quadsim_shared::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::agent::Agent;
use crate::episode::{self, EpisodeClock};
use crate::physics::{self, Thrust};
use crate::sensor;
use crate::wind::WindModel;

/// One competitor and how it is wired into the arena.
pub struct PlayerSpec {
    pub agent: Box<dyn Agent>,
    /// Whether this player's observations pass through the sensor model.
    pub noisy_observations: bool,
    /// Ticks between agent decisions; the last action is held in between.
    pub control_period: u32,
}

impl PlayerSpec {
    pub fn new(agent: Box<dyn Agent>) -> Self {
        Self {
            agent,
            noisy_observations: false,
            control_period: 1,
        }
    }

    pub fn noisy(mut self, noisy: bool) -> Self {
        self.noisy_observations = noisy;
        self
    }

    pub fn with_control_period(mut self, period: u32) -> Self {
        self.control_period = period;
        self
    }
}

struct Player {
    spec: PlayerSpec,
    drone: DroneState,
    action: Action,
    captures: u32,
    deaths: u32,
    /// Remaining dead ticks; `None` while flying.
    respawn_in: Option<u32>,
}

impl Player {
    fn new(spec: PlayerSpec) -> Self {
        Self {
            spec,
            drone: DroneState::spawn(),
            action: Action::none(),
            captures: 0,
            deaths: 0,
            respawn_in: None,
        }
    }

    fn is_alive(&self) -> bool {
        self.respawn_in.is_none()
    }
}

/// Headless multi-drone game: every player chases the same fixed sequence of
/// targets under one shared wind field, one physics tick per frame.
pub struct Arena {
    config: ArenaConfig,
    targets: Vec<Vec2>,
    wind: WindModel,
    wind_rng: Pcg64,
    sensor_rng: Pcg64,
    clock: EpisodeClock,
    respawn_ticks: u32,
    players: Vec<Player>,
}

impl Arena {
    pub fn new(config: ArenaConfig, players: Vec<PlayerSpec>) -> SimResult<Self> {
        config.validate()?;
        if players.is_empty() {
            return Err(SimError::Configuration("arena needs at least one player".into()));
        }
        if let Some(p) = players.iter().find(|p| p.control_period == 0) {
            return Err(SimError::Configuration(format!(
                "control_period for '{}' must be >= 1",
                p.agent.name()
            )));
        }

        let mut root = Pcg64::seed_from_u64(config.seed);
        let mut target_rng = Pcg64::seed_from_u64(root.gen());
        let mut wind_rng = Pcg64::seed_from_u64(root.gen());
        let sensor_rng = Pcg64::seed_from_u64(root.gen());

        let targets = (0..config.target_count)
            .map(|_| episode::random_target_position(&mut target_rng))
            .collect();

        let mut wind = WindModel::new(config.wind);
        wind.sample_episode_wind(&mut wind_rng);

        let limit_ticks = (config.time_limit_secs * FPS as f32).round() as u32;
        let respawn_ticks = (config.respawn_secs * FPS as f32).round() as u32;

        let mut players: Vec<Player> = players.into_iter().map(Player::new).collect();
        for p in &mut players {
            p.spec.agent.reset();
        }

        Ok(Self {
            config,
            targets,
            wind,
            wind_rng,
            sensor_rng,
            clock: EpisodeClock::new(limit_ticks),
            respawn_ticks,
            players,
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn targets(&self) -> &[Vec2] {
        &self.targets
    }

    pub fn wind(&self) -> &WindState {
        self.wind.state()
    }

    pub fn tick(&self) -> u32 {
        self.clock.ticks()
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_expired()
    }

    /// Current target for a player; the sequence wraps once exhausted.
    fn target_for(&self, captures: u32) -> Vec2 {
        self.targets[captures as usize % self.targets.len()]
    }

    /// Advance the game by one frame. Returns `true` once the time limit passes.
    pub fn step(&mut self) -> bool {
        if self.is_finished() {
            return true;
        }
        self.clock.tick();
        let tick = self.clock.ticks();
        let wind = self.wind.update(&mut self.wind_rng);

        for i in 0..self.players.len() {
            let target = self.target_for(self.players[i].captures);
            let noise = self.config.sensor_noise;
            let respawn_ticks = self.respawn_ticks;
            let player = &mut self.players[i];

            if let Some(remaining) = player.respawn_in {
                if remaining == 0 {
                    player.respawn_in = None;
                    player.drone = DroneState::spawn();
                    player.action = Action::none();
                    player.spec.agent.reset();
                    tracing::debug!(player = player.spec.agent.name(), tick, "respawned");
                } else {
                    player.respawn_in = Some(remaining - 1);
                }
                continue;
            }

            if (tick - 1) % player.spec.control_period == 0 {
                let obs = if player.spec.noisy_observations {
                    sensor::observe(&player.drone, target, &noise, &mut self.sensor_rng)
                } else {
                    sensor::observe_clean(&player.drone, target)
                };
                player.action = player.spec.agent.act(&obs);
            }

            let thrust = Thrust::from_action(&player.action);
            physics::advance(&mut player.drone, thrust, wind);

            let distance = player.drone.position.distance(target);
            if distance < CAPTURE_RADIUS {
                player.captures += 1;
            } else if !distance.is_finite() || distance > CRASH_DISTANCE {
                player.deaths += 1;
                player.respawn_in = Some(respawn_ticks);
                tracing::debug!(player = player.spec.agent.name(), tick, "player lost");
            }
        }

        self.is_finished()
    }

    /// Play until the time limit and report the standings.
    pub fn run(mut self) -> ArenaResult {
        while !self.step() {}
        self.result()
    }

    pub fn result(&self) -> ArenaResult {
        let scores: Vec<PlayerScore> = self
            .players
            .iter()
            .map(|p| PlayerScore {
                name: p.spec.agent.name().to_string(),
                score: p.captures,
                deaths: p.deaths,
            })
            .collect();

        let mut winner = 0;
        for (i, s) in scores.iter().enumerate() {
            if s.score > scores[winner].score {
                winner = i;
            }
        }

        ArenaResult {
            scores,
            winner,
            final_tick: self.clock.ticks(),
        }
    }

    pub fn is_alive(&self, player: usize) -> bool {
        self.players.get(player).map_or(false, Player::is_alive)
    }

    pub fn drone(&self, player: usize) -> Option<&DroneState> {
        self.players.get(player).map(|p| &p.drone)
    }
}
