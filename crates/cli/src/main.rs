use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use quadsim_shared::*;
use quadsim_sim::{resolve_agent, run_episode, Arena, PlayerSpec, AGENT_NAMES};

#[derive(Parser)]
#[command(name = "quadsim", about = "Quadcopter target-reaching simulator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single episode and print its result
    Run {
        /// Agent name (hover, pid, random)
        #[arg(long, default_value = "pid")]
        agent: String,

        /// Random seed for the episode
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Curriculum level (0 = light wind, 1 = medium, 2 = full noise)
        #[arg(long, conflicts_with = "config")]
        level: Option<u32>,

        /// EnvConfig JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Cap on agent decisions
        #[arg(long, default_value_t = u32::MAX)]
        max_steps: u32,

        /// Output path for replay JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Evaluate an agent over many seeded episodes in parallel
    Evaluate {
        #[arg(long, default_value = "pid")]
        agent: String,

        /// Number of episodes; episode i uses seed + i
        #[arg(long, default_value_t = 50)]
        episodes: u32,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, conflicts_with = "config")]
        level: Option<u32>,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Play the multi-drone balloon game
    Arena {
        /// Comma-separated players, each `name` or `name:noisy`
        #[arg(long, default_value = "pid,pid:noisy,random")]
        players: String,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Game length in seconds
        #[arg(long)]
        time_limit: Option<f32>,

        /// Ticks between agent decisions
        #[arg(long, default_value_t = 1)]
        control_period: u32,

        /// ArenaConfig JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            agent,
            seed,
            level,
            config,
            max_steps,
            output,
        } => cmd_run(&agent, seed, load_env_config(level, config.as_deref()), max_steps, output),

        Commands::Evaluate {
            agent,
            episodes,
            seed,
            level,
            config,
        } => cmd_evaluate(&agent, episodes, seed, load_env_config(level, config.as_deref())),

        Commands::Arena {
            players,
            seed,
            time_limit,
            control_period,
            config,
        } => {
            let mut arena_config = match config {
                Some(path) => read_json::<ArenaConfig>(&path),
                None => ArenaConfig::default(),
            };
            arena_config.seed = seed;
            if let Some(secs) = time_limit {
                arena_config.time_limit_secs = secs;
            }
            cmd_arena(&players, control_period, arena_config)
        }
    }
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("cannot read {}: {}", path.display(), e)));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| fail(format!("invalid config {}: {}", path.display(), e)))
}

/// JSON file wins, then the curriculum level, then the full noisy defaults.
fn load_env_config(level: Option<u32>, path: Option<&Path>) -> EnvConfig {
    let config = match (path, level) {
        (Some(path), _) => read_json::<EnvConfig>(path),
        (None, Some(level)) => EnvConfig::curriculum(level),
        (None, None) => EnvConfig::default(),
    };
    if let Err(e) = config.validate() {
        fail(e);
    }
    config
}

fn cmd_run(agent_name: &str, seed: u64, config: EnvConfig, max_steps: u32, output: Option<PathBuf>) {
    let mut agent = resolve_agent(agent_name, seed).unwrap_or_else(|e| fail(e));

    println!("Running episode: {} (seed={})", agent.name(), seed);

    let replay = run_episode(&config, seed, agent.as_mut(), max_steps).unwrap_or_else(|e| fail(e));
    let result = &replay.result;

    println!();
    println!("=== Episode Result ===");
    println!("Termination: {:?}", result.termination);
    println!("Final tick:  {} ({:.1}s)", result.final_tick, result.final_tick as f32 * DT);
    println!("Steps:       {}", result.steps);
    println!("Captures:    {}", result.captures);
    println!("Reward:      {:.2}", result.total_reward);

    if let Some(path) = output {
        match serde_json::to_string_pretty(&replay) {
            Ok(json) => match std::fs::write(&path, json) {
                Ok(()) => println!("\nReplay written to {}", path.display()),
                Err(e) => eprintln!("\nFailed to write replay: {}", e),
            },
            Err(e) => eprintln!("\nFailed to serialize replay: {}", e),
        }
    }
}

struct EpisodeStats {
    reward: f32,
    captures: u32,
    crashed: bool,
}

fn cmd_evaluate(agent_name: &str, episodes: u32, seed: u64, config: EnvConfig) {
    if episodes == 0 {
        fail("--episodes must be >= 1");
    }
    if let Err(e) = resolve_agent(agent_name, seed) {
        fail(e);
    }

    println!(
        "Evaluating {} over {} episodes (seeds {}..{})",
        agent_name,
        episodes,
        seed,
        episode_seed(seed, episodes)
    );

    let results: Result<Vec<EpisodeStats>, SimError> = (0..episodes)
        .into_par_iter()
        .map(|i| {
            let episode_seed = episode_seed(seed, i);
            let mut agent = resolve_agent(agent_name, episode_seed)?;
            let replay = run_episode(&config, episode_seed, agent.as_mut(), u32::MAX)?;
            Ok(EpisodeStats {
                reward: replay.result.total_reward,
                captures: replay.result.captures,
                crashed: replay.result.termination == Some(Termination::Crash),
            })
        })
        .collect();
    let stats = results.unwrap_or_else(|e| fail(e));
    tracing::info!(episodes = stats.len(), agent = agent_name, "evaluation complete");

    let n = stats.len() as f32;
    let mean = stats.iter().map(|s| s.reward).sum::<f32>() / n;
    let variance = stats.iter().map(|s| (s.reward - mean).powi(2)).sum::<f32>() / n;
    let mean_captures = stats.iter().map(|s| s.captures as f32).sum::<f32>() / n;
    let crash_rate = stats.iter().filter(|s| s.crashed).count() as f32 / n;

    println!();
    println!("=== Evaluation ===");
    println!("{:<16} {:>10}", "Metric", "Value");
    println!("{:-<16} {:-<10}", "", "");
    println!("{:<16} {:>10.2}", "mean reward", mean);
    println!("{:<16} {:>10.2}", "std reward", variance.sqrt());
    println!("{:<16} {:>10.2}", "mean captures", mean_captures);
    println!("{:<16} {:>9.1}%", "crash rate", crash_rate * 100.0);
    println!();
    println!("Verdict: {}", verdict(mean));
}

/// Seed for the i-th episode or player; wraps so any `--seed` is usable.
fn episode_seed(base: u64, i: u32) -> u64 {
    base.wrapping_add(i as u64)
}

fn verdict(mean_reward: f32) -> &'static str {
    if mean_reward > 500.0 {
        "excellent"
    } else if mean_reward > 0.0 {
        "good"
    } else {
        "insufficient"
    }
}

/// Parse `name` or `name:noisy`.
fn parse_player(entry: &str, seed: u64, control_period: u32) -> Result<PlayerSpec, SimError> {
    let (name, noisy) = match entry.split_once(':') {
        Some((name, "noisy")) => (name, true),
        Some((_, flag)) => {
            return Err(SimError::Configuration(format!(
                "unknown player flag '{}' (expected 'noisy')",
                flag
            )))
        }
        None => (entry, false),
    };
    let agent = resolve_agent(name, seed)?;
    Ok(PlayerSpec::new(agent)
        .noisy(noisy)
        .with_control_period(control_period))
}

fn cmd_arena(players_str: &str, control_period: u32, config: ArenaConfig) {
    let entries: Vec<&str> = players_str
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let players: Vec<PlayerSpec> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_player(entry, episode_seed(config.seed, i as u32), control_period))
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| fail(format!("{} (agents: {})", e, AGENT_NAMES.join(", "))));

    println!(
        "Arena: {} players, {:.0}s, seed={}",
        players.len(),
        config.time_limit_secs,
        config.seed
    );

    let arena = Arena::new(config, players).unwrap_or_else(|e| fail(e));
    let wind = *arena.wind();
    println!(
        "Wind: {:.1} deg, speed {:.4}",
        wind.direction.to_degrees(),
        wind.speed
    );

    let result = arena.run();

    println!();
    println!("=== Arena Scoreboard ===");
    println!("{:<4} {:<20} {:>8} {:>8}", "#", "Player", "Score", "Deaths");
    println!("{:-<4} {:-<20} {:-<8} {:-<8}", "", "", "", "");
    for (i, (entry, s)) in entries.iter().zip(result.scores.iter()).enumerate() {
        println!("{:<4} {:<20} {:>8} {:>8}", i, entry, s.score, s.deaths);
    }
    println!();
    println!("Winner is: {} (player {})", entries[result.winner], result.winner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(verdict(800.0), "excellent");
        assert_eq!(verdict(500.0), "good");
        assert_eq!(verdict(0.5), "good");
        assert_eq!(verdict(0.0), "insufficient");
        assert_eq!(verdict(-1200.0), "insufficient");
    }

    #[test]
    fn test_episode_seed_wraps_at_max() {
        assert_eq!(episode_seed(7, 3), 10);
        assert_eq!(episode_seed(u64::MAX, 0), u64::MAX);
        assert_eq!(episode_seed(u64::MAX, 1), 0);
        assert_eq!(episode_seed(u64::MAX - 1, 5), 3);
    }

    #[test]
    fn test_parse_player_flags() {
        let spec = parse_player("pid:noisy", 0, 3).unwrap();
        assert!(spec.noisy_observations);
        assert_eq!(spec.control_period, 3);
        assert_eq!(spec.agent.name(), "pid");

        let spec = parse_player("hover", 0, 1).unwrap();
        assert!(!spec.noisy_observations);

        assert!(matches!(
            parse_player("pid:loud", 0, 1),
            Err(SimError::Configuration(_))
        ));
        assert!(matches!(
            parse_player("ace", 0, 1),
            Err(SimError::UnknownAgent(_))
        ));
    }
}
