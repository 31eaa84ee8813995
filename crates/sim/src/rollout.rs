use quadsim_shared::*;

use crate::agent::Agent;
use crate::env::DroneEnv;
use crate::render::FrameRecorder;

/// Run one episode of `agent` and record it as a replay.
///
/// Frames come from the render hook every `FRAME_INTERVAL` sub-steps, plus
/// the initial and final states. `max_steps` caps agent decisions, which
/// matters only in mouse-target mode where the time limit is very long.
pub fn run_episode(
    config: &EnvConfig,
    seed: u64,
    agent: &mut dyn Agent,
    max_steps: u32,
) -> SimResult<EpisodeReplay> {
    let recording = EnvConfig {
        render_every_frame: true,
        ..*config
    };
    let mut env = DroneEnv::with_renderer(recording, seed, FrameRecorder::new(FRAME_INTERVAL))?;
    agent.reset();

    let mut obs = env.reset();
    let initial = env.snapshot();
    env.renderer_mut().push(initial);

    let mut total_reward = 0.0;
    let mut steps = 0;
    let mut termination = None;

    while steps < max_steps {
        let action = agent.act(&obs);
        let result = env.step(action)?;
        total_reward += result.reward;
        steps += 1;
        obs = result.observation;

        if result.done {
            termination = result.info.termination;
            break;
        }
    }

    let final_frame = env.snapshot();
    let captures = env.target().captures;
    let final_tick = env.clock().ticks();
    let mut frames = env.into_renderer().into_frames();
    if frames.last().map(|f| f.tick) != Some(final_tick) {
        frames.push(final_frame);
    }

    tracing::debug!(
        seed,
        agent = agent.name(),
        total_reward,
        captures,
        ?termination,
        "episode complete"
    );

    Ok(EpisodeReplay {
        seed,
        agent: agent.name().to_string(),
        config: *config,
        frames,
        result: EpisodeResult {
            total_reward,
            steps,
            final_tick,
            captures,
            termination,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::HoverAgent;
    use crate::agents::PidAgent;

    #[test]
    fn test_episode_completes() {
        let mut agent = HoverAgent;
        let replay = run_episode(&EnvConfig::default(), 7, &mut agent, u32::MAX).unwrap();

        assert!(replay.result.termination.is_some());
        assert!(replay.result.final_tick <= EnvConfig::default().time_limit_ticks());
        assert_eq!(replay.agent, "hover");
        assert!(!replay.config.render_every_frame);
    }

    #[test]
    fn test_episode_records_frames() {
        let mut agent = HoverAgent;
        let replay = run_episode(&EnvConfig::nominal(), 0, &mut agent, 24).unwrap();

        // 24 steps = 120 sub-steps = 60 recorded frames + initial
        assert_eq!(replay.result.steps, 24);
        assert_eq!(replay.result.termination, None);
        assert_eq!(replay.frames.len(), 61);
        assert_eq!(replay.frames[0].tick, 0);
        assert_eq!(replay.frames.last().unwrap().tick, 120);
        assert!(replay.frames.windows(2).all(|w| w[0].tick < w[1].tick));
    }

    #[test]
    fn test_pid_collects_targets_without_wind() {
        for seed in 0..5 {
            let mut agent = PidAgent::new();
            let replay = run_episode(&EnvConfig::nominal(), seed, &mut agent, u32::MAX).unwrap();
            let result = replay.result;
            assert_eq!(
                result.termination,
                Some(Termination::TimeLimit),
                "seed {seed}: pid crashed at tick {}",
                result.final_tick
            );
            assert!(result.captures >= 2, "seed {seed}: only {} captures", result.captures);
            assert!(result.total_reward > 200.0, "seed {seed}: reward {}", result.total_reward);
        }
    }

    #[test]
    fn test_pid_beats_hover() {
        let mut pid = PidAgent::new();
        let mut hover = HoverAgent;
        let a = run_episode(&EnvConfig::nominal(), 42, &mut pid, u32::MAX).unwrap();
        let b = run_episode(&EnvConfig::nominal(), 42, &mut hover, u32::MAX).unwrap();
        assert!(a.result.total_reward > b.result.total_reward);
    }
}
