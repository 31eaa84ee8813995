use quadsim_shared::{Action, Observation, SimError, SimResult};

use crate::agents::{PidAgent, RandomAgent};

pub trait Agent: Send {
    fn name(&self) -> &str;
    fn act(&mut self, obs: &Observation) -> Action;

    /// Clear per-episode controller state. Stateless agents ignore this.
    fn reset(&mut self) {}
}

/// Agent that leaves both rotors at the hover set-point - useful for testing.
pub struct HoverAgent;

impl Agent for HoverAgent {
    fn name(&self) -> &str {
        "hover"
    }

    fn act(&mut self, _obs: &Observation) -> Action {
        Action::none()
    }
}

pub const AGENT_NAMES: [&str; 3] = ["hover", "pid", "random"];

/// Look up a built-in agent by name. `seed` only matters for stochastic agents.
pub fn resolve_agent(name: &str, seed: u64) -> SimResult<Box<dyn Agent>> {
    match name {
        "hover" => Ok(Box::new(HoverAgent)),
        "pid" => Ok(Box::new(PidAgent::new())),
        "random" => Ok(Box::new(RandomAgent::new(seed))),
        other => Err(SimError::UnknownAgent(format!(
            "'{}'. Valid options: {}",
            other,
            AGENT_NAMES.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_agents() {
        for name in AGENT_NAMES {
            let agent = resolve_agent(name, 0).unwrap();
            assert_eq!(agent.name(), name);
        }
    }

    #[test]
    fn test_resolve_unknown_agent() {
        let err = resolve_agent("ace", 0).err().unwrap();
        assert!(matches!(err, SimError::UnknownAgent(ref msg) if msg.contains("ace")));
    }

    #[test]
    fn test_hover_agent_is_neutral() {
        let mut agent = HoverAgent;
        assert_eq!(agent.act(&Observation::zeros()), Action::none());
    }
}
