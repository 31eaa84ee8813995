pub mod agent;
pub mod agents;
pub mod arena;
pub mod env;
pub mod episode;
pub mod physics;
pub mod render;
pub mod rollout;
pub mod sensor;
pub mod wind;

pub use agent::*;
pub use arena::{Arena, PlayerSpec};
pub use env::*;
pub use render::*;
pub use rollout::*;
pub use wind::WindModel;
