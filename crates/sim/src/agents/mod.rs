pub mod flight;
pub mod pid;
pub mod random;

pub use flight::FlightState;
pub use pid::PidAgent;
pub use random::RandomAgent;
