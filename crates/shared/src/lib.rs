mod config;
mod constants;
mod error;
mod types;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use types::*;
