use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("environment must be reset before stepping")]
    NotReset,
    #[error("episode is finished; call reset() before stepping again")]
    EpisodeFinished,
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
}

pub type SimResult<T> = Result<T, SimError>;
