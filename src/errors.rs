/// Domain-specific error types for the simulator.
/// Every failure is returned to the immediate caller. Nothing is retried:
/// the core is deterministic, so the same bad input fails the same way.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("price feed error: {0}")]
    Feed(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SimError {
    fn from(e: reqwest::Error) -> Self {
        SimError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Parse(e.to_string())
    }
}

impl From<csv::Error> for SimError {
    fn from(e: csv::Error) -> Self {
        SimError::Parse(e.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
