/// Failures of the AI translation step. None of these reach the user as a
/// fatal error; the planner falls back to pattern matching on every variant.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("no API key configured")]
    NotConfigured,

    #[error("the model returned no content")]
    NoResponse,

    #[error("the model reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("the model reply is not a JSON array")]
    InvalidFormat,

    #[error("command #{index} is missing a valid `{field}` field")]
    InvalidStructure { index: usize, field: &'static str },

    #[error("API quota exceeded; check your plan and billing details")]
    QuotaExceeded,

    #[error("the API key was rejected; check your credentials")]
    InvalidCredential,

    #[error("AI request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Request(err.to_string())
    }
}

/// Session-level failures. Only raised when the terminal itself is unusable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
