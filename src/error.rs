use thiserror::Error;

/// Errors surfaced at the engine boundary (§6.4/§7). Empty-language and
/// invariant-violation failures are handled internally and never escape as
/// an `EngineError` — they either collapse to an empty match stream or, for
/// invariant breaches, panic in debug builds.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex_syntax::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
