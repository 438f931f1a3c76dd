//! Error types for the quiz core and for result persistence.

use thiserror::Error;

/// Which side of the real/synthetic split a pool ran short on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TruthClass {
  Real,
  Synthetic,
}

impl std::fmt::Display for TruthClass {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TruthClass::Real => f.write_str("real"),
      TruthClass::Synthetic => f.write_str("synthetic"),
    }
  }
}

/// Failures raised by the sampling, session and scoring core.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuizError {
  #[error("unknown image category: {category:?}")]
  UnknownCategory { category: String },

  #[error("category {category:?} is configured as both real and synthetic")]
  AmbiguousCategory { category: String },

  #[error("not enough {class} images: requested {requested}, available {available}")]
  InsufficientPool { class: TruthClass, requested: usize, available: usize },

  #[error("session is already complete; no further answers accepted")]
  SessionAlreadyComplete,

  #[error("session is complete; there is no current item")]
  SessionComplete,

  #[error("session is not complete: {answered} of {total} items answered")]
  SessionIncomplete { answered: usize, total: usize },

  #[error("cannot evaluate an empty session")]
  EmptySession,

  #[error("invalid participant: {0}")]
  InvalidParticipant(String),
}

pub type QuizResult<T> = std::result::Result<T, QuizError>;

/// Failures from a `ResultSink`. Callers treat these as non-fatal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("remote sheet returned HTTP {status}: {body}")]
  Status { status: u16, body: String },

  #[error("malformed stored row: {0}")]
  MalformedRow(String),

  #[error("blocking file task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}
