use thiserror::Error;

/// Errors raised by the exploration semantics. A state that simply does not
/// have the shape a rule looks for is never an error.
#[derive(Debug, Error)]
pub enum SemanticsError {
  #[error("Cannot compute jumpdests for section: {0}")]
  UnsupportedSection(String),

  #[error("Symbolic buffer width is not a concrete integer: {0}")]
  NonConcreteWidth(String),

  #[error("Invalid bytes token: {0}")]
  InvalidBytesToken(String),

  #[error("Missing cell: {0}")]
  MissingCell(String),

  #[error("Config error: {0}")]
  Config(#[from] serde_json::Error),

  #[error("IO error: {0}")]
  IOError(#[from] std::io::Error),

  #[error("Hex error: {0}")]
  Hex(#[from] hex::FromHexError),
}
