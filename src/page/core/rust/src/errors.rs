/* src/page/core/rust/src/errors.rs */

use thiserror::Error;

pub type PageResult<T> = Result<T, PageError>;

#[derive(Debug, Error)]
pub enum PageError {
  /// Malformed page configuration, fatal to page construction.
  #[error("invalid page configuration: {0}")]
  Configuration(String),

  /// A read or write request failed at the remote call boundary.
  #[error("{code}: {message}")]
  Remote { code: String, message: String },

  /// A dialog could not be opened or was torn down before closing.
  #[error("dialog failed: {0}")]
  Dialog(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl PageError {
  pub fn configuration(msg: impl Into<String>) -> Self {
    Self::Configuration(msg.into())
  }

  pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Remote { code: code.into(), message: message.into() }
  }

  pub fn dialog(msg: impl Into<String>) -> Self {
    Self::Dialog(msg.into())
  }

  pub fn code(&self) -> &str {
    match self {
      Self::Configuration(_) => "CONFIGURATION_ERROR",
      Self::Remote { code, .. } => code,
      Self::Dialog(_) => "DIALOG_ERROR",
      Self::Serialization(_) => "SERIALIZATION_ERROR",
    }
  }

  pub fn message(&self) -> String {
    match self {
      Self::Remote { message, .. } => message.clone(),
      other => other.to_string(),
    }
  }
}
