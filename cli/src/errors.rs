use std::path::PathBuf;

use proofs::errors::ProofError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
  #[error(transparent)]
  Config(#[from] config::ConfigError),

  #[error("{}: {0}", .0.kind())]
  Proof(#[from] ProofError),

  #[error("failed to access {path:?}: {source}")]
  Io { path: PathBuf, source: std::io::Error },

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl CliError {
  pub fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::Io { path: path.to_path_buf(), source }
  }
}
