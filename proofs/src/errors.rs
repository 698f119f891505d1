//! Error type for the `proofs` crate.
//!
//! This enum represents the various error conditions that can occur within the `proofs` crate.
//! It provides a unified way to handle and propagate errors throughout the crate.
//!
//! The witness stage fails with one of:
//!
//! - `GraphParse`: The witness graph blob is malformed.
//! - `InputMismatch`: The inputs JSON does not provide exactly the signals the graph declares.
//! - `ConstraintViolation`: Evaluation hit a division by zero or a failed assertion.
//!
//! The proving stage fails with one of:
//!
//! - `ZkeyParse`: The proving key blob is malformed or not for BN254 Groth16.
//! - `Prover`: The witness does not fit the proving key, or the curve arithmetic failed.
//!
//! Supporting variants cover the file formats (`R1csParse`, `WitnessFormat`), verification
//! (`VerifyFailed`), worker threads (`Worker`) and transparent I/O and JSON errors.
use thiserror::Error;

/// Represents the various error conditions that can occur within the `proofs` crate.
#[derive(Debug, Error)]
pub enum ProofError {
  /// The witness graph could not be decoded
  #[error("Failed to parse witness graph: {0}")]
  GraphParse(String),

  /// The inputs do not match the graph's declared input signals
  #[error("Input mismatch: {0}")]
  InputMismatch(String),

  /// Evaluating the graph violated a field or circuit constraint
  #[error("Constraint violation: {0}")]
  ConstraintViolation(String),

  /// The proving key could not be decoded
  #[error("Failed to parse zkey: {0}")]
  ZkeyParse(String),

  /// The prover rejected its inputs or failed internally
  #[error("Prover error: {0}")]
  Prover(String),

  /// The R1CS file could not be decoded
  #[error("Failed to parse r1cs: {0}")]
  R1csParse(String),

  /// The `.wtns` file could not be decoded
  #[error("Invalid witness file: {0}")]
  WitnessFormat(String),

  /// The error is a failed proof verification
  #[error("Failed to verify proof: {0}")]
  VerifyFailed(String),

  /// A blocking worker task panicked or was cancelled
  #[error("Worker error: {0}")]
  Worker(String),

  /// The error is a std::io::Error
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The error is a serde_json::Error
  #[error(transparent)]
  Serde(#[from] serde_json::Error),
}

impl ProofError {
  /// Short name of the error kind, suitable for a caller-facing diagnostic.
  pub fn kind(&self) -> &'static str {
    match self {
      ProofError::GraphParse(_) => "GraphParseError",
      ProofError::InputMismatch(_) => "InputMismatch",
      ProofError::ConstraintViolation(_) => "ConstraintViolation",
      ProofError::ZkeyParse(_) => "ZkeyParseError",
      ProofError::Prover(_) => "ProverError",
      ProofError::R1csParse(_) => "R1csParseError",
      ProofError::WitnessFormat(_) => "WitnessFormatError",
      ProofError::VerifyFailed(_) => "VerifyFailed",
      ProofError::Worker(_) => "WorkerError",
      ProofError::Io(_) => "IoError",
      ProofError::Serde(_) => "JsonError",
    }
  }
}
