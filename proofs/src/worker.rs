//! Async wrappers that run the CPU bound stages on tokio's blocking pool.
//!
//! The graph, inputs, zkey and witness are shared read-only through `Arc`s, so the same key can
//! serve any number of concurrent proofs. Dropping the returned future abandons the result, the
//! blocking task still runs to completion and nothing it computed escapes.

use std::sync::Arc;

use tokio::task::{self, JoinError};
use tracing::debug;

use crate::{calculate_witness, errors::ProofError, groth16_prove, ProverOutput};

fn map_blocking_error(err: JoinError) -> ProofError {
  ProofError::Worker(format!("blocking task failed: {err}"))
}

/// Calculates the `.wtns` witness on a blocking worker thread.
pub async fn calculate_witness_async(
  inputs: Arc<[u8]>,
  graph: Arc<[u8]>,
) -> Result<Vec<u8>, ProofError> {
  debug!("scheduling witness calculation");
  task::spawn_blocking(move || calculate_witness(&inputs, &graph))
    .await
    .map_err(map_blocking_error)?
}

/// Generates a Groth16 proof on a blocking worker thread.
pub async fn groth16_prove_async(
  zkey: Arc<[u8]>,
  witness: Arc<[u8]>,
) -> Result<ProverOutput, ProofError> {
  debug!("scheduling groth16 proof");
  task::spawn_blocking(move || groth16_prove(&zkey, &witness)).await.map_err(map_blocking_error)?
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tests::inputs::{multiplier_graph, multiplier_key};

  #[tokio::test]
  #[tracing_test::traced_test]
  async fn test_workers_run_both_stages() {
    let graph: Arc<[u8]> = multiplier_graph().to_bytes().into();
    let zkey: Arc<[u8]> = multiplier_key().to_bytes().into();
    let inputs: Arc<[u8]> = Arc::from(&br#"{"a": "3", "b": "4"}"#[..]);

    let witness = calculate_witness_async(inputs, graph).await.unwrap();
    let output = groth16_prove_async(zkey, witness.into()).await.unwrap();
    assert_eq!(output.public_signals, r#"["12"]"#);
    assert!(logs_contain("scheduling groth16 proof"));
  }

  #[tokio::test]
  async fn test_concurrent_proofs_share_a_key() {
    let graph: Arc<[u8]> = multiplier_graph().to_bytes().into();
    let zkey: Arc<[u8]> = multiplier_key().to_bytes().into();
    let witness: Arc<[u8]> =
      calculate_witness_async(Arc::from(&br#"{"a": 5, "b": 6}"#[..]), graph).await.unwrap().into();

    let (first, second) = tokio::join!(
      groth16_prove_async(zkey.clone(), witness.clone()),
      groth16_prove_async(zkey, witness)
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.public_signals, r#"["30"]"#);
    assert_eq!(first.public_signals, second.public_signals);
    assert_ne!(first.proof, second.proof);
  }

  #[tokio::test]
  async fn test_worker_errors_propagate() {
    let graph: Arc<[u8]> = multiplier_graph().to_bytes().into();
    let err = calculate_witness_async(Arc::from(&br#"{"a": 1}"#[..]), graph).await.unwrap_err();
    assert!(matches!(err, ProofError::InputMismatch(_)));
  }
}
