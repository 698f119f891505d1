//! # Proofs Crate
//!
//! Witness calculation for circom circuits and Groth16 proving over BN254.
//!
//! The two stages are used one after the other: a precompiled witness graph evaluated against the
//! inputs JSON yields a `.wtns` witness, and that witness together with the circuit's `.zkey`
//! yields a proof and its public signals in the snarkjs JSON layouts.
//!
//! ## Modules
//!
//! - `circom`: The witness graph evaluator and the circom artifact formats.
//! - `errors`: The crate's error type.
//! - `groth16`: Proving keys, the prover, a development setup and verification.
//! - `worker`: Async wrappers that run both stages on blocking worker threads.
//!
//! ## Functions
//!
//! - `calculate_witness`: Inputs JSON and graph bytes to `.wtns` bytes.
//! - `groth16_prove`: Zkey and `.wtns` bytes to the proof and public signals JSON.

use serde::{Deserialize, Serialize};
#[cfg(feature = "timing")] use tracing::trace;
use tracing::{debug, info};

use crate::{
  circom::{witness::generate_witness_from_graph, wtns},
  errors::ProofError,
  groth16::{
    json::{public_signals_to_json, ProofJson},
    ProvingKey,
  },
};

pub mod circom;
pub mod errors;
pub mod groth16;
pub mod worker;
#[cfg(test)] mod tests;

pub type Curve = ark_bn254::Bn254;
pub type Fr = ark_bn254::Fr;
pub type Fq = ark_bn254::Fq;
pub type Fq2 = ark_bn254::Fq2;
pub type G1Affine = ark_bn254::G1Affine;
pub type G1Projective = ark_bn254::G1Projective;
pub type G2Affine = ark_bn254::G2Affine;
pub type G2Projective = ark_bn254::G2Projective;

/// Proof and public signals, both as snarkjs JSON text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverOutput {
  pub proof:          String,
  pub public_signals: String,
}

/// Calculates the witness of a circuit
///
/// # Arguments
///
/// * `inputs` - The inputs JSON, mapping every input signal of the graph to its value.
/// * `graph` - The serialized witness graph of the circuit.
///
/// # Returns
///
/// The witness as `.wtns` bytes. Fails with `GraphParse`, `InputMismatch` or
/// `ConstraintViolation`.
pub fn calculate_witness(inputs: &[u8], graph: &[u8]) -> Result<Vec<u8>, ProofError> {
  let witness = generate_witness_from_graph(inputs, graph)?;
  Ok(wtns::write_witness(&witness))
}

/// Generates a Groth16 proof
///
/// # Arguments
///
/// * `zkey` - The circuit's proving key in the snarkjs zkey format.
/// * `witness` - A `.wtns` witness of the same circuit.
///
/// # Returns
///
/// The proof and the public signals. A malformed key fails with `ZkeyParse`; a witness that cannot
/// be read or does not fit the key fails with `Prover`.
pub fn groth16_prove(zkey: &[u8], witness: &[u8]) -> Result<ProverOutput, ProofError> {
  let start = std::time::Instant::now();
  let pk = ProvingKey::try_from(zkey)?;
  debug!("zkey loaded in {:?}", start.elapsed());

  let witness = wtns::load_witness_from_bytes::<Fr>(witness)
    .map_err(|e| ProofError::Prover(format!("unusable witness: {e}")))?;
  #[cfg(feature = "timing")]
  trace!("witness of {} values loaded in {:?}", witness.len(), start.elapsed());

  let proof = groth16::prove(&pk, &witness)?;
  let output = ProverOutput {
    proof:          serde_json::to_string(&ProofJson::from(&proof))?,
    public_signals: public_signals_to_json(&witness[1..=pk.n_public])?,
  };
  info!("proved {} public signals in {:?}", pk.n_public, start.elapsed());
  Ok(output)
}
