//! # Groth16 Module
//!
//! Groth16 proving over BN254 following the snarkjs and rapidsnark conventions, so that keys
//! produced by the circom toolchain can be used directly and proofs verify with snarkjs.
//!
//! ## Modules
//!
//! - `zkey`: Reading and writing snarkjs `.zkey` proving keys.
//! - `prover`: Proof generation from a proving key and a witness.
//! - `setup`: A single party development setup producing a proving key from an R1CS.
//! - `verifier`: Pairing based proof verification.
//! - `json`: The snarkjs JSON layouts of proofs, public signals and verification keys.

use serde::{Deserialize, Serialize};

use crate::{Fr, G1Affine, G2Affine};

pub mod json;
pub mod prover;
pub mod setup;
pub mod verifier;
pub mod zkey;

pub use prover::{prove, prove_with_rng};
pub use setup::{setup, setup_with_rng};
pub use verifier::{groth16_verify, verify};

/// Which QAP matrix a coefficient belongs to. `C` is never stored, it is recomputed as `A * B`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Matrix {
  A,
  B,
}

/// Non zero entry of the `A` or `B` constraint matrix
#[derive(Clone, Debug, PartialEq)]
pub struct Coefficient {
  pub matrix:     Matrix,
  pub constraint: usize,
  pub signal:     usize,
  pub value:      Fr,
}

/// Groth16 verification key
#[derive(Clone, Debug, PartialEq)]
pub struct VerifyingKey {
  pub alpha_g1: G1Affine,
  pub beta_g2:  G2Affine,
  pub gamma_g2: G2Affine,
  pub delta_g2: G2Affine,
  /// One point for the constant one plus one per public signal
  pub ic:       Vec<G1Affine>,
}

impl VerifyingKey {
  /// Number of public signals the key verifies.
  pub fn n_public(&self) -> usize { self.ic.len().saturating_sub(1) }
}

/// Groth16 proving key as laid out in a snarkjs zkey
#[derive(Clone, Debug, PartialEq)]
pub struct ProvingKey {
  /// Number of witness signals, including the constant one
  pub n_vars:       usize,
  /// Number of public signals, outputs followed by public inputs
  pub n_public:     usize,
  /// Size of the evaluation domain, a power of two
  pub domain_size:  usize,
  pub vk:           VerifyingKey,
  pub beta_g1:      G1Affine,
  pub delta_g1:     G1Affine,
  pub coefficients: Vec<Coefficient>,
  /// `n_vars` points
  pub a_query:      Vec<G1Affine>,
  /// `n_vars` points
  pub b_g1_query:   Vec<G1Affine>,
  /// `n_vars` points
  pub b_g2_query:   Vec<G2Affine>,
  /// One point per private signal
  pub c_query:      Vec<G1Affine>,
  /// `domain_size` points
  pub h_query:      Vec<G1Affine>,
}

/// Groth16 proof
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Proof {
  pub a: G1Affine,
  pub b: G2Affine,
  pub c: G1Affine,
}
