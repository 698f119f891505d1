//! Groth16 verification.

use ark_bn254::Bn254;
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use serde::Deserialize;
use tracing::debug;

use super::{
  json::{public_signals_from_json, ProofJson, VerifyingKeyJson},
  Proof, VerifyingKey,
};
use crate::{errors::ProofError, Fr, G1Projective};

/// Verifies a proof
///
/// # Arguments
///
/// * `vk` - The verification key of the circuit.
/// * `proof` - The proof to check.
/// * `public_signals` - Public outputs followed by public inputs, without the constant one.
///
/// # Returns
///
/// Whether `e(A, B) = e(alpha, beta) * e(IC(x), gamma) * e(C, delta)` holds. A public signal count
/// that does not match the key is `VerifyFailed`.
pub fn verify(vk: &VerifyingKey, proof: &Proof, public_signals: &[Fr]) -> Result<bool, ProofError> {
  if public_signals.len() != vk.n_public() {
    return Err(ProofError::VerifyFailed(format!(
      "expected {} public signals, got {}",
      vk.n_public(),
      public_signals.len()
    )));
  }

  let inputs = G1Projective::msm(&vk.ic[1..], public_signals)
    .map_err(|_| ProofError::VerifyFailed("IC points do not match the public signals".into()))?;
  let vk_x = (vk.ic[0].into_group() + inputs).into_affine();

  let lhs = Bn254::pairing(proof.a, proof.b);
  let rhs = Bn254::multi_pairing([vk.alpha_g1, vk_x, proof.c], [
    vk.beta_g2,
    vk.gamma_g2,
    vk.delta_g2,
  ]);
  let valid = lhs == rhs;
  debug!("groth16 proof with {} public signals valid: {valid}", public_signals.len());
  Ok(valid)
}

fn parse_json<'a, T: Deserialize<'a>>(json: &'a str, what: &str) -> Result<T, ProofError> {
  serde_json::from_str(json).map_err(|e| ProofError::VerifyFailed(format!("malformed {what}: {e}")))
}

/// Verifies a proof from the snarkjs JSON forms of the key, the proof and the public signals.
pub fn groth16_verify(
  vkey_json: &str,
  proof_json: &str,
  public_json: &str,
) -> Result<bool, ProofError> {
  let vk = VerifyingKey::try_from(&parse_json::<VerifyingKeyJson>(vkey_json, "verification key")?)?;
  let proof = Proof::try_from(&parse_json::<ProofJson>(proof_json, "proof")?)?;
  let public_signals = public_signals_from_json(public_json)?;
  verify(&vk, &proof, &public_signals)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    groth16::{json::public_signals_to_json, prove},
    tests::inputs::multiplier_key,
  };

  #[test]
  #[tracing_test::traced_test]
  fn test_verify_json() {
    let pk = multiplier_key();
    let witness: Vec<Fr> = [1u64, 12, 3, 4].into_iter().map(Fr::from).collect();
    let proof = prove(&pk, &witness).unwrap();

    let vkey = serde_json::to_string(&VerifyingKeyJson::from(&pk.vk)).unwrap();
    let proof = serde_json::to_string(&ProofJson::from(&proof)).unwrap();
    let public = public_signals_to_json(&[Fr::from(12u64)]).unwrap();
    assert!(groth16_verify(&vkey, &proof, &public).unwrap());
    assert!(!groth16_verify(&vkey, &proof, r#"["13"]"#).unwrap());
    assert!(matches!(groth16_verify(&vkey, &proof, "[]"), Err(ProofError::VerifyFailed(_))));
  }

  #[test]
  fn test_malformed_json_fails_verification() {
    let pk = multiplier_key();
    let witness: Vec<Fr> = [1u64, 12, 3, 4].into_iter().map(Fr::from).collect();
    let vkey = serde_json::to_string(&VerifyingKeyJson::from(&pk.vk)).unwrap();
    let proof = serde_json::to_string(&ProofJson::from(&prove(&pk, &witness).unwrap())).unwrap();

    for (vkey, proof, public) in [
      ("{", proof.as_str(), r#"["12"]"#),
      (vkey.as_str(), r#"{"pi_a": 1}"#, r#"["12"]"#),
      (vkey.as_str(), proof.as_str(), r#"{"12": true}"#),
    ] {
      let err = groth16_verify(vkey, proof, public).unwrap_err();
      assert!(matches!(err, ProofError::VerifyFailed(_)), "{err}");
    }
  }

  #[test]
  fn test_tampered_proof() {
    let pk = multiplier_key();
    let witness: Vec<Fr> = [1u64, 12, 3, 4].into_iter().map(Fr::from).collect();
    let mut proof = prove(&pk, &witness).unwrap();
    proof.c = (proof.c + pk.delta_g1).into_affine();
    assert!(!verify(&pk.vk, &proof, &[Fr::from(12u64)]).unwrap());
  }
}
