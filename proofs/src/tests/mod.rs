//! End to end tests: witness calculation through proving and verification.

use inputs::{
  cubic_graph, cubic_key, cubic_r1cs, multiplier_graph, multiplier_key, multiplier_r1cs,
};

use super::*;
use crate::{
  circom::{r1cs::R1CS, wtns::load_witness_from_bytes},
  groth16::{groth16_verify, json::VerifyingKeyJson, setup},
};


const MULTIPLIER_INPUTS: &[u8] = br#"{"a": "3", "b": "4"}"#;

fn vkey_json(pk: &ProvingKey) -> String {
  serde_json::to_string(&VerifyingKeyJson::from(&pk.vk)).unwrap()
}

#[test]
#[tracing_test::traced_test]
fn test_end_to_end_multiplier() {
  let graph = multiplier_graph().to_bytes();
  let pk = multiplier_key();

  let witness = calculate_witness(MULTIPLIER_INPUTS, &graph).unwrap();
  let output = groth16_prove(&pk.to_bytes(), &witness).unwrap();

  assert_eq!(output.public_signals, r#"["12"]"#);
  let proof: serde_json::Value = serde_json::from_str(&output.proof).unwrap();
  assert_eq!(proof["protocol"], "groth16");
  assert_eq!(proof["curve"], "bn128");
  assert!(groth16_verify(&vkey_json(&pk), &output.proof, &output.public_signals).unwrap());
  assert!(logs_contain("proved 1 public signals"));
}

#[test]
fn test_witness_is_deterministic_and_complete() {
  let graph = cubic_graph();
  let bytes = graph.to_bytes();
  let first = calculate_witness(br#"{"x": 3}"#, &bytes).unwrap();
  let second = calculate_witness(br#"{"x": "3"}"#, &bytes).unwrap();
  assert_eq!(first, second);

  let witness = load_witness_from_bytes::<Fr>(&first).unwrap();
  assert_eq!(witness.len(), graph.witness_len());
  assert_eq!(witness[1], Fr::from(35u64));
  assert!(cubic_r1cs().is_satisfied(&witness));
}

#[test]
fn test_graph_witness_satisfies_r1cs() {
  let bytes = calculate_witness(MULTIPLIER_INPUTS, &multiplier_graph().to_bytes()).unwrap();
  let witness = load_witness_from_bytes::<Fr>(&bytes).unwrap();
  assert!(multiplier_r1cs().is_satisfied(&witness));
}

#[test]
fn test_missing_input_is_rejected() {
  let err = calculate_witness(br#"{"a": "3"}"#, &multiplier_graph().to_bytes()).unwrap_err();
  assert!(matches!(err, ProofError::InputMismatch(_)));
  assert_eq!(err.kind(), "InputMismatch");
}

#[test]
fn test_cubic_round_trip() {
  let pk = cubic_key();
  let witness = calculate_witness(br#"{"x": 3}"#, &cubic_graph().to_bytes()).unwrap();
  let output = groth16_prove(&pk.to_bytes(), &witness).unwrap();
  assert_eq!(output.public_signals, r#"["35"]"#);
  assert!(groth16_verify(&vkey_json(&pk), &output.proof, &output.public_signals).unwrap());
  assert!(!groth16_verify(&vkey_json(&pk), &output.proof, r#"["36"]"#).unwrap());
}

#[test]
fn test_proofs_are_randomized() {
  let pk = multiplier_key();
  let zkey = pk.to_bytes();
  let witness = calculate_witness(MULTIPLIER_INPUTS, &multiplier_graph().to_bytes()).unwrap();

  let first = groth16_prove(&zkey, &witness).unwrap();
  let second = groth16_prove(&zkey, &witness).unwrap();
  assert_ne!(first.proof, second.proof);
  assert_eq!(first.public_signals, second.public_signals);
  for output in [first, second] {
    assert!(groth16_verify(&vkey_json(&pk), &output.proof, &output.public_signals).unwrap());
  }
}

#[test]
fn test_truncated_artifacts() {
  let graph = multiplier_graph().to_bytes();
  let err = calculate_witness(MULTIPLIER_INPUTS, &graph[..graph.len() - 3]).unwrap_err();
  assert!(matches!(err, ProofError::GraphParse(_)));
  assert!(matches!(calculate_witness(MULTIPLIER_INPUTS, &[]), Err(ProofError::GraphParse(_))));

  let zkey = multiplier_key().to_bytes();
  let witness = calculate_witness(MULTIPLIER_INPUTS, &graph).unwrap();
  let err = groth16_prove(&zkey[..zkey.len() / 3], &witness).unwrap_err();
  assert!(matches!(err, ProofError::ZkeyParse(_)));
  assert_eq!(err.kind(), "ZkeyParseError");
}

#[test]
fn test_witness_must_fit_the_key() {
  let zkey = multiplier_key().to_bytes();
  let cubic_witness = calculate_witness(br#"{"x": 2}"#, &cubic_graph().to_bytes()).unwrap();
  assert!(matches!(groth16_prove(&zkey, &cubic_witness), Err(ProofError::Prover(_))));
  assert!(matches!(groth16_prove(&zkey, b"not a witness"), Err(ProofError::Prover(_))));
}

#[test]
fn test_setup_from_r1cs_file_bytes() {
  let r1cs = R1CS::try_from(&multiplier_r1cs().to_bytes()[..]).unwrap();
  let pk = setup(&r1cs).unwrap();
  let witness = calculate_witness(br#"{"a": 7, "b": 6}"#, &multiplier_graph().to_bytes()).unwrap();
  let output = groth16_prove(&pk.to_bytes(), &witness).unwrap();
  assert_eq!(output.public_signals, r#"["42"]"#);
  assert!(groth16_verify(&vkey_json(&pk), &output.proof, &output.public_signals).unwrap());

  // a key from a different setup rejects the proof
  assert!(!groth16_verify(&vkey_json(&multiplier_key()), &output.proof, r#"["42"]"#).unwrap());
}
