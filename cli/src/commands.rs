//! Subcommand implementations over resolved artifact paths.

use std::{
  path::Path,
  sync::Arc,
  time::{Duration, Instant},
};

use proofs::{
  calculate_witness,
  circom::r1cs::R1CS,
  groth16::{self, json::VerifyingKeyJson, groth16_verify, ProvingKey},
  groth16_prove,
  worker::{calculate_witness_async, groth16_prove_async},
  ProverOutput,
};
use tracing::{debug, info};

use crate::{config::Config, errors::CliError};

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
  debug!("reading {path:?}");
  std::fs::read(path).map_err(CliError::io(path))
}

fn read_string(path: &Path) -> Result<String, CliError> {
  std::fs::read_to_string(path).map_err(CliError::io(path))
}

fn write(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), CliError> {
  if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).map_err(CliError::io(parent))?;
  }
  std::fs::write(path, contents).map_err(CliError::io(path))?;
  info!("wrote {path:?}");
  Ok(())
}

fn write_output(config: &Config, output: &ProverOutput) -> Result<(), CliError> {
  write(&config.proof, &output.proof)?;
  write(&config.public, &output.public_signals)
}

/// Computes the witness of `inputs` and writes it as `.wtns`.
pub fn witness(config: &Config) -> Result<(), CliError> {
  let wtns = calculate_witness(&read(&config.inputs)?, &read(&config.graph)?)?;
  write(&config.witness, wtns)
}

/// Proves a `.wtns` witness against the zkey and writes the proof and public signals.
pub fn prove(config: &Config) -> Result<(), CliError> {
  let output = groth16_prove(&read(&config.zkey)?, &read(&config.witness)?)?;
  write_output(config, &output)
}

/// Durations of the two stages of a `run`
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
  pub witness: Duration,
  pub proof:   Duration,
}

/// Computes the witness and proves it, each stage on a worker thread.
pub async fn run(config: &Config) -> Result<RunReport, CliError> {
  let graph: Arc<[u8]> = read(&config.graph)?.into();
  let inputs: Arc<[u8]> = read(&config.inputs)?.into();
  let zkey: Arc<[u8]> = read(&config.zkey)?.into();

  let start = Instant::now();
  let wtns: Arc<[u8]> = calculate_witness_async(inputs, graph).await?.into();
  let witness = start.elapsed();
  write(&config.witness, &wtns)?;

  let start = Instant::now();
  let output = groth16_prove_async(zkey, wtns).await?;
  let proof = start.elapsed();
  write_output(config, &output)?;

  Ok(RunReport { witness, proof })
}

/// Checks the proof and public signals against the verification key.
pub fn verify(config: &Config) -> Result<bool, CliError> {
  Ok(groth16_verify(
    &read_string(&config.vkey)?,
    &read_string(&config.proof)?,
    &read_string(&config.public)?,
  )?)
}

fn write_vkey(path: &Path, pk: &ProvingKey) -> Result<(), CliError> {
  write(path, serde_json::to_string_pretty(&VerifyingKeyJson::from(&pk.vk))?)
}

/// Runs the development setup on the R1CS and writes the zkey and verification key.
pub fn setup(config: &Config) -> Result<(), CliError> {
  let r1cs = R1CS::try_from(&config.r1cs)?;
  let pk = groth16::setup(&r1cs)?;
  write(&config.zkey, pk.to_bytes())?;
  write_vkey(&config.vkey, &pk)
}

/// Extracts the verification key of the zkey as snarkjs JSON.
pub fn export_vkey(config: &Config) -> Result<(), CliError> {
  let pk = ProvingKey::try_from(&read(&config.zkey)?[..])?;
  write_vkey(&config.vkey, &pk)
}

#[cfg(test)]
mod tests {
  use proofs::{
    circom::{r1cs::R1CS, Graph, GraphBuilder, Operation},
    Fr,
  };
  use tempdir::TempDir;

  use super::*;

  /// `out = a * b` written into a fresh directory
  fn workspace() -> (TempDir, Config) {
    let dir = TempDir::new("circom-prover").unwrap();
    let path = |name: &str| dir.path().join(name);
    let config = Config {
      graph:   path("graph.bin"),
      inputs:  path("inputs.json"),
      zkey:    path("keys/circuit.zkey"),
      witness: path("out/witness.wtns"),
      proof:   path("out/proof.json"),
      public:  path("out/public.json"),
      vkey:    path("keys/verification_key.json"),
      r1cs:    path("circuit.r1cs"),
    };

    let mut builder = GraphBuilder::<Fr>::new();
    let one = builder.one();
    let a = builder.input("a", 1)[0];
    let b = builder.input("b", 1)[0];
    let out = builder.op(Operation::Mul, a, b);
    builder.witness(one).witness(out).witness(a).witness(b);
    std::fs::write(&config.graph, builder.build().unwrap().to_bytes()).unwrap();

    let one = Fr::from(1u64);
    let r1cs = R1CS::new(1, 0, 2, 4, vec![(vec![(2, one)], vec![(3, one)], vec![(1, one)])]);
    std::fs::write(&config.r1cs, r1cs.to_bytes()).unwrap();
    std::fs::write(&config.inputs, r#"{"a": "3", "b": "4"}"#).unwrap();
    (dir, config)
  }

  #[test]
  fn test_setup_witness_prove_verify() {
    let (_dir, config) = workspace();
    setup(&config).unwrap();
    witness(&config).unwrap();
    prove(&config).unwrap();

    assert_eq!(std::fs::read_to_string(&config.public).unwrap(), r#"["12"]"#);
    assert!(verify(&config).unwrap());

    std::fs::write(&config.public, r#"["13"]"#).unwrap();
    assert!(!verify(&config).unwrap());
  }

  #[test]
  fn test_witness_from_witnesscalc_graph() {
    let (_dir, config) = workspace();
    let graph = Graph::<Fr>::try_from(&std::fs::read(&config.graph).unwrap()[..]).unwrap();
    std::fs::write(&config.graph, graph.to_witnesscalc_bytes().unwrap()).unwrap();

    setup(&config).unwrap();
    witness(&config).unwrap();
    prove(&config).unwrap();
    assert_eq!(std::fs::read_to_string(&config.public).unwrap(), r#"["12"]"#);
    assert!(verify(&config).unwrap());
  }

  #[test]
  fn test_export_vkey_matches_setup() {
    let (_dir, config) = workspace();
    setup(&config).unwrap();
    let from_setup = std::fs::read_to_string(&config.vkey).unwrap();
    std::fs::remove_file(&config.vkey).unwrap();

    export_vkey(&config).unwrap();
    assert_eq!(std::fs::read_to_string(&config.vkey).unwrap(), from_setup);
  }

  #[tokio::test]
  async fn test_run_reports_both_stages() {
    let (_dir, config) = workspace();
    setup(&config).unwrap();
    run(&config).await.unwrap();
    assert!(config.witness.is_file());
    assert!(verify(&config).unwrap());
  }

  #[test]
  fn test_missing_artifact_names_the_path() {
    let (_dir, config) = workspace();
    let err = prove(&config).unwrap_err();
    match err {
      CliError::Io { path, .. } => assert_eq!(path, config.zkey),
      other => panic!("unexpected error {other}"),
    }
  }

  #[test]
  fn test_bad_inputs_surface_the_error_kind() {
    let (_dir, config) = workspace();
    std::fs::write(&config.inputs, r#"{"a": "3"}"#).unwrap();
    let err = witness(&config).unwrap_err();
    assert!(err.to_string().starts_with("InputMismatch"));
  }
}
