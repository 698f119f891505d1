//! Artifact paths, layered as defaults, then an optional TOML file, then `CIRCOM_PROVER_*`
//! environment variables. Command line flags override the result.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::errors::CliError;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
  pub graph:   PathBuf,
  pub inputs:  PathBuf,
  pub zkey:    PathBuf,
  pub witness: PathBuf,
  pub proof:   PathBuf,
  pub public:  PathBuf,
  pub vkey:    PathBuf,
  pub r1cs:    PathBuf,
}

/// Reads the configuration, using `config_file` only when it exists.
pub fn read_config(config_file: &Path) -> Result<Config, CliError> {
  let builder = config::Config::builder()
    .set_default("graph", "graph.bin")?
    .set_default("inputs", "inputs.json")?
    .set_default("zkey", "circuit.zkey")?
    .set_default("witness", "witness.wtns")?
    .set_default("proof", "proof.json")?
    .set_default("public", "public.json")?
    .set_default("vkey", "verification_key.json")?
    .set_default("r1cs", "circuit.r1cs")?;

  let builder = if config_file.is_file() {
    debug!("reading configuration from {config_file:?}");
    builder.add_source(config::File::from(config_file).format(config::FileFormat::Toml))
  } else {
    builder
  };

  // allow ENV to override
  let builder = builder
    .add_source(config::Environment::with_prefix("CIRCOM_PROVER").try_parsing(true).separator("_"));

  Ok(builder.build()?.try_deserialize()?)
}

#[cfg(test)]
mod tests {
  use tempdir::TempDir;

  use super::*;

  #[test]
  fn test_defaults_without_file() {
    let dir = TempDir::new("config").unwrap();
    let config = read_config(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(config.graph, PathBuf::from("graph.bin"));
    assert_eq!(config.zkey, PathBuf::from("circuit.zkey"));
    assert_eq!(config.public, PathBuf::from("public.json"));
  }

  #[test]
  fn test_file_overrides_defaults() {
    let dir = TempDir::new("config").unwrap();
    let path = dir.path().join("circom-prover.toml");
    std::fs::write(&path, "graph = \"build/multiplier.bin\"\nwitness = \"out/w.wtns\"\n").unwrap();

    let config = read_config(&path).unwrap();
    assert_eq!(config.graph, PathBuf::from("build/multiplier.bin"));
    assert_eq!(config.witness, PathBuf::from("out/w.wtns"));
    assert_eq!(config.inputs, PathBuf::from("inputs.json"));
  }

  #[test]
  fn test_environment_overrides_file() {
    let dir = TempDir::new("config").unwrap();
    let path = dir.path().join("circom-prover.toml");
    std::fs::write(&path, "vkey = \"from-file.json\"\n").unwrap();

    std::env::set_var("CIRCOM_PROVER_VKEY", "from-env.json");
    let config = read_config(&path);
    std::env::remove_var("CIRCOM_PROVER_VKEY");
    assert_eq!(config.unwrap().vkey, PathBuf::from("from-env.json"));
  }
}
