use std::{path::PathBuf, process::ExitCode};

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod commands;
pub mod config;
pub mod errors;

use crate::{config::Config, errors::CliError};

#[derive(Parser, Debug)]
#[command(name = "circom-prover", version, about = "Circom witness calculation and Groth16 proofs")]
pub struct Args {
  /// Configuration file with default artifact paths
  #[arg(short, long, default_value = "circom-prover.toml")]
  config: PathBuf,

  /// Increase logging verbosity (-v, -vv, -vvv, etc.)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

/// Artifact path overrides. Anything left out comes from the configuration.
#[derive(ClapArgs, Debug, Default)]
pub struct Paths {
  /// Witness graph
  #[arg(long)]
  graph:   Option<PathBuf>,
  /// Inputs JSON
  #[arg(long)]
  inputs:  Option<PathBuf>,
  /// Proving key
  #[arg(long)]
  zkey:    Option<PathBuf>,
  /// `.wtns` witness
  #[arg(long)]
  witness: Option<PathBuf>,
  /// Proof JSON
  #[arg(long)]
  proof:   Option<PathBuf>,
  /// Public signals JSON
  #[arg(long)]
  public:  Option<PathBuf>,
  /// Verification key JSON
  #[arg(long)]
  vkey:    Option<PathBuf>,
  /// Constraint system
  #[arg(long)]
  r1cs:    Option<PathBuf>,
}

impl Paths {
  fn apply(self, mut config: Config) -> Config {
    let overrides = [
      (self.graph, &mut config.graph),
      (self.inputs, &mut config.inputs),
      (self.zkey, &mut config.zkey),
      (self.witness, &mut config.witness),
      (self.proof, &mut config.proof),
      (self.public, &mut config.public),
      (self.vkey, &mut config.vkey),
      (self.r1cs, &mut config.r1cs),
    ];
    for (value, target) in overrides {
      if let Some(value) = value {
        *target = value;
      }
    }
    config
  }
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Compute the witness of the inputs from the witness graph
  Witness(Paths),
  /// Prove a witness with the proving key
  Prove(Paths),
  /// Compute the witness and prove it, reporting the time of each stage
  Run(Paths),
  /// Verify a proof and its public signals
  Verify(Paths),
  /// Development-only setup of a proving key from an R1CS
  Setup(Paths),
  /// Export the verification key of a proving key
  ExportVkey(Paths),
}

fn init_logging(verbose: u8) {
  // Logging options
  let log_level = match verbose {
    0 => Level::ERROR,
    1 => Level::WARN,
    2 => Level::INFO,
    3 => Level::DEBUG,
    _ => Level::TRACE,
  };
  let builder = FmtSubscriber::builder().with_max_level(log_level).with_writer(std::io::stderr);
  let result = match EnvFilter::try_from_default_env() {
    Ok(filter) => tracing::subscriber::set_global_default(builder.with_env_filter(filter).finish()),
    Err(_) => tracing::subscriber::set_global_default(builder.finish()),
  };
  result.expect("setting default subscriber failed");
}

async fn execute(args: Args) -> Result<ExitCode, CliError> {
  let config = config::read_config(&args.config)?;
  match args.command {
    Command::Witness(paths) => commands::witness(&paths.apply(config))?,
    Command::Prove(paths) => commands::prove(&paths.apply(config))?,
    Command::Run(paths) => {
      let report = commands::run(&paths.apply(config)).await?;
      println!("witness: {:.3}s", report.witness.as_secs_f64());
      println!("proof: {:.3}s", report.proof.as_secs_f64());
    },
    Command::Verify(paths) =>
      if commands::verify(&paths.apply(config))? {
        println!("OK");
      } else {
        println!("INVALID");
        return Ok(ExitCode::FAILURE);
      },
    Command::Setup(paths) => commands::setup(&paths.apply(config))?,
    Command::ExportVkey(paths) => commands::export_vkey(&paths.apply(config))?,
  }
  Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
  let args = Args::parse();
  init_logging(args.verbose);
  info!("using configuration {:?}", args.config);

  match execute(args).await {
    Ok(code) => code,
    Err(e) => {
      error!("{e}");
      eprintln!("error: {e}");
      ExitCode::FAILURE
    },
  }
}
