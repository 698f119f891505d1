//! # R1CS Module
//!
//! The `r1cs` module provides functionalities for handling Rank-1 Constraint System (R1CS)
//! representations of Circom circuits. The trusted setup reads the constraints from here to build
//! a proving key.
//!
//! ## Structs
//!
//! - `R1CS`: Represents the R1CS structure, including the number of inputs, outputs, variables, and
//!   constraints.
//! - `Header`: Represents the header of an R1CS file, including field size and various counts.
//!
//! ## Type Definitions
//!
//! - `Constraint`: A type alias for a tuple representing a constraint in the R1CS, consisting of
//!   vectors of pairs of indices and field elements.
//!
//! ## Functions
//!
//! - `read_header`: Reads the header of an R1CS file from a reader.
//! - `read_constraint_vec`: Reads a vector of constraints from a reader.
//! - `read_constraints`: Reads all constraints from a reader based on the R1CS header.
use std::{io::Read, path::PathBuf};

use ark_ff::Zero;
use byteorder::{LittleEndian, ReadBytesExt};

use super::{
  field_n8, modulus_bytes, read_field, read_u32, write_field, write_u32, BinFile, BinFileWriter,
};
use crate::{errors::ProofError, Fr};

const R1CS_MAGIC: &[u8; 4] = b"r1cs";
const R1CS_VERSION: u32 = 1;

const HEADER_TYPE: u32 = 1;
const CONSTRAINT_TYPE: u32 = 2;
const WIRE2LABEL_TYPE: u32 = 3;

/// Linear combination as `(signal index, coefficient)` pairs
pub type LinearCombination = Vec<(usize, Fr)>;

/// Constraint type, `A * B = C`
pub type Constraint = (LinearCombination, LinearCombination, LinearCombination);

/// R1CS type
#[derive(Clone, Debug, Default, PartialEq)]
pub struct R1CS {
  /// Number of private inputs
  pub num_private_inputs: usize,
  /// Number of public inputs
  pub num_public_inputs:  usize,
  /// Number of public outputs
  pub num_public_outputs: usize,
  /// Number of inputs, the constant one plus public outputs and inputs
  pub num_inputs:         usize,
  /// Number of auxiliary variables
  pub num_aux:            usize,
  /// Number of variables
  pub num_variables:      usize,
  /// Constraints
  pub constraints:        Vec<Constraint>,
}

/// R1CSFile's header
#[derive(Debug, Default)]
pub struct Header {
  /// Field size
  pub field_size:    u32,
  /// Prime
  pub prime:         Vec<u8>,
  /// Number of wires
  pub n_wires:       u32,
  /// Number of public outputs
  pub n_pub_out:     u32,
  /// Number of public inputs
  pub n_pub_in:      u32,
  /// Number of private inputs
  pub n_prv_in:      u32,
  /// Number of labels
  pub n_labels:      u64,
  /// Number of constraints
  pub n_constraints: u32,
}

impl TryFrom<&[u8]> for R1CS {
  type Error = ProofError;

  fn try_from(value: &[u8]) -> Result<Self, Self::Error> { from_bytes(value) }
}

impl TryFrom<&PathBuf> for R1CS {
  type Error = ProofError;

  fn try_from(filename: &PathBuf) -> Result<Self, Self::Error> {
    let bytes = std::fs::read(filename)?;
    from_bytes(&bytes)
  }
}

impl R1CS {
  /// Builds an R1CS from its counts and constraints.
  pub fn new(
    num_public_outputs: usize,
    num_public_inputs: usize,
    num_private_inputs: usize,
    num_variables: usize,
    constraints: Vec<Constraint>,
  ) -> Self {
    let num_inputs = 1 + num_public_outputs + num_public_inputs;
    Self {
      num_private_inputs,
      num_public_inputs,
      num_public_outputs,
      num_inputs,
      num_aux: num_variables.saturating_sub(num_inputs),
      num_variables,
      constraints,
    }
  }

  /// Number of public signals, outputs first and then public inputs.
  pub fn num_public(&self) -> usize { self.num_public_outputs + self.num_public_inputs }

  /// Checks `A * B = C` for every constraint against a full witness.
  pub fn is_satisfied(&self, witness: &[Fr]) -> bool {
    if witness.len() != self.num_variables {
      return false;
    }
    let eval = |lc: &LinearCombination| {
      lc.iter().fold(Fr::zero(), |acc, (index, coeff)| acc + witness[*index] * coeff)
    };
    self.constraints.iter().all(|(a, b, c)| eval(a) * eval(b) == eval(c))
  }

  /// Serializes the R1CS, labelling wire `i` as label `i`.
  pub fn to_bytes(&self) -> Vec<u8> {
    let n8 = field_n8::<Fr>();

    let mut header = Vec::new();
    write_u32(&mut header, n8 as u32);
    header.extend_from_slice(&modulus_bytes::<Fr>());
    write_u32(&mut header, self.num_variables as u32);
    write_u32(&mut header, self.num_public_outputs as u32);
    write_u32(&mut header, self.num_public_inputs as u32);
    write_u32(&mut header, self.num_private_inputs as u32);
    header.extend_from_slice(&(self.num_variables as u64).to_le_bytes());
    write_u32(&mut header, self.constraints.len() as u32);

    let mut constraints = Vec::new();
    for (a, b, c) in &self.constraints {
      for lc in [a, b, c] {
        write_u32(&mut constraints, lc.len() as u32);
        for (index, coeff) in lc {
          write_u32(&mut constraints, *index as u32);
          write_field(&mut constraints, coeff, n8);
        }
      }
    }

    let mut labels = Vec::new();
    for wire in 0..self.num_variables as u64 {
      labels.extend_from_slice(&wire.to_le_bytes());
    }

    let mut writer = BinFileWriter::new(R1CS_MAGIC, R1CS_VERSION, 3);
    writer
      .section(HEADER_TYPE, &header)
      .section(CONSTRAINT_TYPE, &constraints)
      .section(WIRE2LABEL_TYPE, &labels);
    writer.finish()
  }
}

/// Reads an R1CS from bytes
fn from_bytes(data: &[u8]) -> Result<R1CS, ProofError> {
  let kind = ProofError::R1csParse;
  let file = BinFile::parse(data, R1CS_MAGIC, R1CS_VERSION, kind)?;

  let header_size = file.section_size(HEADER_TYPE)?;
  let header = read_header(&mut file.section(HEADER_TYPE)?, header_size as u64)?;
  if header.field_size as usize != field_n8::<Fr>() || header.prime != modulus_bytes::<Fr>() {
    return Err(kind("r1cs is not defined over the BN254 scalar field".to_string()));
  }

  let constraints = read_constraints(&mut file.section(CONSTRAINT_TYPE)?, &header)?;
  // The wire to label map is not needed, but a well formed file carries it
  file.section(WIRE2LABEL_TYPE)?;

  let num_inputs = (1 + header.n_pub_in + header.n_pub_out) as usize;
  if (header.n_wires as usize) < num_inputs + header.n_prv_in as usize {
    return Err(kind(format!("{} wires cannot hold the declared inputs", header.n_wires)));
  }
  Ok(R1CS::new(
    header.n_pub_out as usize,
    header.n_pub_in as usize,
    header.n_prv_in as usize,
    header.n_wires as usize,
    constraints,
  ))
}

/// Reads a header from a reader
///
/// # Arguments
///
/// * `reader`: The reader to read the header from.
/// * `size`: The size of the header.
///
/// # Returns
///
/// The header.
fn read_header<R: Read>(reader: &mut R, size: u64) -> Result<Header, ProofError> {
  let kind = ProofError::R1csParse;
  let field_size = read_u32(reader, kind)?;
  if size != 32 + field_size as u64 {
    return Err(kind(format!("header section has {size} bytes for a {field_size}-byte field")));
  }
  let mut prime = vec![0u8; field_size as usize];
  reader.read_exact(&mut prime).map_err(|_| kind("truncated header".to_string()))?;

  Ok(Header {
    field_size,
    prime,
    n_wires: read_u32(reader, kind)?,
    n_pub_out: read_u32(reader, kind)?,
    n_pub_in: read_u32(reader, kind)?,
    n_prv_in: read_u32(reader, kind)?,
    n_labels: reader
      .read_u64::<LittleEndian>()
      .map_err(|_| kind("truncated header".to_string()))?,
    n_constraints: read_u32(reader, kind)?,
  })
}

/// Reads a constraint vector from a reader
fn read_constraint_vec<R: Read>(
  reader: &mut R,
  header: &Header,
) -> Result<LinearCombination, ProofError> {
  let kind = ProofError::R1csParse;
  let n_vec = read_u32(reader, kind)? as usize;
  let mut vec = Vec::with_capacity(n_vec.min(header.n_wires as usize));
  for _ in 0..n_vec {
    let index = read_u32(reader, kind)?;
    if index >= header.n_wires {
      return Err(kind(format!("constraint references wire {index} of {}", header.n_wires)));
    }
    vec.push((index as usize, read_field(reader, header.field_size as usize, kind)?));
  }
  Ok(vec)
}

/// Reads constraints from a reader
///
/// # Arguments
///
/// * `reader`: The reader to read the constraints from.
/// * `header`: The header of the R1CS.
///
/// # Returns
///
/// The constraints.
fn read_constraints<R: Read>(
  reader: &mut R,
  header: &Header,
) -> Result<Vec<Constraint>, ProofError> {
  let mut vec = Vec::with_capacity((header.n_constraints as usize).min(1 << 20));
  for _ in 0..header.n_constraints {
    let a = read_constraint_vec(reader, header)?;
    let b = read_constraint_vec(reader, header)?;
    let c = read_constraint_vec(reader, header)?;
    vec.push((a, b, c));
  }
  Ok(vec)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tests::inputs::multiplier_r1cs;

  #[test]
  #[tracing_test::traced_test]
  fn test_r1cs_from_bin() {
    let bytes = multiplier_r1cs().to_bytes();
    let r1cs = R1CS::try_from(&bytes[..]).unwrap();
    assert_eq!(r1cs.num_inputs, 2);
    assert_eq!(r1cs.num_private_inputs, 2);
    assert_eq!(r1cs.num_public_inputs, 0);
    assert_eq!(r1cs.num_public_outputs, 1);
    assert_eq!(r1cs.num_aux, 2);
    assert_eq!(r1cs, multiplier_r1cs());
  }

  #[test]
  fn test_r1cs_satisfaction() {
    let r1cs = multiplier_r1cs();
    let good: Vec<Fr> = [1u64, 12, 3, 4].into_iter().map(Fr::from).collect();
    let bad: Vec<Fr> = [1u64, 13, 3, 4].into_iter().map(Fr::from).collect();
    assert!(r1cs.is_satisfied(&good));
    assert!(!r1cs.is_satisfied(&bad));
    assert!(!r1cs.is_satisfied(&good[..3]));
  }

  #[test]
  fn test_r1cs_rejects_malformed() {
    let bytes = multiplier_r1cs().to_bytes();
    for len in [0, 10, bytes.len() - 1] {
      assert!(matches!(R1CS::try_from(&bytes[..len]), Err(ProofError::R1csParse(_))));
    }
  }
}
