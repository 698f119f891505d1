//! # Circom Module
//!
//! The `circom` module provides utilities for working with the circom artifact formats within the
//! `proofs` crate: the precompiled witness graph and its evaluator, the `.wtns` witness file and
//! the `.r1cs` constraint system file.
//!
//! ## Modules
//!
//! - `graph`: The witness graph node arena, its binary codec and a deduplicating builder.
//! - `inputs`: Parsing of the inputs JSON into the graph's input buffer.
//! - `ops`: Circom semantics of the arithmetic, comparison and bitwise operations.
//! - `r1cs`: Reading and writing R1CS files.
//! - `witness`: The witness calculation itself.
//! - `witnesscalc`: The circom-witnesscalc `graph.bin` layout.
//! - `wtns`: Reading and writing `.wtns` files.
//!
//! All of the binary formats share the iden3 container layout implemented by [`BinFile`]: a
//! 4-byte magic, a `u32` version, a `u32` section count and then `(u32 type, u64 size, payload)`
//! sections.

use std::{
  collections::HashMap,
  io::{Cursor, Read},
};

use ark_ff::{BigInteger, PrimeField};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num_bigint::BigUint;

use crate::errors::ProofError;

pub mod graph;
pub mod inputs;
pub mod ops;
pub mod r1cs;
pub mod witness;
pub mod witnesscalc;
pub mod wtns;

pub use graph::{Graph, GraphBuilder, Node, Operation, TresOperation, UnoOperation};
pub use witness::{calculate_witness_values, evaluate};

/// Constructor for the format-specific error variant of a reader.
pub(crate) type ErrorKind = fn(String) -> ProofError;

/// Indexed view over an iden3 binary container held in memory.
pub(crate) struct BinFile<'a> {
  /// Raw container bytes
  data:     &'a [u8],
  /// section type -> (payload offset, payload size)
  sections: HashMap<u32, (usize, usize)>,
  /// Error variant used for malformed containers
  kind:     ErrorKind,
}

impl<'a> BinFile<'a> {
  /// Reads the container header and indexes every section without decoding payloads.
  pub fn parse(
    data: &'a [u8],
    magic: &[u8; 4],
    max_version: u32,
    kind: ErrorKind,
  ) -> Result<Self, ProofError> {
    let mut reader = Cursor::new(data);
    let mut header = [0u8; 4];
    reader.read_exact(&mut header).map_err(|_| kind("file is too short".to_string()))?;
    if &header != magic {
      return Err(kind(format!(
        "invalid magic, expected {:?}",
        String::from_utf8_lossy(magic)
      )));
    }

    let version = read_u32(&mut reader, kind)?;
    if version == 0 || version > max_version {
      return Err(kind(format!("unsupported version {version}")));
    }

    let num_sections = read_u32(&mut reader, kind)?;
    let mut sections = HashMap::new();
    for _ in 0..num_sections {
      let section_type = read_u32(&mut reader, kind)?;
      let section_size = reader
        .read_u64::<LittleEndian>()
        .map_err(|_| kind("truncated section header".to_string()))?;
      let offset = reader.position() as usize;
      let end = (offset as u64)
        .checked_add(section_size)
        .filter(|end| *end <= data.len() as u64)
        .ok_or_else(|| kind(format!("section {section_type} is truncated")))?;
      if sections.insert(section_type, (offset, section_size as usize)).is_some() {
        return Err(kind(format!("duplicate section {section_type}")));
      }
      reader.set_position(end);
    }

    Ok(Self { data, sections, kind })
  }

  /// Returns a reader over the payload of a required section.
  pub fn section(&self, section_type: u32) -> Result<Cursor<&'a [u8]>, ProofError> {
    let (offset, size) = self
      .sections
      .get(&section_type)
      .ok_or_else(|| (self.kind)(format!("missing section {section_type}")))?;
    Ok(Cursor::new(&self.data[*offset..*offset + *size]))
  }

  /// Payload size of a required section.
  pub fn section_size(&self, section_type: u32) -> Result<usize, ProofError> {
    self
      .sections
      .get(&section_type)
      .map(|(_, size)| *size)
      .ok_or_else(|| (self.kind)(format!("missing section {section_type}")))
  }
}

/// Builder for an iden3 binary container.
pub(crate) struct BinFileWriter {
  out: Vec<u8>,
}

impl BinFileWriter {
  pub fn new(magic: &[u8; 4], version: u32, num_sections: u32) -> Self {
    let mut out = Vec::new();
    out.extend_from_slice(magic);
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&num_sections.to_le_bytes());
    Self { out }
  }

  pub fn section(&mut self, section_type: u32, payload: &[u8]) -> &mut Self {
    self.out.extend_from_slice(&section_type.to_le_bytes());
    self.out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    self.out.extend_from_slice(payload);
    self
  }

  pub fn finish(self) -> Vec<u8> { self.out }
}

/// Reads a little endian `u32`, reporting truncation through `kind`.
pub(crate) fn read_u32<R: Read>(reader: &mut R, kind: ErrorKind) -> Result<u32, ProofError> {
  reader.read_u32::<LittleEndian>().map_err(|_| kind("unexpected end of data".to_string()))
}

/// Writes a little endian `u32`.
pub(crate) fn write_u32(out: &mut Vec<u8>, value: u32) {
  // Writing into a Vec cannot fail
  let _ = out.write_u32::<LittleEndian>(value);
}

/// Byte width of a field element of `F` in the iden3 formats.
pub fn field_n8<F: PrimeField>() -> usize { ((F::MODULUS_BIT_SIZE as usize + 63) / 64) * 8 }

/// Modulus of `F` as `n8` little endian bytes.
pub fn modulus_bytes<F: PrimeField>() -> Vec<u8> {
  let mut bytes = F::MODULUS.to_bytes_le();
  bytes.resize(field_n8::<F>(), 0);
  bytes
}

/// Reads a field element in standard (non Montgomery) little endian form.
///
/// Values that are not canonical, i.e. not below the modulus, are rejected.
pub(crate) fn read_field<F: PrimeField, R: Read>(
  reader: &mut R,
  n8: usize,
  kind: ErrorKind,
) -> Result<F, ProofError> {
  let mut repr = vec![0u8; n8];
  reader.read_exact(&mut repr).map_err(|_| kind("truncated field element".to_string()))?;
  field_from_le_bytes(&repr).ok_or_else(|| kind("field element is not canonical".to_string()))
}

/// Converts little endian bytes to a field element when the value is below the modulus.
pub fn field_from_le_bytes<F: PrimeField>(bytes: &[u8]) -> Option<F> {
  let modulus: BigUint = F::MODULUS.into();
  if BigUint::from_bytes_le(bytes) >= modulus {
    return None;
  }
  Some(F::from_le_bytes_mod_order(bytes))
}

/// Appends a field element in standard little endian form, padded to `n8` bytes.
pub(crate) fn write_field<F: PrimeField>(out: &mut Vec<u8>, value: &F, n8: usize) {
  let mut bytes = value.into_bigint().to_bytes_le();
  bytes.resize(n8, 0);
  out.extend_from_slice(&bytes);
}

/// Canonical integer value of a field element.
pub fn field_to_biguint<F: PrimeField>(value: &F) -> BigUint { value.into_bigint().into() }

/// Decimal string of a field element, as used by the circom JSON formats.
pub fn field_to_decimal<F: PrimeField>(value: &F) -> String {
  field_to_biguint(value).to_str_radix(10)
}

#[cfg(test)]
mod tests {
  use ark_bn254::Fr;

  use super::*;

  #[test]
  fn test_binfile_sections() {
    let mut writer = BinFileWriter::new(b"test", 1, 2);
    writer.section(1, &[1, 2, 3]).section(2, &[]);
    let bytes = writer.finish();

    let file = BinFile::parse(&bytes, b"test", 1, ProofError::GraphParse).unwrap();
    assert_eq!(file.section_size(1).unwrap(), 3);
    assert_eq!(file.section(1).unwrap().into_inner(), &[1, 2, 3]);
    assert!(matches!(file.section(3), Err(ProofError::GraphParse(_))));

    let newer = BinFile::parse(&bytes, b"test", 0, ProofError::GraphParse);
    assert!(matches!(newer, Err(ProofError::GraphParse(_))));
  }

  #[test]
  fn test_binfile_rejects_truncated_section() {
    let mut writer = BinFileWriter::new(b"test", 1, 1);
    writer.section(1, &[0u8; 16]);
    let mut bytes = writer.finish();
    bytes.truncate(bytes.len() - 1);

    let err = BinFile::parse(&bytes, b"test", 1, ProofError::ZkeyParse).err().unwrap();
    assert!(matches!(err, ProofError::ZkeyParse(_)));
    let err = BinFile::parse(&bytes, b"nope", 1, ProofError::ZkeyParse).err().unwrap();
    assert!(matches!(err, ProofError::ZkeyParse(_)));
  }

  #[test]
  fn test_field_bytes() {
    assert_eq!(field_n8::<Fr>(), 32);
    assert!(field_from_le_bytes::<Fr>(&modulus_bytes::<Fr>()).is_none());

    let mut out = Vec::new();
    write_field(&mut out, &Fr::from(12u64), 32);
    assert_eq!(out.len(), 32);
    assert_eq!(out[0], 12);
    assert_eq!(field_from_le_bytes::<Fr>(&out), Some(Fr::from(12u64)));
    assert_eq!(field_to_decimal(&-Fr::from(1u64)).len(), 77);
  }
}
