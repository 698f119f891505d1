//! # Wtns Module
//!
//! Reading and writing of the `.wtns` witness file used across the circom tooling.
//!
//! The file is an iden3 container with magic `wtns` and two sections: a header holding the field
//! element width, the prime and the witness length, followed by the witness values in standard
//! little endian form.

use std::io::Read;

use ark_ff::PrimeField;

use super::{
  field_n8, modulus_bytes, read_field, read_u32, write_field, write_u32, BinFile, BinFileWriter,
};
use crate::errors::ProofError;

const WTNS_MAGIC: &[u8; 4] = b"wtns";
const WTNS_VERSION: u32 = 2;

const HEADER_SECTION: u32 = 1;
const DATA_SECTION: u32 = 2;

/// Serializes a witness to `.wtns` bytes.
pub fn write_witness<F: PrimeField>(witness: &[F]) -> Vec<u8> {
  let n8 = field_n8::<F>();

  let mut header = Vec::with_capacity(8 + n8);
  write_u32(&mut header, n8 as u32);
  header.extend_from_slice(&modulus_bytes::<F>());
  write_u32(&mut header, witness.len() as u32);

  let mut data = Vec::with_capacity(witness.len() * n8);
  for value in witness {
    write_field(&mut data, value, n8);
  }

  let mut writer = BinFileWriter::new(WTNS_MAGIC, WTNS_VERSION, 2);
  writer.section(HEADER_SECTION, &header).section(DATA_SECTION, &data);
  writer.finish()
}

/// Loads a witness from a bin reader
///
/// # Arguments
///
/// * `reader` - A reader over a complete `.wtns` file.
///
/// # Returns
///
/// A `Result` containing a vector of field elements. The file's prime must be the modulus of `F`.
pub fn load_witness_from_bin_reader<F: PrimeField, R: Read>(
  mut reader: R,
) -> Result<Vec<F>, ProofError> {
  let mut bytes = Vec::new();
  reader.read_to_end(&mut bytes)?;
  load_witness_from_bytes(&bytes)
}

/// Loads a witness from `.wtns` bytes held in memory.
pub fn load_witness_from_bytes<F: PrimeField>(bytes: &[u8]) -> Result<Vec<F>, ProofError> {
  let kind = ProofError::WitnessFormat;
  let file = BinFile::parse(bytes, WTNS_MAGIC, WTNS_VERSION, kind)?;

  let mut header = file.section(HEADER_SECTION)?;
  let field_size = read_u32(&mut header, kind)? as usize;
  if field_size != field_n8::<F>() {
    return Err(kind(format!("witness uses {field_size}-byte field elements")));
  }
  let mut prime = vec![0u8; field_size];
  header.read_exact(&mut prime).map_err(|_| kind("truncated header".to_string()))?;
  if prime != modulus_bytes::<F>() {
    return Err(kind("witness prime does not match the field".to_string()));
  }
  let witness_len = read_u32(&mut header, kind)? as usize;

  if file.section_size(DATA_SECTION)? != witness_len * field_size {
    return Err(kind(format!(
      "data section holds {} bytes, expected {witness_len} elements of {field_size} bytes",
      file.section_size(DATA_SECTION)?
    )));
  }
  let mut data = file.section(DATA_SECTION)?;
  let mut result = Vec::with_capacity(witness_len);
  for _ in 0..witness_len {
    result.push(read_field(&mut data, field_size, kind)?);
  }
  Ok(result)
}
