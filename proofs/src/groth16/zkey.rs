//! Reading and writing snarkjs `.zkey` proving keys.
//!
//! Curve coordinates are stored in Montgomery form and the coefficient values in double
//! Montgomery form (`x * R^2 mod r`), both as 32 little endian bytes. Everything read is checked:
//! the field moduli must be BN254's, every point must be on the curve and in the prime order
//! subgroup, and every coefficient must address a constraint and signal that exist.

use std::io::Read;

use ark_ff::{BigInt, BigInteger, PrimeField};
use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use super::{Coefficient, Matrix, ProvingKey, VerifyingKey};
use crate::{
  circom::{modulus_bytes, read_u32, write_u32, BinFile, BinFileWriter},
  errors::ProofError,
  Fq, Fq2, Fr, G1Affine, G2Affine,
};

const ZKEY_MAGIC: &[u8; 4] = b"zkey";
const ZKEY_VERSION: u32 = 1;
const GROTH16_PROTOCOL: u32 = 1;

const HEADER_SECTION: u32 = 1;
const GROTH16_HEADER_SECTION: u32 = 2;
const IC_SECTION: u32 = 3;
const COEFFS_SECTION: u32 = 4;
const A_SECTION: u32 = 5;
const B1_SECTION: u32 = 6;
const B2_SECTION: u32 = 7;
const C_SECTION: u32 = 8;
const H_SECTION: u32 = 9;
const CONTRIBUTIONS_SECTION: u32 = 10;

const N8: usize = 32;
const G1_SIZE: usize = 2 * N8;
const G2_SIZE: usize = 4 * N8;
const COEFFICIENT_SIZE: usize = 12 + N8;

fn parse_error(message: impl Into<String>) -> ProofError { ProofError::ZkeyParse(message.into()) }

impl TryFrom<&[u8]> for ProvingKey {
  type Error = ProofError;

  fn try_from(value: &[u8]) -> Result<Self, Self::Error> { read_zkey(value) }
}

/// Reads a proving key from zkey bytes.
///
/// # Arguments
///
/// * `data` - A complete `.zkey` file.
///
/// # Returns
///
/// The proving key, or `ZkeyParse` describing the first malformed part.
pub fn read_zkey(data: &[u8]) -> Result<ProvingKey, ProofError> {
  let kind = ProofError::ZkeyParse;
  let file = BinFile::parse(data, ZKEY_MAGIC, ZKEY_VERSION, kind)?;

  let protocol = read_u32(&mut file.section(HEADER_SECTION)?, kind)?;
  if protocol != GROTH16_PROTOCOL {
    return Err(parse_error(format!("protocol {protocol} is not groth16")));
  }

  let mut header = file.section(GROTH16_HEADER_SECTION)?;
  read_modulus(&mut header, &modulus_bytes::<Fq>(), "base")?;
  read_modulus(&mut header, &modulus_bytes::<Fr>(), "scalar")?;
  let n_vars = read_u32(&mut header, kind)? as usize;
  let n_public = read_u32(&mut header, kind)? as usize;
  let domain_size = read_u32(&mut header, kind)? as usize;
  if !domain_size.is_power_of_two() {
    return Err(parse_error(format!("domain size {domain_size} is not a power of two")));
  }
  if n_vars <= n_public {
    return Err(parse_error(format!("{n_vars} signals cannot hold {n_public} public signals")));
  }

  let alpha_g1 = read_g1(&mut header)?;
  let beta_g1 = read_g1(&mut header)?;
  let beta_g2 = read_g2(&mut header)?;
  let gamma_g2 = read_g2(&mut header)?;
  let delta_g1 = read_g1(&mut header)?;
  let delta_g2 = read_g2(&mut header)?;
  debug!("zkey header: {n_vars} signals, {n_public} public, domain {domain_size}");

  let ic = read_g1_section(&file, IC_SECTION, n_public + 1)?;
  let coefficients = read_coefficients(&file, n_vars, domain_size)?;
  let a_query = read_g1_section(&file, A_SECTION, n_vars)?;
  let b_g1_query = read_g1_section(&file, B1_SECTION, n_vars)?;
  let b_g2_query = read_g2_section(&file, B2_SECTION, n_vars)?;
  let c_query = read_g1_section(&file, C_SECTION, n_vars - n_public - 1)?;
  let h_query = read_g1_section(&file, H_SECTION, domain_size)?;

  Ok(ProvingKey {
    n_vars,
    n_public,
    domain_size,
    vk: VerifyingKey { alpha_g1, beta_g2, gamma_g2, delta_g2, ic },
    beta_g1,
    delta_g1,
    coefficients,
    a_query,
    b_g1_query,
    b_g2_query,
    c_query,
    h_query,
  })
}

fn read_modulus<R: Read>(reader: &mut R, expected: &[u8], name: &str) -> Result<(), ProofError> {
  let n8 = read_u32(reader, ProofError::ZkeyParse)? as usize;
  if n8 != expected.len() {
    return Err(parse_error(format!("{name} field uses {n8}-byte elements")));
  }
  let mut modulus = vec![0u8; n8];
  reader.read_exact(&mut modulus).map_err(|_| parse_error("truncated groth16 header"))?;
  if modulus != expected {
    return Err(parse_error(format!("{name} field modulus is not BN254's")));
  }
  Ok(())
}

fn read_coefficients(
  file: &BinFile,
  n_vars: usize,
  domain_size: usize,
) -> Result<Vec<Coefficient>, ProofError> {
  let mut section = file.section(COEFFS_SECTION)?;
  let n_coefficients = read_u32(&mut section, ProofError::ZkeyParse)? as usize;
  if file.section_size(COEFFS_SECTION)? != 4 + n_coefficients * COEFFICIENT_SIZE {
    return Err(parse_error(format!("coefficient section does not hold {n_coefficients} entries")));
  }

  let mut coefficients = Vec::with_capacity(n_coefficients);
  for _ in 0..n_coefficients {
    let matrix = match read_u32(&mut section, ProofError::ZkeyParse)? {
      0 => Matrix::A,
      1 => Matrix::B,
      other => return Err(parse_error(format!("coefficient names unknown matrix {other}"))),
    };
    let constraint = read_u32(&mut section, ProofError::ZkeyParse)? as usize;
    let signal = read_u32(&mut section, ProofError::ZkeyParse)? as usize;
    if constraint >= domain_size || signal >= n_vars {
      return Err(parse_error(format!(
        "coefficient ({constraint}, {signal}) is outside the {domain_size} x {n_vars} matrix"
      )));
    }
    let value = read_double_montgomery(&mut section)?;
    coefficients.push(Coefficient { matrix, constraint, signal, value });
  }
  Ok(coefficients)
}

fn read_limbs<R: Read>(reader: &mut R) -> Result<BigInt<4>, ProofError> {
  let mut limbs = [0u64; 4];
  reader
    .read_u64_into::<LittleEndian>(&mut limbs)
    .map_err(|_| parse_error("truncated field element"))?;
  Ok(BigInt::new(limbs))
}

/// Reads a base field element stored in Montgomery form.
fn read_fq<R: Read>(reader: &mut R) -> Result<Fq, ProofError> {
  let limbs = read_limbs(reader)?;
  if limbs >= Fq::MODULUS {
    return Err(parse_error("curve coordinate is not below the base field modulus"));
  }
  Ok(Fq::new_unchecked(limbs))
}

/// Reads a scalar stored as `x * R^2 mod r`.
fn read_double_montgomery<R: Read>(reader: &mut R) -> Result<Fr, ProofError> {
  let limbs = read_limbs(reader)?;
  if limbs >= Fr::MODULUS {
    return Err(parse_error("coefficient is not below the scalar field modulus"));
  }
  // Stripping one Montgomery factor leaves the Montgomery form of the value
  Ok(Fr::new_unchecked(Fr::new_unchecked(limbs).into_bigint()))
}

fn read_g1<R: Read>(reader: &mut R) -> Result<G1Affine, ProofError> {
  let x = read_fq(reader)?;
  let y = read_fq(reader)?;
  if x.0.is_zero() && y.0.is_zero() {
    return Ok(G1Affine::identity());
  }
  let point = G1Affine::new_unchecked(x, y);
  if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
    return Err(parse_error("G1 point is not in the curve's prime order subgroup"));
  }
  Ok(point)
}

fn read_g2<R: Read>(reader: &mut R) -> Result<G2Affine, ProofError> {
  let x = Fq2::new(read_fq(reader)?, read_fq(reader)?);
  let y = Fq2::new(read_fq(reader)?, read_fq(reader)?);
  if x.c0.0.is_zero() && x.c1.0.is_zero() && y.c0.0.is_zero() && y.c1.0.is_zero() {
    return Ok(G2Affine::identity());
  }
  let point = G2Affine::new_unchecked(x, y);
  if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
    return Err(parse_error("G2 point is not in the curve's prime order subgroup"));
  }
  Ok(point)
}

fn read_g1_section(
  file: &BinFile,
  section_type: u32,
  count: usize,
) -> Result<Vec<G1Affine>, ProofError> {
  let size = file.section_size(section_type)?;
  if size != count * G1_SIZE {
    return Err(parse_error(format!(
      "section {section_type} holds {size} bytes, expected {count} G1 points"
    )));
  }
  let mut section = file.section(section_type)?;
  (0..count).map(|_| read_g1(&mut section)).collect()
}

fn read_g2_section(
  file: &BinFile,
  section_type: u32,
  count: usize,
) -> Result<Vec<G2Affine>, ProofError> {
  let size = file.section_size(section_type)?;
  if size != count * G2_SIZE {
    return Err(parse_error(format!(
      "section {section_type} holds {size} bytes, expected {count} G2 points"
    )));
  }
  let mut section = file.section(section_type)?;
  (0..count).map(|_| read_g2(&mut section)).collect()
}

fn write_limbs(out: &mut Vec<u8>, limbs: &BigInt<4>) {
  for limb in limbs.0 {
    out.extend_from_slice(&limb.to_le_bytes());
  }
}

fn write_g1(out: &mut Vec<u8>, point: &G1Affine) {
  if point.infinity {
    out.extend_from_slice(&[0u8; G1_SIZE]);
    return;
  }
  write_limbs(out, &point.x.0);
  write_limbs(out, &point.y.0);
}

fn write_g2(out: &mut Vec<u8>, point: &G2Affine) {
  if point.infinity {
    out.extend_from_slice(&[0u8; G2_SIZE]);
    return;
  }
  for coordinate in [point.x.c0, point.x.c1, point.y.c0, point.y.c1] {
    write_limbs(out, &coordinate.0);
  }
}

fn g1_section(points: &[G1Affine]) -> Vec<u8> {
  let mut out = Vec::with_capacity(points.len() * G1_SIZE);
  points.iter().for_each(|point| write_g1(&mut out, point));
  out
}

impl ProvingKey {
  /// Serializes the key as a snarkjs zkey with an empty contribution list.
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut header = Vec::new();
    write_u32(&mut header, GROTH16_PROTOCOL);

    let mut groth16 = Vec::new();
    write_u32(&mut groth16, N8 as u32);
    groth16.extend_from_slice(&modulus_bytes::<Fq>());
    write_u32(&mut groth16, N8 as u32);
    groth16.extend_from_slice(&modulus_bytes::<Fr>());
    write_u32(&mut groth16, self.n_vars as u32);
    write_u32(&mut groth16, self.n_public as u32);
    write_u32(&mut groth16, self.domain_size as u32);
    write_g1(&mut groth16, &self.vk.alpha_g1);
    write_g1(&mut groth16, &self.beta_g1);
    write_g2(&mut groth16, &self.vk.beta_g2);
    write_g2(&mut groth16, &self.vk.gamma_g2);
    write_g1(&mut groth16, &self.delta_g1);
    write_g2(&mut groth16, &self.vk.delta_g2);

    let mut coefficients = Vec::with_capacity(4 + self.coefficients.len() * COEFFICIENT_SIZE);
    write_u32(&mut coefficients, self.coefficients.len() as u32);
    for coefficient in &self.coefficients {
      write_u32(&mut coefficients, coefficient.matrix as u32);
      write_u32(&mut coefficients, coefficient.constraint as u32);
      write_u32(&mut coefficients, coefficient.signal as u32);
      // The Montgomery form of `x * R` is `x * R^2`
      let shifted = Fr::from_le_bytes_mod_order(&coefficient.value.0.to_bytes_le());
      write_limbs(&mut coefficients, &shifted.0);
    }

    let mut b2 = Vec::with_capacity(self.b_g2_query.len() * G2_SIZE);
    self.b_g2_query.iter().for_each(|point| write_g2(&mut b2, point));

    // No ceremony transcript, just the empty contribution list
    let mut contributions = Vec::new();
    contributions.extend_from_slice(&[0u8; 64]);
    write_u32(&mut contributions, 0);

    let mut writer = BinFileWriter::new(ZKEY_MAGIC, ZKEY_VERSION, 10);
    writer
      .section(HEADER_SECTION, &header)
      .section(GROTH16_HEADER_SECTION, &groth16)
      .section(IC_SECTION, &g1_section(&self.vk.ic))
      .section(COEFFS_SECTION, &coefficients)
      .section(A_SECTION, &g1_section(&self.a_query))
      .section(B1_SECTION, &g1_section(&self.b_g1_query))
      .section(B2_SECTION, &b2)
      .section(C_SECTION, &g1_section(&self.c_query))
      .section(H_SECTION, &g1_section(&self.h_query))
      .section(CONTRIBUTIONS_SECTION, &contributions);
    writer.finish()
  }
}
