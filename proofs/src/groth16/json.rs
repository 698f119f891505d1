//! snarkjs JSON layouts.
//!
//! Points are written as projective coordinates in decimal, with `z = 1` for affine points and
//! `(0, 1, 0)` for the identity. G2 coordinates are `[c0, c1]` pairs.

use ark_ec::AffineRepr;
use ark_ff::{One, PrimeField, Zero};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use super::{Proof, VerifyingKey};
use crate::{
  circom::{field_from_le_bytes, field_to_decimal},
  errors::ProofError,
  Fq, Fq2, Fr, G1Affine, G2Affine,
};

/// Proof in the snarkjs layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofJson {
  pub pi_a:     Vec<String>,
  pub pi_b:     Vec<Vec<String>>,
  pub pi_c:     Vec<String>,
  pub protocol: String,
  pub curve:    String,
}

/// Verification key in the snarkjs layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyingKeyJson {
  pub protocol:   String,
  pub curve:      String,
  #[serde(rename = "nPublic")]
  pub n_public:   usize,
  pub vk_alpha_1: Vec<String>,
  pub vk_beta_2:  Vec<Vec<String>>,
  pub vk_gamma_2: Vec<Vec<String>>,
  pub vk_delta_2: Vec<Vec<String>>,
  #[serde(rename = "IC")]
  pub ic:         Vec<Vec<String>>,
}

const PROTOCOL: &str = "groth16";
const CURVE: &str = "bn128";

fn json_error(message: impl Into<String>) -> ProofError { ProofError::VerifyFailed(message.into()) }

fn fq2_to_json(value: &Fq2) -> Vec<String> {
  vec![field_to_decimal(&value.c0), field_to_decimal(&value.c1)]
}

/// Decimal coordinates of a G1 point
pub fn g1_to_json(point: &G1Affine) -> Vec<String> {
  match point.xy() {
    Some((x, y)) => vec![field_to_decimal(x), field_to_decimal(y), "1".to_string()],
    None => vec!["0".to_string(), "1".to_string(), "0".to_string()],
  }
}

/// Decimal coordinates of a G2 point
pub fn g2_to_json(point: &G2Affine) -> Vec<Vec<String>> {
  match point.xy() {
    Some((x, y)) => vec![fq2_to_json(x), fq2_to_json(y), fq2_to_json(&Fq2::one())],
    None => vec![fq2_to_json(&Fq2::zero()), fq2_to_json(&Fq2::one()), fq2_to_json(&Fq2::zero())],
  }
}

/// Parses a decimal field element, rejecting values at or above the modulus.
pub fn parse_decimal<F: PrimeField>(text: &str) -> Result<F, ProofError> {
  let value = BigUint::parse_bytes(text.trim().as_bytes(), 10)
    .ok_or_else(|| json_error(format!("{text:?} is not a decimal integer")))?;
  field_from_le_bytes(&value.to_bytes_le())
    .ok_or_else(|| json_error(format!("{text} is not a field element")))
}

fn coordinates<'a, T>(values: &'a [T], name: &str) -> Result<[&'a T; 3], ProofError> {
  match values {
    [x, y, z] => Ok([x, y, z]),
    _ => Err(json_error(format!("{name} must have three coordinates"))),
  }
}

/// Parses a G1 point from its snarkjs coordinates.
pub fn g1_from_json(values: &[String]) -> Result<G1Affine, ProofError> {
  let [x, y, z] = coordinates(values, "G1 point")?;
  let z: Fq = parse_decimal(z)?;
  if z.is_zero() {
    return Ok(G1Affine::identity());
  }
  if !z.is_one() {
    return Err(json_error("G1 point is not normalized"));
  }
  let point = G1Affine::new_unchecked(parse_decimal(x)?, parse_decimal(y)?);
  if !point.is_on_curve() {
    return Err(json_error("G1 point is not on the curve"));
  }
  Ok(point)
}

fn fq2_from_json(values: &[String]) -> Result<Fq2, ProofError> {
  match values {
    [c0, c1] => Ok(Fq2::new(parse_decimal(c0)?, parse_decimal(c1)?)),
    _ => Err(json_error("G2 coordinate must have two components")),
  }
}

/// Parses a G2 point from its snarkjs coordinates.
pub fn g2_from_json(values: &[Vec<String>]) -> Result<G2Affine, ProofError> {
  let [x, y, z] = coordinates(values, "G2 point")?;
  let z = fq2_from_json(z)?;
  if z.is_zero() {
    return Ok(G2Affine::identity());
  }
  if !z.is_one() {
    return Err(json_error("G2 point is not normalized"));
  }
  let point = G2Affine::new_unchecked(fq2_from_json(x)?, fq2_from_json(y)?);
  if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
    return Err(json_error("G2 point is not in the curve's prime order subgroup"));
  }
  Ok(point)
}

impl From<&Proof> for ProofJson {
  fn from(proof: &Proof) -> Self {
    Self {
      pi_a:     g1_to_json(&proof.a),
      pi_b:     g2_to_json(&proof.b),
      pi_c:     g1_to_json(&proof.c),
      protocol: PROTOCOL.to_string(),
      curve:    CURVE.to_string(),
    }
  }
}

impl TryFrom<&ProofJson> for Proof {
  type Error = ProofError;

  fn try_from(json: &ProofJson) -> Result<Self, Self::Error> {
    if json.protocol != PROTOCOL || json.curve != CURVE {
      return Err(json_error(format!("unsupported {} proof on {}", json.protocol, json.curve)));
    }
    Ok(Proof {
      a: g1_from_json(&json.pi_a)?,
      b: g2_from_json(&json.pi_b)?,
      c: g1_from_json(&json.pi_c)?,
    })
  }
}

impl From<&VerifyingKey> for VerifyingKeyJson {
  fn from(vk: &VerifyingKey) -> Self {
    Self {
      protocol:   PROTOCOL.to_string(),
      curve:      CURVE.to_string(),
      n_public:   vk.n_public(),
      vk_alpha_1: g1_to_json(&vk.alpha_g1),
      vk_beta_2:  g2_to_json(&vk.beta_g2),
      vk_gamma_2: g2_to_json(&vk.gamma_g2),
      vk_delta_2: g2_to_json(&vk.delta_g2),
      ic:         vk.ic.iter().map(g1_to_json).collect(),
    }
  }
}

impl TryFrom<&VerifyingKeyJson> for VerifyingKey {
  type Error = ProofError;

  fn try_from(json: &VerifyingKeyJson) -> Result<Self, Self::Error> {
    if json.protocol != PROTOCOL || json.curve != CURVE {
      return Err(json_error(format!("unsupported {} key on {}", json.protocol, json.curve)));
    }
    if json.ic.len() != json.n_public + 1 {
      return Err(json_error(format!(
        "key declares {} public signals but has {} IC points",
        json.n_public,
        json.ic.len()
      )));
    }
    Ok(VerifyingKey {
      alpha_g1: g1_from_json(&json.vk_alpha_1)?,
      beta_g2:  g2_from_json(&json.vk_beta_2)?,
      gamma_g2: g2_from_json(&json.vk_gamma_2)?,
      delta_g2: g2_from_json(&json.vk_delta_2)?,
      ic:       json.ic.iter().map(|point| g1_from_json(point)).collect::<Result<_, _>>()?,
    })
  }
}

/// Public signals as the JSON array of decimal strings snarkjs expects.
pub fn public_signals_to_json(signals: &[Fr]) -> Result<String, ProofError> {
  let signals: Vec<String> = signals.iter().map(field_to_decimal).collect();
  Ok(serde_json::to_string(&signals)?)
}

/// Parses a JSON array of decimal strings into public signals.
pub fn public_signals_from_json(json: &str) -> Result<Vec<Fr>, ProofError> {
  let signals: Vec<String> = serde_json::from_str(json)
    .map_err(|e| ProofError::VerifyFailed(format!("malformed public signals: {e}")))?;
  signals.iter().map(|signal| parse_decimal(signal)).collect()
}
