//! Inputs JSON handling.
//!
//! The inputs file maps each input signal name to its value. A value is a JSON integer, a decimal
//! string (a leading `-` means `p - |v|`), a `0x` prefixed hex string, or an array of those, nested
//! arrays being flattened row-major. Values at or above the modulus are reduced.

use std::collections::BTreeMap;

use ark_ff::PrimeField;
use num_bigint::BigUint;
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use super::graph::Graph;
use crate::errors::ProofError;

/// Circom input
#[derive(Debug, Default, Deserialize)]
pub struct CircomInput {
  /// Signal name to JSON value
  #[serde(flatten)]
  pub signals: BTreeMap<String, Value>,
}

impl TryFrom<&[u8]> for CircomInput {
  type Error = ProofError;

  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    serde_json::from_slice(value)
      .map_err(|e| ProofError::InputMismatch(format!("inputs are not a JSON object: {e}")))
  }
}

impl CircomInput {
  /// Builds the graph's input buffer: slot 0 holds one, every declared signal is written at its
  /// offset.
  ///
  /// The names must match the graph's inputs exactly. Any missing or unexpected name, or a value
  /// whose element count differs from the declared length, is an `InputMismatch`.
  pub fn to_input_buffer<F: PrimeField>(&self, graph: &Graph<F>) -> Result<Vec<F>, ProofError> {
    let missing: Vec<&str> = graph
      .inputs
      .keys()
      .filter(|name| !self.signals.contains_key(*name))
      .map(String::as_str)
      .collect();
    if !missing.is_empty() {
      return Err(ProofError::InputMismatch(format!(
        "missing input signals: {}",
        missing.join(", ")
      )));
    }

    let unexpected: Vec<&str> = self
      .signals
      .keys()
      .filter(|name| !graph.inputs.contains_key(*name))
      .map(String::as_str)
      .collect();
    if !unexpected.is_empty() {
      return Err(ProofError::InputMismatch(format!(
        "unexpected input signals: {}",
        unexpected.join(", ")
      )));
    }

    let mut buffer = vec![F::zero(); graph.num_input_slots];
    buffer[0] = F::one();
    for (name, signal) in &graph.inputs {
      let mut values = Vec::with_capacity(signal.len);
      flatten(&self.signals[name], &mut values)
        .map_err(|e| ProofError::InputMismatch(format!("input {name}: {e}")))?;
      if values.len() != signal.len {
        return Err(ProofError::InputMismatch(format!(
          "input {name} expects {} values, got {}",
          signal.len,
          values.len()
        )));
      }
      trace!("input {name} -> slots {}..{}", signal.offset, signal.offset + signal.len);
      buffer[signal.offset..signal.offset + signal.len].copy_from_slice(&values);
    }
    Ok(buffer)
  }
}

/// Parses the inputs JSON and lays it out as the graph's input buffer.
pub fn parse_inputs<F: PrimeField>(inputs: &[u8], graph: &Graph<F>) -> Result<Vec<F>, ProofError> {
  CircomInput::try_from(inputs)?.to_input_buffer(graph)
}

/// Appends the field elements of a (possibly nested) JSON value.
fn flatten<F: PrimeField>(value: &Value, out: &mut Vec<F>) -> Result<(), String> {
  match value {
    Value::Array(items) => items.iter().try_for_each(|item| flatten(item, out)),
    other => {
      out.push(parse_value(other)?);
      Ok(())
    },
  }
}

/// Parses a scalar JSON value into a field element.
pub fn parse_value<F: PrimeField>(value: &Value) -> Result<F, String> {
  match value {
    Value::Number(number) =>
      if let Some(unsigned) = number.as_u64() {
        Ok(F::from(unsigned))
      } else if let Some(signed) = number.as_i64() {
        Ok(-F::from(signed.unsigned_abs()))
      } else {
        Err(format!("{number} is not an integer"))
      },
    Value::String(text) => parse_str(text.trim()),
    other => Err(format!("unsupported value {other}")),
  }
}

fn parse_str<F: PrimeField>(text: &str) -> Result<F, String> {
  let (negative, digits) = match text.strip_prefix('-') {
    Some(rest) => (true, rest),
    None => (false, text),
  };
  let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
    Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
    None => BigUint::parse_bytes(digits.as_bytes(), 10),
  }
  .ok_or_else(|| format!("{text:?} is not a decimal or hex integer"))?;

  let value = F::from_le_bytes_mod_order(&parsed.to_bytes_le());
  Ok(if negative { -value } else { value })
}
