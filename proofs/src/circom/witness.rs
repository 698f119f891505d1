//! # Witness Module
//!
//! The `witness` module evaluates a witness graph against concrete inputs.
//!
//! Evaluation visits the node arena once in topological order and stores each node's value in a
//! table indexed by node position, so a node shared by several users is computed a single time.
//! The witness is then read off the table through the graph's witness signal mapping.
//!
//! ## Functions
//!
//! - `evaluate`: Evaluates a graph against an already built input buffer.
//! - `calculate_witness_values`: Parses the inputs JSON and evaluates the graph.
//! - `generate_witness_from_graph`: Decodes a graph blob and computes the BN254 witness.

use std::time::Instant;

use ark_ff::PrimeField;
use tracing::{debug, info};

use super::{
  graph::{Graph, Node},
  inputs::parse_inputs,
  ops::{apply_op, apply_tres, apply_uno},
};
use crate::{errors::ProofError, Fr};

/// Evaluates every node of `graph` and returns the witness.
///
/// # Arguments
///
/// * `graph` - A validated witness graph.
/// * `input_buffer` - One value per input slot, slot 0 holding one.
///
/// # Returns
///
/// A `Result` containing one field element per witness slot.
pub fn evaluate<F: PrimeField>(graph: &Graph<F>, input_buffer: &[F]) -> Result<Vec<F>, ProofError> {
  if input_buffer.len() != graph.num_input_slots {
    return Err(ProofError::InputMismatch(format!(
      "graph expects {} input slots, got {}",
      graph.num_input_slots,
      input_buffer.len()
    )));
  }

  let mut values = vec![F::zero(); graph.nodes.len()];
  for &index in graph.topological_order() {
    values[index] = match &graph.nodes[index] {
      Node::Input(slot) => input_buffer[*slot],
      Node::Constant(value) => *value,
      Node::Op(op, a, b) => apply_op(*op, &values[*a], &values[*b])
        .map_err(|e| annotate(e, index))?,
      Node::UnoOp(op, a) => apply_uno(*op, &values[*a]),
      Node::TresOp(op, a, b, c) => apply_tres(*op, &values[*a], &values[*b], &values[*c]),
      Node::Assert(value, expected) => {
        if values[*value] != values[*expected] {
          return Err(ProofError::ConstraintViolation(format!(
            "assertion at node {index} failed: node {value} differs from node {expected}"
          )));
        }
        values[*value]
      },
    };
  }

  Ok(graph.witness_signals.iter().map(|signal| values[*signal]).collect())
}

fn annotate(error: ProofError, index: usize) -> ProofError {
  match error {
    ProofError::ConstraintViolation(message) =>
      ProofError::ConstraintViolation(format!("{message} at node {index}")),
    other => other,
  }
}

/// Parses the inputs JSON against `graph` and computes the witness.
pub fn calculate_witness_values<F: PrimeField>(
  inputs: &[u8],
  graph: &Graph<F>,
) -> Result<Vec<F>, ProofError> {
  let input_buffer = parse_inputs(inputs, graph)?;
  evaluate(graph, &input_buffer)
}

/// Generates a witness from a graph
///
/// # Arguments
///
/// * `input_json` - The inputs JSON bytes.
/// * `graph_data` - The serialized graph.
///
/// # Returns
///
/// A `Result` containing a vector of field elements.
pub fn generate_witness_from_graph(
  input_json: &[u8],
  graph_data: &[u8],
) -> Result<Vec<Fr>, ProofError> {
  let start = Instant::now();
  let graph = Graph::<Fr>::try_from(graph_data)?;
  debug!("graph decoded in {:?}", start.elapsed());

  let witness = calculate_witness_values(input_json, &graph)?;
  info!("computed {} witness values in {:?}", witness.len(), start.elapsed());
  Ok(witness)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::circom::{GraphBuilder, Operation};

  /// out = a * b, with the product reused by an intermediate signal `out + out`
  fn shared_graph() -> Graph<Fr> {
    let mut builder = GraphBuilder::<Fr>::new();
    let one = builder.one();
    let a = builder.input("a", 1)[0];
    let b = builder.input("b", 1)[0];
    let out = builder.op(Operation::Mul, a, b);
    let double = builder.op(Operation::Add, out, out);
    builder.witness(one).witness(out).witness(a).witness(b).witness(double);
    builder.build().unwrap()
  }

  #[test]
  #[tracing_test::traced_test]
  fn test_evaluate_shared_nodes() {
    let witness = calculate_witness_values(br#"{"a": "3", "b": "4"}"#, &shared_graph()).unwrap();
    let expected: Vec<Fr> = [1u64, 12, 3, 4, 24].into_iter().map(Fr::from).collect();
    assert_eq!(witness, expected);
  }

  #[test]
  fn test_evaluate_rejects_wrong_buffer() {
    let err = evaluate(&shared_graph(), &[Fr::from(1u64)]).unwrap_err();
    assert!(matches!(err, ProofError::InputMismatch(_)));
  }

  #[test]
  fn test_failed_assertion() {
    let mut builder = GraphBuilder::<Fr>::new();
    let a = builder.input("a", 1)[0];
    let seven = builder.constant(Fr::from(7u64));
    let checked = builder.assert_eq(a, seven);
    builder.witness(checked);
    let graph = builder.build().unwrap();

    assert_eq!(calculate_witness_values(br#"{"a": 7}"#, &graph).unwrap(), vec![Fr::from(7u64)]);
    let err = calculate_witness_values(br#"{"a": 8}"#, &graph).unwrap_err();
    assert!(matches!(err, ProofError::ConstraintViolation(_)));
  }

  #[test]
  fn test_generate_from_graph_bytes() {
    let bytes = shared_graph().to_bytes();
    let witness = generate_witness_from_graph(br#"{"a": 5, "b": "0x2"}"#, &bytes).unwrap();
    assert_eq!(witness[1], Fr::from(10u64));
    assert!(matches!(
      generate_witness_from_graph(br#"{"a": 5, "b": 2}"#, &bytes[..20]),
      Err(ProofError::GraphParse(_))
    ));
  }
}
