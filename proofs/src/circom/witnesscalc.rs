//! # Witnesscalc Graph Module
//!
//! Reading and writing the `graph.bin` files emitted by circom-witnesscalc's `build-circuit`.
//!
//! ## Layout
//!
//! 1. magic `wtns.graph.001`
//! 2. `u64` node count
//! 3. one length delimited protobuf `Node` message per node
//! 4. a length delimited protobuf `GraphMetadata` message
//! 5. `u64` offset of the metadata message
//!
//! Constants are little endian integers in standard form. Input slot 0 holds the constant one, as
//! in this crate's own layout.

use std::collections::BTreeMap;

use ark_ff::{BigInteger, PrimeField};
use byteorder::{LittleEndian, ReadBytesExt};
use prost::Message;
use tracing::debug;

use super::{
  field_from_le_bytes, field_n8,
  graph::{Graph, InputSignal, Node, Operation, TresOperation, UnoOperation},
};
use crate::errors::ProofError;

pub(crate) const WITNESSCALC_MAGIC: &[u8] = b"wtns.graph.001";

/// Protobuf messages of the `circom_witnesscalc.proto` package.
mod proto {
  use std::collections::BTreeMap;

  #[derive(Clone, PartialEq, prost::Message)]
  pub struct BigUInt {
    #[prost(bytes = "vec", tag = "1")]
    pub value_le: Vec<u8>,
  }

  #[derive(Clone, Copy, PartialEq, prost::Message)]
  pub struct InputNode {
    #[prost(uint32, tag = "1")]
    pub idx: u32,
  }

  #[derive(Clone, PartialEq, prost::Message)]
  pub struct ConstantNode {
    #[prost(message, optional, tag = "1")]
    pub value: Option<BigUInt>,
  }

  #[derive(Clone, Copy, PartialEq, prost::Message)]
  pub struct UnoOpNode {
    #[prost(int32, tag = "1")]
    pub op:    i32,
    #[prost(uint32, tag = "2")]
    pub a_idx: u32,
  }

  #[derive(Clone, Copy, PartialEq, prost::Message)]
  pub struct DuoOpNode {
    #[prost(int32, tag = "1")]
    pub op:    i32,
    #[prost(uint32, tag = "2")]
    pub a_idx: u32,
    #[prost(uint32, tag = "3")]
    pub b_idx: u32,
  }

  #[derive(Clone, Copy, PartialEq, prost::Message)]
  pub struct TresOpNode {
    #[prost(int32, tag = "1")]
    pub op:    i32,
    #[prost(uint32, tag = "2")]
    pub a_idx: u32,
    #[prost(uint32, tag = "3")]
    pub b_idx: u32,
    #[prost(uint32, tag = "4")]
    pub c_idx: u32,
  }

  #[derive(Clone, PartialEq, prost::Message)]
  pub struct Node {
    #[prost(oneof = "node::Kind", tags = "1, 2, 3, 4, 5")]
    pub node: Option<node::Kind>,
  }

  pub mod node {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
      #[prost(message, tag = "1")]
      Input(super::InputNode),
      #[prost(message, tag = "2")]
      Constant(super::ConstantNode),
      #[prost(message, tag = "3")]
      UnoOp(super::UnoOpNode),
      #[prost(message, tag = "4")]
      DuoOp(super::DuoOpNode),
      #[prost(message, tag = "5")]
      TresOp(super::TresOpNode),
    }
  }

  #[derive(Clone, Copy, PartialEq, prost::Message)]
  pub struct SignalDescription {
    #[prost(uint32, tag = "1")]
    pub offset: u32,
    #[prost(uint32, tag = "2")]
    pub len:    u32,
  }

  #[derive(Clone, PartialEq, prost::Message)]
  pub struct GraphMetadata {
    #[prost(uint32, repeated, tag = "1")]
    pub witness_signals: Vec<u32>,
    #[prost(btree_map = "string, message", tag = "2")]
    pub inputs:          BTreeMap<String, SignalDescription>,
  }
}

fn parse_error(message: String) -> ProofError { ProofError::GraphParse(message) }

fn op_code<T>(index: usize, code: i32, from_code: fn(u8) -> Option<T>) -> Result<T, ProofError> {
  u8::try_from(code)
    .ok()
    .and_then(from_code)
    .ok_or_else(|| parse_error(format!("node {index} has unknown operation {code}")))
}

fn node_from_proto<F: PrimeField>(index: usize, node: proto::Node) -> Result<Node<F>, ProofError> {
  use proto::node::Kind;

  let kind = node.node.ok_or_else(|| parse_error(format!("node {index} is empty")))?;
  Ok(match kind {
    Kind::Input(input) => Node::Input(input.idx as usize),
    Kind::Constant(constant) => {
      let value = constant
        .value
        .ok_or_else(|| parse_error(format!("constant node {index} has no value")))?
        .value_le;
      if value.len() > field_n8::<F>() {
        return Err(parse_error(format!("constant node {index} is {} bytes wide", value.len())));
      }
      let value = field_from_le_bytes(&value)
        .ok_or_else(|| parse_error(format!("constant node {index} is not canonical")))?;
      Node::Constant(value)
    },
    Kind::UnoOp(op) =>
      Node::UnoOp(op_code(index, op.op, UnoOperation::from_code)?, op.a_idx as usize),
    Kind::DuoOp(op) => Node::Op(
      op_code(index, op.op, Operation::from_code)?,
      op.a_idx as usize,
      op.b_idx as usize,
    ),
    Kind::TresOp(op) => Node::TresOp(
      op_code(index, op.op, TresOperation::from_code)?,
      op.a_idx as usize,
      op.b_idx as usize,
      op.c_idx as usize,
    ),
  })
}

fn node_to_proto<F: PrimeField>(index: usize, node: &Node<F>) -> Result<proto::Node, ProofError> {
  use proto::node::Kind;

  let kind = match node {
    Node::Input(slot) => Kind::Input(proto::InputNode { idx: *slot as u32 }),
    Node::Constant(value) => Kind::Constant(proto::ConstantNode {
      value: Some(proto::BigUInt { value_le: value.into_bigint().to_bytes_le() }),
    }),
    Node::UnoOp(op, a) => Kind::UnoOp(proto::UnoOpNode { op: op.code() as i32, a_idx: *a as u32 }),
    Node::Op(op, a, b) =>
      Kind::DuoOp(proto::DuoOpNode { op: op.code() as i32, a_idx: *a as u32, b_idx: *b as u32 }),
    Node::TresOp(op, a, b, c) => Kind::TresOp(proto::TresOpNode {
      op:    op.code() as i32,
      a_idx: *a as u32,
      b_idx: *b as u32,
      c_idx: *c as u32,
    }),
    Node::Assert(..) =>
      return Err(parse_error(format!("assertion node {index} has no witnesscalc encoding"))),
  };
  Ok(proto::Node { node: Some(kind) })
}

/// Decodes and validates a circom-witnesscalc `graph.bin`.
pub(crate) fn read_witnesscalc_graph<F: PrimeField>(data: &[u8]) -> Result<Graph<F>, ProofError> {
  let mut rest = data
    .strip_prefix(WITNESSCALC_MAGIC)
    .ok_or_else(|| parse_error("invalid magic, expected \"wtns.graph.001\"".to_string()))?;
  let num_nodes = rest
    .read_u64::<LittleEndian>()
    .map_err(|_| parse_error("truncated node count".to_string()))?;

  // Every node takes at least its length prefix, which bounds the allocation on corrupt counts
  if num_nodes > rest.len() as u64 {
    return Err(parse_error(format!("file too small for {num_nodes} nodes")));
  }
  let mut nodes = Vec::with_capacity(num_nodes as usize);
  for index in 0..num_nodes as usize {
    let node = proto::Node::decode_length_delimited(&mut rest)
      .map_err(|e| parse_error(format!("node {index}: {e}")))?;
    nodes.push(node_from_proto(index, node)?);
  }

  let metadata = proto::GraphMetadata::decode_length_delimited(&mut rest)
    .map_err(|e| parse_error(format!("graph metadata: {e}")))?;
  // The trailing metadata offset is optional
  if !rest.is_empty() && rest.len() != 8 {
    return Err(parse_error(format!("{} trailing bytes after the metadata", rest.len())));
  }

  let witness_signals = metadata.witness_signals.iter().map(|signal| *signal as usize).collect();
  let inputs: BTreeMap<String, InputSignal> = metadata
    .inputs
    .into_iter()
    .map(|(name, signal)| {
      (name, InputSignal { offset: signal.offset as usize, len: signal.len as usize })
    })
    .collect();
  let num_input_slots =
    inputs.values().map(|signal| signal.offset + signal.len).max().unwrap_or(1).max(1);

  let graph = Graph::new(nodes, witness_signals, inputs, num_input_slots)?;
  debug!(
    "parsed witnesscalc graph with {} nodes, {} witness signals and {} inputs",
    graph.nodes.len(),
    graph.witness_len(),
    graph.inputs.len()
  );
  Ok(graph)
}

impl<F: PrimeField> Graph<F> {
  /// Serializes the graph in the circom-witnesscalc `graph.bin` layout.
  ///
  /// Assertion nodes have no counterpart in that layout and make this fail with `GraphParse`.
  pub fn to_witnesscalc_bytes(&self) -> Result<Vec<u8>, ProofError> {
    let mut out = WITNESSCALC_MAGIC.to_vec();
    out.extend_from_slice(&(self.nodes.len() as u64).to_le_bytes());
    for (index, node) in self.nodes.iter().enumerate() {
      out.extend_from_slice(&node_to_proto(index, node)?.encode_length_delimited_to_vec());
    }

    let metadata_offset = out.len() as u64;
    let metadata = proto::GraphMetadata {
      witness_signals: self.witness_signals.iter().map(|signal| *signal as u32).collect(),
      inputs:          self
        .inputs
        .iter()
        .map(|(name, signal)| {
          let description =
            proto::SignalDescription { offset: signal.offset as u32, len: signal.len as u32 };
          (name.clone(), description)
        })
        .collect(),
    };
    out.extend_from_slice(&metadata.encode_length_delimited_to_vec());
    out.extend_from_slice(&metadata_offset.to_le_bytes());
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use ark_bn254::Fr;

  use super::*;
  use crate::circom::{witness::evaluate, GraphBuilder};

  /// `out = a * b + 5` encoded by hand: four input and op nodes, a one byte constant and the
  /// metadata mapping `a` and `b` to slots 1 and 2.
  #[rustfmt::skip]
  const FIXTURE: &[u8] = &[
    b'w', b't', b'n', b's', b'.', b'g', b'r', b'a', b'p', b'h', b'.', b'0', b'0', b'1',
    6, 0, 0, 0, 0, 0, 0, 0,
    // Input(0), Input(1), Input(2)
    0x02, 0x0a, 0x00,
    0x04, 0x0a, 0x02, 0x08, 0x01,
    0x04, 0x0a, 0x02, 0x08, 0x02,
    // Mul(1, 2)
    0x06, 0x22, 0x04, 0x10, 0x01, 0x18, 0x02,
    // Constant(5)
    0x07, 0x12, 0x05, 0x0a, 0x03, 0x0a, 0x01, 0x05,
    // Add(3, 4)
    0x08, 0x22, 0x06, 0x08, 0x02, 0x10, 0x03, 0x18, 0x04,
    // witness [0, 5, 1, 2], inputs {a: (1, 1), b: (2, 1)}
    0x1c, 0x0a, 0x04, 0x00, 0x05, 0x01, 0x02,
    0x12, 0x09, 0x0a, 0x01, b'a', 0x12, 0x04, 0x08, 0x01, 0x10, 0x01,
    0x12, 0x09, 0x0a, 0x01, b'b', 0x12, 0x04, 0x08, 0x02, 0x10, 0x01,
    59, 0, 0, 0, 0, 0, 0, 0,
  ];

  #[test]
  #[tracing_test::traced_test]
  fn test_reads_witnesscalc_fixture() {
    let graph = Graph::<Fr>::try_from(FIXTURE).unwrap();
    assert_eq!(graph.nodes, vec![
      Node::Input(0),
      Node::Input(1),
      Node::Input(2),
      Node::Op(Operation::Mul, 1, 2),
      Node::Constant(Fr::from(5u64)),
      Node::Op(Operation::Add, 3, 4),
    ]);
    assert_eq!(graph.witness_signals, vec![0, 5, 1, 2]);
    assert_eq!(graph.inputs["b"], InputSignal { offset: 2, len: 1 });
    assert_eq!(graph.num_input_slots, 3);

    let buffer = [1u64, 3, 4].map(Fr::from);
    let witness = evaluate(&graph, &buffer).unwrap();
    assert_eq!(witness, [1u64, 17, 3, 4].map(Fr::from).to_vec());
  }

  #[test]
  fn test_metadata_may_end_the_file() {
    let graph = Graph::<Fr>::try_from(&FIXTURE[..FIXTURE.len() - 8]).unwrap();
    assert_eq!(graph.witness_len(), 4);
  }

  #[test]
  fn test_witnesscalc_bytes_round_trip() {
    let mut builder = GraphBuilder::<Fr>::new();
    let one = builder.one();
    let x = builder.input("x", 2);
    let product = builder.op(Operation::Mul, x[0], x[1]);
    let neg = builder.uno(UnoOperation::Neg, product);
    let big = builder.constant(-Fr::from(1u64));
    let sel = builder.tres(TresOperation::TernCond, x[0], neg, big);
    builder.witness(one).witness(sel).witness(x[0]).witness(x[1]);
    let graph = builder.build().unwrap();

    let bytes = graph.to_witnesscalc_bytes().unwrap();
    assert!(bytes.starts_with(WITNESSCALC_MAGIC));
    assert_eq!(Graph::<Fr>::try_from(&bytes[..]).unwrap(), graph);
  }

  #[test]
  fn test_assertions_cannot_be_written() {
    let mut builder = GraphBuilder::<Fr>::new();
    let a = builder.input("a", 1)[0];
    let checked = builder.assert_eq(a, a);
    builder.witness(checked);
    let err = builder.build().unwrap().to_witnesscalc_bytes().unwrap_err();
    assert!(matches!(err, ProofError::GraphParse(_)));
  }

  #[test]
  fn test_rejects_malformed_witnesscalc_graphs() {
    for len in [3, WITNESSCALC_MAGIC.len() + 4, 30, 60, FIXTURE.len() - 4] {
      let err = Graph::<Fr>::try_from(&FIXTURE[..len]).unwrap_err();
      assert!(matches!(err, ProofError::GraphParse(_)), "prefix of {len} bytes");
    }

    // Mul(1, 2) becomes operation 42
    let mut unknown_op = FIXTURE.to_vec();
    unknown_op.splice(38..38, [0x08, 42]);
    unknown_op[37] += 2;
    unknown_op[35] += 2;
    let err = Graph::<Fr>::try_from(&unknown_op[..]).unwrap_err();
    assert!(matches!(err, ProofError::GraphParse(_)), "{err}");

    // Point input b at slot 1 as well
    let mut unbound = FIXTURE.to_vec();
    let b_offset = unbound.len() - 8 - 3;
    assert_eq!(unbound[b_offset], 0x02);
    unbound[b_offset] = 0x01;
    let err = Graph::<Fr>::try_from(&unbound[..]).unwrap_err();
    assert!(matches!(err, ProofError::GraphParse(_)), "{err}");
  }
}
