//! # Graph Module
//!
//! A witness graph is a circuit's witness computation compiled ahead of time into a DAG of field
//! operations. Nodes live in an arena and refer to their operands by arena index; a node may be
//! shared by any number of downstream nodes. The graph also records which node provides each
//! witness slot and where each named input signal lives in the input buffer.
//!
//! The input buffer has one slot per input signal element plus slot 0, which always holds the
//! constant `1`.
//!
//! ## Binary layouts
//!
//! Graphs produced by circom-witnesscalc (`graph.bin`, magic `wtns.graph.001`) are read by the
//! `witnesscalc` module. This crate's own layout is an iden3 container with magic `wgrf`:
//!
//! 1. header: `n8`, prime, node count, witness count, input slot count
//! 2. nodes: `u8` tag followed by the node payload
//! 3. witness signals: one `u32` node index per witness slot
//! 4. inputs: `(name, offset, len)` entries

use std::{
  collections::{BTreeMap, HashMap, VecDeque},
  io::Read,
};

use ark_ff::PrimeField;
use byteorder::ReadBytesExt;
use tracing::debug;

use super::{
  field_n8, modulus_bytes, read_field, read_u32,
  witnesscalc::{read_witnesscalc_graph, WITNESSCALC_MAGIC},
  write_field, write_u32, BinFile, BinFileWriter,
};
use crate::errors::ProofError;

const GRAPH_MAGIC: &[u8; 4] = b"wgrf";
const GRAPH_VERSION: u32 = 1;

const HEADER_SECTION: u32 = 1;
const NODES_SECTION: u32 = 2;
const WITNESS_SECTION: u32 = 3;
const INPUTS_SECTION: u32 = 4;

const TAG_INPUT: u8 = 0;
const TAG_CONSTANT: u8 = 1;
const TAG_OP: u8 = 2;
const TAG_UNO_OP: u8 = 3;
const TAG_TRES_OP: u8 = 4;
const TAG_ASSERT: u8 = 5;

/// Binary operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
  Mul,
  Div,
  Add,
  Sub,
  Pow,
  Idiv,
  Mod,
  Eq,
  Neq,
  Lt,
  Gt,
  Leq,
  Geq,
  Land,
  Lor,
  Shl,
  Shr,
  Bor,
  Band,
  Bxor,
}

impl Operation {
  const ALL: [Operation; 20] = [
    Operation::Mul,
    Operation::Div,
    Operation::Add,
    Operation::Sub,
    Operation::Pow,
    Operation::Idiv,
    Operation::Mod,
    Operation::Eq,
    Operation::Neq,
    Operation::Lt,
    Operation::Gt,
    Operation::Leq,
    Operation::Geq,
    Operation::Land,
    Operation::Lor,
    Operation::Shl,
    Operation::Shr,
    Operation::Bor,
    Operation::Band,
    Operation::Bxor,
  ];

  pub(crate) fn from_code(code: u8) -> Option<Self> { Self::ALL.get(code as usize).copied() }

  pub(crate) fn code(self) -> u8 { self as u8 }
}

/// Unary operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnoOperation {
  Neg,
  Id,
  Lnot,
  Bnot,
}

impl UnoOperation {
  pub(crate) fn from_code(code: u8) -> Option<Self> {
    match code {
      0 => Some(UnoOperation::Neg),
      1 => Some(UnoOperation::Id),
      2 => Some(UnoOperation::Lnot),
      3 => Some(UnoOperation::Bnot),
      _ => None,
    }
  }

  pub(crate) fn code(self) -> u8 { self as u8 }
}

/// Ternary operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TresOperation {
  TernCond,
}

impl TresOperation {
  pub(crate) fn from_code(code: u8) -> Option<Self> {
    match code {
      0 => Some(TresOperation::TernCond),
      _ => None,
    }
  }

  pub(crate) fn code(self) -> u8 { self as u8 }
}

/// A node of the witness graph. Operands are arena indices.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node<F> {
  /// Value of an input buffer slot
  Input(usize),
  /// Field constant
  Constant(F),
  /// Binary operation
  Op(Operation, usize, usize),
  /// Unary operation
  UnoOp(UnoOperation, usize),
  /// Ternary operation
  TresOp(TresOperation, usize, usize, usize),
  /// Evaluates to the first operand, failing when it differs from the second
  Assert(usize, usize),
}

impl<F> Node<F> {
  /// Arena indices this node reads from.
  pub fn operands(&self) -> Vec<usize> {
    match self {
      Node::Input(_) | Node::Constant(_) => vec![],
      Node::UnoOp(_, a) => vec![*a],
      Node::Op(_, a, b) | Node::Assert(a, b) => vec![*a, *b],
      Node::TresOp(_, a, b, c) => vec![*a, *b, *c],
    }
  }
}

/// Location of a named input signal in the input buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSignal {
  /// First input buffer slot
  pub offset: usize,
  /// Number of field elements (1 for a scalar signal)
  pub len:    usize,
}

/// A validated witness graph
#[derive(Clone, Debug, PartialEq)]
pub struct Graph<F: PrimeField> {
  /// Node arena
  pub nodes:           Vec<Node<F>>,
  /// Node providing each witness slot
  pub witness_signals: Vec<usize>,
  /// Input signal name -> input buffer range
  pub inputs:          BTreeMap<String, InputSignal>,
  /// Size of the input buffer, including the constant slot 0
  pub num_input_slots: usize,
  /// Evaluation order of `nodes`
  order:               Vec<usize>,
}

impl<F: PrimeField> Graph<F> {
  /// Validates the parts of a graph and computes its evaluation order.
  ///
  /// Every operand and witness signal must index into the arena, every input slot must lie in the
  /// input buffer and the nodes must not form a cycle.
  pub fn new(
    nodes: Vec<Node<F>>,
    witness_signals: Vec<usize>,
    inputs: BTreeMap<String, InputSignal>,
    num_input_slots: usize,
  ) -> Result<Self, ProofError> {
    if nodes.is_empty() {
      return Err(ProofError::GraphParse("graph has no nodes".to_string()));
    }
    if num_input_slots == 0 {
      return Err(ProofError::GraphParse("input buffer lacks the constant slot".to_string()));
    }

    for (index, node) in nodes.iter().enumerate() {
      if let Node::Input(slot) = node {
        if *slot >= num_input_slots {
          return Err(ProofError::GraphParse(format!(
            "node {index} reads input slot {slot} of {num_input_slots}"
          )));
        }
      }
      if let Some(operand) = node.operands().into_iter().find(|operand| *operand >= nodes.len()) {
        return Err(ProofError::GraphParse(format!(
          "node {index} references missing node {operand}"
        )));
      }
    }

    if let Some(signal) = witness_signals.iter().find(|signal| **signal >= nodes.len()) {
      return Err(ProofError::GraphParse(format!(
        "witness signal references missing node {signal}"
      )));
    }

    for (name, signal) in &inputs {
      if signal.offset == 0 || signal.offset + signal.len > num_input_slots {
        return Err(ProofError::GraphParse(format!(
          "input {name} occupies slots {}..{} outside the input buffer",
          signal.offset,
          signal.offset + signal.len
        )));
      }
    }
    check_input_slots(&inputs, num_input_slots)?;

    let order = topological_order(&nodes)?;
    Ok(Self { nodes, witness_signals, inputs, num_input_slots, order })
  }

  /// Order in which nodes must be evaluated so that operands precede their users.
  pub fn topological_order(&self) -> &[usize] { &self.order }

  /// Number of witness slots this graph produces.
  pub fn witness_len(&self) -> usize { self.witness_signals.len() }

  /// Serializes the graph to its binary layout.
  pub fn to_bytes(&self) -> Vec<u8> {
    let n8 = field_n8::<F>();

    let mut header = Vec::new();
    write_u32(&mut header, n8 as u32);
    header.extend_from_slice(&modulus_bytes::<F>());
    write_u32(&mut header, self.nodes.len() as u32);
    write_u32(&mut header, self.witness_signals.len() as u32);
    write_u32(&mut header, self.num_input_slots as u32);

    let mut nodes = Vec::new();
    for node in &self.nodes {
      match node {
        Node::Input(slot) => {
          nodes.push(TAG_INPUT);
          write_u32(&mut nodes, *slot as u32);
        },
        Node::Constant(value) => {
          nodes.push(TAG_CONSTANT);
          write_field(&mut nodes, value, n8);
        },
        Node::Op(op, a, b) => {
          nodes.push(TAG_OP);
          nodes.push(op.code());
          write_u32(&mut nodes, *a as u32);
          write_u32(&mut nodes, *b as u32);
        },
        Node::UnoOp(op, a) => {
          nodes.push(TAG_UNO_OP);
          nodes.push(op.code());
          write_u32(&mut nodes, *a as u32);
        },
        Node::TresOp(op, a, b, c) => {
          nodes.push(TAG_TRES_OP);
          nodes.push(op.code());
          write_u32(&mut nodes, *a as u32);
          write_u32(&mut nodes, *b as u32);
          write_u32(&mut nodes, *c as u32);
        },
        Node::Assert(value, expected) => {
          nodes.push(TAG_ASSERT);
          write_u32(&mut nodes, *value as u32);
          write_u32(&mut nodes, *expected as u32);
        },
      }
    }

    let mut witness = Vec::new();
    for signal in &self.witness_signals {
      write_u32(&mut witness, *signal as u32);
    }

    let mut inputs = Vec::new();
    write_u32(&mut inputs, self.inputs.len() as u32);
    for (name, signal) in &self.inputs {
      write_u32(&mut inputs, name.len() as u32);
      inputs.extend_from_slice(name.as_bytes());
      write_u32(&mut inputs, signal.offset as u32);
      write_u32(&mut inputs, signal.len as u32);
    }

    let mut writer = BinFileWriter::new(GRAPH_MAGIC, GRAPH_VERSION, 4);
    writer
      .section(HEADER_SECTION, &header)
      .section(NODES_SECTION, &nodes)
      .section(WITNESS_SECTION, &witness)
      .section(INPUTS_SECTION, &inputs);
    writer.finish()
  }
}

impl<F: PrimeField> TryFrom<&[u8]> for Graph<F> {
  type Error = ProofError;

  /// Accepts both the circom-witnesscalc `graph.bin` layout and the `wgrf` container.
  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    if value.starts_with(WITNESSCALC_MAGIC) {
      read_witnesscalc_graph(value)
    } else {
      from_bytes(value)
    }
  }
}

/// Decodes and validates a graph blob
fn from_bytes<F: PrimeField>(data: &[u8]) -> Result<Graph<F>, ProofError> {
  let kind = ProofError::GraphParse;
  if data.is_empty() {
    return Err(kind("graph is empty".to_string()));
  }
  let file = BinFile::parse(data, GRAPH_MAGIC, GRAPH_VERSION, kind)?;

  let mut header = file.section(HEADER_SECTION)?;
  let n8 = read_u32(&mut header, kind)? as usize;
  if n8 != field_n8::<F>() {
    return Err(kind(format!("graph uses {n8}-byte field elements")));
  }
  let mut prime = vec![0u8; n8];
  header.read_exact(&mut prime).map_err(|_| kind("truncated header".to_string()))?;
  if prime != modulus_bytes::<F>() {
    return Err(kind("graph prime does not match the evaluation field".to_string()));
  }
  let num_nodes = read_u32(&mut header, kind)? as usize;
  let num_witness = read_u32(&mut header, kind)? as usize;
  let num_input_slots = read_u32(&mut header, kind)? as usize;

  // Every node takes at least five bytes, which bounds the allocation on corrupt counts
  if num_nodes > file.section_size(NODES_SECTION)? / 5 {
    return Err(kind(format!("node section too small for {num_nodes} nodes")));
  }
  let mut section = file.section(NODES_SECTION)?;
  let mut nodes = Vec::with_capacity(num_nodes);
  for index in 0..num_nodes {
    let tag = section.read_u8().map_err(|_| kind(format!("truncated node {index}")))?;
    let read_op = |section: &mut std::io::Cursor<&[u8]>| {
      section.read_u8().map_err(|_| kind(format!("truncated node {index}")))
    };
    let node = match tag {
      TAG_INPUT => Node::Input(read_u32(&mut section, kind)? as usize),
      TAG_CONSTANT => Node::Constant(read_field(&mut section, n8, kind)?),
      TAG_OP => {
        let code = read_op(&mut section)?;
        let op = Operation::from_code(code)
          .ok_or_else(|| kind(format!("node {index} has unknown operation {code}")))?;
        Node::Op(op, read_u32(&mut section, kind)? as usize, read_u32(&mut section, kind)? as usize)
      },
      TAG_UNO_OP => {
        let code = read_op(&mut section)?;
        let op = UnoOperation::from_code(code)
          .ok_or_else(|| kind(format!("node {index} has unknown unary operation {code}")))?;
        Node::UnoOp(op, read_u32(&mut section, kind)? as usize)
      },
      TAG_TRES_OP => {
        let code = read_op(&mut section)?;
        let op = TresOperation::from_code(code)
          .ok_or_else(|| kind(format!("node {index} has unknown ternary operation {code}")))?;
        Node::TresOp(
          op,
          read_u32(&mut section, kind)? as usize,
          read_u32(&mut section, kind)? as usize,
          read_u32(&mut section, kind)? as usize,
        )
      },
      TAG_ASSERT => {
        let value = read_u32(&mut section, kind)? as usize;
        Node::Assert(value, read_u32(&mut section, kind)? as usize)
      },
      _ => return Err(kind(format!("node {index} has unknown tag {tag}"))),
    };
    nodes.push(node);
  }
  if section.position() as usize != file.section_size(NODES_SECTION)? {
    return Err(kind("trailing bytes after the last node".to_string()));
  }

  if file.section_size(WITNESS_SECTION)? != num_witness * 4 {
    return Err(kind(format!("witness section does not hold {num_witness} signals")));
  }
  let mut section = file.section(WITNESS_SECTION)?;
  let mut witness_signals = Vec::with_capacity(num_witness);
  for _ in 0..num_witness {
    witness_signals.push(read_u32(&mut section, kind)? as usize);
  }

  let mut section = file.section(INPUTS_SECTION)?;
  let num_inputs = read_u32(&mut section, kind)?;
  let mut inputs = BTreeMap::new();
  for _ in 0..num_inputs {
    let name_len = read_u32(&mut section, kind)? as usize;
    if name_len > section.get_ref().len() {
      return Err(kind("input name is truncated".to_string()));
    }
    let mut name = vec![0u8; name_len];
    section.read_exact(&mut name).map_err(|_| kind("input name is truncated".to_string()))?;
    let name =
      String::from_utf8(name).map_err(|_| kind("input name is not valid UTF-8".to_string()))?;
    let offset = read_u32(&mut section, kind)? as usize;
    let len = read_u32(&mut section, kind)? as usize;
    if inputs.insert(name.clone(), InputSignal { offset, len }).is_some() {
      return Err(kind(format!("input {name} is declared twice")));
    }
  }

  let graph = Graph::new(nodes, witness_signals, inputs, num_input_slots)?;
  debug!(
    "parsed graph with {} nodes, {} witness signals and {} inputs",
    graph.nodes.len(),
    graph.witness_len(),
    graph.inputs.len()
  );
  Ok(graph)
}

/// Every input slot but the constant one must belong to exactly one input signal.
fn check_input_slots(
  inputs: &BTreeMap<String, InputSignal>,
  num_input_slots: usize,
) -> Result<(), ProofError> {
  let declared: usize = inputs.values().map(|signal| signal.len).sum();
  if declared + 1 < num_input_slots {
    return Err(ProofError::GraphParse(format!(
      "inputs bind {declared} of the {} input slots",
      num_input_slots - 1
    )));
  }

  let mut owner: Vec<Option<&str>> = vec![None; num_input_slots];
  for (name, signal) in inputs {
    for slot in signal.offset..signal.offset + signal.len {
      if let Some(other) = owner[slot].replace(name.as_str()) {
        return Err(ProofError::GraphParse(format!(
          "inputs {other} and {name} both claim input slot {slot}"
        )));
      }
    }
  }
  match owner.iter().skip(1).position(Option::is_none) {
    Some(slot) => Err(ProofError::GraphParse(format!("input slot {} is unbound", slot + 1))),
    None => Ok(()),
  }
}

/// Computes an evaluation order with Kahn's algorithm, without recursion.
fn topological_order<F>(nodes: &[Node<F>]) -> Result<Vec<usize>, ProofError> {
  let mut pending = vec![0usize; nodes.len()];
  let mut users = vec![Vec::new(); nodes.len()];
  for (index, node) in nodes.iter().enumerate() {
    for operand in node.operands() {
      pending[index] += 1;
      users[operand].push(index);
    }
  }

  let mut ready: VecDeque<usize> =
    pending.iter().enumerate().filter(|(_, count)| **count == 0).map(|(i, _)| i).collect();
  let mut order = Vec::with_capacity(nodes.len());
  while let Some(index) = ready.pop_front() {
    order.push(index);
    for &user in &users[index] {
      pending[user] -= 1;
      if pending[user] == 0 {
        ready.push_back(user);
      }
    }
  }

  if order.len() != nodes.len() {
    return Err(ProofError::GraphParse(format!(
      "graph contains a cycle through {} nodes",
      nodes.len() - order.len()
    )));
  }
  Ok(order)
}

/// Incremental graph construction.
///
/// Structurally identical nodes are stored once, so a subexpression requested twice maps to the
/// same arena slot and is evaluated once.
#[derive(Debug)]
pub struct GraphBuilder<F: PrimeField> {
  nodes:           Vec<Node<F>>,
  index:           HashMap<Node<F>, usize>,
  witness_signals: Vec<usize>,
  inputs:          BTreeMap<String, InputSignal>,
  num_input_slots: usize,
}

impl<F: PrimeField> Default for GraphBuilder<F> {
  fn default() -> Self { Self::new() }
}

impl<F: PrimeField> GraphBuilder<F> {
  pub fn new() -> Self {
    Self {
      nodes:           vec![],
      index:           HashMap::new(),
      witness_signals: vec![],
      inputs:          BTreeMap::new(),
      num_input_slots: 1,
    }
  }

  fn push(&mut self, node: Node<F>) -> usize {
    if let Some(index) = self.index.get(&node) {
      return *index;
    }
    let index = self.nodes.len();
    self.nodes.push(node.clone());
    self.index.insert(node, index);
    index
  }

  /// Node holding the constant one from input slot 0.
  pub fn one(&mut self) -> usize { self.push(Node::Input(0)) }

  /// Declares an input signal of `len` elements and returns one node per element.
  pub fn input(&mut self, name: &str, len: usize) -> Vec<usize> {
    let offset = self.num_input_slots;
    self.num_input_slots += len;
    self.inputs.insert(name.to_string(), InputSignal { offset, len });
    (offset..offset + len).map(|slot| self.push(Node::Input(slot))).collect()
  }

  pub fn constant(&mut self, value: F) -> usize { self.push(Node::Constant(value)) }

  pub fn op(&mut self, op: Operation, a: usize, b: usize) -> usize { self.push(Node::Op(op, a, b)) }

  pub fn uno(&mut self, op: UnoOperation, a: usize) -> usize { self.push(Node::UnoOp(op, a)) }

  pub fn tres(&mut self, op: TresOperation, a: usize, b: usize, c: usize) -> usize {
    self.push(Node::TresOp(op, a, b, c))
  }

  /// Node that evaluates to `value` and fails evaluation unless it equals `expected`.
  pub fn assert_eq(&mut self, value: usize, expected: usize) -> usize {
    self.push(Node::Assert(value, expected))
  }

  /// Appends a witness slot computed by `node`.
  pub fn witness(&mut self, node: usize) -> &mut Self {
    self.witness_signals.push(node);
    self
  }

  pub fn build(self) -> Result<Graph<F>, ProofError> {
    Graph::new(self.nodes, self.witness_signals, self.inputs, self.num_input_slots)
  }
}

#[cfg(test)]
mod tests {
  use ark_bn254::Fr;

  use super::*;

  fn sample_graph() -> Graph<Fr> {
    let mut builder = GraphBuilder::<Fr>::new();
    let one = builder.one();
    let x = builder.input("x", 1)[0];
    let x2 = builder.op(Operation::Mul, x, x);
    let five = builder.constant(Fr::from(5u64));
    let sum = builder.op(Operation::Add, x2, five);
    let neg = builder.uno(UnoOperation::Neg, sum);
    let sel = builder.tres(TresOperation::TernCond, x, sum, neg);
    let checked = builder.assert_eq(sel, sel);
    builder.witness(one).witness(checked).witness(x);
    builder.build().unwrap()
  }

  #[test]
  #[tracing_test::traced_test]
  fn test_graph_bytes_round_trip() {
    let graph = sample_graph();
    let bytes = graph.to_bytes();
    let parsed = Graph::<Fr>::try_from(&bytes[..]).unwrap();
    assert_eq!(parsed, graph);
    assert_eq!(parsed.witness_len(), 3);
    assert_eq!(parsed.inputs["x"], InputSignal { offset: 1, len: 1 });
  }

  #[test]
  fn test_builder_deduplicates_nodes() {
    let mut builder = GraphBuilder::<Fr>::new();
    let a = builder.input("a", 1)[0];
    let b = builder.input("b", 1)[0];
    let first = builder.op(Operation::Mul, a, b);
    let second = builder.op(Operation::Mul, a, b);
    let swapped = builder.op(Operation::Mul, b, a);
    assert_eq!(first, second);
    assert_ne!(first, swapped);
    assert_eq!(builder.constant(Fr::from(7u64)), builder.constant(Fr::from(7u64)));
  }

  #[test]
  fn test_topological_order_handles_unsorted_arena() {
    // out = (a + 1) * a with the product stored before its operands
    let nodes = vec![
      Node::Op(Operation::Mul, 3, 1),
      Node::Input(1),
      Node::Constant(Fr::from(1u64)),
      Node::Op(Operation::Add, 1, 2),
    ];
    let inputs = BTreeMap::from([("a".to_string(), InputSignal { offset: 1, len: 1 })]);
    let graph = Graph::new(nodes, vec![0], inputs, 2).unwrap();

    let order = graph.topological_order();
    let position = |node: usize| order.iter().position(|n| *n == node).unwrap();
    assert_eq!(order.len(), 4);
    assert!(position(1) < position(3));
    assert!(position(2) < position(3));
    assert!(position(3) < position(0));
  }

  #[test]
  fn test_rejects_cycles_and_dangling_operands() {
    let cycle = vec![Node::Op(Operation::Add, 1, 1), Node::UnoOp(UnoOperation::Id, 0)];
    let err = Graph::<Fr>::new(cycle, vec![0], BTreeMap::new(), 1).unwrap_err();
    assert!(matches!(err, ProofError::GraphParse(_)));

    let dangling = vec![Node::<Fr>::Op(Operation::Add, 0, 9)];
    let err = Graph::new(dangling, vec![0], BTreeMap::new(), 1).unwrap_err();
    assert!(matches!(err, ProofError::GraphParse(_)));

    let bad_slot = vec![Node::<Fr>::Input(4)];
    let err = Graph::new(bad_slot, vec![0], BTreeMap::new(), 2).unwrap_err();
    assert!(matches!(err, ProofError::GraphParse(_)));
  }

  #[test]
  fn test_rejects_unbound_and_shared_input_slots() {
    let nodes = vec![Node::<Fr>::Input(0), Node::Input(1), Node::Input(2)];
    let a = InputSignal { offset: 1, len: 1 };

    let unbound = BTreeMap::from([("a".to_string(), a)]);
    let err = Graph::new(nodes.clone(), vec![0, 1, 2], unbound, 3).unwrap_err();
    assert!(matches!(err, ProofError::GraphParse(_)), "{err}");

    let shared = BTreeMap::from([("a".to_string(), a), ("b".to_string(), a)]);
    let err = Graph::new(nodes.clone(), vec![0, 1], shared, 3).unwrap_err();
    assert!(matches!(err, ProofError::GraphParse(_)), "{err}");

    // Overlapping ranges that still add up to the buffer size
    let overlap = BTreeMap::from([
      ("a".to_string(), InputSignal { offset: 1, len: 2 }),
      ("b".to_string(), InputSignal { offset: 2, len: 1 }),
    ]);
    let err = Graph::new(nodes.clone(), vec![0, 1, 2], overlap, 3).unwrap_err();
    assert!(matches!(err, ProofError::GraphParse(_)), "{err}");

    let bound = BTreeMap::from([("a".to_string(), InputSignal { offset: 1, len: 2 })]);
    assert!(Graph::new(nodes, vec![0, 1, 2], bound, 3).is_ok());
  }

  #[test]
  fn test_rejects_malformed_bytes() {
    let bytes = sample_graph().to_bytes();

    for len in [0, 3, 12, bytes.len() / 2, bytes.len() - 1] {
      let err = Graph::<Fr>::try_from(&bytes[..len]).unwrap_err();
      assert!(matches!(err, ProofError::GraphParse(_)), "prefix of {len} bytes");
    }

    let mut corrupt = bytes.clone();
    corrupt[0] = b'x';
    assert!(matches!(Graph::<Fr>::try_from(&corrupt[..]), Err(ProofError::GraphParse(_))));

    // Flip the prime so it no longer matches the field
    let mut wrong_prime = bytes;
    wrong_prime[12 + 12 + 4] ^= 1;
    assert!(matches!(Graph::<Fr>::try_from(&wrong_prime[..]), Err(ProofError::GraphParse(_))));
  }
}
