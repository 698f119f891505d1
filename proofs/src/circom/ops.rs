//! Circom semantics of the graph operations.
//!
//! Arithmetic is exact modular arithmetic over the field. Integer-flavoured operations (integer
//! division, modulo, shifts and bitwise logic) act on the canonical representative in `[0, p)`,
//! and comparisons act on the signed interpretation where values above `(p - 1) / 2` are negative.

use ark_ff::PrimeField;
use num_bigint::{BigInt, BigUint};

use super::{
  field_to_biguint,
  graph::{Operation, TresOperation, UnoOperation},
};
use crate::errors::ProofError;

fn from_bool<F: PrimeField>(value: bool) -> F { if value { F::one() } else { F::zero() } }

fn from_biguint<F: PrimeField>(value: &BigUint) -> F {
  F::from_le_bytes_mod_order(&value.to_bytes_le())
}

fn modulus<F: PrimeField>() -> BigUint { F::MODULUS.into() }

/// Signed value of a field element, mapping the upper half of the field to negative integers.
fn to_signed<F: PrimeField>(value: &F) -> BigInt {
  let unsigned = field_to_biguint(value);
  let half = modulus::<F>() >> 1usize;
  if unsigned > half {
    BigInt::from(unsigned) - BigInt::from(modulus::<F>())
  } else {
    BigInt::from(unsigned)
  }
}

/// All-ones mask over the field's bit width
fn mask<F: PrimeField>() -> BigUint {
  (BigUint::from(1u8) << F::MODULUS_BIT_SIZE as usize) - BigUint::from(1u8)
}

/// Shift amount as a small integer, `None` when it exceeds the field bit width.
fn shift_amount<F: PrimeField>(amount: &BigUint) -> Option<usize> {
  if amount.bits() > 32 || *amount >= BigUint::from(F::MODULUS_BIT_SIZE) {
    return None;
  }
  Some(amount.to_u32_digits().first().copied().unwrap_or(0) as usize)
}

fn shl<F: PrimeField>(value: &BigUint, amount: &BigUint) -> F {
  // Shifts above (p - 1) / 2 are negative shifts the other way
  if *amount > modulus::<F>() >> 1usize {
    return shr(value, &(modulus::<F>() - amount));
  }
  match shift_amount::<F>(amount) {
    Some(k) => from_biguint(&((value << k) & mask::<F>())),
    None => F::zero(),
  }
}

fn shr<F: PrimeField>(value: &BigUint, amount: &BigUint) -> F {
  if *amount > modulus::<F>() >> 1usize {
    return shl(value, &(modulus::<F>() - amount));
  }
  match shift_amount::<F>(amount) {
    Some(k) => from_biguint(&(value >> k)),
    None => F::zero(),
  }
}

/// Applies a binary operation.
pub fn apply_op<F: PrimeField>(op: Operation, a: &F, b: &F) -> Result<F, ProofError> {
  let result = match op {
    Operation::Add => *a + b,
    Operation::Sub => *a - b,
    Operation::Mul => *a * b,
    Operation::Div => {
      let inverse = b
        .inverse()
        .ok_or_else(|| ProofError::ConstraintViolation("field division by zero".to_string()))?;
      *a * inverse
    },
    Operation::Pow => a.pow(b.into_bigint()),
    Operation::Idiv | Operation::Mod => {
      let (a, b) = (field_to_biguint(a), field_to_biguint(b));
      if b.bits() == 0 {
        return Err(ProofError::ConstraintViolation("integer division by zero".to_string()));
      }
      if op == Operation::Idiv {
        from_biguint(&(a / b))
      } else {
        from_biguint(&(a % b))
      }
    },
    Operation::Eq => from_bool(a == b),
    Operation::Neq => from_bool(a != b),
    Operation::Lt => from_bool(to_signed(a) < to_signed(b)),
    Operation::Gt => from_bool(to_signed(a) > to_signed(b)),
    Operation::Leq => from_bool(to_signed(a) <= to_signed(b)),
    Operation::Geq => from_bool(to_signed(a) >= to_signed(b)),
    Operation::Land => from_bool(!a.is_zero() && !b.is_zero()),
    Operation::Lor => from_bool(!a.is_zero() || !b.is_zero()),
    Operation::Shl => shl(&field_to_biguint(a), &field_to_biguint(b)),
    Operation::Shr => shr(&field_to_biguint(a), &field_to_biguint(b)),
    Operation::Bor => from_biguint(&(field_to_biguint(a) | field_to_biguint(b))),
    Operation::Band => from_biguint(&(field_to_biguint(a) & field_to_biguint(b))),
    Operation::Bxor => from_biguint(&(field_to_biguint(a) ^ field_to_biguint(b))),
  };
  Ok(result)
}

/// Applies a unary operation.
pub fn apply_uno<F: PrimeField>(op: UnoOperation, a: &F) -> F {
  match op {
    UnoOperation::Neg => -*a,
    UnoOperation::Id => *a,
    UnoOperation::Lnot => from_bool(a.is_zero()),
    UnoOperation::Bnot => from_biguint(&(field_to_biguint(a) ^ mask::<F>())),
  }
}

/// Applies a ternary operation.
pub fn apply_tres<F: PrimeField>(op: TresOperation, a: &F, b: &F, c: &F) -> F {
  match op {
    TresOperation::TernCond =>
      if a.is_zero() {
        *c
      } else {
        *b
      },
  }
}
