//! Groth16 proof generation.
//!
//! The quotient polynomial is never divided out explicitly. `A * B - C` is evaluated on the odd
//! coset of the constraint domain, where the vanishing polynomial is the constant `-2`, and the
//! proving key's H query already carries that factor.

use std::time::Instant;

use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{Field, Zero};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use ark_std::UniformRand;
use rand::{rngs::OsRng, CryptoRng, RngCore};
#[cfg(feature = "timing")] use tracing::trace;
use tracing::{debug, info};

use super::{Matrix, Proof, ProvingKey};
use crate::{errors::ProofError, Fr, G1Affine, G1Projective, G2Affine, G2Projective};

/// Proves with blinding factors drawn from the operating system's CSPRNG.
pub fn prove(pk: &ProvingKey, witness: &[Fr]) -> Result<Proof, ProofError> {
  prove_with_rng(pk, witness, &mut OsRng)
}

/// Generates a Groth16 proof
///
/// # Arguments
///
/// * `pk` - The proving key of the circuit.
/// * `witness` - The full witness, `pk.n_vars` values starting with the constant one.
/// * `rng` - Source of the blinding factors `r` and `s`.
///
/// # Returns
///
/// The proof, or `Prover` if the witness does not fit the key.
pub fn prove_with_rng<R: RngCore + CryptoRng>(
  pk: &ProvingKey,
  witness: &[Fr],
  rng: &mut R,
) -> Result<Proof, ProofError> {
  if witness.len() != pk.n_vars {
    return Err(ProofError::Prover(format!(
      "witness has {} values but the proving key expects {}",
      witness.len(),
      pk.n_vars
    )));
  }
  let start = Instant::now();

  let r = Fr::rand(rng);
  let s = Fr::rand(rng);

  let h = quotient_evaluations(pk, witness)?;
  debug!("evaluated A * B - C on the coset in {:?}", start.elapsed());

  #[cfg(feature = "timing")]
  let msm_start = Instant::now();
  let private = &witness[pk.n_public + 1..];
  let a = msm_g1(&pk.a_query, witness, "A")?;
  let b1 = msm_g1(&pk.b_g1_query, witness, "B1")?;
  let b2 = msm_g2(&pk.b_g2_query, witness)?;
  let c = msm_g1(&pk.c_query, private, "C")?;
  let h = msm_g1(&pk.h_query, &h, "H")?;
  #[cfg(feature = "timing")]
  trace!("multi-scalar multiplications took {:?}", msm_start.elapsed());

  let pi_a = pk.vk.alpha_g1.into_group() + a + pk.delta_g1 * r;
  let pi_b = pk.vk.beta_g2.into_group() + b2 + pk.vk.delta_g2 * s;
  let b1 = pk.beta_g1.into_group() + b1 + pk.delta_g1 * s;
  let pi_c = c + h + pi_a * s + b1 * r - pk.delta_g1 * (r * s);

  info!("groth16 proof generated in {:?}", start.elapsed());
  Ok(Proof { a: pi_a.into_affine(), b: pi_b.into_affine(), c: pi_c.into_affine() })
}

/// Evaluations of `A * B - C` on the odd coset of the constraint domain.
fn quotient_evaluations(pk: &ProvingKey, witness: &[Fr]) -> Result<Vec<Fr>, ProofError> {
  let domain = domain(pk.domain_size)?;
  let n = domain.size();

  let mut a = vec![Fr::zero(); n];
  let mut b = vec![Fr::zero(); n];
  for coefficient in &pk.coefficients {
    let target = match coefficient.matrix {
      Matrix::A => &mut a,
      Matrix::B => &mut b,
    };
    target[coefficient.constraint] += coefficient.value * witness[coefficient.signal];
  }
  let mut c: Vec<Fr> = a.iter().zip(&b).map(|(a, b)| *a * b).collect();

  let shift = coset_generator(n)?;
  for evaluations in [&mut a, &mut b, &mut c] {
    domain.ifft_in_place(evaluations);
    let mut power = Fr::from(1u64);
    for coefficient in evaluations.iter_mut() {
      *coefficient *= power;
      power *= shift;
    }
    domain.fft_in_place(evaluations);
  }

  Ok(a.iter().zip(&b).zip(&c).map(|((a, b), c)| *a * b - c).collect())
}

/// Radix-2 domain of exactly `size` points.
pub(crate) fn domain(size: usize) -> Result<Radix2EvaluationDomain<Fr>, ProofError> {
  Radix2EvaluationDomain::<Fr>::new(size)
    .filter(|domain| domain.size() == size)
    .ok_or_else(|| ProofError::Prover(format!("no radix-2 domain of size {size}")))
}

/// Primitive `2n`-th root of unity. Multiplying by it maps the domain onto its odd coset.
pub(crate) fn coset_generator(n: usize) -> Result<Fr, ProofError> {
  let shift = domain(2 * n)?.element(1);
  debug_assert_eq!(shift.pow([n as u64]), -Fr::from(1u64));
  Ok(shift)
}

fn msm_g1(bases: &[G1Affine], scalars: &[Fr], name: &str) -> Result<G1Projective, ProofError> {
  G1Projective::msm(bases, scalars).map_err(|_| {
    ProofError::Prover(format!(
      "{name} query has {} points for {} scalars",
      bases.len(),
      scalars.len()
    ))
  })
}

fn msm_g2(bases: &[G2Affine], scalars: &[Fr]) -> Result<G2Projective, ProofError> {
  G2Projective::msm(bases, scalars).map_err(|_| {
    ProofError::Prover(format!("B2 query has {} points for {} scalars", bases.len(), scalars.len()))
  })
}
