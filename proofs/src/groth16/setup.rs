//! Single party Groth16 setup for development and testing.
//!
//! Whoever runs the setup learns the toxic waste and can forge proofs, so keys made here must never
//! protect anything of value. Production keys come from a multi party ceremony.

use ark_ec::{CurveGroup, Group};
use ark_ff::{Field, Zero};
use ark_poly::EvaluationDomain;
use ark_std::UniformRand;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use tracing::{debug, warn};

use super::{
  prover::{coset_generator, domain},
  Coefficient, Matrix, ProvingKey, VerifyingKey,
};
use crate::{circom::r1cs::R1CS, errors::ProofError, Fr, G1Projective, G2Projective};

/// Runs the setup with randomness from the operating system's CSPRNG.
pub fn setup(r1cs: &R1CS) -> Result<ProvingKey, ProofError> { setup_with_rng(r1cs, &mut OsRng) }

fn nonzero<R: RngCore + CryptoRng>(rng: &mut R) -> Fr {
  loop {
    let value = Fr::rand(rng);
    if !value.is_zero() {
      return value;
    }
  }
}

/// Generates a proving key for `r1cs`.
///
/// # Arguments
///
/// * `r1cs` - The constraint system, with the circom signal layout.
/// * `rng` - Source of the toxic waste.
///
/// # Returns
///
/// A proving key in the zkey layout. One extra `A` row per public signal, including the constant
/// one, keeps the IC points linearly independent.
pub fn setup_with_rng<R: RngCore + CryptoRng>(
  r1cs: &R1CS,
  rng: &mut R,
) -> Result<ProvingKey, ProofError> {
  warn!("running a single party groth16 setup, the resulting key is not fit for production");

  let n_vars = r1cs.num_variables;
  let n_public = r1cs.num_public();
  if n_vars <= n_public {
    return Err(ProofError::Prover(format!(
      "{n_vars} signals cannot hold {n_public} public signals"
    )));
  }
  let n_constraints = r1cs.constraints.len();
  let domain = domain((n_constraints + n_public + 1).next_power_of_two())?;
  let domain_size = domain.size();
  debug!("setup over {n_constraints} constraints, {n_vars} signals, domain {domain_size}");

  let mut coefficients = Vec::new();
  for (constraint, (a, b, _)) in r1cs.constraints.iter().enumerate() {
    for (matrix, lc) in [(Matrix::A, a), (Matrix::B, b)] {
      for (signal, value) in lc {
        if *signal >= n_vars {
          return Err(ProofError::Prover(format!("constraint {constraint} uses signal {signal}")));
        }
        coefficients.push(Coefficient { matrix, constraint, signal: *signal, value: *value });
      }
    }
  }
  for signal in 0..=n_public {
    coefficients.push(Coefficient {
      matrix: Matrix::A,
      constraint: n_constraints + signal,
      signal,
      value: Fr::from(1u64),
    });
  }

  let tau = nonzero(rng);
  let alpha = nonzero(rng);
  let beta = nonzero(rng);
  let gamma = nonzero(rng);
  let delta = nonzero(rng);

  // a_j(tau), b_j(tau), c_j(tau) through the Lagrange basis of the domain
  let lagrange = domain.evaluate_all_lagrange_coefficients(tau);
  let mut a_tau = vec![Fr::zero(); n_vars];
  let mut b_tau = vec![Fr::zero(); n_vars];
  let mut c_tau = vec![Fr::zero(); n_vars];
  for coefficient in &coefficients {
    let target = match coefficient.matrix {
      Matrix::A => &mut a_tau,
      Matrix::B => &mut b_tau,
    };
    target[coefficient.signal] += coefficient.value * lagrange[coefficient.constraint];
  }
  for (constraint, (_, _, c)) in r1cs.constraints.iter().enumerate() {
    for (signal, value) in c {
      c_tau[*signal] += *value * lagrange[constraint];
    }
  }

  let gamma_inverse = gamma.inverse().ok_or_else(|| ProofError::Prover("zero gamma".into()))?;
  let delta_inverse = delta.inverse().ok_or_else(|| ProofError::Prover("zero delta".into()))?;
  let combined = |j: usize| beta * a_tau[j] + alpha * b_tau[j] + c_tau[j];

  let g1 = G1Projective::generator();
  let g2 = G2Projective::generator();
  let to_g1 = |scalars: &[Fr]| {
    let points: Vec<G1Projective> = scalars.iter().map(|scalar| g1 * scalar).collect();
    G1Projective::normalize_batch(&points)
  };

  let ic: Vec<Fr> = (0..=n_public).map(|j| combined(j) * gamma_inverse).collect();
  let c: Vec<Fr> = (n_public + 1..n_vars).map(|j| combined(j) * delta_inverse).collect();

  // H_i = L_i(tau / g) * Z(tau) / (Z(g w^i) * delta) with Z = -2 on the odd coset
  let shift = coset_generator(domain_size)?;
  let shift_inverse =
    shift.inverse().ok_or_else(|| ProofError::Prover("zero coset generator".into()))?;
  let vanishing = tau.pow([domain_size as u64]) - Fr::from(1u64);
  let h_factor = -vanishing
    * (Fr::from(2u64) * delta).inverse().ok_or_else(|| ProofError::Prover("zero delta".into()))?;
  let h: Vec<Fr> = domain
    .evaluate_all_lagrange_coefficients(tau * shift_inverse)
    .into_iter()
    .map(|l| l * h_factor)
    .collect();

  let b_g2: Vec<G2Projective> = b_tau.iter().map(|scalar| g2 * scalar).collect();

  Ok(ProvingKey {
    n_vars,
    n_public,
    domain_size,
    vk: VerifyingKey {
      alpha_g1: (g1 * alpha).into_affine(),
      beta_g2: (g2 * beta).into_affine(),
      gamma_g2: (g2 * gamma).into_affine(),
      delta_g2: (g2 * delta).into_affine(),
      ic: to_g1(&ic),
    },
    beta_g1: (g1 * beta).into_affine(),
    delta_g1: (g1 * delta).into_affine(),
    coefficients,
    a_query: to_g1(&a_tau),
    b_g1_query: to_g1(&b_tau),
    b_g2_query: G2Projective::normalize_batch(&b_g2),
    c_query: to_g1(&c),
    h_query: to_g1(&h),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tests::inputs::{cubic_r1cs, multiplier_r1cs};

  #[test]
  #[tracing_test::traced_test]
  fn test_setup_shape() {
    let r1cs = multiplier_r1cs();
    let pk = setup(&r1cs).unwrap();
    assert_eq!(pk.n_vars, 4);
    assert_eq!(pk.n_public, 1);
    // one constraint plus two public rows
    assert_eq!(pk.domain_size, 4);
    assert_eq!(pk.vk.ic.len(), 2);
    assert_eq!(pk.c_query.len(), 2);
    assert_eq!(pk.h_query.len(), 4);
    assert!(logs_contain("not fit for production"));
  }

  #[test]
  fn test_setup_rounds_domain_up() {
    let pk = setup(&cubic_r1cs()).unwrap();
    assert_eq!(pk.domain_size, 8);
    assert_eq!(pk.coefficients.iter().filter(|c| c.constraint >= 3).count(), 2);
  }

  #[test]
  fn test_setup_rejects_too_few_signals() {
    let mut r1cs = multiplier_r1cs();
    r1cs.num_variables = 1;
    assert!(matches!(setup(&r1cs), Err(ProofError::Prover(_))));
  }
}
