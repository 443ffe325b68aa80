use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{collections::BTreeSet, vec::Vec};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::poly::{interpolate, InterpolationError};

/// The x-coordinate at which the node with the given index holds its share.
///
/// Indices are shifted by one so that index `0` is a valid node index and no
/// node is ever handed the evaluation at zero, which is the secret itself.
pub fn eval_point<F: PrimeField>(index: u32) -> F {
    F::from(u64::from(index) + 1)
}

/// A private share `f(index + 1)` of a secret polynomial `f`.
#[derive(Clone, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize)]
pub struct PriShare<F: PrimeField> {
    index: u32,
    #[serde(with = "crate::ark")]
    value: F,
}

impl<F: PrimeField> core::fmt::Debug for PriShare<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PriShare").field("index", &self.index).field("value", &"<redacted>").finish()
    }
}

impl<F: PrimeField> PriShare<F> {
    pub fn new(index: u32, value: F) -> Self {
        Self { index, value }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// NOTE: the value is secret, do not log or send it in the clear.
    pub fn value(&self) -> F {
        self.value
    }
}

impl<F: PrimeField> Drop for PriShare<F> {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// A public share `G * f(index + 1)`, i.e. a commitment polynomial evaluated at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubShare<G> {
    index: u32,
    value: G,
}

impl<G: CurveGroup> PubShare<G> {
    pub fn new(index: u32, value: G) -> Self {
        Self { index, value }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn value(&self) -> G {
        self.value
    }
}

fn eval_points<F: PrimeField>(indices: impl Iterator<Item = u32>) -> Result<Vec<F>, InterpolationError> {
    let mut seen = BTreeSet::new();
    indices
        .map(|i| if seen.insert(i) { Ok(eval_point(i)) } else { Err(InterpolationError::DuplicateIndex(i)) })
        .collect()
}

/// Recover the secret from at least `t + 1` private shares.
///
/// With fewer shares the result is a well-defined field element that has
/// nothing to do with the secret.
pub fn recover_secret<F: PrimeField>(shares: &[PriShare<F>]) -> Result<F, InterpolationError> {
    let x = eval_points::<F>(shares.iter().map(PriShare::index))?;
    let mut y = shares.iter().map(PriShare::value).collect::<Vec<_>>();
    let mut coeffs = interpolate(&x, &y)?;
    let secret = coeffs[0];
    y.zeroize();
    coeffs.zeroize();
    Ok(secret)
}

/// Recover the public key `G * secret` from at least `t + 1` public shares.
pub fn recover_public<G: CurveGroup>(shares: &[PubShare<G>]) -> Result<G, InterpolationError> {
    let x = eval_points::<G::ScalarField>(shares.iter().map(PubShare::index))?;
    let y = shares.iter().map(PubShare::value).collect::<Vec<_>>();
    Ok(interpolate(&x, &y)?[0])
}

#[cfg(test)]
mod tests {
    use ark_bn254::{Fr, G2Projective};
    use ark_ec::Group;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::poly::PrivatePoly;

    #[test]
    fn any_quorum_recovers_the_secret() {
        let rng = &mut StdRng::seed_from_u64(9);
        let poly = PrivatePoly::<Fr>::rand(2, rng);
        let public = poly.commit::<G2Projective>();
        let shares = (0..5).map(|i| poly.evaluate(i)).collect::<Vec<_>>();

        for window in shares.windows(3) {
            assert_eq!(recover_secret(window).unwrap(), poly.secret());
        }
        let scattered = [shares[4].clone(), shares[0].clone(), shares[2].clone()];
        assert_eq!(recover_secret(&scattered).unwrap(), poly.secret());

        let public_shares = [public.evaluate(1), public.evaluate(3), public.evaluate(4)];
        assert_eq!(recover_public(&public_shares).unwrap(), public.public_key());
        assert_eq!(public.public_key(), G2Projective::generator() * poly.secret());

        // two shares of a degree two polynomial say nothing about the secret
        assert_ne!(recover_secret(&shares[..2]).unwrap(), poly.secret());
    }

    #[test]
    fn duplicate_indices_are_rejected() {
        let shares = [PriShare::new(1, Fr::from(1u64)), PriShare::new(1, Fr::from(2u64))];
        assert_eq!(recover_secret(&shares), Err(InterpolationError::DuplicateIndex(1)));
        assert_eq!(recover_secret::<Fr>(&[]), Err(InterpolationError::NoPoints));
    }

    #[test]
    fn index_zero_is_not_the_secret() {
        assert_eq!(eval_point::<Fr>(0), Fr::from(1u64));
        assert_eq!(eval_point::<Fr>(u32::MAX), Fr::from(u64::from(u32::MAX) + 1));
    }

    #[test]
    fn debug_is_redacted() {
        let share = PriShare::new(3, Fr::from(42u64));
        assert_eq!(format!("{share:?}"), "PriShare { index: 3, value: \"<redacted>\" }");
    }
}
