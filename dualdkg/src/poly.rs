use core::ops::{Add, Mul};

use ark_ec::CurveGroup;
use ark_ff::{Field, PrimeField};
use ark_poly::{univariate::DensePolynomial, DenseUVPolynomial, Polynomial};
use ark_std::{end_timer, rand, start_timer, vec, vec::Vec, UniformRand, Zero};
use zeroize::Zeroize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::share::{eval_point, PriShare, PubShare};

/// Errors of the polynomial arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Error {
    /// Polynomials have different numbers of coefficients ({0} != {1}).
    LengthMismatch(usize, usize),
    /// A polynomial needs at least one coefficient.
    Empty,
}

/// A secret polynomial over a scalar field.
///
/// Its coefficients never leave this type: only evaluations and the
/// commitment do. The leading coefficient is never zero, so the polynomial
/// has exactly `t + 1` coefficients.
pub struct PrivatePoly<F: PrimeField> {
    poly: DensePolynomial<F>,
}

impl<F: PrimeField> core::fmt::Debug for PrivatePoly<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrivatePoly").field("degree", &self.degree()).finish_non_exhaustive()
    }
}

impl<F: PrimeField> PrivatePoly<F> {
    /// Samples a random polynomial of degree `t`.
    pub fn rand<R: rand::Rng + rand::CryptoRng>(t: u32, rng: &mut R) -> Self {
        let mut coeffs = (0..t).map(|_| F::rand(rng)).collect::<Vec<_>>();
        let mut leading = F::rand(rng);
        while leading.is_zero() {
            leading = F::rand(rng);
        }
        coeffs.push(leading);
        Self { poly: DensePolynomial::from_coefficients_vec(coeffs) }
    }

    pub fn degree(&self) -> usize {
        self.poly.degree()
    }

    /// The share of the node with the given index.
    pub fn evaluate(&self, index: u32) -> PriShare<F> {
        PriShare::new(index, self.poly.evaluate(&eval_point(index)))
    }

    /// Commit to every coefficient with the generator of `G`.
    pub fn commit<G: CurveGroup<ScalarField = F>>(&self) -> PublicPoly<G> {
        let g = G::generator();
        PublicPoly { coeffs: self.poly.coeffs.iter().map(|c| g * c).collect() }
    }

    /// The secret this polynomial shares.
    #[cfg(test)]
    pub(crate) fn secret(&self) -> F {
        self.poly.coeffs[0]
    }
}

impl<F: PrimeField> Drop for PrivatePoly<F> {
    fn drop(&mut self) {
        self.poly.coeffs.zeroize();
    }
}

/// A polynomial with coefficients of Group elements.
///
/// Unlike a scalar polynomial it keeps trailing zero coefficients, since the
/// number of coefficients is what fixes the threshold of a commitment.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicPoly<G> {
    coeffs: Vec<G>,
}

impl<G: CurveGroup> core::fmt::Debug for PublicPoly<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, coeff) in self.coeffs.iter().enumerate().filter(|(_, c)| !Zero::is_zero(*c)) {
            if i == 0 {
                write!(f, "\n{:?}", coeff)?;
            } else if i == 1 {
                write!(f, " + \n{:?} * x", coeff)?;
            } else {
                write!(f, " + \n{:?} * x^{}", coeff, i)?;
            }
        }
        Ok(())
    }
}

impl<G> PublicPoly<G> {
    pub fn coeffs(&self) -> &[G] {
        &self.coeffs
    }

    pub fn into_coeffs(self) -> Vec<G> {
        self.coeffs
    }

    /// Threshold of the commitment: its number of coefficients minus one.
    pub fn threshold(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }
}

impl<G: CurveGroup> PublicPoly<G> {
    /// Constructs a new polynomial from a list of coefficients.
    pub fn from_coefficients_vec(coeffs: Vec<G>) -> Result<Self, Error> {
        if coeffs.is_empty() {
            return Err(Error::Empty);
        }
        Ok(Self { coeffs })
    }

    /// Constructs a new polynomial from its wire form.
    pub fn from_affine(coeffs: &[G::Affine]) -> Result<Self, Error> {
        Self::from_coefficients_vec(coeffs.iter().map(|c| (*c).into()).collect())
    }

    /// Wire form of the coefficients.
    pub fn to_affine(&self) -> Vec<G::Affine> {
        G::normalize_batch(&self.coeffs)
    }

    /// The constant coefficient, i.e. the public key of the shared secret.
    pub fn public_key(&self) -> G {
        self.coeffs.first().copied().unwrap_or_else(G::zero)
    }

    /// The public share of the node with the given index.
    pub fn evaluate(&self, index: u32) -> PubShare<G> {
        PubShare::new(index, self.evaluate_at(&eval_point(index)))
    }

    /// Whether `share` lies on this polynomial.
    pub fn verify(&self, share: &PriShare<G::ScalarField>) -> bool {
        self.evaluate(share.index()).value() == G::generator() * share.value()
    }

    /// Coefficient-wise sum of two commitments of the same threshold.
    pub fn checked_add(&self, other: &Self) -> Result<Self, Error> {
        if self.coeffs.len() != other.coeffs.len() {
            return Err(Error::LengthMismatch(self.coeffs.len(), other.coeffs.len()));
        }
        let coeffs = self.coeffs.iter().zip(&other.coeffs).map(|(a, b)| *a + b).collect();
        Ok(Self { coeffs })
    }

    #[cfg(not(feature = "parallel"))]
    pub fn evaluate_at(&self, point: &G::ScalarField) -> G {
        if point.is_zero() {
            return self.public_key();
        }
        Self::horner_evaluate(&self.coeffs, point)
    }

    #[cfg(feature = "parallel")]
    pub fn evaluate_at(&self, point: &G::ScalarField) -> G {
        if point.is_zero() {
            return self.public_key();
        }

        // Set some minimum number of coefficients to be worked on per thread
        // to avoid per-thread costs dominating parallel execution time.
        const MIN_ELEMENTS_PER_THREAD: usize = 16;
        let num_cpus_available = rayon::current_num_threads();
        let num_coeffs = self.coeffs.len();
        let num_elem_per_thread = core::cmp::max(num_coeffs / num_cpus_available, MIN_ELEMENTS_PER_THREAD);

        // Each thread runs Horner on its own chunk, scaled by point^{chunk start}.
        self.coeffs
            .par_chunks(num_elem_per_thread)
            .enumerate()
            .map(|(i, chunk)| {
                let shift = point.pow([(i * num_elem_per_thread) as u64]);
                Self::horner_evaluate(chunk, point).mul_bigint(shift.into_bigint())
            })
            .sum()
    }

    // Horner's method for polynomial evaluation
    #[inline]
    fn horner_evaluate(poly_coeffs: &[G], point: &G::ScalarField) -> G {
        poly_coeffs
            .iter()
            .rfold(G::zero(), move |result, coeff| result.mul_bigint(point.into_bigint()) + coeff)
    }
}

/// An error that can occur during polynomial interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum InterpolationError {
    /// The input slices have different lengths ({0} != {1}).
    InvalidInputLengths(usize, usize),
    /// Nothing to interpolate.
    NoPoints,
    /// Share index {0} is given more than once.
    DuplicateIndex(u32),
    /// An attempt was made to invert zero.
    TriedToInvertZero,
}

/// Performs polynomial interpolation over a set of points where x-coordinates are field elements
/// and y-coordinates are either field elements or group elements.
///
/// Runs in O(n²) field operations and O(n²) scalar multiplications of `y` values.
///
/// # Returns
///
/// * `Ok(Vec<C>)` - the coefficients of the interpolated polynomial, in ascending order of degree.
/// * `Err(InterpolationError)` - if the input slices have different lengths or if
///   two x-coordinates coincide.
pub fn interpolate<C, O, F: Field>(x: &[F], y: &[C]) -> Result<Vec<C>, InterpolationError>
where
    C: Mul<F, Output = O> + Copy + Default + Zeroize,
    C: Add<C, Output = O>,
    O: Into<C>,
{
    if x.len() != y.len() {
        return Err(InterpolationError::InvalidInputLengths(x.len(), y.len()));
    }
    if x.is_empty() {
        return Err(InterpolationError::NoPoints);
    }

    let n = x.len();
    let mut s = vec![F::zero(); n];
    let mut coeffs = vec![C::default(); n];

    // s(X) = Π(X - x_i), monic, stored in ascending order
    s.push(F::one());
    s[n - 1] = -x[0];

    let start = start_timer!(|| "Computing Lagrange interpolation");
    compute_coeffs(x, &mut s);

    for (x_i, y_i) in x.iter().zip(y) {
        let ff = compute_phi_inv(*x_i, &s)?;
        let mut b = F::one();
        update_coeffs(&mut coeffs, y_i, x_i, &s, &mut b, ff);
    }
    end_timer!(start);

    Ok(coeffs)
}

/// Compute coefficients of the s polynomial: s(X) = Π(X - x_i)
#[inline(always)]
fn compute_coeffs<F: Field>(x: &[F], s: &mut [F]) {
    let n = x.len();
    for (i, &x_elem) in x.iter().enumerate().skip(1) {
        for j in n - 1 - i..n - 1 {
            let s_j_1 = s[j + 1];
            s[j] -= x_elem * s_j_1;
        }
        s[n - 1] -= x_elem;
    }
}

/// Inverse of s'(x_i) = Π_{j≠i}(x_i - x_j)
#[inline(always)]
fn compute_phi_inv<F: Field>(x_i: F, s: &[F]) -> Result<F, InterpolationError> {
    let n = s.len() - 1;
    let mut phi = F::zero();
    for j in (1..=n).rev() {
        phi *= x_i;
        phi += F::from(j as u64) * s[j];
    }
    phi.inverse().ok_or(InterpolationError::TriedToInvertZero)
}

/// Add y_i times the Lagrange basis polynomial of x_i to the coefficients.
fn update_coeffs<C, O, F: Field>(coeffs: &mut [C], y_i: &C, x_i: &F, s: &[F], b: &mut F, ff: F)
where
    C: Mul<F, Output = O> + Copy,
    C: Add<C, Output = O>,
    O: Into<C>,
{
    let n = coeffs.len();
    for j in (0..n).rev() {
        let ybbf = *y_i * (*b * ff);
        coeffs[j] = (coeffs[j] + ybbf.into()).into();
        *b *= x_i;
        *b += s[j];
    }
}

#[cfg(test)]
mod tests {
    use ark_bls12_381::{Fr, G2Projective};
    use ark_ec::Group;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use proptest::prelude::ProptestConfig;
    use test_strategy::proptest;

    use super::*;

    fn commitment(seed: u64, t: u32) -> PublicPoly<G2Projective> {
        let rng = &mut StdRng::seed_from_u64(seed);
        PrivatePoly::<Fr>::rand(t, rng).commit()
    }

    #[test]
    fn arithmetic_check_evaluate() {
        let gen = G2Projective::generator();
        let x = Fr::from(123456789_u64);

        // p(x) = 111 + 222x
        let secret_coeffs = vec![Fr::from(111_u64), Fr::from(222_u64)];
        // pg(x) = g^(111) + (g^(222))^x = g^(111 + 222x)
        let public_coeffs = secret_coeffs.iter().map(|coeff| gen * coeff).collect::<Vec<_>>();

        let secret_poly = DensePolynomial::from_coefficients_vec(secret_coeffs);
        let public_poly = PublicPoly::from_coefficients_vec(public_coeffs).unwrap();

        assert_eq!(gen * secret_poly.evaluate(&x), public_poly.evaluate_at(&x));
        assert_eq!(public_poly.evaluate_at(&Fr::zero()), gen * Fr::from(111_u64));
    }

    #[test]
    fn private_poly_has_exact_degree() {
        let rng = &mut StdRng::seed_from_u64(1);
        for t in 0..5 {
            let poly = PrivatePoly::<Fr>::rand(t, rng);
            assert_eq!(poly.degree(), t as usize);
            assert_eq!(poly.commit::<G2Projective>().coeffs().len(), t as usize + 1);
        }
    }

    #[test]
    fn shares_verify_against_commitment() {
        let rng = &mut StdRng::seed_from_u64(2);
        let poly = PrivatePoly::<Fr>::rand(2, rng);
        let public = poly.commit::<G2Projective>();
        for i in 0..5 {
            let share = poly.evaluate(i);
            assert!(public.verify(&share));
            assert_eq!(public.evaluate(i).value(), G2Projective::generator() * share.value());
        }
        let bad = PriShare::new(0, poly.evaluate(0).value() + Fr::from(1u64));
        assert!(!public.verify(&bad));
        assert_eq!(public.public_key(), G2Projective::generator() * poly.secret());
    }

    #[test]
    fn add_requires_same_threshold() {
        let a = commitment(1, 1);
        let b = commitment(2, 2);
        assert_eq!(a.checked_add(&b), Err(Error::LengthMismatch(2, 3)));
        assert_eq!(PublicPoly::<G2Projective>::from_coefficients_vec(vec![]), Err(Error::Empty));
    }

    #[test]
    fn affine_roundtrip() {
        let a = commitment(3, 3);
        let b = PublicPoly::<G2Projective>::from_affine(&a.to_affine()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn interpolation_recovers_coefficients() {
        let rng = &mut StdRng::seed_from_u64(4);
        let coeffs = (0..4).map(|_| Fr::rand(rng)).collect::<Vec<_>>();
        let poly = DensePolynomial::from_coefficients_vec(coeffs.clone());
        let x = (1..=4u64).map(Fr::from).collect::<Vec<_>>();
        let y = x.iter().map(|x| poly.evaluate(x)).collect::<Vec<_>>();
        assert_eq!(interpolate(&x, &y).unwrap(), coeffs);

        assert_eq!(interpolate(&x[..2], &y), Err(InterpolationError::InvalidInputLengths(2, 4)));
        assert_eq!(interpolate::<Fr, Fr, Fr>(&[], &[]), Err(InterpolationError::NoPoints));
        let same = [Fr::from(1u64), Fr::from(1u64)];
        assert_eq!(interpolate(&same, &y[..2]), Err(InterpolationError::TriedToInvertZero));
    }

    #[proptest(ProptestConfig::with_cases(16))]
    fn evaluation_is_deterministic(#[strategy(0u64..1000)] seed: u64, #[strategy(0u32..64)] index: u32) {
        let poly = commitment(seed, 2);
        assert_eq!(poly.evaluate(index), poly.evaluate(index));
    }

    #[proptest(ProptestConfig::with_cases(8))]
    fn addition_is_commutative_and_associative(#[strategy(0u64..1000)] seed: u64) {
        let a = commitment(seed, 2);
        let b = commitment(seed + 1, 2);
        let c = commitment(seed + 2, 2);
        assert_eq!(a.checked_add(&b).unwrap(), b.checked_add(&a).unwrap());
        let left = a.checked_add(&b).unwrap().checked_add(&c).unwrap();
        let right = a.checked_add(&b.checked_add(&c).unwrap()).unwrap();
        assert_eq!(left, right);
        // evaluation distributes over the sum
        let sum = left.evaluate(3).value();
        assert_eq!(sum, a.evaluate(3).value() + b.evaluate(3).value() + c.evaluate(3).value());
    }
}
