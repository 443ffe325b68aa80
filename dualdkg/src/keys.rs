use ark_ec::{AffineRepr, CurveGroup};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{rand, vec::Vec, UniformRand, Zero};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Affine point of the identity group.
pub type IdentityAffine = ark_secp256k1::Affine;
/// Scalar field of the identity group.
pub type IdentityScalar = ark_secp256k1::Fr;

/// Identity key of a node: a secp256k1 point.
///
/// Shares are encrypted to it. It never takes part in the threshold keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(#[serde(with = "crate::ark")] IdentityAffine);

impl PublicKey {
    fn compressed(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.compressed_size());
        // writing into a Vec cannot fail
        let _ = self.0.serialize_compressed(&mut bytes);
        bytes
    }

    pub fn into_affine(self) -> IdentityAffine {
        self.0
    }

    /// Whether this is the point at infinity, which nobody can decrypt for.
    pub fn is_identity(&self) -> bool {
        self.0.is_zero()
    }
}

/// Keys are ordered by their compressed encoding.
impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.compressed().cmp(&other.compressed())
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl From<IdentityAffine> for PublicKey {
    fn from(point: IdentityAffine) -> Self {
        Self(point)
    }
}

impl From<PublicKey> for IdentityAffine {
    fn from(key: PublicKey) -> IdentityAffine {
        key.0
    }
}

/// Lowercase hex of the compressed point.
impl core::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&hex::encode(self.compressed()))
    }
}

/// Identity secret of a node.
#[derive(Copy, Clone, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(#[serde(with = "crate::ark")] IdentityScalar);

impl core::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretKey(\"<redacted>\")")
    }
}

impl From<IdentityScalar> for SecretKey {
    fn from(scalar: IdentityScalar) -> Self {
        Self(scalar)
    }
}

impl UniformRand for SecretKey {
    fn rand<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self(IdentityScalar::rand(rng))
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}

impl SecretKey {
    /// `G * sk` on secp256k1.
    pub fn public(&self) -> PublicKey {
        (IdentityAffine::generator() * self.0).into_affine().into()
    }

    /// The raw scalar. Only the decryption path needs it.
    pub fn expose_secret(self) -> IdentityScalar {
        self.0
    }

    /// Sample a uniformly random, non-zero secret key.
    pub fn rand_nonzero<R: rand::Rng + rand::CryptoRng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let sk = Self::rand(rng);
            if !sk.is_zero() {
                return sk;
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// Identity secret together with its public key.
///
/// The secret is wiped when the pair is dropped.
#[derive(Debug, Clone, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize)]
pub struct Keypair {
    sk: SecretKey,
    pk: PublicKey,
}

impl Keypair {
    pub fn from_sk(sk: SecretKey) -> Self {
        Self { pk: sk.public(), sk }
    }

    pub fn rand<R: rand::Rng + rand::CryptoRng + ?Sized>(rng: &mut R) -> Self {
        Self::from_sk(SecretKey::rand_nonzero(rng))
    }

    pub fn pk(&self) -> PublicKey {
        self.pk
    }

    pub fn sk(&self) -> &SecretKey {
        &self.sk
    }
}

impl Drop for Keypair {
    fn drop(&mut self) {
        self.sk.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn keypair_matches_secret() {
        let rng = &mut StdRng::seed_from_u64(42);
        let keypair = Keypair::rand(rng);
        assert_eq!(keypair.pk(), keypair.sk().public());
        assert!(!keypair.pk().is_identity());
        assert_eq!(Keypair::from_sk(*keypair.sk()), keypair);
    }

    #[test]
    fn secret_key_debug_is_redacted() {
        let sk = SecretKey::from(IdentityScalar::from(5u64));
        assert_eq!(format!("{sk:?}"), "SecretKey(\"<redacted>\")");
    }

    #[test]
    fn public_key_display_is_compressed_hex() {
        let pk = SecretKey::from(IdentityScalar::from(1u64)).public();
        // compressed secp256k1 points are 32 bytes plus a flag byte in arkworks
        assert_eq!(pk.to_string().len(), 2 * pk.compressed_size());
        assert_eq!(pk.into_affine(), IdentityAffine::generator());
    }

    #[test]
    fn serde_roundtrip() {
        let rng = &mut StdRng::seed_from_u64(7);
        let keypair = Keypair::rand(rng);
        let json = serde_json::to_string(&keypair.pk()).unwrap();
        let pk: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, keypair.pk());
    }
}
