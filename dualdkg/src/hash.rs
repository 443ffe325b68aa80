use ark_serialize::{CanonicalSerialize, SerializationError};
use ark_std::vec::Vec;
use sha3::{Digest, Sha3_256};
use zeroize::Zeroize;

use crate::keys::IdentityAffine;

const KDF_DST: &[u8] = b"DUALDKG-V01-CS01-with-secp256k1_SHA3-256_ECIES_KDF_";

/// Derive a 256-bit symmetric key from an ECDH exchange.
///
/// The key binds the ephemeral public key together with the shared point,
/// so a ciphertext cannot be re-targeted to another ephemeral key.
pub fn derive_key(epk: &IdentityAffine, shared: &IdentityAffine) -> Result<[u8; 32], SerializationError> {
    let mut buf = Vec::with_capacity(2 * epk.compressed_size());
    epk.serialize_compressed(&mut buf)?;
    shared.serialize_compressed(&mut buf)?;
    let mut hasher = Sha3_256::new();
    hasher.update(KDF_DST);
    hasher.update(&buf);
    buf.zeroize();
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use ark_ec::{AffineRepr, CurveGroup};

    use super::*;

    #[test]
    fn key_depends_on_both_points() {
        let g = IdentityAffine::generator();
        let two_g = (g + g).into_affine();
        let k1 = derive_key(&g, &two_g).unwrap();
        let k2 = derive_key(&two_g, &g).unwrap();
        assert_ne!(k1, k2);
        assert_eq!(k1, derive_key(&g, &two_g).unwrap());
    }
}
