//! ECIES over the identity group.
//!
//! A fresh ephemeral key is drawn for every message, the ECDH point is hashed
//! into an XChaCha20-Poly1305 key and the payload is sealed under a random
//! 24-byte nonce. Only the holder of the recipient's identity secret can open it.

use ark_ec::{AffineRepr, CurveGroup};
use ark_serialize::{
    CanonicalDeserialize, CanonicalSerialize, Compress, Read, SerializationError, Valid, Validate, Write,
};
use ark_std::{rand, vec::Vec};
use chacha20poly1305::{aead::AeadInPlace, Key, KeyInit, XChaCha20Poly1305 as ChaCha, XNonce as Nonce};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::keys::{IdentityAffine, PublicKey, SecretKey};

/// Length of the XChaCha20 nonce.
pub const NONCE_LEN: usize = 24;

const AAD: &[u8] = b"dualdkg";

/// An encrypted message addressed to the owner of an identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    /// The ephemeral public key used in the encryption
    #[serde(with = "crate::ark")]
    epk: IdentityAffine,
    /// The nonce used in the encryption
    nonce: [u8; NONCE_LEN],
    /// Sealed payload, including the authentication tag
    data: Vec<u8>,
}

/// An Error that can occur during the encryption or decryption of a [`Ciphertext`].
#[derive(Debug, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Error {
    /// Serialization error: {0}
    Serialization(#[cfg_attr(feature = "std", from, source)] SerializationError),
    /// Error in the ChaCha20Poly1305 encryption
    ChaCha20Poly1305(#[cfg_attr(feature = "std", from, source)] chacha20poly1305::Error),
    /// Refusing to encrypt to the point at infinity
    InvalidRecipient,
}

#[cfg(not(feature = "std"))]
impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Self {
        Self::Serialization(e)
    }
}

#[cfg(not(feature = "std"))]
impl From<chacha20poly1305::Error> for Error {
    fn from(e: chacha20poly1305::Error) -> Self {
        Self::ChaCha20Poly1305(e)
    }
}

/// Encrypt `msg` for the provided public key.
pub fn encrypt<R: rand::Rng + rand::CryptoRng>(rng: &mut R, pk: PublicKey, msg: &[u8]) -> Result<Ciphertext, Error> {
    if pk.is_identity() {
        return Err(Error::InvalidRecipient);
    }
    let mut esk = SecretKey::rand_nonzero(rng);
    let epk = esk.public().into_affine();
    let shared = (pk.into_affine() * esk.expose_secret()).into_affine();
    esk.zeroize();
    let key = Zeroizing::new(crate::hash::derive_key(&epk, &shared)?);

    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let mut data = Vec::with_capacity(msg.len() + 16);
    data.extend_from_slice(msg);
    let cipher = ChaCha::new(Key::from_slice(&key[..]));
    cipher.encrypt_in_place(Nonce::from_slice(&nonce), AAD, &mut data)?;
    Ok(Ciphertext { epk, nonce, data })
}

/// Decrypt a [`Ciphertext`] using the recipient's secret key.
///
/// Fails if the key is not the one the message was sealed for or if the
/// ciphertext was modified.
pub fn decrypt(sk: &SecretKey, ct: &Ciphertext) -> Result<Zeroizing<Vec<u8>>, Error> {
    let shared = (ct.epk * sk.expose_secret()).into_affine();
    let key = Zeroizing::new(crate::hash::derive_key(&ct.epk, &shared)?);
    let mut data = Zeroizing::new(ct.data.clone());
    let cipher = ChaCha::new(Key::from_slice(&key[..]));
    cipher.decrypt_in_place(Nonce::from_slice(&ct.nonce), AAD, &mut *data)?;
    Ok(data)
}

impl Ciphertext {
    /// Get the ephemeral public key.
    pub fn epk(&self) -> IdentityAffine {
        self.epk
    }

    /// Get ciphertext data.
    pub fn ciphertext(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the sealed payload.
    pub fn ciphertext_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }
}

impl Valid for Ciphertext {
    fn check(&self) -> Result<(), SerializationError> {
        self.epk.check()
    }
}

impl CanonicalSerialize for Ciphertext {
    fn serialize_with_mode<W: Write>(&self, mut writer: W, compress: Compress) -> Result<(), SerializationError> {
        self.epk.serialize_with_mode(&mut writer, compress)?;
        writer.write_all(&self.nonce)?;
        self.data.serialize_with_mode(&mut writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        self.epk.serialized_size(compress) + NONCE_LEN + self.data.serialized_size(compress)
    }
}

impl CanonicalDeserialize for Ciphertext {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let epk = IdentityAffine::deserialize_with_mode(&mut reader, compress, validate)?;
        let mut nonce = [0u8; NONCE_LEN];
        reader.read_exact(&mut nonce)?;
        let data = Vec::<u8>::deserialize_with_mode(&mut reader, compress, validate)?;
        Ok(Self { epk, nonce, data })
    }
}

#[cfg(test)]
mod tests {
    use ark_std::rand::rngs::OsRng;

    use super::*;
    use crate::keys::Keypair;

    #[test]
    fn encryption_and_decryption() {
        let msg = b"hello_world!!!!";
        let other_msg = b"to whom it may concern";
        let mut rng = OsRng;
        let keypair = Keypair::rand(&mut rng);
        let other_keypair = Keypair::rand(&mut rng);

        let encrypted = encrypt(&mut rng, keypair.pk(), msg).unwrap();
        let decrypted = decrypt(keypair.sk(), &encrypted).unwrap();
        assert_eq!(decrypted.as_slice(), msg);
        assert!(decrypt(other_keypair.sk(), &encrypted).is_err());

        let encrypted = encrypt(&mut rng, other_keypair.pk(), other_msg).unwrap();
        assert!(decrypt(keypair.sk(), &encrypted).is_err());
        assert_eq!(decrypt(other_keypair.sk(), &encrypted).unwrap().as_slice(), other_msg);
    }

    #[test]
    fn non_deterministic_encryption() {
        let msg = b"peepo";
        let pk = Keypair::rand(&mut OsRng).pk();
        let encrypted = encrypt(&mut OsRng, pk, msg).unwrap();
        for _ in 0..10 {
            let other_encrypted = encrypt(&mut OsRng, pk, msg).unwrap();
            assert_ne!(encrypted.ciphertext(), other_encrypted.ciphertext());
            assert_ne!(encrypted.epk(), other_encrypted.epk());
        }
    }

    #[test]
    fn tampering_is_detected() {
        let keypair = Keypair::rand(&mut OsRng);
        let mut encrypted = encrypt(&mut OsRng, keypair.pk(), b"share bytes").unwrap();
        encrypted.ciphertext_mut()[0] ^= 1;
        assert!(matches!(decrypt(keypair.sk(), &encrypted), Err(Error::ChaCha20Poly1305(_))));
    }

    #[test]
    fn refuses_identity_recipient() {
        let pk = PublicKey::from(IdentityAffine::zero());
        assert!(matches!(encrypt(&mut OsRng, pk, b"x"), Err(Error::InvalidRecipient)));
    }

    #[test]
    fn canonical_serialization() {
        let mut rng = OsRng;
        let keypair = Keypair::rand(&mut rng);
        let encrypted = encrypt(&mut rng, keypair.pk(), b"hello_world!!!!").unwrap();
        let mut bytes = Vec::new();
        encrypted.serialize_compressed(&mut bytes).unwrap();
        assert_eq!(bytes.len(), encrypted.compressed_size());
        let encrypted2 = Ciphertext::deserialize_compressed(bytes.as_slice()).unwrap();
        assert_eq!(encrypted, encrypted2);
        assert_eq!(decrypt(keypair.sk(), &encrypted2).unwrap().as_slice(), b"hello_world!!!!");
    }
}
