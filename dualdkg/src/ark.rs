use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Compress, SerializationError, Validate};
use ark_std::vec::Vec;

/// Serialize any canonical Arkworks value as a compressed byte string.
///
/// Meant to be used as `#[serde(with = "crate::ark")]`.
pub fn serialize<S, A: CanonicalSerialize>(a: &A, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut bytes = Vec::with_capacity(a.compressed_size());
    a.serialize_with_mode(&mut bytes, Compress::Yes)
        .map_err(serde::ser::Error::custom)?;
    s.serialize_bytes(&bytes)
}

/// Inverse of [`serialize`]. Points are checked to be on the curve and in the right subgroup.
pub fn deserialize<'de, D, A: CanonicalDeserialize>(data: D) -> Result<A, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let bytes: Vec<u8> = serde::de::Deserialize::deserialize(data)?;
    let mut reader = bytes.as_slice();
    let a = A::deserialize_with_mode(&mut reader, Compress::Yes, Validate::Yes).map_err(serde::de::Error::custom)?;
    if !reader.is_empty() {
        return Err(serde::de::Error::custom("trailing bytes after canonical encoding"));
    }
    Ok(a)
}

/// Fixed-width little-endian encoding of a scalar.
///
/// The width is the byte length of the field modulus, so every scalar of the
/// same field encodes to the same number of bytes.
pub fn scalar_to_bytes<F: PrimeField>(s: &F) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::with_capacity(s.compressed_size());
    s.serialize_compressed(&mut bytes)?;
    Ok(bytes)
}

/// Decode a scalar produced by [`scalar_to_bytes`].
///
/// Rejects inputs of the wrong width and non-reduced values.
pub fn scalar_from_bytes<F: PrimeField>(bytes: &[u8]) -> Result<F, SerializationError> {
    if bytes.len() != F::zero().compressed_size() {
        return Err(SerializationError::InvalidData);
    }
    F::deserialize_compressed(bytes)
}

#[cfg(test)]
mod tests {
    use ark_bls12_381::Fr as BlsFr;
    use ark_bn254::Fr as BnFr;
    use ark_std::{rand::rngs::OsRng, UniformRand, Zero};

    use super::*;

    #[test]
    fn scalars_are_fixed_width() {
        let rng = &mut OsRng;
        assert_eq!(scalar_to_bytes(&BnFr::zero()).unwrap().len(), 32);
        assert_eq!(scalar_to_bytes(&BlsFr::from(1u64)).unwrap().len(), 32);
        let s = BnFr::rand(rng);
        let bytes = scalar_to_bytes(&s).unwrap();
        assert_eq!(scalar_from_bytes::<BnFr>(&bytes).unwrap(), s);
    }

    #[test]
    fn scalar_decoding_is_strict() {
        let bytes = scalar_to_bytes(&BlsFr::from(7u64)).unwrap();
        assert!(scalar_from_bytes::<BlsFr>(&bytes[..31]).is_err());
        let mut longer = bytes.clone();
        longer.push(0);
        assert!(scalar_from_bytes::<BlsFr>(&longer).is_err());
        // the modulus itself is not a canonical encoding
        assert!(scalar_from_bytes::<BlsFr>(&[0xff; 32]).is_err());
    }
}
