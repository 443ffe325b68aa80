use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::cipher::Ciphertext;

/// Affine point of the first protocol curve, as it travels on the wire.
pub type Point1 = ark_bn254::G2Affine;
/// Affine point of the second protocol curve, as it travels on the wire.
pub type Point2 = ark_bls12_381::G2Affine;

/// The encrypted shares a dealer hands to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize)]
pub struct Deal {
    /// Index of the recipient
    pub share_index: u32,
    /// Share on the first curve, encrypted to the recipient
    pub encrypted_share1: Ciphertext,
    /// Share on the second curve, encrypted to the recipient
    pub encrypted_share2: Ciphertext,
}

/// Everything a dealer broadcasts in one run.
///
/// The bundle is safe to publish: shares are only present encrypted, next to
/// the public commitments they are checked against.
#[derive(Debug, Clone, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize)]
pub struct DealBundle {
    /// Index of the dealer
    pub dealer_index: u32,
    /// One deal per roster member, the dealer included
    pub deals: Vec<Deal>,
    /// Commitment to the dealer's polynomial on the first curve, `t + 1` points
    #[serde(with = "crate::ark")]
    pub public1: Vec<Point1>,
    /// Commitment to the dealer's polynomial on the second curve, `t + 1` points
    #[serde(with = "crate::ark")]
    pub public2: Vec<Point2>,
    /// Opaque tag of the run, set by whoever orchestrates it
    pub session_id: Vec<u8>,
    /// Opaque signature slot for the transport layer; never produced nor checked here
    pub signature: Option<Vec<u8>>,
}

impl DealBundle {
    /// The deal addressed to `index`, if the dealer produced one.
    pub fn deal_for(&self, index: u32) -> Option<&Deal> {
        self.deals.iter().find(|deal| deal.share_index == index)
    }
}
