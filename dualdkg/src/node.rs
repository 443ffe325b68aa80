use ark_std::{collections::BTreeSet, vec::Vec};
use serde::{Deserialize, Serialize};

use crate::keys::PublicKey;

/// A member of the roster.
///
/// The index doubles as the node's share identifier: the node's share of any
/// polynomial `f` is `f(index + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    /// Unique index of the node in the roster
    pub index: u32,
    /// Identity key used to encrypt the shares addressed to this node
    pub public: PublicKey,
}

impl Node {
    pub fn new(index: u32, public: PublicKey) -> Self {
        Self { index, public }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Error {
    /// The roster is empty
    EmptyRoster,
    /// The roster has more nodes than fit in a `u32`
    TooManyNodes,
    /// Node index {0} appears more than once in the roster
    DuplicateIndex(u32),
    /// Node {0} uses the point at infinity as identity key
    InvalidIdentityKey(u32),
}

/// Check a roster and return it sorted by node index.
pub fn validate_roster(nodes: &[Node]) -> Result<Vec<Node>, Error> {
    if nodes.is_empty() {
        return Err(Error::EmptyRoster);
    }
    u32::try_from(nodes.len()).map_err(|_| Error::TooManyNodes)?;
    let mut seen = BTreeSet::new();
    for node in nodes {
        if !seen.insert(node.index) {
            return Err(Error::DuplicateIndex(node.index));
        }
        if node.public.is_identity() {
            return Err(Error::InvalidIdentityKey(node.index));
        }
    }
    let mut sorted = nodes.to_vec();
    sorted.sort_unstable_by_key(|node| node.index);
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use ark_ec::AffineRepr;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::keys::{IdentityAffine, Keypair};

    fn pk(seed: u64) -> PublicKey {
        Keypair::rand(&mut StdRng::seed_from_u64(seed)).pk()
    }

    #[test]
    fn roster_is_sorted() {
        let nodes = [Node::new(2, pk(2)), Node::new(0, pk(0)), Node::new(7, pk(7))];
        let sorted = validate_roster(&nodes).unwrap();
        assert_eq!(sorted.iter().map(|n| n.index).collect::<Vec<_>>(), [0, 2, 7]);
    }

    #[test]
    fn invalid_rosters() {
        assert_eq!(validate_roster(&[]), Err(Error::EmptyRoster));
        let nodes = [Node::new(1, pk(1)), Node::new(1, pk(2))];
        assert_eq!(validate_roster(&nodes), Err(Error::DuplicateIndex(1)));
        let nodes = [Node::new(0, pk(1)), Node::new(3, PublicKey::from(IdentityAffine::zero()))];
        assert_eq!(validate_roster(&nodes), Err(Error::InvalidIdentityKey(3)));
    }
}
