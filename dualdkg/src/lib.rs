#![cfg_attr(not(feature = "std"), no_std)]
#![deny(future_incompatible, nonstandard_style, rust_2018_idioms, unsafe_code)]
#![warn(unused, unused_crate_dependencies)]

//! Threshold distributed key generation over two pairing-friendly curves at once.
//! Built using [Arkworks](https://arkworks.rs/)
//!
//! Every participant deals a Feldman verifiable secret sharing of a fresh random
//! secret on the G2 group of BN254 and, independently, on the G2 group of
//! BLS12-381. Shares travel inside a broadcast [`DealBundle`], each one encrypted
//! to its recipient's secp256k1 identity key, next to the dealer's public
//! commitment polynomials. Once a participant holds the bundles of the whole
//! roster it decrypts its own shares, checks them against the commitments and
//! sums everything into a [`DistKeyShare`] per curve.
//!
//! # Fault model
//!
//! There is no complaint round and no qualified set. The roster is curated
//! outside of this crate, so the first missing, undecryptable or inconsistent
//! share aborts the run for the participant that observes it. The error names
//! the offending dealer, and internal bookkeeping failures are reported as bugs
//! rather than as protocol faults.
//!
//! # Usage
//!
//! ```no_run
//! # use ark_std::rand::rngs::OsRng;
//! # use dualdkg::{DistKeyGenerator, Keypair, Node};
//! # fn main() -> Result<(), dualdkg::dkg::Error> {
//! let rng = &mut OsRng;
//! let keypairs = (0..3).map(|_| Keypair::rand(rng)).collect::<Vec<_>>();
//! let nodes = keypairs
//!     .iter()
//!     .enumerate()
//!     .map(|(i, k)| Node::new(i as u32, k.pk()))
//!     .collect::<Vec<_>>();
//!
//! let generators = keypairs
//!     .iter()
//!     .enumerate()
//!     .map(|(i, k)| DistKeyGenerator::new(rng, i as u32, 1, &nodes, *k.sk()))
//!     .collect::<Result<Vec<_>, _>>()?;
//! let bundles = generators.iter().map(|g| g.deal(rng)).collect::<Result<Vec<_>, _>>()?;
//! for mut generator in generators {
//!     let share = generator.process_deal_bundles(&bundles)?;
//!     println!("joint key on BN254: {:?}", share.public_key1());
//! }
//! # Ok(())
//! # }
//! ```

macro_rules! impl_from {
    (impl From for $target:ty {
        $($var:ident: $ty:ty => $new:expr),+,
    }) => {$(
        impl From<$ty> for $target {
            fn from($var: $ty) -> Self {
                $new
            }
        }
    )+}
}

/// Serde bridge for Arkworks canonical encodings
pub mod ark;

/// Share encryption under identity keys
pub mod cipher;

/// The key generation session, dealer and aggregator stages
pub mod dkg;

/// Key derivation
pub mod hash;

/// Identity keys on secp256k1
pub mod keys;

/// Wire messages exchanged between participants
pub mod messages;

/// Roster entries
pub mod node;

/// DKG Protocol Parameters
pub mod params;

/// Working with Polynomials.
pub mod poly;

/// Round-based protocol driver
#[cfg(feature = "std")]
pub mod rounds;

/// Private and public shares
pub mod share;

/// Progress tracing
pub mod trace;

// Re-exports for convenience
pub use dkg::{CurveId, DistKeyGenerator, DistKeyShare};
pub use keys::{Keypair, PublicKey, SecretKey};
pub use messages::{Deal, DealBundle};
pub use node::Node;
pub use params::Parameters;
#[cfg(feature = "std")]
pub use rounds::keygen;

/// First protocol curve: the G2 group of BN254.
pub type Curve1 = ark_bn254::G2Projective;
/// Second protocol curve: the G2 group of BLS12-381.
pub type Curve2 = ark_bls12_381::G2Projective;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MIN_SUPPORTED_RUST_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

// used for benchmarking
#[cfg(test)]
#[allow(unused)]
pub use criterion as _;
