//! Key generation session.
//!
//! A [`DistKeyGenerator`] lives for exactly one run. It deals once with
//! [`DistKeyGenerator::deal`] and, once the bundles of the whole roster are
//! known, aggregates them with [`DistKeyGenerator::process_deal_bundles`].
//!
//! Every participant must be handed the same set of bundles, otherwise the
//! participants end up with different joint commitments. Ordering of that set
//! does not matter: bundles are addressed by dealer index.

use ark_ec::{AffineRepr, CurveGroup};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{collections::BTreeMap, end_timer, rand, start_timer, vec::Vec, Zero};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::{
    cipher::{self, Ciphertext},
    keys::{Keypair, SecretKey},
    messages::{Deal, DealBundle, Point1, Point2},
    node::{self, Node},
    params::{self, Parameters},
    poly::{self, PrivatePoly, PublicPoly},
    share::PriShare,
    Curve1, Curve2,
};

/// Scalar field of [`Curve1`].
pub type Scalar1 = ark_bn254::Fr;
/// Scalar field of [`Curve2`].
pub type Scalar2 = ark_bls12_381::Fr;

/// Names the protocol curve an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, displaydoc::Display)]
pub enum CurveId {
    /// BN254
    Bn254,
    /// BLS12-381
    Bls12_381,
}

/// Key generation error
#[derive(Debug, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[displaydoc("key generation failed: {0}")]
pub struct Error(#[cfg_attr(feature = "std", source)] Reason);

/// Why key generation failed
#[derive(Debug, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Reason {
    /// invalid input: {0}
    InvalidInput(#[cfg_attr(feature = "std", source)] InputError),
    /// could not encrypt a share for node {recipient}: {source}
    Encryption {
        recipient: u32,
        #[cfg_attr(feature = "std", source)]
        source: cipher::Error,
    },
    /// protocol aborted: {0}
    Aborted(#[cfg_attr(feature = "std", source)] KeygenAborted),
    /// bug occurred: {0}
    Bug(#[cfg_attr(feature = "std", source)] Bug),
}

/// Input rejected before any randomness is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum InputError {
    /// invalid roster: {0}
    Roster(#[cfg_attr(feature = "std", source)] node::Error),
    /// invalid parameters: {0}
    Parameters(#[cfg_attr(feature = "std", source)] params::Error),
    /// node {0} is not part of the roster
    NotAParticipant(u32),
    /// identity secret does not match the roster key of node {0}
    IdentityMismatch(u32),
}

/// Protocol fault caused by a dealer.
///
/// Any of these ends the run. There is no complaint phase: the roster has to
/// be fixed outside of this crate and the run started over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum KeygenAborted {
    /// got a bundle from dealer {0} which is not part of the roster
    UnknownDealer(u32),
    /// dealer {0} published more than one bundle
    DuplicateBundle(u32),
    /// no bundle from dealer {0}
    MissingBundle(u32),
    /// dealer {dealer} published a malformed commitment on {curve}
    InvalidCommitment { dealer: u32, curve: CurveId },
    /// dealer {0} omitted our share
    MissingShare(u32),
    /// could not decrypt the {curve} share of dealer {dealer}
    Decryption { dealer: u32, curve: CurveId },
    /// the {curve} share of dealer {dealer} is not a canonical scalar
    InvalidShareEncoding { dealer: u32, curve: CurveId },
    /// the {curve} share of dealer {dealer} does not match its commitment
    InvalidShare { dealer: u32, curve: CurveId },
}

impl KeygenAborted {
    /// The dealer at fault.
    pub fn dealer(&self) -> u32 {
        match *self {
            KeygenAborted::UnknownDealer(d)
            | KeygenAborted::DuplicateBundle(d)
            | KeygenAborted::MissingBundle(d)
            | KeygenAborted::MissingShare(d) => d,
            KeygenAborted::InvalidCommitment { dealer, .. }
            | KeygenAborted::Decryption { dealer, .. }
            | KeygenAborted::InvalidShareEncoding { dealer, .. }
            | KeygenAborted::InvalidShare { dealer, .. } => dealer,
        }
    }
}

/// Our own bookkeeping is broken; no dealer is to blame.
#[derive(Debug, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Bug {
    /// {curve} share of dealer {dealer} is missing after it was recorded
    MissingShare { dealer: u32, curve: CurveId },
    /// {curve} commitment of dealer {dealer} is missing after it was ingested
    MissingCommitment { dealer: u32, curve: CurveId },
    /// joint commitment on {0} is missing after aggregation
    MissingJointCommitment(CurveId),
    /// commitments on {curve} could not be added: {source}
    Polynomial {
        curve: CurveId,
        #[cfg_attr(feature = "std", source)]
        source: poly::Error,
    },
}

impl_from! {
    impl From for Error {
        err: InputError => Error(Reason::InvalidInput(err)),
        err: KeygenAborted => Error(Reason::Aborted(err)),
        err: Bug => Error(Reason::Bug(err)),
    }
}

impl Error {
    pub fn reason(&self) -> &Reason {
        &self.0
    }

    pub fn into_reason(self) -> Reason {
        self.0
    }

    /// Whether the failure is a defect of this node rather than a fault of a peer.
    pub fn is_bug(&self) -> bool {
        matches!(self.0, Reason::Bug(_))
    }

    /// The dealer that caused the run to abort, if any.
    pub fn culprit(&self) -> Option<u32> {
        match &self.0 {
            Reason::Aborted(aborted) => Some(aborted.dealer()),
            _ => None,
        }
    }
}

/// State of one curve of the run.
struct CurveSession<G: CurveGroup> {
    curve: CurveId,
    private: PrivatePoly<G::ScalarField>,
    public: PublicPoly<G>,
    /// decrypted shares, by dealer
    valid_shares: BTreeMap<u32, G::ScalarField>,
    /// commitments of every dealer, by dealer
    all_publics: BTreeMap<u32, PublicPoly<G>>,
}

/// Running sums of one curve while aggregating.
struct Aggregate<G: CurveGroup> {
    share: G::ScalarField,
    public: Option<PublicPoly<G>>,
}

impl<G: CurveGroup> CurveSession<G> {
    fn new<R: rand::Rng + rand::CryptoRng>(curve: CurveId, t: u32, rng: &mut R) -> Self {
        let private = PrivatePoly::rand(t, rng);
        let public = private.commit();
        Self { curve, private, public, valid_shares: BTreeMap::new(), all_publics: BTreeMap::new() }
    }

    /// Evaluate our polynomial for `node` and encrypt the result to it.
    fn encrypt_share<R: rand::Rng + rand::CryptoRng>(&self, rng: &mut R, node: &Node) -> Result<Ciphertext, cipher::Error> {
        let share = self.private.evaluate(node.index);
        let bytes = Zeroizing::new(crate::ark::scalar_to_bytes(&share.value())?);
        cipher::encrypt(rng, node.public, &bytes)
    }

    fn ingest(&mut self, dealer: u32, coeffs: &[G::Affine], params: &Parameters) -> Result<(), KeygenAborted> {
        let invalid = KeygenAborted::InvalidCommitment { dealer, curve: self.curve };
        if coeffs.len() != params.commitment_len() {
            return Err(invalid);
        }
        let public = PublicPoly::from_affine(coeffs).map_err(|_| invalid)?;
        self.all_publics.insert(dealer, public);
        Ok(())
    }

    fn record(&mut self, dealer: u32, sk: &SecretKey, ct: &Ciphertext) -> Result<(), KeygenAborted> {
        let curve = self.curve;
        let plaintext = cipher::decrypt(sk, ct).map_err(|_| KeygenAborted::Decryption { dealer, curve })?;
        let value = crate::ark::scalar_from_bytes::<G::ScalarField>(&plaintext)
            .map_err(|_| KeygenAborted::InvalidShareEncoding { dealer, curve })?;
        self.valid_shares.insert(dealer, value);
        Ok(())
    }

    /// Feldman check of the share of `dealer`, then fold it into `acc`.
    fn verify_and_accumulate(&self, dealer: u32, own_index: u32, acc: &mut Aggregate<G>) -> Result<(), Error> {
        let curve = self.curve;
        let value = self.valid_shares.get(&dealer).copied().ok_or(Bug::MissingShare { dealer, curve })?;
        let public = self.all_publics.get(&dealer).ok_or(Bug::MissingCommitment { dealer, curve })?;
        if !public.verify(&PriShare::new(own_index, value)) {
            return Err(KeygenAborted::InvalidShare { dealer, curve }.into());
        }
        acc.share += value;
        acc.public = Some(match acc.public.take() {
            None => public.clone(),
            Some(sum) => sum.checked_add(public).map_err(|source| Bug::Polynomial { curve, source })?,
        });
        Ok(())
    }
}

impl<G: CurveGroup> Aggregate<G> {
    fn new() -> Self {
        Self { share: G::ScalarField::zero(), public: None }
    }

    fn finish(mut self, index: u32, curve: CurveId) -> Result<(Vec<G::Affine>, PriShare<G::ScalarField>), Bug> {
        let public = self.public.take().ok_or(Bug::MissingJointCommitment(curve))?;
        Ok((public.to_affine(), PriShare::new(index, self.share)))
    }
}

impl<G: CurveGroup> Drop for Aggregate<G> {
    fn drop(&mut self) {
        self.share.zeroize();
    }
}

/// One participant of one key generation run.
pub struct DistKeyGenerator {
    index: u32,
    params: Parameters,
    /// the roster, sorted by index
    nodes: Vec<Node>,
    keypair: Keypair,
    session_id: Vec<u8>,
    curve1: CurveSession<Curve1>,
    curve2: CurveSession<Curve2>,
}

impl core::fmt::Debug for DistKeyGenerator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DistKeyGenerator")
            .field("index", &self.index)
            .field("params", &self.params)
            .field("identity", &self.keypair.pk())
            .finish_non_exhaustive()
    }
}

impl DistKeyGenerator {
    /// Start a run as node `index` of `nodes`.
    ///
    /// `threshold + 1` joint shares will be needed to reconstruct. The roster
    /// and the identity secret are checked before any randomness is drawn.
    pub fn new<R: rand::Rng + rand::CryptoRng>(
        rng: &mut R,
        index: u32,
        threshold: u32,
        nodes: &[Node],
        identity_secret: SecretKey,
    ) -> Result<Self, Error> {
        let nodes = node::validate_roster(nodes).map_err(InputError::Roster)?;
        let n = u32::try_from(nodes.len()).map_err(|_| InputError::Roster(node::Error::TooManyNodes))?;
        let params = Parameters::new(n, threshold);
        params.validate().map_err(InputError::Parameters)?;
        let me = nodes
            .iter()
            .find(|node| node.index == index)
            .ok_or(InputError::NotAParticipant(index))?;
        let keypair = Keypair::from_sk(identity_secret);
        if me.public != keypair.pk() {
            return Err(InputError::IdentityMismatch(index).into());
        }

        let timer = start_timer!(|| "Sample secret polynomials");
        let curve1 = CurveSession::new(CurveId::Bn254, threshold, rng);
        let curve2 = CurveSession::new(CurveId::Bls12_381, threshold, rng);
        end_timer!(timer);

        Ok(Self { index, params, nodes, keypair, session_id: Vec::new(), curve1, curve2 })
    }

    /// Tag the bundles of this run with `session_id`.
    pub fn with_session_id(mut self, session_id: impl Into<Vec<u8>>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn params(&self) -> Parameters {
        self.params
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn session_id(&self) -> &[u8] {
        &self.session_id
    }

    /// Our own commitment on the first curve.
    pub fn public_poly1(&self) -> &PublicPoly<Curve1> {
        &self.curve1.public
    }

    /// Our own commitment on the second curve.
    pub fn public_poly2(&self) -> &PublicPoly<Curve2> {
        &self.curve2.public
    }

    /// Produce the bundle to broadcast: one encrypted deal per roster member
    /// and our commitments.
    ///
    /// Either every share gets encrypted or no bundle is returned at all.
    pub fn deal<R: rand::Rng + rand::CryptoRng>(&self, rng: &mut R) -> Result<DealBundle, Error> {
        let timer = start_timer!(|| "Deal shares");
        let mut deals = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let encryption_failed = |source| Error(Reason::Encryption { recipient: node.index, source });
            let encrypted_share1 = self.curve1.encrypt_share(rng, node).map_err(encryption_failed)?;
            let encrypted_share2 = self.curve2.encrypt_share(rng, node).map_err(encryption_failed)?;
            deals.push(Deal { share_index: node.index, encrypted_share1, encrypted_share2 });
        }
        end_timer!(timer);

        Ok(DealBundle {
            dealer_index: self.index,
            deals,
            public1: self.curve1.public.to_affine(),
            public2: self.curve2.public.to_affine(),
            session_id: self.session_id.clone(),
            signature: None,
        })
    }

    /// Decrypt, verify and sum the shares dealt to us by every roster member.
    ///
    /// `bundles` must hold exactly one bundle per roster member, in any order.
    /// The first fault aborts the run.
    pub fn process_deal_bundles(&mut self, bundles: &[DealBundle]) -> Result<DistKeyShare, Error> {
        let timer = start_timer!(|| "Process deal bundles");
        let mut by_dealer = BTreeMap::new();
        for bundle in bundles {
            let dealer = bundle.dealer_index;
            if !self.nodes.iter().any(|node| node.index == dealer) {
                return Err(KeygenAborted::UnknownDealer(dealer).into());
            }
            if by_dealer.insert(dealer, bundle).is_some() {
                return Err(KeygenAborted::DuplicateBundle(dealer).into());
            }
        }

        // every commitment is known before the first share is checked
        for (&dealer, bundle) in &by_dealer {
            self.curve1.ingest(dealer, &bundle.public1, &self.params)?;
            self.curve2.ingest(dealer, &bundle.public2, &self.params)?;
        }

        let mut acc1 = Aggregate::new();
        let mut acc2 = Aggregate::new();
        for node in &self.nodes {
            let dealer = node.index;
            let bundle = by_dealer.get(&dealer).ok_or(KeygenAborted::MissingBundle(dealer))?;
            let deal = bundle.deal_for(self.index).ok_or(KeygenAborted::MissingShare(dealer))?;

            self.curve1.record(dealer, self.keypair.sk(), &deal.encrypted_share1)?;
            self.curve2.record(dealer, self.keypair.sk(), &deal.encrypted_share2)?;

            self.curve1.verify_and_accumulate(dealer, self.index, &mut acc1)?;
            self.curve2.verify_and_accumulate(dealer, self.index, &mut acc2)?;
        }

        let (commits1, share1) = acc1.finish(self.index, CurveId::Bn254)?;
        let (commits2, share2) = acc2.finish(self.index, CurveId::Bls12_381)?;
        end_timer!(timer);

        Ok(DistKeyShare { commits1, commits2, share1, share2 })
    }

    #[cfg(test)]
    pub(crate) fn secrets(&self) -> (Scalar1, Scalar2) {
        (self.curve1.private.secret(), self.curve2.private.secret())
    }
}

/// Output of a successful run.
///
/// Holds the joint commitment and this node's joint share on both curves.
/// `t + 1` of these shares reconstruct the joint secret of a curve, and the
/// constant coefficient of the joint commitment is its public key.
#[derive(Debug, Clone, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize)]
pub struct DistKeyShare {
    /// Joint commitment on the first curve
    #[serde(with = "crate::ark")]
    pub commits1: Vec<Point1>,
    /// Joint commitment on the second curve
    #[serde(with = "crate::ark")]
    pub commits2: Vec<Point2>,
    /// Our joint share on the first curve
    pub share1: PriShare<Scalar1>,
    /// Our joint share on the second curve
    pub share2: PriShare<Scalar2>,
}

impl DistKeyShare {
    /// Index of the node holding this share.
    pub fn index(&self) -> u32 {
        self.share1.index()
    }

    /// Joint public key on the first curve.
    pub fn public_key1(&self) -> Point1 {
        self.commits1.first().copied().unwrap_or_else(Point1::zero)
    }

    /// Joint public key on the second curve.
    pub fn public_key2(&self) -> Point2 {
        self.commits2.first().copied().unwrap_or_else(Point2::zero)
    }

    pub fn public_poly1(&self) -> Result<PublicPoly<Curve1>, poly::Error> {
        PublicPoly::from_affine(&self.commits1)
    }

    pub fn public_poly2(&self) -> Result<PublicPoly<Curve2>, poly::Error> {
        PublicPoly::from_affine(&self.commits2)
    }

    /// Whether both shares lie on their joint commitments.
    pub fn verify(&self) -> bool {
        let ok1 = self.public_poly1().map(|p| p.verify(&self.share1)).unwrap_or(false);
        let ok2 = self.public_poly2().map(|p| p.verify(&self.share2)).unwrap_or(false);
        ok1 && ok2
    }
}
