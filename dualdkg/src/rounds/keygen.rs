use ark_std::{rand, vec::Vec};
use round_based::{
    rounds_router::{simple_store::RoundInput, RoundsRouter},
    runtime::AsyncRuntime,
    Delivery, Mpc, MpcParty, Outgoing, ProtocolMessage, SinkExt,
};
use serde::{Deserialize, Serialize};

use crate::{
    dkg::{self, DistKeyGenerator, DistKeyShare},
    keys::Keypair,
    messages::DealBundle,
    node::Node,
    trace::Tracer,
};

use super::IoError;

/// Protocol message
#[derive(Clone, Debug, PartialEq, ProtocolMessage, Serialize, Deserialize)]
pub enum Msg {
    /// Round 1
    Deal(DealBundle),
}

/// Keygen protocol error
#[derive(Debug, displaydoc::Display, thiserror::Error)]
#[displaydoc("keygen protocol is failed to complete")]
pub struct Error(#[source] Reason);

/// Keygen protocol abort reason
#[derive(Debug, displaydoc::Display, thiserror::Error)]
pub enum Reason {
    /// Key generation failed: {0}
    Keygen(#[source] dkg::Error),
    /// Protocol was aborted by another party: {0}
    Aborted(#[source] KeygenAborted),
    /// IO error
    IoError(#[source] IoError),
    /// Roster of {0} nodes does not fit the transport
    RosterTooLarge(usize),
    /// Bug occurred
    Bug(Bug),
}

impl_from! {
    impl From for Error {
        err: dkg::Error => Error(Reason::Keygen(err)),
        err: KeygenAborted => Error(Reason::Aborted(err)),
        err: IoError => Error(Reason::IoError(err)),
        err: Bug => Error(Reason::Bug(err)),
    }
}

impl Error {
    pub fn reason(&self) -> &Reason {
        &self.0
    }
}

/// Misbehaviour only the transport layer can see
#[derive(Debug, displaydoc::Display, thiserror::Error)]
pub enum KeygenAborted {
    /// Party {sender} sent the bundle of dealer {claimed}
    DealerMismatch { sender: u32, claimed: u32 },
}

#[derive(Debug, displaydoc::Display, thiserror::Error)]
pub enum Bug {
    /// Node {0} passed validation but is missing from the roster
    OwnPositionMissing(u32),
    /// Received {got} bundles from a roster of {expected}
    UnexpectedNumberOfBundles { got: usize, expected: usize },
}

/// Run the key generation as node `index` of `nodes`.
///
/// Parties are addressed by their position in the roster sorted by index, so
/// the party with the lowest node index must be party `0` of the network.
#[allow(clippy::too_many_arguments)]
pub async fn run<R, M>(
    rng: &mut R,
    mut tracer: Option<&mut dyn Tracer>,
    keypair: &Keypair,
    nodes: &[Node],
    index: u32,
    t: u32,
    session_id: &[u8],
    party: M,
) -> Result<DistKeyShare, Error>
where
    R: rand::RngCore + rand::CryptoRng,
    M: Mpc<ProtocolMessage = Msg>,
{
    tracer.protocol_begins();
    let mut generator = DistKeyGenerator::new(rng, index, t, nodes, *keypair.sk())?.with_session_id(session_id);
    let roster = generator.nodes().iter().map(|node| node.index).collect::<Vec<_>>();
    let n = u16::try_from(roster.len()).map_err(|_| Reason::RosterTooLarge(roster.len()))?;
    let i = roster
        .iter()
        .position(|&j| j == index)
        .and_then(|i| u16::try_from(i).ok())
        .ok_or(Bug::OwnPositionMissing(index))?;

    tracer.stage("Setup networking");
    let MpcParty { delivery, runtime, .. } = party.into_party();
    let (incomings, mut outgoings) = delivery.split();

    let mut rounds = RoundsRouter::<Msg>::builder();
    let round1 = rounds.add_round(RoundInput::<DealBundle>::broadcast(i, n));
    let mut rounds = rounds.listen(incomings);

    // Round 1
    tracer.round_begins();
    tracer.stage("Deal shares");
    let bundle = generator.deal(rng)?;
    runtime.yield_now().await;

    tracer.send_msg();
    outgoings
        .send(Outgoing::broadcast(Msg::Deal(bundle.clone())))
        .await
        .map_err(IoError::send_message)?;
    tracer.msg_sent();

    tracer.receive_msgs();
    let bundles = rounds.complete(round1).await.map_err(IoError::receive_message)?;
    tracer.msgs_received();

    tracer.stage("Check senders");
    let bundles = bundles.into_vec_including_me(bundle);
    if bundles.len() != roster.len() {
        return Err(Bug::UnexpectedNumberOfBundles { got: bundles.len(), expected: roster.len() }.into());
    }
    for (&sender, bundle) in roster.iter().zip(&bundles) {
        if bundle.dealer_index != sender {
            return Err(KeygenAborted::DealerMismatch { sender, claimed: bundle.dealer_index }.into());
        }
    }

    tracer.stage("Verify and aggregate shares");
    let share = generator.process_deal_bundles(&bundles)?;
    tracer.protocol_ends();
    Ok(share)
}

impl From<Reason> for Error {
    fn from(reason: Reason) -> Self {
        Error(reason)
    }
}
