//! Running the key generation over a [`round_based`] network.
//!
//! The core in [`crate::dkg`] is transport agnostic. The drivers in here only
//! move its messages around and report progress to a [`Tracer`](crate::trace::Tracer).

pub mod keygen;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Transport failure
#[derive(Debug, displaydoc::Display, thiserror::Error)]
pub enum IoError {
    /// send message: {0}
    SendMessage(#[source] BoxedError),
    /// receive message: {0}
    ReceiveMessage(#[source] BoxedError),
}

impl IoError {
    pub fn send_message<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::SendMessage(Box::new(err))
    }

    pub fn receive_message<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::ReceiveMessage(Box::new(err))
    }
}
