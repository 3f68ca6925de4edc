//! Participant records and sessions.
//!
//! A [`Participant`] is the hub-side view of one connected chat session: its
//! identity plus the producer half of a bounded outbound queue. The matching
//! [`Session`] holds the consumer half and is handed to the connection's
//! send pump. The queue is single-producer/single-consumer for a given
//! participant, so the bounded buffer itself is the only synchronization.

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::identity::{Identity, ParticipantId};

/// Default outbound queue capacity per participant.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

/// Errors delivering a payload to a participant's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The queue is at capacity.
    #[error("outbound queue is full")]
    QueueFull,
    /// The queue was closed; the participant is on its way out.
    #[error("outbound queue is closed")]
    QueueClosed,
}

/// Hub-side record of a registered participant.
///
/// The hub's membership map holds the only instance; removing it from the
/// map drops the queue sender, which closes the queue and signals the send
/// pump to drain and exit.
#[derive(Debug)]
pub struct Participant {
    identity: Identity,
    outbox: mpsc::Sender<Bytes>,
}

impl Participant {
    /// Create a participant record from its identity and queue sender.
    #[must_use]
    pub fn new(identity: Identity, outbox: mpsc::Sender<Bytes>) -> Self {
        Self { identity, outbox }
    }

    /// Get the participant's numeric identifier.
    #[must_use]
    pub fn id(&self) -> ParticipantId {
        self.identity.id
    }

    /// Get the participant's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Enqueue a payload without blocking the hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue is full or closed.
    pub fn try_deliver(&self, payload: Bytes) -> Result<(), DeliveryError> {
        self.outbox.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::QueueClosed,
        })
    }
}

/// One participant's view of its own session.
///
/// Returned by admission; owns the sole consumer of the outbound queue.
#[derive(Debug)]
pub struct Session {
    identity: Identity,
    outbox: mpsc::Receiver<Bytes>,
}

impl Session {
    /// Create a session from its identity and queue receiver.
    #[must_use]
    pub fn new(identity: Identity, outbox: mpsc::Receiver<Bytes>) -> Self {
        Self { identity, outbox }
    }

    /// Get the session's identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Split into the identity and the raw queue receiver.
    #[must_use]
    pub fn into_parts(self) -> (Identity, mpsc::Receiver<Bytes>) {
        (self.identity, self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_identity(id: ParticipantId) -> Identity {
        Identity {
            id,
            name: format!("User{id}"),
        }
    }

    #[test]
    fn test_try_deliver_full_queue() {
        let (tx, _rx) = mpsc::channel(1);
        let participant = Participant::new(test_identity(1), tx);

        assert!(participant.try_deliver(Bytes::from_static(b"a")).is_ok());
        assert_eq!(
            participant.try_deliver(Bytes::from_static(b"b")),
            Err(DeliveryError::QueueFull)
        );
    }

    #[test]
    fn test_try_deliver_closed_queue() {
        let (tx, rx) = mpsc::channel(1);
        let participant = Participant::new(test_identity(1), tx);
        drop(rx);

        assert_eq!(
            participant.try_deliver(Bytes::from_static(b"a")),
            Err(DeliveryError::QueueClosed)
        );
    }

    #[tokio::test]
    async fn test_queue_drains_after_sender_drop() {
        let (tx, rx) = mpsc::channel(4);
        let participant = Participant::new(test_identity(1), tx);
        participant.try_deliver(Bytes::from_static(b"first")).unwrap();
        participant.try_deliver(Bytes::from_static(b"second")).unwrap();

        let session = Session::new(test_identity(1), rx);
        let (_, mut outbox) = session.into_parts();
        drop(participant);

        // Buffered payloads survive the sender drop, then the queue closes.
        assert_eq!(outbox.recv().await.unwrap(), Bytes::from_static(b"first"));
        assert_eq!(outbox.recv().await.unwrap(), Bytes::from_static(b"second"));
        assert!(outbox.recv().await.is_none());
    }
}
