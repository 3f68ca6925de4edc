//! The room hub: a single serializing coordinator for one chat room.
//!
//! The hub owns the participant set and processes exactly one event at a
//! time, selected among three typed channels (join, leave, forward). All
//! membership mutation happens inside the hub task, so the set needs no
//! lock; pumps only ever talk to the hub through a [`HubHandle`].
//!
//! Submitting an event suspends the submitting pump while the hub is busy.
//! That is the intended backpressure path: a slow hub throttles inbound
//! reads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use parlor_protocol::{codec, Envelope};

use crate::identity::{IdentitySequence, ParticipantId};
use crate::participant::{DeliveryError, Participant, Session, DEFAULT_OUTBOX_CAPACITY};

/// Default capacity of each hub event channel.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of each participant's outbound queue.
    pub outbox_capacity: usize,
    /// Capacity of each of the three event channels.
    pub event_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Hub errors.
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub task has stopped and no longer accepts events.
    #[error("room hub is no longer running")]
    HubClosed,
}

/// A forwarded chat message awaiting fan-out.
#[derive(Debug)]
struct ChatSubmission {
    sender: ParticipantId,
    text: String,
}

#[derive(Debug, Default)]
struct SharedStats {
    participants: AtomicUsize,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// A point-in-time snapshot of hub counters.
///
/// `dropped` counts deliveries skipped because a recipient's outbound queue
/// was full; it is the observable side of the drop policy.
#[derive(Debug, Clone, Copy)]
pub struct HubStats {
    /// Currently registered participants.
    pub participants: usize,
    /// Payloads enqueued for delivery since startup.
    pub delivered: u64,
    /// Payloads dropped due to a full outbound queue.
    pub dropped: u64,
}

/// The central room hub.
///
/// Create with [`RoomHub::new`] and drive with [`RoomHub::run`], or use
/// [`RoomHub::spawn`] to run it on its own task. The loop exits once every
/// [`HubHandle`] has been dropped.
pub struct RoomHub {
    members: HashMap<ParticipantId, Participant>,
    join_rx: mpsc::Receiver<Participant>,
    leave_rx: mpsc::Receiver<ParticipantId>,
    forward_rx: mpsc::Receiver<ChatSubmission>,
    stats: Arc<SharedStats>,
}

impl RoomHub {
    /// Create a hub and its first handle.
    #[must_use]
    pub fn new(config: HubConfig) -> (Self, HubHandle) {
        let (join_tx, join_rx) = mpsc::channel(config.event_capacity);
        let (leave_tx, leave_rx) = mpsc::channel(config.event_capacity);
        let (forward_tx, forward_rx) = mpsc::channel(config.event_capacity);
        let stats = Arc::new(SharedStats::default());

        let hub = Self {
            members: HashMap::new(),
            join_rx,
            leave_rx,
            forward_rx,
            stats: Arc::clone(&stats),
        };
        let handle = HubHandle {
            join_tx,
            leave_tx,
            forward_tx,
            identities: Arc::new(IdentitySequence::new()),
            stats,
            outbox_capacity: config.outbox_capacity,
        };

        (hub, handle)
    }

    /// Spawn the hub on its own task and return a handle to it.
    #[must_use]
    pub fn spawn(config: HubConfig) -> HubHandle {
        let (hub, handle) = Self::new(config);
        tokio::spawn(hub.run());
        handle
    }

    /// Run the event loop until all handles are dropped.
    pub async fn run(mut self) {
        info!("room hub running");

        loop {
            tokio::select! {
                Some(participant) = self.join_rx.recv() => self.handle_join(participant),
                Some(id) = self.leave_rx.recv() => self.handle_leave(id),
                Some(submission) = self.forward_rx.recv() => self.handle_forward(submission),
                else => break,
            }
        }

        info!("room hub stopped");
    }

    fn handle_join(&mut self, participant: Participant) {
        let id = participant.id();
        let name = participant.name().to_string();

        self.members.insert(id, participant);
        self.stats
            .participants
            .store(self.members.len(), Ordering::Relaxed);

        debug!(participant = %name, members = self.members.len(), "participant joined");
        self.broadcast(&Envelope::user_joined(name), Some(id));
    }

    fn handle_leave(&mut self, id: ParticipantId) {
        // Removing the record drops the queue sender, closing the queue so
        // the send pump drains remaining payloads and exits.
        let Some(departed) = self.members.remove(&id) else {
            debug!(id, "leave for unknown participant ignored");
            return;
        };
        self.stats
            .participants
            .store(self.members.len(), Ordering::Relaxed);

        debug!(participant = %departed.name(), members = self.members.len(), "participant left");
        self.broadcast(&Envelope::user_left(departed.name()), Some(id));
    }

    fn handle_forward(&mut self, submission: ChatSubmission) {
        let Some(sender) = self.members.get(&submission.sender) else {
            debug!(id = submission.sender, "chat from departed participant discarded");
            return;
        };

        let envelope = Envelope::chat(sender.name(), submission.text);
        self.broadcast(&envelope, Some(submission.sender));
    }

    /// Fan an envelope out to every member except `exclude`.
    ///
    /// The envelope is serialized once and the payload shared across
    /// recipients. A full queue drops the payload for that recipient only,
    /// keeping the hub live; the drop is counted in [`HubStats`].
    fn broadcast(&self, envelope: &Envelope, exclude: Option<ParticipantId>) {
        let payload = match codec::encode(envelope) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "failed to encode envelope, skipping broadcast");
                return;
            }
        };

        for member in self.members.values() {
            if Some(member.id()) == exclude {
                continue;
            }

            match member.try_deliver(payload.clone()) {
                Ok(()) => {
                    self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(DeliveryError::QueueFull) => {
                    self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(participant = %member.name(), "outbound queue full, dropping message");
                }
                Err(DeliveryError::QueueClosed) => {
                    debug!(participant = %member.name(), "outbound queue closed, departure pending");
                }
            }
        }
    }
}

/// A cloneable handle for submitting events to a [`RoomHub`].
#[derive(Debug, Clone)]
pub struct HubHandle {
    join_tx: mpsc::Sender<Participant>,
    leave_tx: mpsc::Sender<ParticipantId>,
    forward_tx: mpsc::Sender<ChatSubmission>,
    identities: Arc<IdentitySequence>,
    stats: Arc<SharedStats>,
    outbox_capacity: usize,
}

impl HubHandle {
    /// Admit a new participant: mint an identity, create its bounded
    /// outbound queue, and submit a join event.
    ///
    /// The returned [`Session`] owns the queue's consumer half; its queue
    /// closes when the hub processes the matching leave event.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub has stopped.
    pub async fn admit(&self) -> Result<Session, HubError> {
        let identity = self.identities.mint();
        let (tx, rx) = mpsc::channel(self.outbox_capacity);
        let participant = Participant::new(identity.clone(), tx);

        self.join_tx
            .send(participant)
            .await
            .map_err(|_| HubError::HubClosed)?;

        Ok(Session::new(identity, rx))
    }

    /// Submit a leave event for a participant.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub has stopped.
    pub async fn leave(&self, id: ParticipantId) -> Result<(), HubError> {
        self.leave_tx.send(id).await.map_err(|_| HubError::HubClosed)
    }

    /// Submit raw chat text for fan-out, attributed to `sender`.
    ///
    /// Suspends while the hub's forward channel is full; this is the
    /// backpressure path from receive pumps into the hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub has stopped.
    pub async fn forward(
        &self,
        sender: ParticipantId,
        text: impl Into<String>,
    ) -> Result<(), HubError> {
        self.forward_tx
            .send(ChatSubmission {
                sender,
                text: text.into(),
            })
            .await
            .map_err(|_| HubError::HubClosed)
    }

    /// Get a snapshot of the hub's counters.
    #[must_use]
    pub fn stats(&self) -> HubStats {
        HubStats {
            participants: self.stats.participants.load(Ordering::Relaxed),
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
        }
    }
}
