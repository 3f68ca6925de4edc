//! # parlor-core
//!
//! Room hub, participant sessions, and broadcast fan-out for the Parlor
//! chat server.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **RoomHub** - the single serializing coordinator owning membership
//! - **Participant** / **Session** - one connected chat session and its
//!   bounded outbound queue
//! - **IdentitySequence** - monotonic `UserN` display-name minting
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  join/leave/forward  ┌─────────────┐
//! │  Connection │─────────────────────▶│   RoomHub   │
//! └─────────────┘                      └─────────────┘
//!        ▲                                    │
//!        │        bounded outbound queue      │
//!        └────────────────────────────────────┘
//! ```
//!
//! All membership mutation happens inside the single hub task, so the
//! participant set needs no lock. The per-participant outbound queue is the
//! only structure shared between the hub (producer) and a send pump (sole
//! consumer).

pub mod hub;
pub mod identity;
pub mod participant;

pub use hub::{HubConfig, HubError, HubHandle, HubStats, RoomHub};
pub use identity::{Identity, IdentitySequence, ParticipantId};
pub use participant::{DeliveryError, Participant, Session};
