//! # parlor-protocol
//!
//! Wire envelope definitions for the Parlor chat hub.
//!
//! The hub never re-broadcasts raw inbound text. Everything that leaves the
//! hub is wrapped in an [`Envelope`] and serialized as a JSON text frame:
//!
//! ```text
//! {"type":"chatMessage","message":"hi","user":"User1"}
//! ```
//!
//! ## Envelope kinds
//!
//! - `chatMessage` - a participant's forwarded chat text
//! - `userJoined` / `userLeft` - membership notifications synthesized by the hub
//!
//! ## Example
//!
//! ```rust
//! use parlor_protocol::{codec, Envelope};
//!
//! let envelope = Envelope::chat("User1", "Hello, world!");
//!
//! // Encode and decode
//! let encoded = codec::encode(&envelope).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! assert_eq!(envelope, decoded);
//! ```

pub mod codec;
pub mod envelope;

pub use codec::{decode, encode, ProtocolError};
pub use envelope::{Envelope, EventKind};
