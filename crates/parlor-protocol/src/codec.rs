//! Codec for encoding and decoding Parlor envelopes.
//!
//! Envelopes travel as discrete WebSocket text frames, one frame per logical
//! message, so there is no length prefixing or fragmentation handling here.
//! The serialized form is JSON.

use bytes::Bytes;
use thiserror::Error;

use crate::envelope::Envelope;

/// Maximum serialized envelope size (64 KiB).
pub const MAX_ENVELOPE_SIZE: usize = 64 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Envelope exceeds maximum size.
    #[error("Envelope size {0} exceeds maximum {MAX_ENVELOPE_SIZE}")]
    EnvelopeTooLarge(usize),

    /// JSON encoding error.
    #[error("Encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    /// JSON decoding error.
    #[error("Decoding error: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode an envelope to its JSON wire form.
///
/// The returned bytes are valid UTF-8 and can be sent as a text frame.
///
/// # Errors
///
/// Returns an error if the envelope is too large or encoding fails.
pub fn encode(envelope: &Envelope) -> Result<Bytes, ProtocolError> {
    let payload = serde_json::to_vec(envelope).map_err(ProtocolError::Encode)?;

    if payload.len() > MAX_ENVELOPE_SIZE {
        return Err(ProtocolError::EnvelopeTooLarge(payload.len()));
    }

    Ok(Bytes::from(payload))
}

/// Decode an envelope from its JSON wire form.
///
/// # Errors
///
/// Returns an error if the data is too large or not a valid envelope.
pub fn decode(data: &[u8]) -> Result<Envelope, ProtocolError> {
    if data.len() > MAX_ENVELOPE_SIZE {
        return Err(ProtocolError::EnvelopeTooLarge(data.len()));
    }

    serde_json::from_slice(data).map_err(ProtocolError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EventKind;

    #[test]
    fn test_wire_shape() {
        let envelope = Envelope::chat("User1", "hi");
        let encoded = encode(&envelope).unwrap();

        assert_eq!(
            &encoded[..],
            br#"{"type":"chatMessage","message":"hi","user":"User1"}"#
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let envelopes = vec![
            Envelope::chat("User1", "Hello, world!"),
            Envelope::user_joined("User2"),
            Envelope::user_left("User3"),
        ];

        for envelope in envelopes {
            let encoded = encode(&envelope).unwrap();
            let decoded = decode(&encoded).unwrap();
            assert_eq!(envelope, decoded);
        }
    }

    #[test]
    fn test_decode_membership_kind() {
        let decoded = decode(
            br#"{"type":"userJoined","message":"User2 joined the chat.","user":"User2"}"#,
        )
        .unwrap();
        assert_eq!(decoded.kind, EventKind::UserJoined);
        assert_eq!(decoded.user, "User2");
    }

    #[test]
    fn test_envelope_too_large() {
        let envelope = Envelope::chat("User1", "x".repeat(MAX_ENVELOPE_SIZE + 1));

        match encode(&envelope) {
            Err(ProtocolError::EnvelopeTooLarge(_)) => {}
            other => panic!("Expected EnvelopeTooLarge error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_invalid() {
        assert!(matches!(
            decode(br#"{"type":"unknownKind","message":"","user":""}"#),
            Err(ProtocolError::Decode(_))
        ));
        assert!(matches!(decode(b"not json"), Err(ProtocolError::Decode(_))));
    }
}
