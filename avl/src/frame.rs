//! Inbound message classification
//!
//! One logical message arrives per delivery. The first byte decides the
//! shape: `{` opens a JSON handshake, anything shorter than the minimum
//! binary packet is a bare device-identifier string, everything else is a
//! raw binary record packet.

use fleetlink_common::{Handshake, SessionHint};
use tracing::warn;

use crate::decoder::MIN_PACKET_LEN;
use crate::error::AvlError;

/// What the connection handler should do with one inbound message.
#[derive(Debug, PartialEq)]
pub enum Action {
    /// Apply the hint, then decode the payload as binary records.
    ForwardBinary { payload: Vec<u8>, hint: SessionHint },
    /// Merge the hint into the session announcement; nothing to decode.
    UpdateSession(SessionHint),
    /// Nothing usable in the message.
    Ignore,
}

/// Hex-decode the `avlHex` field of a handshake.
pub fn decode_avl_hex(avl_hex: &str) -> Result<Vec<u8>, AvlError> {
    Ok(hex::decode(avl_hex)?)
}

/// Classify one inbound message.
///
/// A handshake that fails to parse is an error and the message is
/// dropped. A handshake whose `avlHex` fails to decode keeps its session
/// fields: the binary forwarding is skipped but the update still happens.
pub fn dispatch(message: &[u8]) -> Result<Action, AvlError> {
    if message.first() == Some(&b'{') {
        let handshake: Handshake = serde_json::from_slice(message)?;
        let hint = handshake.session_hint();

        if let Some(avl_hex) = handshake.avl_hex.as_deref() {
            match decode_avl_hex(avl_hex) {
                Ok(payload) => return Ok(Action::ForwardBinary { payload, hint }),
                Err(e) => {
                    warn!("Invalid avlHex in handshake, keeping session fields: {}", e);
                }
            }
        }

        return Ok(if hint.is_empty() {
            Action::Ignore
        } else {
            Action::UpdateSession(hint)
        });
    }

    if message.len() < MIN_PACKET_LEN {
        return Ok(Action::UpdateSession(SessionHint {
            upload_ref: None,
            imei: Some(String::from_utf8_lossy(message).to_string()),
        }));
    }

    Ok(Action::ForwardBinary {
        payload: message.to_vec(),
        hint: SessionHint::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlink_common::UploadRef;

    #[test]
    fn test_dispatch_handshake_with_hex() {
        let msg = br#"{"uploadRef":1755000000000,"imei":"123456789012345","avlHex":"0a0b0c"}"#;
        match dispatch(msg).unwrap() {
            Action::ForwardBinary { payload, hint } => {
                assert_eq!(payload, vec![0x0a, 0x0b, 0x0c]);
                assert_eq!(hint.upload_ref, Some(UploadRef::Number(1_755_000_000_000)));
                assert_eq!(hint.imei.as_deref(), Some("123456789012345"));
            }
            other => panic!("Expected ForwardBinary, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_handshake_session_only() {
        let msg = br#"{"uploadRef":"ref-77","imei":"987654321098765"}"#;
        match dispatch(msg).unwrap() {
            Action::UpdateSession(hint) => {
                assert_eq!(hint.upload_ref, Some(UploadRef::Text("ref-77".to_string())));
                assert_eq!(hint.imei.as_deref(), Some("987654321098765"));
            }
            other => panic!("Expected UpdateSession, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_handshake_partial_fields() {
        // imei alone must not touch the upload ref
        let msg = br#"{"imei":"111111111111111"}"#;
        match dispatch(msg).unwrap() {
            Action::UpdateSession(hint) => {
                assert!(hint.upload_ref.is_none());
                assert_eq!(hint.imei.as_deref(), Some("111111111111111"));
            }
            other => panic!("Expected UpdateSession, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_empty_handshake_ignored() {
        assert_eq!(dispatch(b"{}").unwrap(), Action::Ignore);
    }

    #[test]
    fn test_dispatch_malformed_handshake() {
        let err = dispatch(b"{not valid json").unwrap_err();
        assert!(matches!(err, AvlError::MalformedHandshake(_)));
    }

    #[test]
    fn test_dispatch_bad_hex_keeps_session_fields() {
        let msg = br#"{"uploadRef":9,"avlHex":"zz-not-hex"}"#;
        match dispatch(msg).unwrap() {
            Action::UpdateSession(hint) => {
                assert_eq!(hint.upload_ref, Some(UploadRef::Number(9)));
            }
            other => panic!("Expected UpdateSession, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_odd_length_hex() {
        // odd-length hex with no session fields leaves nothing usable
        let msg = br#"{"avlHex":"abc"}"#;
        assert_eq!(dispatch(msg).unwrap(), Action::Ignore);
    }

    #[test]
    fn test_dispatch_bare_identifier() {
        let msg = b"IMEI999";
        match dispatch(msg).unwrap() {
            Action::UpdateSession(hint) => {
                assert!(hint.upload_ref.is_none());
                assert_eq!(hint.imei.as_deref(), Some("IMEI999"));
            }
            other => panic!("Expected UpdateSession, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_binary_passthrough() {
        let msg = vec![0x00u8; 24];
        match dispatch(&msg).unwrap() {
            Action::ForwardBinary { payload, hint } => {
                assert_eq!(payload, msg);
                assert!(hint.is_empty());
            }
            other => panic!("Expected ForwardBinary, got {:?}", other),
        }
    }

    #[test]
    fn test_handshake_round_trip() {
        // what the gateway serializes, the dispatcher must classify
        let handshake = Handshake {
            upload_ref: Some(UploadRef::Number(42)),
            imei: Some("222222222222222".to_string()),
            avl_hex: Some("ff00".to_string()),
        };
        let wire = serde_json::to_vec(&handshake).unwrap();
        match dispatch(&wire).unwrap() {
            Action::ForwardBinary { payload, hint } => {
                assert_eq!(payload, vec![0xff, 0x00]);
                assert_eq!(hint.upload_ref, Some(UploadRef::Number(42)));
                assert_eq!(hint.imei.as_deref(), Some("222222222222222"));
            }
            other => panic!("Expected ForwardBinary, got {:?}", other),
        }
    }
}
