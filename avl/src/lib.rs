//! Binary telemetry codec for the Fleetlink ingest pipeline
//!
//! Two pure components: the record decoder ([`decoder`]) turns a binary
//! location packet into decoded fixes, and the frame dispatcher ([`frame`])
//! classifies one inbound message (JSON handshake, bare device identifier,
//! or raw binary packet) into the action the connection handler should
//! take. No I/O and no shared state live in this crate.

pub mod decoder;
pub mod error;
pub mod frame;

pub use decoder::{decode_records, DecodeOutcome, MIN_PACKET_LEN};
pub use error::{AvlError, AvlResult};
pub use frame::{decode_avl_hex, dispatch, Action};
