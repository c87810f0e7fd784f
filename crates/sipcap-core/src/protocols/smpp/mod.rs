//! SMPP PDU extraction.
//!
//! Every PDU starts with a 16-byte header: command length, command id,
//! command status and sequence number, all big-endian `u32`. Extraction walks
//! a transport payload PDU by PDU and stops at the first incomplete PDU or
//! unknown command id; nothing is carried over between payloads.
//!
//! Byte offsets live in `layout`, safe access in `reader`, and the
//! extraction walk in `parser`.

pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{SmppCommand, extract_pdus, looks_like_pdu};
