//! PCAP/PCAPNG capture file source.
//!
//! Handles file I/O and container parsing only; frames are emitted as raw
//! link-layer bytes with their capture timestamp. PCAPNG interfaces keep
//! their own link type and clock resolution.

mod layout;
mod parser;
mod reader;

pub use parser::PcapFileSource;
