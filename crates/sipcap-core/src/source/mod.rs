//! Frame sources feeding the capture runner.

mod pcap;

pub use pcap::PcapFileSource;

use bytes::Bytes;
use pcap_parser::Linktype;
use thiserror::Error;

/// One captured frame: raw link-layer bytes plus capture time in seconds.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    pub ts: Option<f64>,
    pub linktype: Linktype,
    pub data: Bytes,
}

/// Pull-based frame producer. `Ok(None)` marks the end of the capture.
pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error ({context}): {message}")]
    Pcap {
        context: &'static str,
        message: String,
    },
}
