//! sipcap core library: decoding pipeline for captured signalling traffic.
//!
//! Frames read from a packet source are pushed through a chain of stages:
//! link layer -> IPv4 (with fragment reassembly and ICMP recovery) ->
//! TCP/UDP -> application framers (SIP, SMPP, RTP, RTCP). Each framer cuts
//! the payload into messages and hands them to a batch queue that forwards
//! full batches to a `MessageSink`.
//!
//! Header readers live in `protocols` and only ever move a cursor over the
//! shared frame buffer. Payloads stay zero-copy views until a message is
//! queued; queued messages always own their bytes.
//!
//! Invariants:
//! - A malformed frame is dropped with a log line; the capture continues.
//! - Fragments are reassembled only once the whole datagram is covered.
//! - Batches are delivered in arrival order per queue.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use sipcap_core::{JsonLinesSink, PipelineConfig, capture_pcap_file};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = Arc::new(JsonLinesSink::new(std::io::stdout()));
//! let summary =
//!     capture_pcap_file(Path::new("capture.pcap"), PipelineConfig::default(), sink).await?;
//! println!("packets: {}", summary.packets_total);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod buffer;
mod capture;
pub mod config;
pub mod defrag;
pub mod packet;
pub mod pipeline;
pub mod protocols;
pub mod sink;
mod source;

pub use buffer::FrameBuffer;
pub use capture::{CaptureError, capture_pcap_file, run_capture};
pub use config::{ConfigError, PipelineConfig};
pub use defrag::{FragmentSender, FragmentService, FragmentStore};
pub use packet::{Packet, Payload, ProtocolCode};
pub use pipeline::Pipeline;
pub use protocols::DecodeError;
pub use sink::{JsonLinesSink, MemorySink, MessageSink};
pub use source::{PacketEvent, PacketSource, PcapFileSource, SourceError};

/// One decoded message as written by the JSON lines sink.
///
/// # Examples
/// ```
/// use sipcap_core::{MessageRecord, Packet, Payload, ProtocolCode};
///
/// let mut packet = Packet::new(0.0);
/// packet.protocol_code = Some(ProtocolCode::Smpp);
/// packet.payload = Payload::Owned(vec![0x00, 0x10]);
///
/// let record = MessageRecord::from_packet(&packet);
/// assert_eq!(record.protocol.as_deref(), Some("smpp"));
/// assert_eq!(record.payload, "0010");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// RFC3339 capture time (absent when the timestamp is out of range).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub src: String,
    pub dst: String,
    pub src_port: u16,
    pub dst_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub rejected: bool,
    pub payload_len: usize,
    /// Lowercase hex dump of the message bytes.
    pub payload: String,
}

impl MessageRecord {
    pub fn from_packet(packet: &Packet) -> Self {
        let payload = packet.payload.as_slice();
        Self {
            timestamp: ts_to_rfc3339(packet.timestamp),
            src: packet.src_addr.to_string(),
            dst: packet.dst_addr.to_string(),
            src_port: packet.src_port,
            dst_port: packet.dst_port,
            protocol: packet.protocol_code.map(|code| code.as_str().to_string()),
            rejected: packet.rejected,
            payload_len: payload.len(),
            payload: hex::encode(payload),
        }
    }
}

/// Totals reported once a capture has been fully dispatched.
///
/// # Examples
/// ```
/// use sipcap_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     packets_total: 10,
///     time_start: None,
///     time_end: None,
/// };
/// assert_eq!(summary.packets_total, 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Frames read from the source.
    pub packets_total: u64,
    /// RFC3339 timestamp of the earliest frame (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the latest frame (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Format seconds since the Unix epoch as RFC3339.
///
/// # Examples
/// ```
/// use sipcap_core::ts_to_rfc3339;
///
/// assert_eq!(ts_to_rfc3339(0.0).as_deref(), Some("1970-01-01T00:00:00Z"));
/// assert!(ts_to_rfc3339(f64::NAN).is_none());
/// ```
pub fn ts_to_rfc3339(ts: f64) -> Option<String> {
    if !ts.is_finite() {
        return None;
    }
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
