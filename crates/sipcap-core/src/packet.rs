use std::net::{IpAddr, Ipv4Addr};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Application protocol assigned once a payload has been classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolCode {
    Sip,
    Rtp,
    Rtcp,
    Icmp,
    Smpp,
}

impl ProtocolCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolCode::Sip => "sip",
            ProtocolCode::Rtp => "rtp",
            ProtocolCode::Rtcp => "rtcp",
            ProtocolCode::Icmp => "icmp",
            ProtocolCode::Smpp => "smpp",
        }
    }
}

/// Packet payload: a view into the captured frame or an owned copy.
///
/// A `Slice` keeps the whole frame alive; anything retained after the frame
/// has been dispatched must be `Owned`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Slice(Bytes),
    Owned(Vec<u8>),
}

impl Payload {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Payload::Slice(bytes) => bytes,
            Payload::Owned(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Payload::Owned(_))
    }

    /// Copy a frame slice into its own allocation. Owned payloads are kept.
    pub fn materialize(self) -> Self {
        match self {
            Payload::Slice(bytes) => Payload::Owned(bytes.to_vec()),
            owned @ Payload::Owned(_) => owned,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Slice(bytes) => bytes,
            Payload::Owned(bytes) => Bytes::from(bytes),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Owned(Vec::new())
    }
}

/// Unit of work threaded through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Capture time in seconds since the Unix epoch.
    pub timestamp: f64,
    pub src_addr: IpAddr,
    pub dst_addr: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    /// IPv4 protocol number of the transport carried by this packet.
    pub protocol_number: u8,
    pub protocol_code: Option<ProtocolCode>,
    /// Set when the datagram was recovered from an ICMP error report.
    pub rejected: bool,
    pub payload: Payload,
}

impl Packet {
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            src_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            dst_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            src_port: 0,
            dst_port: 0,
            protocol_number: 0,
            protocol_code: None,
            rejected: false,
            payload: Payload::default(),
        }
    }

    /// Derive an application message from this packet: same endpoints and
    /// timestamp, new protocol code and an owned copy of `bytes`.
    pub fn message(&self, protocol_code: ProtocolCode, bytes: &[u8]) -> Packet {
        Packet {
            timestamp: self.timestamp,
            src_addr: self.src_addr,
            dst_addr: self.dst_addr,
            src_port: self.src_port,
            dst_port: self.dst_port,
            protocol_number: self.protocol_number,
            protocol_code: Some(protocol_code),
            rejected: self.rejected,
            payload: Payload::Owned(bytes.to_vec()),
        }
    }
}
