use std::net::Ipv4Addr;

use etherparse::Ipv4HeaderSlice;

use crate::buffer::FrameBuffer;

use super::DecodeError;

pub const FRAGMENT_OFFSET_UNIT: usize = 8;

pub const PROTOCOL_ICMP: u8 = 0x01;
pub const PROTOCOL_IPV4: u8 = 0x04;
pub const PROTOCOL_TCP: u8 = 0x06;
pub const PROTOCOL_UDP: u8 = 0x11;

/// Decoded IPv4 header fields the pipeline cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    pub header_length: usize,
    pub total_length: usize,
    pub identification: u16,
    pub more_fragments: bool,
    /// Fragment offset in bytes (the wire field multiplied by 8).
    pub fragment_offset: usize,
    pub protocol_number: u8,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
}

impl Ipv4Header {
    pub fn is_fragment(&self) -> bool {
        self.more_fragments || self.fragment_offset > 0
    }

    /// Payload bytes carried by this datagram or fragment.
    pub fn payload_length(&self) -> usize {
        self.total_length.saturating_sub(self.header_length)
    }
}

/// Read an IPv4 header, options included, starting at the cursor.
///
/// The cursor is left on the first payload byte. `total_length` is taken
/// as written; callers truncate the buffer to it. Checksums are not verified.
pub fn read_header(buffer: &mut FrameBuffer) -> Result<Ipv4Header, DecodeError> {
    let slice = Ipv4HeaderSlice::from_slice(buffer.remaining_slice())?;
    let header = Ipv4Header {
        header_length: slice.slice().len(),
        total_length: usize::from(slice.total_len()),
        identification: slice.identification(),
        more_fragments: slice.more_fragments(),
        fragment_offset: FRAGMENT_OFFSET_UNIT * usize::from(slice.fragments_offset().value()),
        protocol_number: slice.protocol().0,
        src_addr: slice.source_addr(),
        dst_addr: slice.destination_addr(),
    };
    buffer.skip(header.header_length)?;
    Ok(header)
}
