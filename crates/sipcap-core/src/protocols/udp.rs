use etherparse::UdpHeaderSlice;

use crate::buffer::FrameBuffer;

use super::DecodeError;

pub const HEADER_LEN: usize = 8;
/// Smallest payload that can carry RTP, RTCP or a SIP start line.
pub const MIN_PAYLOAD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
}

/// Read a UDP header; length and checksum are not checked.
pub fn read_header(buffer: &mut FrameBuffer) -> Result<UdpHeader, DecodeError> {
    let slice = UdpHeaderSlice::from_slice(buffer.remaining_slice())?;
    let header = UdpHeader {
        src_port: slice.source_port(),
        dst_port: slice.destination_port(),
    };
    buffer.skip(HEADER_LEN)?;
    Ok(header)
}
