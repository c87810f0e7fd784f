use etherparse::Icmpv4Slice;

use crate::buffer::FrameBuffer;

use super::DecodeError;

pub const TYPE_DESTINATION_UNREACHABLE: u8 = 3;
pub const CODE_PORT_UNREACHABLE: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
}

impl IcmpHeader {
    /// Destination port unreachable reports embed the original datagram.
    pub fn is_port_unreachable(&self) -> bool {
        self.icmp_type == TYPE_DESTINATION_UNREACHABLE && self.code == CODE_PORT_UNREACHABLE
    }
}

/// Read the ICMP type and code and skip to the message body.
pub fn read_header(buffer: &mut FrameBuffer) -> Result<IcmpHeader, DecodeError> {
    let slice = Icmpv4Slice::from_slice(buffer.remaining_slice())?;
    let header_length = slice.header_len();
    let header = IcmpHeader {
        icmp_type: slice.type_u8(),
        code: slice.code_u8(),
    };
    buffer.skip(header_length)?;
    Ok(header)
}
