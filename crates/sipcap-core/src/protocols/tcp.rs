use etherparse::TcpHeaderSlice;

use crate::buffer::FrameBuffer;

use super::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub header_length: usize,
}

/// Read a TCP header and leave the cursor on the first payload byte.
pub fn read_header(buffer: &mut FrameBuffer) -> Result<TcpHeader, DecodeError> {
    let slice = TcpHeaderSlice::from_slice(buffer.remaining_slice())?;
    let header = TcpHeader {
        src_port: slice.source_port(),
        dst_port: slice.destination_port(),
        header_length: slice.slice().len(),
    };
    buffer.skip(header.header_length)?;
    Ok(header)
}
