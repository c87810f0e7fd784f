use crate::buffer::FrameBuffer;
use crate::packet::Packet;
use crate::protocols::DecodeError;
use crate::protocols::{sip, tcp};

use super::Framers;

/// Reads the TCP header and hands the segment payload, unreassembled, to
/// the SIP splitter or the SMPP extractor.
#[derive(Debug, Clone, Copy)]
pub struct TcpStage {
    sip_enabled: bool,
}

impl TcpStage {
    pub fn new(sip_enabled: bool) -> Self {
        Self { sip_enabled }
    }

    pub fn handle(
        &self,
        mut buffer: FrameBuffer,
        mut packet: Packet,
        framers: &mut Framers,
    ) -> Result<(), DecodeError> {
        let header = tcp::read_header(&mut buffer)?;
        packet.src_port = header.src_port;
        packet.dst_port = header.dst_port;

        let payload = buffer.remaining_slice();
        if payload.is_empty() {
            return Ok(());
        }
        if sip::is_start_line(payload) {
            if self.sip_enabled && !packet.rejected {
                framers.sip.handle(&packet, payload);
            }
        } else {
            framers.smpp.handle(&packet, payload);
        }
        Ok(())
    }
}
