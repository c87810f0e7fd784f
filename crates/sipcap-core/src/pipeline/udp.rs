use crate::buffer::FrameBuffer;
use crate::config::PipelineConfig;
use crate::packet::{Packet, Payload};
use crate::protocols::DecodeError;
use crate::protocols::rtp::{self, MediaKind};
use crate::protocols::{sip, udp};

use super::Framers;

/// Reads the UDP header and routes the payload by its first bytes.
///
/// Routing policy:
/// - RTCP goes out only when RTCP is enabled and the packet is not rejected.
/// - RTP goes out whenever RTP is enabled, rejected or not.
/// - SIP goes out only when SIP is enabled and the packet is not rejected.
#[derive(Debug, Clone, Copy)]
pub struct UdpStage {
    sip_enabled: bool,
    rtp_enabled: bool,
    rtcp_enabled: bool,
}

impl UdpStage {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            sip_enabled: config.sip.enabled,
            rtp_enabled: config.rtp.enabled,
            rtcp_enabled: config.rtcp.enabled,
        }
    }

    pub fn handle(
        &self,
        mut buffer: FrameBuffer,
        mut packet: Packet,
        framers: &mut Framers,
    ) -> Result<(), DecodeError> {
        let header = udp::read_header(&mut buffer)?;
        packet.src_port = header.src_port;
        packet.dst_port = header.dst_port;

        let payload = buffer.remaining_bytes();
        if payload.len() < udp::MIN_PAYLOAD_LEN {
            return Ok(());
        }

        match rtp::classify(&payload) {
            Some(MediaKind::Rtcp) => {
                if self.rtcp_enabled && !packet.rejected {
                    packet.payload = Payload::Slice(payload);
                    framers.rtcp.handle(packet);
                }
            }
            Some(MediaKind::Rtp) => {
                if self.rtp_enabled {
                    packet.payload = Payload::Slice(payload);
                    framers.rtp.handle(packet);
                }
            }
            None => {
                if self.sip_enabled && !packet.rejected && sip::is_start_line(&payload) {
                    framers.sip.handle(&packet, &payload);
                }
            }
        }
        Ok(())
    }
}
