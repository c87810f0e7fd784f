use crate::buffer::FrameBuffer;
use crate::packet::Packet;
use crate::protocols::DecodeError;
use crate::protocols::ethernet::{self, ETHER_TYPE_IPV4};

use super::ipv4::Ipv4Stage;

/// Link-layer entry of the chain. Only IPv4 is forwarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct EthernetStage;

impl EthernetStage {
    pub fn handle(
        &self,
        mut buffer: FrameBuffer,
        packet: Packet,
        next: &mut Ipv4Stage,
    ) -> Result<(), DecodeError> {
        match ethernet::read_ether_type(&mut buffer)? {
            ETHER_TYPE_IPV4 => next.handle(buffer, packet),
            _ => Ok(()),
        }
    }
}
