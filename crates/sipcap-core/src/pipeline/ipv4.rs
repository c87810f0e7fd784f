use std::net::IpAddr;
use std::sync::Arc;

use tracing::trace;

use crate::buffer::FrameBuffer;
use crate::config::PipelineConfig;
use crate::defrag::{FragmentSender, FragmentStore};
use crate::packet::{Packet, Payload, ProtocolCode};
use crate::protocols::DecodeError;
use crate::protocols::icmp;
use crate::protocols::ipv4::{
    self, Ipv4Header, PROTOCOL_ICMP, PROTOCOL_IPV4, PROTOCOL_TCP, PROTOCOL_UDP,
};
use crate::sink::MessageSink;

use super::Framers;
use super::bulk::{BatchEmitter, BulkQueue};
use super::tcp::TcpStage;
use super::udp::UdpStage;

/// Bound on IP-in-IP and ICMP-embedded datagram recursion.
pub const MAX_IP_NESTING: usize = 4;

/// Destination for fragments that cannot be routed yet.
pub enum FragmentRoute {
    /// Reassemble in place against a shared store.
    Inline(Arc<FragmentStore>),
    /// Batch fragments and hand them to the reassembly service.
    Channel {
        queue: BulkQueue<(Ipv4Header, Packet)>,
        sender: FragmentSender,
    },
}

impl FragmentRoute {
    pub fn channel(bulk_size: usize, sender: FragmentSender) -> Self {
        FragmentRoute::Channel {
            queue: BulkQueue::new(bulk_size),
            sender,
        }
    }
}

pub struct Ipv4Stage {
    udp: UdpStage,
    tcp: TcpStage,
    framers: Framers,
    icmp: BatchEmitter,
    fragments: FragmentRoute,
}

impl Ipv4Stage {
    pub fn new(
        config: &PipelineConfig,
        sink: Arc<dyn MessageSink>,
        fragments: FragmentRoute,
    ) -> Self {
        Self {
            udp: UdpStage::new(config),
            tcp: TcpStage::new(config.sip.enabled),
            framers: Framers::new(config, sink.clone()),
            icmp: BatchEmitter::new(config.icmp.bulk_size, sink),
            fragments,
        }
    }

    /// Decode an IPv4 datagram starting at the buffer cursor.
    pub fn handle(&mut self, buffer: FrameBuffer, packet: Packet) -> Result<(), DecodeError> {
        self.decode(buffer, packet, 0)
    }

    /// Feed one fragment to the shared store and route the datagram it
    /// completes, if any.
    pub fn reassemble(&mut self, header: Ipv4Header, packet: Packet) -> Result<(), DecodeError> {
        let store = match &self.fragments {
            FragmentRoute::Inline(store) => Arc::clone(store),
            FragmentRoute::Channel { .. } => {
                self.defer_fragment(header, packet);
                return Ok(());
            }
        };
        match store.ingest(header, packet) {
            Some(mut datagram) => {
                let payload = std::mem::take(&mut datagram.payload).into_bytes();
                self.route(FrameBuffer::new(payload), datagram, 0)
            }
            None => Ok(()),
        }
    }

    /// Hand every partially filled batch to its destination.
    pub fn flush(&mut self) {
        self.framers.flush();
        self.icmp.flush();
        if let FragmentRoute::Channel { queue, sender } = &mut self.fragments {
            if !queue.is_empty() {
                sender.send(queue.drain());
            }
        }
    }

    fn decode(
        &mut self,
        mut buffer: FrameBuffer,
        mut packet: Packet,
        depth: usize,
    ) -> Result<(), DecodeError> {
        if depth >= MAX_IP_NESTING {
            return Err(DecodeError::NestingTooDeep {
                layer: "IPv4",
                limit: MAX_IP_NESTING,
            });
        }
        let offset = buffer.position();
        let header = ipv4::read_header(&mut buffer)?;
        packet.src_addr = IpAddr::V4(header.src_addr);
        packet.dst_addr = IpAddr::V4(header.dst_addr);
        packet.protocol_number = header.protocol_number;

        if header.is_fragment() {
            buffer.truncate(offset + header.total_length);
            buffer.set_position(offset + header.header_length)?;
            packet.payload = Payload::Slice(buffer.remaining_bytes()).materialize();
            return self.reassemble(header, packet);
        }

        if !packet.rejected {
            buffer.truncate(offset + header.total_length);
        }
        buffer.set_position(offset + header.header_length)?;
        self.route(buffer, packet, depth)
    }

    fn route(&mut self, buffer: FrameBuffer, packet: Packet, depth: usize) -> Result<(), DecodeError> {
        match packet.protocol_number {
            PROTOCOL_UDP => self.udp.handle(buffer, packet, &mut self.framers),
            PROTOCOL_TCP => self.tcp.handle(buffer, packet, &mut self.framers),
            PROTOCOL_ICMP => self.handle_icmp(buffer, packet, depth),
            PROTOCOL_IPV4 => self.decode(buffer, packet, depth + 1),
            other => {
                trace!(protocol = other, "ignoring IPv4 payload");
                Ok(())
            }
        }
    }

    fn handle_icmp(
        &mut self,
        mut buffer: FrameBuffer,
        mut packet: Packet,
        depth: usize,
    ) -> Result<(), DecodeError> {
        let header = icmp::read_header(&mut buffer)?;
        if !header.is_port_unreachable() {
            return Ok(());
        }
        packet.rejected = true;
        packet.protocol_code = Some(ProtocolCode::Icmp);
        self.icmp
            .emit(packet.message(ProtocolCode::Icmp, buffer.remaining_slice()));
        self.decode(buffer, packet, depth + 1)
    }

    fn defer_fragment(&mut self, header: Ipv4Header, packet: Packet) {
        if let FragmentRoute::Channel { queue, sender } = &mut self.fragments {
            if let Some(batch) = queue.push((header, packet)) {
                sender.send(batch);
            }
        }
    }
}
