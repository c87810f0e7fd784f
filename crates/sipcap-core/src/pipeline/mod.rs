//! Frame dispatch chain.
//!
//! A `Pipeline` owns one instance of every stage plus its batch queues and
//! is never shared between workers. Frames enter through `on_frame`; each
//! stage consumes its header and hands the buffer to exactly one next stage
//! or drops it. Decode failures are logged at `trace` and never escape.

use std::sync::Arc;

use bytes::Bytes;
use pcap_parser::Linktype;
use tracing::trace;

use crate::buffer::FrameBuffer;
use crate::config::PipelineConfig;
use crate::packet::{Packet, ProtocolCode};
use crate::sink::MessageSink;
use crate::source::PacketEvent;

pub mod bulk;
pub mod ethernet;
pub mod ipv4;
pub mod media;
pub mod sip;
pub mod smpp;
pub mod tcp;
pub mod udp;

pub use bulk::{BatchEmitter, BulkQueue};
pub use ethernet::EthernetStage;
pub use ipv4::{FragmentRoute, Ipv4Stage, MAX_IP_NESTING};

/// Application framers shared by the TCP and UDP stages of one chain.
pub struct Framers {
    pub sip: sip::SipFramer,
    pub smpp: smpp::SmppFramer,
    pub rtp: media::MediaFramer,
    pub rtcp: media::MediaFramer,
}

impl Framers {
    pub fn new(config: &PipelineConfig, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sip: sip::SipFramer::new(config.sip.bulk_size, sink.clone()),
            smpp: smpp::SmppFramer::new(config.smpp.bulk_size, sink.clone()),
            rtp: media::MediaFramer::new(ProtocolCode::Rtp, config.rtp.bulk_size, sink.clone()),
            rtcp: media::MediaFramer::new(ProtocolCode::Rtcp, config.rtcp.bulk_size, sink),
        }
    }

    pub fn flush(&mut self) {
        self.sip.flush();
        self.smpp.flush();
        self.rtp.flush();
        self.rtcp.flush();
    }
}

pub struct Pipeline {
    ethernet: EthernetStage,
    ipv4: Ipv4Stage,
}

impl Pipeline {
    pub fn new(
        config: &PipelineConfig,
        sink: Arc<dyn MessageSink>,
        fragments: FragmentRoute,
    ) -> Self {
        Self {
            ethernet: EthernetStage,
            ipv4: Ipv4Stage::new(config, sink, fragments),
        }
    }

    pub fn on_event(&mut self, event: PacketEvent) {
        let PacketEvent { ts, linktype, data } = event;
        self.on_frame(linktype, ts.unwrap_or_default(), data);
    }

    /// Run one captured frame through the chain.
    pub fn on_frame(&mut self, linktype: Linktype, timestamp: f64, data: impl Into<Bytes>) {
        let buffer = FrameBuffer::new(data);
        let packet = Packet::new(timestamp);
        let result = if linktype == Linktype::ETHERNET {
            self.ethernet.handle(buffer, packet, &mut self.ipv4)
        } else if linktype == Linktype::RAW || linktype == Linktype::IPV4 {
            self.ipv4.handle(buffer, packet)
        } else {
            trace!(linktype = linktype.0, "ignoring frame with unsupported link type");
            Ok(())
        };
        if let Err(err) = result {
            trace!(error = %err, "dropping malformed frame");
        }
    }

    /// Hand every partially filled batch to its destination.
    pub fn flush(&mut self) {
        self.ipv4.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use etherparse::PacketBuilder;

    use super::*;
    use crate::defrag::FragmentStore;
    use crate::sink::MemorySink;

    const SRC: [u8; 4] = [10, 0, 0, 1];
    const DST: [u8; 4] = [10, 0, 0, 2];
    const INVITE: &[u8] =
        b"INVITE sip:bob@example.com SIP/2.0\r\nCall-ID: 1\r\nContent-Length: 0\r\n\r\n";

    fn pipeline(config: PipelineConfig) -> (Pipeline, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let store = Arc::new(FragmentStore::new(Duration::from_secs(60)));
        let pipeline = Pipeline::new(&config, sink.clone(), FragmentRoute::Inline(store));
        (pipeline, sink)
    }

    fn udp_frame(payload: &[u8]) -> Vec<u8> {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4(SRC, DST, 64)
            .udp(5060, 5080);
        let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, payload).unwrap();
        frame
    }

    fn tcp_frame(payload: &[u8]) -> Vec<u8> {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4(SRC, DST, 64)
            .tcp(2775, 40000, 1, 1024);
        let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, payload).unwrap();
        frame
    }

    /// IPv4 datagram (no link layer) carrying a UDP payload.
    fn udp_datagram(payload: &[u8]) -> Vec<u8> {
        let builder = PacketBuilder::ipv4(SRC, DST, 64).udp(5060, 5080);
        let mut datagram = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut datagram, payload).unwrap();
        datagram
    }

    fn ipv4_header(protocol: u8, id: u16, flags_and_offset: u16, payload_len: usize) -> Vec<u8> {
        let total = (20 + payload_len) as u16;
        let mut header = vec![0x45, 0x00];
        header.extend_from_slice(&total.to_be_bytes());
        header.extend_from_slice(&id.to_be_bytes());
        header.extend_from_slice(&flags_and_offset.to_be_bytes());
        header.extend_from_slice(&[64, protocol, 0, 0]);
        header.extend_from_slice(&SRC);
        header.extend_from_slice(&DST);
        header
    }

    fn ethernet(payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(&0x0800u16.to_be_bytes());
        frame.extend_from_slice(payload);
        frame
    }

    fn icmp_port_unreachable(embedded: &[u8]) -> Vec<u8> {
        let mut icmp = vec![3, 3, 0, 0, 0, 0, 0, 0];
        icmp.extend_from_slice(embedded);
        let mut datagram = ipv4_header(1, 9, 0, icmp.len());
        datagram.extend_from_slice(&icmp);
        ethernet(&datagram)
    }

    fn smpp_pdu(command_id: u32, sequence: u32) -> Vec<u8> {
        let mut bytes = 16u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&command_id.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&sequence.to_be_bytes());
        bytes
    }

    #[test]
    fn udp_sip_message_reaches_sink() {
        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        pipeline.on_frame(Linktype::ETHERNET, 7.25, udp_frame(INVITE));

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.protocol_code, Some(ProtocolCode::Sip));
        assert_eq!(message.src_addr, IpAddr::V4(Ipv4Addr::from(SRC)));
        assert_eq!(message.dst_addr, IpAddr::V4(Ipv4Addr::from(DST)));
        assert_eq!(message.src_port, 5060);
        assert_eq!(message.dst_port, 5080);
        assert_eq!(message.timestamp, 7.25);
        assert!(!message.rejected);
        assert_eq!(message.payload.as_slice(), INVITE);
    }

    #[test]
    fn ethernet_padding_is_not_part_of_the_payload() {
        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        let mut frame = udp_frame(INVITE);
        frame.extend_from_slice(&[0u8; 6]);
        pipeline.on_frame(Linktype::ETHERNET, 0.0, frame);

        assert_eq!(sink.messages()[0].payload.as_slice(), INVITE);
    }

    #[test]
    fn disabled_sip_drops_message() {
        let mut config = PipelineConfig::default();
        config.sip.enabled = false;
        let (mut pipeline, sink) = pipeline(config);
        pipeline.on_frame(Linktype::ETHERNET, 0.0, udp_frame(INVITE));
        assert!(sink.batches().is_empty());
    }

    #[test]
    fn raw_ip_link_type_enters_ipv4_stage() {
        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        pipeline.on_frame(Linktype::RAW, 0.0, udp_datagram(INVITE));
        assert_eq!(sink.messages().len(), 1);
    }

    #[test]
    fn unknown_link_type_and_garbage_are_dropped() {
        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        pipeline.on_frame(Linktype::NULL, 0.0, udp_datagram(INVITE));
        pipeline.on_frame(Linktype::ETHERNET, 0.0, vec![0xffu8; 9]);
        pipeline.on_frame(Linktype::ETHERNET, 0.0, Vec::new());
        assert!(sink.batches().is_empty());
    }

    #[test]
    fn short_udp_payload_is_dropped() {
        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        pipeline.on_frame(Linktype::ETHERNET, 0.0, udp_frame(b"ACK"));
        assert!(sink.batches().is_empty());
    }

    #[test]
    fn rtp_and_rtcp_follow_their_enable_flags() {
        let rtp = [0x80, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0, 0, 1];
        let rtcp = [0x81, 200, 0x00, 0x06, 0, 0, 0, 1, 0, 0, 0, 0];

        let (mut disabled, sink) = pipeline(PipelineConfig::default());
        disabled.on_frame(Linktype::ETHERNET, 0.0, udp_frame(&rtp));
        disabled.on_frame(Linktype::ETHERNET, 0.0, udp_frame(&rtcp));
        assert!(sink.batches().is_empty());

        let mut config = PipelineConfig::default();
        config.rtp.enabled = true;
        config.rtcp.enabled = true;
        let (mut enabled, sink) = pipeline(config);
        enabled.on_frame(Linktype::ETHERNET, 0.0, udp_frame(&rtp));
        enabled.on_frame(Linktype::ETHERNET, 0.0, udp_frame(&rtcp));
        let codes: Vec<_> = sink.messages().iter().map(|m| m.protocol_code).collect();
        assert_eq!(codes, vec![Some(ProtocolCode::Rtp), Some(ProtocolCode::Rtcp)]);
        assert_eq!(sink.messages()[0].payload.as_slice(), rtp.as_slice());
    }

    #[test]
    fn icmp_port_unreachable_emits_report_and_marks_rejected() {
        let rtp = [0x80, 0x08, 0x00, 0x02, 0, 0, 0, 0, 0, 0, 0, 1];
        let embedded = udp_datagram(&rtp);
        let mut config = PipelineConfig::default();
        config.rtp.enabled = true;
        let (mut pipeline, sink) = pipeline(config);

        pipeline.on_frame(Linktype::ETHERNET, 0.0, icmp_port_unreachable(&embedded));

        let messages = sink.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].protocol_code, Some(ProtocolCode::Icmp));
        assert!(messages[0].rejected);
        assert_eq!(messages[0].payload.as_slice(), embedded.as_slice());
        assert_eq!(messages[1].protocol_code, Some(ProtocolCode::Rtp));
        assert!(messages[1].rejected);
        assert_eq!(messages[1].src_port, 5060);
    }

    #[test]
    fn rejected_sip_and_rtcp_are_never_forwarded() {
        let rtcp = [0x81, 201, 0x00, 0x06, 0, 0, 0, 1, 0, 0, 0, 0];
        let mut config = PipelineConfig::default();
        config.rtcp.enabled = true;
        let (mut pipeline, sink) = pipeline(config);

        pipeline.on_frame(Linktype::ETHERNET, 0.0, icmp_port_unreachable(&udp_datagram(INVITE)));
        pipeline.on_frame(Linktype::ETHERNET, 0.0, icmp_port_unreachable(&udp_datagram(&rtcp)));

        let codes: Vec<_> = sink.messages().iter().map(|m| m.protocol_code).collect();
        assert_eq!(codes, vec![Some(ProtocolCode::Icmp), Some(ProtocolCode::Icmp)]);
    }

    #[test]
    fn other_icmp_messages_are_ignored() {
        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        let mut icmp = vec![8, 0, 0, 0, 0, 1, 0, 1];
        icmp.extend_from_slice(b"ping-data");
        let mut datagram = ipv4_header(1, 3, 0, icmp.len());
        datagram.extend_from_slice(&icmp);
        pipeline.on_frame(Linktype::ETHERNET, 0.0, ethernet(&datagram));
        assert!(sink.batches().is_empty());
    }

    #[test]
    fn tcp_payload_goes_to_smpp_or_sip() {
        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        let mut pdus = smpp_pdu(0x0000_0015, 1);
        pdus.extend_from_slice(&smpp_pdu(0x8000_0015, 1));
        pipeline.on_frame(Linktype::ETHERNET, 0.0, tcp_frame(&pdus));
        pipeline.on_frame(Linktype::ETHERNET, 0.0, tcp_frame(INVITE));

        let messages = sink.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].protocol_code, Some(ProtocolCode::Smpp));
        assert_eq!(messages[0].src_port, 2775);
        assert_eq!(messages[1].payload.as_slice(), &pdus[16..]);
        assert_eq!(messages[2].protocol_code, Some(ProtocolCode::Sip));
    }

    #[test]
    fn ip_in_ip_is_decoded_recursively() {
        let inner = udp_datagram(INVITE);
        let mut outer = ipv4_header(4, 5, 0, inner.len());
        outer.extend_from_slice(&inner);
        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        pipeline.on_frame(Linktype::ETHERNET, 0.0, ethernet(&outer));
        assert_eq!(sink.messages().len(), 1);
    }

    #[test]
    fn ip_in_ip_nesting_is_bounded() {
        let mut datagram = udp_datagram(INVITE);
        for id in 0..MAX_IP_NESTING as u16 {
            let mut outer = ipv4_header(4, id, 0, datagram.len());
            outer.extend_from_slice(&datagram);
            datagram = outer;
        }
        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        pipeline.on_frame(Linktype::ETHERNET, 0.0, ethernet(&datagram));
        assert!(sink.batches().is_empty());
    }

    #[test]
    fn fragmented_sip_datagram_is_reassembled_inline() {
        let datagram = udp_datagram(INVITE);
        let transport = &datagram[20..];
        let (head, tail) = transport.split_at(24);

        let mut first = ipv4_header(17, 77, 0x2000, head.len());
        first.extend_from_slice(head);
        let mut second = ipv4_header(17, 77, 3, tail.len());
        second.extend_from_slice(tail);

        let (mut pipeline, sink) = pipeline(PipelineConfig::default());
        pipeline.on_frame(Linktype::ETHERNET, 4.0, ethernet(&second));
        assert!(sink.batches().is_empty());
        pipeline.on_frame(Linktype::ETHERNET, 5.0, ethernet(&first));

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload.as_slice(), INVITE);
        assert_eq!(messages[0].timestamp, 4.0);
        assert_eq!(messages[0].dst_port, 5080);
    }

    #[test]
    fn flush_hands_over_partial_batches() {
        let mut config = PipelineConfig::default();
        config.sip.bulk_size = 10;
        let (mut pipeline, sink) = pipeline(config);
        pipeline.on_frame(Linktype::ETHERNET, 0.0, udp_frame(INVITE));
        pipeline.on_frame(Linktype::ETHERNET, 0.0, udp_frame(INVITE));
        assert!(sink.batches().is_empty());

        pipeline.flush();
        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }
}
