#![allow(dead_code)]

use std::fs;
use std::path::Path;

use etherparse::PacketBuilder;

pub const LINKTYPE_ETHERNET: u32 = 1;
pub const LINKTYPE_RAW: u32 = 101;

pub const INVITE: &[u8] =
    b"INVITE sip:bob@example.com SIP/2.0\r\nCall-ID: 42\r\nContent-Length: 0\r\n\r\n";
pub const TRYING: &[u8] = b"SIP/2.0 100 Trying\r\nCall-ID: 42\r\nContent-Length: 0\r\n\r\n";

pub fn udp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .udp(src_port, dst_port);
    let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

pub fn tcp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .tcp(src_port, dst_port, 1, 1024);
    let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

/// Split a UDP datagram carrying `payload` into two Ethernet-framed IPv4
/// fragments; the cut lands on `first_len` transport bytes (multiple of 8).
pub fn fragmented_udp(id: u16, first_len: usize, payload: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let builder = PacketBuilder::ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64).udp(5060, 5060);
    let mut datagram = Vec::<u8>::with_capacity(builder.size(payload.len()));
    builder.write(&mut datagram, payload).unwrap();
    let (head, tail) = datagram[20..].split_at(first_len);
    (
        ethernet_ipv4(id, 0x2000, head),
        ethernet_ipv4(id, (first_len / 8) as u16, tail),
    )
}

fn ethernet_ipv4(id: u16, flags_and_offset: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; 12];
    frame.extend_from_slice(&0x0800u16.to_be_bytes());
    frame.extend_from_slice(&[0x45, 0x00]);
    frame.extend_from_slice(&((20 + payload.len()) as u16).to_be_bytes());
    frame.extend_from_slice(&id.to_be_bytes());
    frame.extend_from_slice(&flags_and_offset.to_be_bytes());
    frame.extend_from_slice(&[64, 17, 0, 0, 10, 0, 0, 1, 10, 0, 0, 2]);
    frame.extend_from_slice(payload);
    frame
}

pub fn smpp_pdu(command_id: u32, sequence: u32, body: &[u8]) -> Vec<u8> {
    let mut pdu = ((16 + body.len()) as u32).to_be_bytes().to_vec();
    pdu.extend_from_slice(&command_id.to_be_bytes());
    pdu.extend_from_slice(&0u32.to_be_bytes());
    pdu.extend_from_slice(&sequence.to_be_bytes());
    pdu.extend_from_slice(body);
    pdu
}

/// Write a classic (microsecond) PCAP file; timestamps are in microseconds.
pub fn write_pcap(path: &Path, linktype: u32, packets: &[(u64, Vec<u8>)]) {
    let records: Vec<_> = packets
        .iter()
        .map(|(ts_us, data)| ((ts_us / 1_000_000) as u32, (ts_us % 1_000_000) as u32, data.clone()))
        .collect();
    write_pcap_records(path, 0xa1b2_c3d4, linktype, &records);
}

/// Write a nanosecond-resolution classic PCAP file; timestamps are in
/// nanoseconds.
pub fn write_pcap_nanos(path: &Path, linktype: u32, packets: &[(u64, Vec<u8>)]) {
    let records: Vec<_> = packets
        .iter()
        .map(|(ts_ns, data)| {
            ((ts_ns / 1_000_000_000) as u32, (ts_ns % 1_000_000_000) as u32, data.clone())
        })
        .collect();
    write_pcap_records(path, 0xa1b2_3c4d, linktype, &records);
}

fn write_pcap_records(path: &Path, magic: u32, linktype: u32, records: &[(u32, u32, Vec<u8>)]) {
    let mut output = Vec::new();
    output.extend_from_slice(&magic.to_le_bytes());
    output.extend_from_slice(&2u16.to_le_bytes());
    output.extend_from_slice(&4u16.to_le_bytes());
    output.extend_from_slice(&0i32.to_le_bytes());
    output.extend_from_slice(&0u32.to_le_bytes());
    output.extend_from_slice(&65535u32.to_le_bytes());
    output.extend_from_slice(&linktype.to_le_bytes());
    for (seconds, fraction, data) in records {
        output.extend_from_slice(&seconds.to_le_bytes());
        output.extend_from_slice(&fraction.to_le_bytes());
        output.extend_from_slice(&(data.len() as u32).to_le_bytes());
        output.extend_from_slice(&(data.len() as u32).to_le_bytes());
        output.extend_from_slice(data);
    }
    fs::write(path, output).unwrap();
}

/// Write a PCAPNG file with one interface per entry of `linktypes`.
/// Packets carry `(interface, ts_us, data)`.
pub fn write_pcapng(path: &Path, linktypes: &[u16], packets: &[(u32, u64, Vec<u8>)]) {
    let interfaces: Vec<_> = linktypes.iter().map(|linktype| (*linktype, None)).collect();
    write_pcapng_with_resolution(path, &interfaces, packets);
}

/// Like `write_pcapng`, but each interface may carry an `if_tsresol`
/// option; timestamps are then in that interface's units.
pub fn write_pcapng_with_resolution(
    path: &Path,
    interfaces: &[(u16, Option<u8>)],
    packets: &[(u32, u64, Vec<u8>)],
) {
    let mut output = Vec::new();
    output.extend_from_slice(&pcapng_block(0x0A0D0D0A, &section_header_body()));
    for (linktype, tsresol) in interfaces {
        output.extend_from_slice(&pcapng_block(1, &interface_desc_body(*linktype, *tsresol)));
    }
    for (if_id, ts_us, data) in packets {
        output.extend_from_slice(&pcapng_block(6, &enhanced_packet_body(*if_id, *ts_us, data)));
    }
    fs::write(path, output).unwrap();
}

fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x1A2B3C4Du32.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body(linktype: u16, tsresol: Option<u8>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&linktype.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&65535u32.to_be_bytes());
    if let Some(tsresol) = tsresol {
        // if_tsresol, one byte padded to four, then opt_endofopt.
        body.extend_from_slice(&9u16.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&[tsresol, 0, 0, 0]);
        body.extend_from_slice(&[0, 0, 0, 0]);
    }
    body
}

fn enhanced_packet_body(if_id: u32, ts_us: u64, data: &[u8]) -> Vec<u8> {
    let cap_len = data.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&if_id.to_be_bytes());
    body.extend_from_slice(&((ts_us >> 32) as u32).to_be_bytes());
    body.extend_from_slice(&(ts_us as u32).to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    body.resize(body.len() + (4 - data.len() % 4) % 4, 0);
    body
}
