use std::fs::File;
use std::path::Path;

use bytes::Bytes;
use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};
use tracing::debug;

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::layout;
use super::reader::{Container, InterfaceInfo, detect_container, interface, legacy_ts_to_seconds};

#[derive(Clone, Copy)]
struct ErrorContext {
    refill: &'static str,
    next: &'static str,
}

const LEGACY_CONTEXT: ErrorContext = ErrorContext {
    refill: "pcap reader refill",
    next: "pcap reader next",
};
const NG_CONTEXT: ErrorContext = ErrorContext {
    refill: "pcapng reader refill",
    next: "pcapng reader next",
};

/// Streams frames out of a PCAP or PCAPNG file.
pub struct PcapFileSource {
    inner: PcapReader,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Linktype,
        nanosecond: bool,
    },
    Ng {
        reader: PcapNGReader<File>,
        interfaces: Vec<InterfaceInfo>,
    },
}

impl PcapFileSource {
    /// Open `path` and detect its container from the magic bytes.
    ///
    /// # Errors
    /// `SourceError::Io` when the file cannot be opened or is shorter than
    /// a magic number, `SourceError::Pcap` when the container header is
    /// malformed.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut file = File::open(path)?;
        let inner = match detect_container(&mut file)? {
            Container::Ng => PcapReader::Ng {
                reader: PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                    .map_err(|e| pcap_error("pcapng reader init", e))?,
                interfaces: Vec::new(),
            },
            Container::Legacy => PcapReader::Legacy {
                reader: LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                    .map_err(|e| pcap_error("pcap reader init", e))?,
                linktype: Linktype::ETHERNET,
                nanosecond: false,
            },
        };
        Ok(Self { inner })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        match &mut self.inner {
            PcapReader::Legacy {
                reader,
                linktype,
                nanosecond,
            } => drain_blocks(reader, LEGACY_CONTEXT, |block| match block {
                PcapBlockOwned::LegacyHeader(header) => {
                    *linktype = header.network;
                    *nanosecond = header.is_nanosecond_precision();
                    None
                }
                PcapBlockOwned::Legacy(packet) => Some(PacketEvent {
                    ts: Some(legacy_ts_to_seconds(packet.ts_sec, packet.ts_usec, *nanosecond)),
                    linktype: *linktype,
                    data: Bytes::copy_from_slice(packet.data),
                }),
                _ => None,
            }),
            PcapReader::Ng { reader, interfaces } => {
                drain_blocks(reader, NG_CONTEXT, |block| match block {
                    PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                        // Interface ids restart with every section.
                        interfaces.clear();
                        None
                    }
                    PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                        interfaces.push(InterfaceInfo::from(&intf));
                        None
                    }
                    PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                        let intf = interface(interfaces, packet.if_id);
                        Some(PacketEvent {
                            ts: Some(packet.decode_ts_f64(intf.ts_offset, intf.resolution)),
                            linktype: intf.linktype,
                            data: Bytes::copy_from_slice(packet.data),
                        })
                    }
                    PcapBlockOwned::NG(Block::SimplePacket(packet)) => {
                        let intf = interface(interfaces, 0);
                        Some(PacketEvent {
                            ts: None,
                            linktype: intf.linktype,
                            data: Bytes::copy_from_slice(packet.data),
                        })
                    }
                    _ => None,
                })
            }
        }
    }
}

/// Pull blocks until `on_block` yields a packet or the file ends.
fn drain_blocks<R, F>(
    reader: &mut R,
    context: ErrorContext,
    mut on_block: F,
) -> Result<Option<PacketEvent>, SourceError>
where
    R: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Option<PacketEvent>,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let event = on_block(block);
                reader.consume(offset);
                if event.is_some() {
                    return Ok(event);
                }
            }
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| pcap_error(context.refill, e))?;
            }
            Err(e) => {
                debug!(context = context.next, error = %e, "capture parse failed");
                return Err(pcap_error(context.next, e));
            }
        }
    }
}

fn pcap_error(context: &'static str, err: impl std::fmt::Display) -> SourceError {
    SourceError::Pcap {
        context,
        message: err.to_string(),
    }
}
