use std::io::{Read, Seek, SeekFrom};

use pcap_parser::{InterfaceDescriptionBlock, Linktype};

use super::layout;

/// Capture container, told apart by the leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Legacy,
    Ng,
}

/// Peek at the magic bytes, then rewind so the container parser sees
/// the whole file.
///
/// # Errors
/// Fails with the underlying I/O error when fewer than four bytes can be
/// read or the reader cannot seek back.
pub fn detect_container<R: Read + Seek>(reader: &mut R) -> std::io::Result<Container> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    if magic == layout::PCAPNG_MAGIC {
        Ok(Container::Ng)
    } else {
        Ok(Container::Legacy)
    }
}

/// Link type and clock of one PCAPNG interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub linktype: Linktype,
    /// Timestamp units per second.
    pub resolution: u64,
    /// Seconds added to every timestamp of the interface.
    pub ts_offset: u64,
}

impl Default for InterfaceInfo {
    fn default() -> Self {
        Self {
            linktype: Linktype::ETHERNET,
            resolution: layout::DEFAULT_TS_RESOLUTION,
            ts_offset: 0,
        }
    }
}

impl From<&InterfaceDescriptionBlock<'_>> for InterfaceInfo {
    /// Resolutions pcap-parser cannot represent fall back to microseconds;
    /// negative offsets are clamped to zero.
    fn from(block: &InterfaceDescriptionBlock<'_>) -> Self {
        Self {
            linktype: block.linktype,
            resolution: block
                .ts_resolution()
                .unwrap_or(layout::DEFAULT_TS_RESOLUTION),
            ts_offset: u64::try_from(block.ts_offset()).unwrap_or(0),
        }
    }
}

/// Interface `if_id`, or an Ethernet microsecond clock when the capture
/// never described it.
pub fn interface(interfaces: &[InterfaceInfo], if_id: u32) -> InterfaceInfo {
    interfaces
        .get(if_id as usize)
        .copied()
        .unwrap_or_default()
}

/// Classic record header timestamp; `fraction` is in nanoseconds when the
/// file magic says so, microseconds otherwise.
pub fn legacy_ts_to_seconds(seconds: u32, fraction: u32, nanosecond: bool) -> f64 {
    let scale = if nanosecond { 1e-9 } else { 1e-6 };
    seconds as f64 + fraction as f64 * scale
}
