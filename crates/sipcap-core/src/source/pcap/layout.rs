/// First four bytes of a PCAPNG section header block.
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];
/// Read buffer for the pcap-parser streaming readers.
pub const PCAP_READER_BUFFER_SIZE: usize = 64 * 1024;
/// PCAPNG interfaces without a usable `if_tsresol` count microseconds.
pub const DEFAULT_TS_RESOLUTION: u64 = 1_000_000;
