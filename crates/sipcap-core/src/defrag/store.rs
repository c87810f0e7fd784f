use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::packet::{Packet, Payload};
use crate::protocols::ipv4::Ipv4Header;

/// Fragments of one datagram share source, destination and identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentKey {
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub identification: u16,
}

impl From<&Ipv4Header> for FragmentKey {
    fn from(header: &Ipv4Header) -> Self {
        Self {
            src_addr: header.src_addr,
            dst_addr: header.dst_addr,
            identification: header.identification,
        }
    }
}

/// One datagram being collected.
#[derive(Debug)]
struct Reassembly {
    /// First received fragment, payload stripped.
    origin: Packet,
    headers: BTreeMap<usize, Ipv4Header>,
    payloads: BTreeMap<usize, Bytes>,
    last_fragment_seen: bool,
    touched: Instant,
}

impl Reassembly {
    fn new(first: &Packet, now: Instant) -> Self {
        let mut origin = Packet::new(first.timestamp);
        origin.src_addr = first.src_addr;
        origin.dst_addr = first.dst_addr;
        origin.protocol_number = first.protocol_number;
        origin.rejected = first.rejected;
        Self {
            origin,
            headers: BTreeMap::new(),
            payloads: BTreeMap::new(),
            last_fragment_seen: false,
            touched: now,
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.touched) >= ttl
    }

    fn insert(&mut self, header: Ipv4Header, payload: Payload, now: Instant) {
        let offset = header.fragment_offset;
        if !header.more_fragments {
            self.last_fragment_seen = true;
        }
        self.headers.insert(offset, header);
        self.payloads.insert(offset, payload.into_bytes());
        self.touched = now;
    }

    /// Build the datagram once every byte from offset 0 to the end of the
    /// last fragment is covered.
    fn assemble(&self) -> Option<Packet> {
        if !self.last_fragment_seen {
            return None;
        }
        let mut expected = 0;
        for (offset, header) in &self.headers {
            if *offset != expected {
                return None;
            }
            expected = offset + header.payload_length();
        }

        let mut data = vec![0u8; expected];
        for ((offset, header), payload) in self.headers.iter().zip(self.payloads.values()) {
            let len = payload.len().min(header.payload_length());
            data[*offset..offset + len].copy_from_slice(&payload[..len]);
        }

        let mut datagram = self.origin.clone();
        datagram.payload = Payload::Owned(data);
        Some(datagram)
    }
}

/// Shared, time-expiring store of in-progress reassemblies.
///
/// Every mutation of an entry (creation, update, completion, eviction)
/// happens under the lock of the shard holding its key, so fragments of
/// unrelated datagrams never wait on each other and a completion never
/// races an eviction of the same key.
#[derive(Debug)]
pub struct FragmentStore {
    entries: DashMap<FragmentKey, Reassembly>,
    ttl: Duration,
}

/// Shortest TTL a store accepts; it doubles as the sweep period.
pub const MIN_TTL: Duration = Duration::from_millis(1);

impl FragmentStore {
    /// A zero `ttl` is raised to `MIN_TTL`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: ttl.max(MIN_TTL),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add one fragment; returns the reassembled datagram when it completes.
    ///
    /// The returned packet carries the first received fragment's timestamp,
    /// addresses and protocol number, and the concatenated transport bytes
    /// as an owned payload.
    pub fn ingest(&self, header: Ipv4Header, packet: Packet) -> Option<Packet> {
        self.ingest_at(header, packet, Instant::now())
    }

    pub fn ingest_at(&self, header: Ipv4Header, packet: Packet, now: Instant) -> Option<Packet> {
        let key = FragmentKey::from(&header);
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now, self.ttl) {
                    debug!(?key, "replacing expired reassembly");
                    occupied.insert(Reassembly::new(&packet, now));
                }
                occupied.get_mut().insert(header, packet.payload, now);
                let datagram = occupied.get().assemble()?;
                occupied.remove();
                Some(datagram)
            }
            Entry::Vacant(vacant) => {
                let mut reassembly = Reassembly::new(&packet, now);
                reassembly.insert(header, packet.payload, now);
                match reassembly.assemble() {
                    Some(datagram) => Some(datagram),
                    None => {
                        vacant.insert(reassembly);
                        None
                    }
                }
            }
        }
    }

    /// Evict every entry untouched for longer than the TTL.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut evicted = 0;
        self.entries.retain(|key, reassembly| {
            if reassembly.is_expired(now, self.ttl) {
                debug!(?key, fragments = reassembly.headers.len(), "dropping expired reassembly");
                evicted += 1;
                false
            } else {
                true
            }
        });
        evicted
    }
}
