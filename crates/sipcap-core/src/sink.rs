//! Output sinks for finished message batches.
//!
//! A sink receives whole batches and never acknowledges them. Delivery
//! failures are logged and the batch is dropped; nothing is retried.

use std::io::Write;

use parking_lot::Mutex;
use tracing::warn;

use crate::MessageRecord;
use crate::packet::Packet;

pub trait MessageSink: Send + Sync {
    fn send(&self, batch: Vec<Packet>);
}

/// Writes one JSON object per message, one message per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().flush()
    }
}

impl<W: Write + Send> MessageSink for JsonLinesSink<W> {
    fn send(&self, batch: Vec<Packet>) {
        let mut lines = Vec::new();
        for packet in &batch {
            let record = MessageRecord::from_packet(packet);
            match serde_json::to_writer(&mut lines, &record) {
                Ok(()) => lines.push(b'\n'),
                Err(err) => warn!(error = %err, "failed to encode message record"),
            }
        }
        let mut writer = self.writer.lock();
        if let Err(err) = writer.write_all(&lines) {
            warn!(error = %err, messages = batch.len(), "dropping batch after write failure");
        }
    }
}

/// Keeps every batch in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<Vec<Packet>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<Packet>> {
        self.batches.lock().clone()
    }

    pub fn messages(&self) -> Vec<Packet> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    pub fn take(&self) -> Vec<Vec<Packet>> {
        std::mem::take(&mut *self.batches.lock())
    }
}

impl MessageSink for MemorySink {
    fn send(&self, batch: Vec<Packet>) {
        self.batches.lock().push(batch);
    }
}
