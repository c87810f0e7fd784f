use std::sync::Arc;

use crate::packet::Packet;
use crate::sink::MessageSink;

/// Accumulates items until a threshold is reached, then hands the whole
/// batch back to the caller. A threshold of 1 flushes on every push.
#[derive(Debug)]
pub struct BulkQueue<T> {
    items: Vec<T>,
    threshold: usize,
}

impl<T> BulkQueue<T> {
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            items: Vec::with_capacity(threshold),
            threshold,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an item; returns the full batch once the threshold is hit.
    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.items.push(item);
        if self.items.len() >= self.threshold {
            return Some(self.drain());
        }
        None
    }

    /// Take whatever is queued, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<T> {
        std::mem::replace(&mut self.items, Vec::with_capacity(self.threshold))
    }
}

/// Batch queue bound to an output sink.
pub struct BatchEmitter {
    queue: BulkQueue<Packet>,
    sink: Arc<dyn MessageSink>,
}

impl BatchEmitter {
    pub fn new(bulk_size: usize, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            queue: BulkQueue::new(bulk_size),
            sink,
        }
    }

    /// Queue a message, materializing its payload first.
    pub fn emit(&mut self, mut message: Packet) {
        message.payload = message.payload.materialize();
        if let Some(batch) = self.queue.push(message) {
            self.sink.send(batch);
        }
    }

    pub fn flush(&mut self) {
        if !self.queue.is_empty() {
            self.sink.send(self.queue.drain());
        }
    }
}
