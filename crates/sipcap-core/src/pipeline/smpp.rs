use std::sync::Arc;

use crate::packet::{Packet, ProtocolCode};
use crate::protocols::smpp;
use crate::sink::MessageSink;

use super::bulk::BatchEmitter;

/// Extracts length-prefixed SMPP PDUs from a TCP payload.
pub struct SmppFramer {
    emitter: BatchEmitter,
}

impl SmppFramer {
    pub fn new(bulk_size: usize, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            emitter: BatchEmitter::new(bulk_size, sink),
        }
    }

    pub fn handle(&mut self, packet: &Packet, payload: &[u8]) {
        for range in smpp::extract_pdus(payload) {
            self.emitter
                .emit(packet.message(ProtocolCode::Smpp, &payload[range]));
        }
    }

    pub fn flush(&mut self) {
        self.emitter.flush();
    }
}
