use std::sync::Arc;

use crate::packet::{Packet, ProtocolCode};
use crate::protocols::sip;
use crate::sink::MessageSink;

use super::bulk::BatchEmitter;

/// Cuts a transport payload into SIP messages at start-line boundaries.
pub struct SipFramer {
    emitter: BatchEmitter,
}

impl SipFramer {
    pub fn new(bulk_size: usize, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            emitter: BatchEmitter::new(bulk_size, sink),
        }
    }

    /// Emit one message per start line found in `payload`.
    pub fn handle(&mut self, packet: &Packet, payload: &[u8]) {
        for range in sip::split_messages(payload) {
            self.emitter
                .emit(packet.message(ProtocolCode::Sip, &payload[range]));
        }
    }

    pub fn flush(&mut self) {
        self.emitter.flush();
    }
}
