use std::sync::Arc;

use crate::packet::{Packet, ProtocolCode};
use crate::sink::MessageSink;

use super::bulk::BatchEmitter;

/// Forwards one RTP or RTCP envelope per datagram. Media is not decoded.
pub struct MediaFramer {
    code: ProtocolCode,
    emitter: BatchEmitter,
}

impl MediaFramer {
    pub fn new(code: ProtocolCode, bulk_size: usize, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            code,
            emitter: BatchEmitter::new(bulk_size, sink),
        }
    }

    pub fn handle(&mut self, mut packet: Packet) {
        packet.protocol_code = Some(self.code);
        self.emitter.emit(packet);
    }

    pub fn flush(&mut self) {
        self.emitter.flush();
    }
}
