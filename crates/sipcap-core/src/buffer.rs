//! Cursor over a captured frame.
//!
//! `FrameBuffer` wraps a reference-counted `Bytes` and tracks a read
//! position plus a capacity limit. Slicing the remaining bytes shares the
//! underlying storage; nothing is copied until a payload is materialized.

use bytes::Bytes;

use crate::protocols::DecodeError;

#[derive(Debug, Clone)]
pub struct FrameBuffer {
    data: Bytes,
    position: usize,
    capacity: usize,
}

impl FrameBuffer {
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let capacity = data.len();
        Self {
            data,
            position: 0,
            capacity,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.position)
    }

    /// Move the cursor to an absolute offset within the current capacity.
    pub fn set_position(&mut self, position: usize) -> Result<(), DecodeError> {
        if position > self.capacity {
            return Err(DecodeError::TooShort {
                needed: position,
                actual: self.capacity,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Shrink the readable region to `capacity` bytes. Never grows it.
    pub fn truncate(&mut self, capacity: usize) {
        if capacity < self.capacity {
            self.capacity = capacity.max(self.position);
        }
    }

    pub fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        self.require(count)?;
        self.position += count;
        Ok(())
    }

    /// Bytes between the cursor and the capacity limit, sharing storage.
    pub fn remaining_bytes(&self) -> Bytes {
        self.data.slice(self.position..self.capacity)
    }

    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.position..self.capacity]
    }

    fn require(&self, count: usize) -> Result<(), DecodeError> {
        if self.remaining() < count {
            return Err(DecodeError::TooShort {
                needed: self.position + count,
                actual: self.capacity,
            });
        }
        Ok(())
    }
}
