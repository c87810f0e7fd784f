use crate::protocols::DecodeError;

use super::layout;

pub struct SmppReader<'a> {
    payload: &'a [u8],
}

impl<'a> SmppReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn remaining_from(&self, offset: usize) -> usize {
        self.payload.len().saturating_sub(offset)
    }

    pub fn read_u32_be(&self, offset: usize) -> Result<u32, DecodeError> {
        let end = offset + 4;
        let bytes = self
            .payload
            .get(offset..end)
            .ok_or(DecodeError::TooShort {
                needed: end,
                actual: self.payload.len(),
            })?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn command_length(&self, offset: usize) -> Result<usize, DecodeError> {
        self.read_u32_be(offset + layout::COMMAND_LENGTH_OFFSET)
            .map(|length| length as usize)
    }

    pub fn command_id(&self, offset: usize) -> Result<u32, DecodeError> {
        self.read_u32_be(offset + layout::COMMAND_ID_OFFSET)
    }
}
