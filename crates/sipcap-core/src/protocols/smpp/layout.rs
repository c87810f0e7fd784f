pub const HEADER_LEN: usize = 16;
pub const MIN_PDU_LEN: usize = HEADER_LEN;

pub const COMMAND_LENGTH_OFFSET: usize = 0;
pub const COMMAND_ID_OFFSET: usize = 4;

pub const RESPONSE_BIT: u32 = 0x8000_0000;
