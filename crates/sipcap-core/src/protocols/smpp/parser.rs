use std::ops::Range;

use super::layout;
use super::reader::SmppReader;

/// SMPP operations recognised by the extractor (requests and their `_resp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmppCommand {
    GenericNack,
    BindReceiver,
    BindTransmitter,
    QuerySm,
    SubmitSm,
    DeliverSm,
    Unbind,
    ReplaceSm,
    CancelSm,
    BindTransceiver,
    Outbind,
    EnquireLink,
    SubmitMulti,
    AlertNotification,
    DataSm,
    BroadcastSm,
    QueryBroadcastSm,
    CancelBroadcastSm,
}

impl SmppCommand {
    /// Resolve a wire command id; response ids map to their request.
    ///
    /// # Examples
    /// ```
    /// use sipcap_core::protocols::smpp::SmppCommand;
    ///
    /// assert_eq!(SmppCommand::from_id(0x0000_0004), Some(SmppCommand::SubmitSm));
    /// assert_eq!(SmppCommand::from_id(0x8000_0004), Some(SmppCommand::SubmitSm));
    /// assert_eq!(SmppCommand::from_id(0x0000_00ff), None);
    /// ```
    pub fn from_id(id: u32) -> Option<Self> {
        if id == layout::RESPONSE_BIT {
            return Some(Self::GenericNack);
        }
        let response = id & layout::RESPONSE_BIT != 0;
        let command = match id & !layout::RESPONSE_BIT {
            0x0000_0001 => Self::BindReceiver,
            0x0000_0002 => Self::BindTransmitter,
            0x0000_0003 => Self::QuerySm,
            0x0000_0004 => Self::SubmitSm,
            0x0000_0005 => Self::DeliverSm,
            0x0000_0006 => Self::Unbind,
            0x0000_0007 => Self::ReplaceSm,
            0x0000_0008 => Self::CancelSm,
            0x0000_0009 => Self::BindTransceiver,
            0x0000_000b if !response => Self::Outbind,
            0x0000_0015 => Self::EnquireLink,
            0x0000_0021 => Self::SubmitMulti,
            0x0000_0102 if !response => Self::AlertNotification,
            0x0000_0103 => Self::DataSm,
            0x0000_0111 => Self::BroadcastSm,
            0x0000_0112 => Self::QueryBroadcastSm,
            0x0000_0113 => Self::CancelBroadcastSm,
            _ => return None,
        };
        Some(command)
    }
}

/// Check whether a payload starts with a complete PDU of a known command.
pub fn looks_like_pdu(payload: &[u8]) -> bool {
    pdu_at(&SmppReader::new(payload), 0).is_some()
}

/// Extract every complete PDU packed at the start of `payload`.
///
/// Extraction halts at the first truncated PDU or unknown command id; the
/// unconsumed tail is discarded by the caller.
pub fn extract_pdus(payload: &[u8]) -> Vec<Range<usize>> {
    let reader = SmppReader::new(payload);
    let mut pdus = Vec::new();
    let mut offset = 0;
    while let Some(length) = pdu_at(&reader, offset) {
        pdus.push(offset..offset + length);
        offset += length;
    }
    pdus
}

fn pdu_at(reader: &SmppReader<'_>, offset: usize) -> Option<usize> {
    let remaining = reader.remaining_from(offset);
    if remaining < layout::MIN_PDU_LEN {
        return None;
    }
    let length = reader.command_length(offset).ok()?;
    if length < layout::MIN_PDU_LEN || length > remaining {
        return None;
    }
    let command = reader.command_id(offset).ok()?;
    SmppCommand::from_id(command).map(|_| length)
}
