//! RTP/RTCP envelope classification. Media payloads are never decoded.

pub const RTP_VERSION: u8 = 2;
pub const RTCP_PACKET_TYPES: std::ops::RangeInclusive<u8> = 200..=211;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Rtp,
    Rtcp,
}

/// Classify a UDP payload by its first two bytes.
///
/// Returns `None` unless the version bits equal 2.
///
/// # Examples
/// ```
/// use sipcap_core::protocols::rtp::{MediaKind, classify};
///
/// assert_eq!(classify(&[0x80, 0x00]), Some(MediaKind::Rtp));
/// assert_eq!(classify(&[0x81, 200]), Some(MediaKind::Rtcp));
/// assert_eq!(classify(b"INVITE"), None);
/// ```
pub fn classify(payload: &[u8]) -> Option<MediaKind> {
    let (first, second) = match payload {
        [first, second, ..] => (*first, *second),
        _ => return None,
    };
    if first >> 6 != RTP_VERSION {
        return None;
    }
    if RTCP_PACKET_TYPES.contains(&second) {
        Some(MediaKind::Rtcp)
    } else {
        Some(MediaKind::Rtp)
    }
}
