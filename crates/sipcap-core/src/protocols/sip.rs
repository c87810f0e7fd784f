//! SIP message boundary detection.
//!
//! SIP over UDP (and TCP segments) carries no length prefix we can trust
//! before parsing headers, so boundaries are recovered from start lines: a
//! status line `SIP/2.0 <code> ...` or a request line `<METHOD> <uri> SIP/2.0`.

use std::ops::Range;

pub const SIP_VERSION: &[u8] = b"SIP/2.0";

pub const METHODS: &[&[u8]] = &[
    b"INVITE",
    b"ACK",
    b"BYE",
    b"CANCEL",
    b"REGISTER",
    b"OPTIONS",
    b"PRACK",
    b"SUBSCRIBE",
    b"NOTIFY",
    b"PUBLISH",
    b"INFO",
    b"REFER",
    b"MESSAGE",
    b"UPDATE",
];

/// Check whether `data` begins with a plausible SIP start line.
///
/// # Examples
/// ```
/// use sipcap_core::protocols::sip::is_start_line;
///
/// assert!(is_start_line(b"INVITE sip:bob@example.com SIP/2.0\r\n"));
/// assert!(is_start_line(b"SIP/2.0 200 OK\r\n"));
/// assert!(!is_start_line(b"Via: SIP/2.0/UDP 10.0.0.1\r\n"));
/// ```
pub fn is_start_line(data: &[u8]) -> bool {
    let line = first_line(data);
    if line.starts_with(SIP_VERSION) {
        return line.get(SIP_VERSION.len()) == Some(&b' ');
    }
    METHODS.iter().any(|method| {
        line.len() > method.len()
            && line.starts_with(method)
            && line[method.len()] == b' '
            && line.ends_with(SIP_VERSION)
            && line[..line.len() - SIP_VERSION.len()].ends_with(b" ")
    })
}

/// Split a payload into SIP messages, one range per start line.
///
/// Bytes preceding the first start line are ignored; a payload without any
/// start line yields no messages.
pub fn split_messages(payload: &[u8]) -> Vec<Range<usize>> {
    let mut messages = Vec::new();
    let mut mark: Option<usize> = None;

    for offset in line_starts(payload) {
        if !is_start_line(&payload[offset..]) {
            continue;
        }
        if let Some(start) = mark {
            messages.push(start..offset);
        }
        mark = Some(offset);
    }

    if let Some(start) = mark {
        messages.push(start..payload.len());
    }
    messages
}

fn line_starts(payload: &[u8]) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0).chain(
        payload
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte == b'\n')
            .map(|(idx, _)| idx + 1)
            .filter(move |offset| *offset < payload.len()),
    )
}

fn first_line(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .position(|byte| *byte == b'\n')
        .unwrap_or(data.len());
    let line = &data[..end];
    line.strip_suffix(b"\r").unwrap_or(line)
}
