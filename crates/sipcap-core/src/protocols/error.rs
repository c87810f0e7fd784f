use etherparse::err::{self, LenError};
use thiserror::Error;

/// Errors returned by header readers and the frame buffer.
///
/// The dispatch chain never surfaces these to callers: short or corrupt
/// frames are logged at `trace` level and dropped.
///
/// # Examples
/// ```
/// use sipcap_core::DecodeError;
///
/// let err = DecodeError::TooShort { needed: 20, actual: 4 };
/// assert!(err.to_string().contains("need 20 bytes"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("{layer} nesting exceeds {limit} levels")]
    NestingTooDeep { layer: &'static str, limit: usize },
    #[error("malformed {layer} header: {message}")]
    Malformed { layer: &'static str, message: String },
}

impl From<LenError> for DecodeError {
    fn from(err: LenError) -> Self {
        DecodeError::TooShort {
            needed: err.required_len,
            actual: err.len,
        }
    }
}

impl From<err::ipv4::HeaderSliceError> for DecodeError {
    fn from(err: err::ipv4::HeaderSliceError) -> Self {
        match err {
            err::ipv4::HeaderSliceError::Len(len) => len.into(),
            err::ipv4::HeaderSliceError::Content(content) => DecodeError::Malformed {
                layer: "IPv4",
                message: content.to_string(),
            },
        }
    }
}

impl From<err::tcp::HeaderSliceError> for DecodeError {
    fn from(err: err::tcp::HeaderSliceError) -> Self {
        match err {
            err::tcp::HeaderSliceError::Len(len) => len.into(),
            err::tcp::HeaderSliceError::Content(content) => DecodeError::Malformed {
                layer: "TCP",
                message: content.to_string(),
            },
        }
    }
}
