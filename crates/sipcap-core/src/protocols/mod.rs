//! Protocol decoding modules.
//!
//! Header readers (`ethernet`, `ipv4`, `tcp`, `udp`, `icmp`) slice the
//! bytes at the `FrameBuffer` cursor with `etherparse` and leave the cursor
//! right after the header.
//! Content decoders (`sip`, `smpp`, `rtp`) work on payload slices and return
//! byte ranges or classifications; they never copy.
//!
//! Readers validate only what `etherparse` checks when slicing a header
//! (lengths, IP version, minimum header sizes). Checksums are ignored.

pub mod error;
pub mod ethernet;
pub mod icmp;
pub mod ipv4;
pub mod rtp;
pub mod sip;
pub mod smpp;
pub mod tcp;
pub mod udp;

pub use error::DecodeError;
