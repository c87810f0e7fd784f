//! IPv4 fragment reassembly.
//!
//! `FragmentStore` holds in-progress reassemblies keyed by source,
//! destination and identification; `FragmentService` feeds it from a
//! bounded channel and evicts abandoned entries on a timer.

mod service;
mod store;

pub use service::{FragmentBatch, FragmentSender, FragmentService};
pub use store::{FragmentKey, FragmentStore, MIN_TTL};
