//! Pipeline configuration.
//!
//! Loaded from a JSON document with kebab-case keys. Every key is optional;
//! omitted values fall back to the defaults below. Batching is opt-in
//! (`bulk-size` defaults to 1), SIP is enabled and RTP/RTCP are disabled.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BULK_SIZE: usize = 1;
pub const DEFAULT_FRAGMENT_TTL_MS: u64 = 60_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PipelineConfig {
    /// Number of independent dispatch-chain workers.
    pub workers: usize,
    /// Frames buffered per worker before the reader waits.
    pub worker_queue: usize,
    pub sip: SipConfig,
    pub rtp: MediaConfig,
    pub rtcp: MediaConfig,
    pub smpp: BulkConfig,
    pub icmp: BulkConfig,
    pub ipv4: Ipv4Config,
}

/// SIP routing switch (enabled unless configured otherwise) and batch size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SipConfig {
    pub enabled: bool,
    pub bulk_size: usize,
}

/// RTP/RTCP routing switch (disabled unless configured otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MediaConfig {
    pub enabled: bool,
    pub bulk_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BulkConfig {
    pub bulk_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Ipv4Config {
    /// Fragments batched before a handoff to the reassembly service.
    pub bulk_size: usize,
    /// Reassembly time-to-live in milliseconds, measured from last access.
    pub fragment_ttl: u64,
    /// Capacity (in batches) of the fragment channel.
    pub fragment_queue: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            worker_queue: DEFAULT_QUEUE_CAPACITY,
            sip: SipConfig::default(),
            rtp: MediaConfig::default(),
            rtcp: MediaConfig::default(),
            smpp: BulkConfig::default(),
            icmp: BulkConfig::default(),
            ipv4: Ipv4Config::default(),
        }
    }
}

impl Default for SipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bulk_size: DEFAULT_BULK_SIZE,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bulk_size: DEFAULT_BULK_SIZE,
        }
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            bulk_size: DEFAULT_BULK_SIZE,
        }
    }
}

impl Default for Ipv4Config {
    fn default() -> Self {
        Self {
            bulk_size: DEFAULT_BULK_SIZE,
            fragment_ttl: DEFAULT_FRAGMENT_TTL_MS,
            fragment_queue: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Ipv4Config {
    pub fn fragment_ttl(&self) -> Duration {
        Duration::from_millis(self.fragment_ttl)
    }
}

impl PipelineConfig {
    /// Read and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `ConfigError` when the file cannot be read, is not valid JSON
    /// for this schema, or holds an out-of-range value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// # Examples
    /// ```
    /// use sipcap_core::PipelineConfig;
    ///
    /// let config = PipelineConfig::from_json(r#"{ "rtp": { "enabled": true } }"#).unwrap();
    /// assert!(config.rtp.enabled);
    /// assert!(config.sip.enabled);
    /// assert_eq!(config.ipv4.fragment_ttl, 60_000);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("workers", self.workers as u64)?;
        require_positive("worker-queue", self.worker_queue as u64)?;
        require_positive("sip.bulk-size", self.sip.bulk_size as u64)?;
        require_positive("rtp.bulk-size", self.rtp.bulk_size as u64)?;
        require_positive("rtcp.bulk-size", self.rtcp.bulk_size as u64)?;
        require_positive("smpp.bulk-size", self.smpp.bulk_size as u64)?;
        require_positive("icmp.bulk-size", self.icmp.bulk_size as u64)?;
        require_positive("ipv4.bulk-size", self.ipv4.bulk_size as u64)?;
        require_positive("ipv4.fragment-ttl", self.ipv4.fragment_ttl)?;
        require_positive("ipv4.fragment-queue", self.ipv4.fragment_queue as u64)?;
        Ok(())
    }
}

fn require_positive(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
