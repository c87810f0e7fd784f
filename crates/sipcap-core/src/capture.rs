use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PipelineConfig};
use crate::defrag::{FragmentService, FragmentStore};
use crate::pipeline::{FragmentRoute, Pipeline};
use crate::sink::MessageSink;
use crate::source::{PacketEvent, PacketSource, PcapFileSource, SourceError};
use crate::{CaptureSummary, ts_to_rfc3339};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("worker task failed: {0}")]
    Join(#[from] JoinError),
}

pub async fn capture_pcap_file(
    path: &Path,
    config: PipelineConfig,
    sink: Arc<dyn MessageSink>,
) -> Result<CaptureSummary, CaptureError> {
    let source = PcapFileSource::open(path)?;
    run_capture(source, config, sink).await
}

/// Run every frame of `source` through `config.workers` independent
/// pipelines, then flush them and stop the reassembly service.
///
/// Frames are dealt round-robin. Reassembled datagrams are routed by the
/// reassembly service, so their messages may reach the sink after the
/// messages of frames read later.
pub async fn run_capture<S>(
    source: S,
    config: PipelineConfig,
    sink: Arc<dyn MessageSink>,
) -> Result<CaptureSummary, CaptureError>
where
    S: PacketSource + Send + 'static,
{
    config.validate()?;
    let store = Arc::new(FragmentStore::new(config.ipv4.fragment_ttl()));
    let service = FragmentService::spawn(store, &config, Arc::clone(&sink));
    info!(workers = config.workers, "capture started");

    let mut senders = Vec::with_capacity(config.workers);
    let mut workers = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let (tx, mut rx) = mpsc::channel::<PacketEvent>(config.worker_queue);
        let route = FragmentRoute::channel(config.ipv4.bulk_size, service.sender());
        let mut pipeline = Pipeline::new(&config, Arc::clone(&sink), route);
        workers.push(tokio::task::spawn_blocking(move || {
            let mut frames = 0u64;
            while let Some(event) = rx.blocking_recv() {
                pipeline.on_event(event);
                frames += 1;
            }
            pipeline.flush();
            debug!(worker, frames, "worker finished");
        }));
        senders.push(tx);
    }

    let reader = tokio::task::spawn_blocking(move || read_source(source, senders)).await;

    for worker in workers {
        worker.await?;
    }
    service.shutdown().await?;

    let summary = reader??;
    info!(
        packets = summary.packets_total,
        start = summary.time_start.as_deref().unwrap_or("-"),
        end = summary.time_end.as_deref().unwrap_or("-"),
        "capture finished"
    );
    Ok(summary)
}

fn read_source<S: PacketSource>(
    mut source: S,
    senders: Vec<mpsc::Sender<PacketEvent>>,
) -> Result<CaptureSummary, SourceError> {
    let mut packets_total = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;

    let mut next = 0;
    while let Some(event) = source.next_packet()? {
        packets_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, event.ts);
        if let Some(sender) = senders.get(next) {
            if sender.blocking_send(event).is_err() {
                warn!(worker = next, "worker stopped, dropping frame");
            }
        }
        next = (next + 1) % senders.len().max(1);
    }

    Ok(CaptureSummary {
        packets_total,
        time_start: first_ts.and_then(ts_to_rfc3339),
        time_end: last_ts.and_then(ts_to_rfc3339),
    })
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let ts = match ts {
        Some(ts) => ts,
        None => return,
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}
