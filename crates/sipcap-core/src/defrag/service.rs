use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, mpsc::error::TrySendError, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, warn};

use crate::config::PipelineConfig;
use crate::packet::Packet;
use crate::pipeline::{FragmentRoute, Ipv4Stage};
use crate::protocols::ipv4::Ipv4Header;
use crate::sink::MessageSink;

use super::store::FragmentStore;

pub type FragmentBatch = Vec<(Ipv4Header, Packet)>;

/// Producer side of the fragment channel. Sending never blocks.
#[derive(Debug, Clone)]
pub struct FragmentSender {
    tx: mpsc::Sender<FragmentBatch>,
}

impl FragmentSender {
    pub fn send(&self, batch: FragmentBatch) {
        match self.tx.try_send(batch) {
            Ok(()) => {}
            Err(TrySendError::Full(batch)) => {
                warn!(fragments = batch.len(), "fragment queue full, dropping batch");
            }
            Err(TrySendError::Closed(batch)) => {
                warn!(fragments = batch.len(), "reassembly service stopped, dropping batch");
            }
        }
    }
}

/// Reassembly consumer plus the periodic expiry sweep.
///
/// Completed datagrams are routed through the consumer's own IPv4 stage,
/// so their messages reach the same sink as the workers' messages.
pub struct FragmentService {
    sender: FragmentSender,
    store: Arc<FragmentStore>,
    consumer: JoinHandle<()>,
    sweeper: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl FragmentService {
    /// Start the consumer and sweeper tasks on the current Tokio runtime.
    pub fn spawn(
        store: Arc<FragmentStore>,
        config: &PipelineConfig,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.ipv4.fragment_queue);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let stage = Ipv4Stage::new(config, sink, FragmentRoute::Inline(Arc::clone(&store)));
        // The stage writes to the sink, which may block on I/O.
        let consumer = tokio::task::spawn_blocking(move || consume(rx, stage));
        let sweeper = tokio::spawn(sweep(Arc::clone(&store), store.ttl(), shutdown_rx));

        Self {
            sender: FragmentSender { tx },
            store,
            consumer,
            sweeper,
            shutdown,
        }
    }

    pub fn sender(&self) -> FragmentSender {
        self.sender.clone()
    }

    pub fn store(&self) -> &Arc<FragmentStore> {
        &self.store
    }

    /// Stop the sweeper, drain the channel and flush the consumer's batches.
    ///
    /// Completes once every `FragmentSender` clone has been dropped.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        let Self {
            sender,
            consumer,
            sweeper,
            shutdown,
            ..
        } = self;
        drop(sender);
        let _ = shutdown.send(true);
        sweeper.await?;
        consumer.await
    }
}

fn consume(mut rx: mpsc::Receiver<FragmentBatch>, mut stage: Ipv4Stage) {
    while let Some(batch) = rx.blocking_recv() {
        for (header, packet) in batch {
            let identification = header.identification;
            if let Err(err) = stage.reassemble(header, packet) {
                error!(identification, error = %err, "failed to route reassembled datagram");
            }
        }
    }
    stage.flush();
    debug!("fragment consumer stopped");
}

async fn sweep(store: Arc<FragmentStore>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {
                let evicted = store.sweep();
                if evicted > 0 {
                    debug!(evicted, remaining = store.len(), "swept expired reassemblies");
                }
            }
        }
    }
}
