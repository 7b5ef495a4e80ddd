use crate::config::IngestConfig;
use crate::listener::ProductListener;
use anyhow::{Context, Result};
use burstwatch_common::types::ProductMessage;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{self, BufRead};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Per-worker outcome counters, summed on shutdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Events that reached the detector.
    pub processed: u64,
    /// Of those, how many raised an alert.
    pub alerts: u64,
    /// Events without a product name, or refused by the detector.
    pub skipped: u64,
}

impl IngestStats {
    fn merge(&mut self, other: IngestStats) {
        self.processed += other.processed;
        self.alerts += other.alerts;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub submitted: u64,
    pub malformed: u64,
}

/// Fixed set of worker tasks fed through bounded queues.
///
/// Messages are routed by a hash of their entity key, so all events for
/// one product are handled by one worker in submission order.
pub struct IngestPool {
    senders: Vec<mpsc::Sender<ProductMessage>>,
    workers: Vec<JoinHandle<IngestStats>>,
}

impl IngestPool {
    pub fn spawn(listener: Arc<ProductListener>, config: &IngestConfig) -> Self {
        let count = config.workers.max(1);
        let mut senders = Vec::with_capacity(count);
        let mut workers = Vec::with_capacity(count);

        for index in 0..count {
            let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
            senders.push(tx);
            workers.push(tokio::spawn(run_worker(index, listener.clone(), rx)));
        }

        tracing::info!(workers = count, "Ingest workers started");
        Self { senders, workers }
    }

    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    /// Worker index a message is routed to.
    pub fn worker_for(&self, message: &ProductMessage) -> usize {
        partition(message.entity_key(), self.senders.len())
    }

    /// Queues a message, waiting if its worker's queue is full.
    pub async fn submit(&self, message: ProductMessage) -> Result<()> {
        let index = self.worker_for(&message);
        self.senders[index]
            .send(message)
            .await
            .map_err(|_| anyhow::anyhow!("ingest worker {index} has stopped"))
    }

    /// Closes the queues, waits for the workers to drain them and returns
    /// the summed counters.
    pub async fn shutdown(self) -> IngestStats {
        drop(self.senders);

        let mut total = IngestStats::default();
        for (index, handle) in self.workers.into_iter().enumerate() {
            match handle.await {
                Ok(stats) => total.merge(stats),
                Err(e) => tracing::error!(worker = index, error = %e, "Ingest worker failed"),
            }
        }
        total
    }
}

fn partition(key: Option<&str>, workers: usize) -> usize {
    let Some(key) = key else {
        return 0;
    };
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % workers as u64) as usize
}

async fn run_worker(
    index: usize,
    listener: Arc<ProductListener>,
    mut rx: mpsc::Receiver<ProductMessage>,
) -> IngestStats {
    let mut stats = IngestStats::default();

    while let Some(message) = rx.recv().await {
        match listener.handle(&message) {
            Ok(Some(decision)) => {
                stats.processed += 1;
                if decision.alert {
                    stats.alerts += 1;
                }
            }
            Ok(None) => stats.skipped += 1,
            Err(e) => {
                // the listener filters blank keys and its config is validated
                // at load, so this only fires for hand-built listeners
                stats.skipped += 1;
                tracing::warn!(
                    worker = index,
                    product_id = %message.product.id,
                    error = %e,
                    "Detector rejected product event"
                );
            }
        }
    }

    tracing::debug!(worker = index, ?stats, "Ingest worker drained");
    stats
}

/// Reads `ProductMessage` JSON lines from `reader` into the pool until EOF.
///
/// Blank lines are ignored. Lines that are not UTF-8 or fail to parse are
/// logged and counted as malformed; only an I/O error ends the replay early.
pub async fn replay<R>(mut reader: R, pool: &IngestPool) -> Result<ReplayStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = ReplayStats::default();
    let mut line = Vec::new();
    let mut line_no = 0u64;

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .with_context(|| format!("failed to read product events after line {line_no}"))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        submit_line(&line, line_no, pool, &mut stats).await?;
    }

    Ok(stats)
}

/// Same as [`replay`], for lines produced by [`spawn_line_reader`].
///
/// Ends when the reader thread hangs up, or with the first read error it
/// forwards.
pub async fn replay_lines(
    mut lines: mpsc::Receiver<io::Result<Vec<u8>>>,
    pool: &IngestPool,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();
    let mut line_no = 0u64;

    while let Some(line) = lines.recv().await {
        let line = line
            .with_context(|| format!("failed to read product events after line {line_no}"))?;
        line_no += 1;
        submit_line(&line, line_no, pool, &mut stats).await?;
    }

    Ok(stats)
}

async fn submit_line(
    line: &[u8],
    line_no: u64,
    pool: &IngestPool,
    stats: &mut ReplayStats,
) -> Result<()> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(());
    }

    match serde_json::from_slice::<ProductMessage>(line) {
        Ok(message) => {
            pool.submit(message).await?;
            stats.submitted += 1;
        }
        Err(e) => {
            stats.malformed += 1;
            tracing::warn!(line = line_no, error = %e, "Skipping malformed product event");
        }
    }
    Ok(())
}

/// Reads newline-terminated records from a blocking reader on its own OS
/// thread and forwards them, newline included, through a bounded channel.
///
/// The thread stops at EOF, after forwarding a read error, or once the
/// receiver is dropped. Blocking reads never occupy a runtime thread, so
/// the runtime can shut down while the reader is still waiting for input.
pub fn spawn_line_reader<R>(
    mut reader: R,
    capacity: usize,
) -> io::Result<mpsc::Receiver<io::Result<Vec<u8>>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));

    std::thread::Builder::new()
        .name("burstwatch-input".to_string())
        .spawn(move || loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.blocking_send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = tx.blocking_send(Err(e));
                    break;
                }
            }
        })?;

    Ok(rx)
}
