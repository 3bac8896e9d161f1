//! Batch reprocessing

use crate::error::{ActionError, Result};
use lhub_client::{Batch, LogicHubApi};
use std::time::Duration;
use tracing::{debug, info, warn};

const PENDING_STATES: [&str; 4] = ["executing", "queued", "retrying", "scheduled"];
const FAILED_STATES: [&str; 2] = ["canceled", "error"];
const SETTLED_STATES: [&str; 2] = ["ready", "skipped"];

/// Rerun each batch once, in ascending id order.
///
/// Duplicate ids are dropped. With a `delay`, the call sleeps between
/// reruns but not before the first. Returns the ids that were rerun.
pub async fn reprocess_batches(
    api: &dyn LogicHubApi,
    instance: &str,
    batch_ids: &[u64],
    delay: Option<Duration>,
) -> Result<Vec<u64>> {
    let mut ids = batch_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    for (n, batch_id) in ids.iter().enumerate() {
        if let Some(delay) = delay.filter(|d| n > 0 && !d.is_zero()) {
            tokio::time::sleep(delay).await;
        }
        api.reprocess_batch(*batch_id).await?;
        info!(instance = %instance, batch_id, "Batch {} rerun on {}", batch_id, instance);
    }
    Ok(ids)
}

/// Where a batch is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// Queued or running
    Pending,
    /// Finished with `error` or `canceled`
    Failed,
    /// Finished cleanly or skipped
    Settled,
}

impl BatchPhase {
    /// Phase of a server state. Unknown states are an error.
    pub fn of(batch: &Batch) -> Result<Self> {
        let state = batch.state.as_str();
        if PENDING_STATES.contains(&state) {
            Ok(Self::Pending)
        } else if FAILED_STATES.contains(&state) {
            Ok(Self::Failed)
        } else if SETTLED_STATES.contains(&state) {
            Ok(Self::Settled)
        } else {
            Err(ActionError::Batch(format!(
                "Unknown state {:?} for {}",
                batch.state, batch.id
            )))
        }
    }
}

/// Options for [`reprocess_error_batches`]
#[derive(Debug, Clone)]
pub struct ErrorBatchOptions {
    /// Rerun at most this many batches, oldest first
    pub limit: Option<usize>,
    /// Pause between status checks
    pub poll_interval: Duration,
}

impl Default for ErrorBatchOptions {
    fn default() -> Self {
        Self {
            limit: None,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Batches of one stream, oldest window first
struct StreamBatches(Vec<(Batch, BatchPhase)>);

impl StreamBatches {
    async fn fetch(api: &dyn LogicHubApi, stream_id: u64) -> Result<Self> {
        let mut batches = api
            .list_stream_batches(stream_id)
            .await?
            .into_iter()
            .map(|b| BatchPhase::of(&b).map(|phase| (b, phase)))
            .collect::<Result<Vec<_>>>()?;
        batches.sort_by_key(|(b, _)| b.to);
        Ok(Self(batches))
    }

    fn pending(&self) -> usize {
        self.0
            .iter()
            .filter(|(_, phase)| *phase == BatchPhase::Pending)
            .count()
    }

    fn failed(&self) -> Vec<Batch> {
        self.0
            .iter()
            .filter(|(_, phase)| *phase == BatchPhase::Failed)
            .map(|(b, _)| b.clone())
            .collect()
    }

    fn find(&self, id: &str) -> Option<&(Batch, BatchPhase)> {
        self.0.iter().find(|(b, _)| b.id == id)
    }
}

/// Rerun the failed batches of a stream one at a time, oldest first.
///
/// Before each rerun the stream must be idle (no queued or running
/// batches); the call polls until it is. A batch that left the failed
/// state in the meantime is skipped. After a rerun the batch is polled
/// until it finishes; if it fails again the run stops with
/// [`ActionError::Batch`] and the server's errors are logged. Returns the
/// ids that were rerun and finished cleanly.
pub async fn reprocess_error_batches(
    api: &dyn LogicHubApi,
    instance: &str,
    stream_id: u64,
    opts: &ErrorBatchOptions,
) -> Result<Vec<u64>> {
    let mut batches = StreamBatches::fetch(api, stream_id).await?;
    let mut queue = batches.failed();

    if let Some(limit) = opts.limit.filter(|l| *l > 0 && queue.len() > *l) {
        warn!(
            instance = %instance,
            stream_id,
            total = queue.len(),
            "Limit exceeded; taking only the oldest {}",
            limit
        );
        queue.truncate(limit);
    }
    if queue.is_empty() {
        info!(instance = %instance, stream_id, "No error batches found");
        return Ok(Vec::new());
    }
    info!(instance = %instance, stream_id, count = queue.len(), "Error batches found");

    let mut done = Vec::with_capacity(queue.len());
    for (n, target) in queue.iter().enumerate() {
        let batch_id = target
            .numeric_id()
            .ok_or_else(|| ActionError::Batch(format!("Batch id {:?} is not numeric", target.id)))?;

        while batches.pending() > 0 {
            debug!(stream_id, pending = batches.pending(), "Waiting for the stream to go idle");
            tokio::time::sleep(opts.poll_interval).await;
            batches = StreamBatches::fetch(api, stream_id).await?;
        }
        if !matches!(batches.find(&target.id), Some((_, BatchPhase::Failed))) {
            warn!(stream_id, batch_id, "Batch state changed; no longer in error state");
            continue;
        }

        info!(
            instance = %instance,
            stream_id,
            batch_id,
            "Reprocessing batch {} of {}",
            n + 1,
            queue.len()
        );
        api.reprocess_batch(batch_id).await?;

        loop {
            tokio::time::sleep(opts.poll_interval).await;
            batches = StreamBatches::fetch(api, stream_id).await?;
            match batches.find(&target.id) {
                None => {
                    warn!(stream_id, batch_id, "Batch no longer found");
                    break;
                }
                Some((_, BatchPhase::Pending)) => continue,
                Some((_, BatchPhase::Settled)) => break,
                Some((batch, BatchPhase::Failed)) => {
                    for message in batch.errors() {
                        tracing::error!(stream_id, batch_id, "Error returned: {}", message);
                    }
                    return Err(ActionError::Batch(format!(
                        "Batch {} finished with state \"{}\"",
                        batch_id, batch.state
                    )));
                }
            }
        }
        info!(instance = %instance, stream_id, batch_id, "Batch processing finished");
        done.push(batch_id);
    }
    Ok(done)
}
