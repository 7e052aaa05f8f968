use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{info, warn};

use oeis_common::{EdgeTriple, SeqId};
use oeis_graph::{GraphWriter, QueryBackend};

use crate::queue::WorkQueue;
use crate::source::RecordSource;
use crate::stats::RunStats;

/// What the scrape phase produced: the run-wide processed count and the
/// now-static results buffer.
pub struct ScrapeOutcome {
    pub processed: usize,
    pub triples: Vec<EdgeTriple>,
}

/// Shared mutable state for one scrape phase. The dedup set and counters use
/// the same locking discipline as the results buffer they annotate.
struct ScrapeState {
    dedup: Mutex<HashSet<SeqId>>,
    buffer: Mutex<Vec<EdgeTriple>>,
    processed: AtomicUsize,
    started: Instant,
}

/// Two-phase fetch/parse/batch-write pipeline: scrape fully with a worker
/// pool, then drain the buffer into the graph. The record source is injected,
/// so the network and local-file variants share everything else.
pub struct Pipeline {
    source: Arc<dyn RecordSource>,
    num_workers: usize,
    progress_interval: usize,
}

impl Pipeline {
    pub fn new(source: Arc<dyn RecordSource>, num_workers: usize, progress_interval: usize) -> Self {
        Self {
            source,
            num_workers: num_workers.max(1),
            progress_interval,
        }
    }

    /// Seed the queue, run the worker pool until every item is acknowledged,
    /// then cancel the workers and hand back the buffer.
    pub async fn scrape(&self, ids: Vec<SeqId>) -> ScrapeOutcome {
        let total = ids.len();
        let queue = Arc::new(WorkQueue::new());
        for id in ids {
            queue.push(id);
        }

        info!(
            total,
            workers = self.num_workers,
            source = self.source.name(),
            "Scrape phase starting"
        );

        let state = Arc::new(ScrapeState {
            dedup: Mutex::new(HashSet::new()),
            buffer: Mutex::new(Vec::new()),
            processed: AtomicUsize::new(0),
            started: Instant::now(),
        });

        let mut workers = JoinSet::new();
        for _ in 0..self.num_workers {
            workers.spawn(worker_loop(
                Arc::clone(&queue),
                Arc::clone(&self.source),
                Arc::clone(&state),
                self.progress_interval,
            ));
        }

        queue.join().await;

        // All items acknowledged; anything still in flight is abandoned.
        workers.abort_all();
        while workers.join_next().await.is_some() {}

        let processed = state.processed.load(Ordering::Acquire);
        let triples = std::mem::take(&mut *state.buffer.lock().unwrap());
        info!(processed, triples = triples.len(), "Scrape phase complete");

        ScrapeOutcome { processed, triples }
    }

    /// Full run: scrape, then flush the buffer through the graph writer.
    pub async fn run<B: QueryBackend>(&self, ids: Vec<SeqId>, writer: &GraphWriter<B>) -> RunStats {
        let started = Instant::now();

        let outcome = self.scrape(ids).await;
        let report = writer.flush(&outcome.triples).await;

        RunStats {
            processed: outcome.processed,
            triples_extracted: outcome.triples.len(),
            triples_written: report.written,
            batches: report.batches,
            failed_batches: report.failed_batches,
            write_duration: report.duration,
            total_duration: started.elapsed(),
        }
    }
}

/// One worker: dequeue, dedup-check, fetch, parse, append, acknowledge,
/// forever. Cancelled by the orchestrator once the queue joins.
async fn worker_loop(
    queue: Arc<WorkQueue<SeqId>>,
    source: Arc<dyn RecordSource>,
    state: Arc<ScrapeState>,
    progress_interval: usize,
) {
    loop {
        let id = queue.pop().await;

        // The id enters the dedup set before its fetch begins; a duplicate
        // seed is acknowledged without a second fetch.
        let fresh = state.dedup.lock().unwrap().insert(id.clone());
        if fresh {
            let triples = match source.fetch(&id).await {
                Ok(Some(content)) => source.parse(&id, &content),
                Ok(None) => Vec::new(),
                Err(e) => {
                    warn!(id = %id, error = %e, "Fetch failed, treating as no data");
                    Vec::new()
                }
            };

            if !triples.is_empty() {
                state.buffer.lock().unwrap().extend(triples);
            }

            let processed = state.processed.fetch_add(1, Ordering::AcqRel) + 1;
            if progress_interval > 0 && processed % progress_interval == 0 {
                info!(
                    processed,
                    elapsed_secs = state.started.elapsed().as_secs_f64(),
                    "Scrape progress"
                );
            }
        }

        queue.task_done();
    }
}
