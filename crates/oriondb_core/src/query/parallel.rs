//! Parallel equality scan over a bounded set of worker threads.
//!
//! A collector thread hands shards to workers in listing order, keeping at
//! most `max_threads` of them alive. Each worker reads its shard straight from
//! the store (the cache is never touched off the caller's thread), filters it
//! and reports back over a channel. The collector dispatches the next shard
//! whenever one reports and finishes once every dispatched shard has.
//!
//! The first failing shard stops dispatch. Workers already running are
//! drained and the whole scan fails with [`CoreError::WorkerFailure`].

use crate::error::{CoreError, CoreResult};
use crate::query::matches;
use crate::shard::{ShardName, ShardStore};
use crossbeam_channel::Sender;
use oriondb_codec::Record;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type WorkerReport = (ShardName, Result<Vec<Record>, String>);

/// Handle to a running parallel scan.
///
/// Results are merged in completion order, not shard order.
#[derive(Debug)]
pub struct ParallelSearch {
    handle: JoinHandle<CoreResult<Vec<Record>>>,
    shards: usize,
}

impl ParallelSearch {
    /// Starts scanning `shards` for records matching `query`.
    ///
    /// # Errors
    ///
    /// Fails only if the collector thread cannot be spawned; scan failures
    /// surface from [`ParallelSearch::wait`].
    pub fn spawn(
        store: ShardStore,
        shards: Vec<ShardName>,
        query: Record,
        max_threads: usize,
    ) -> CoreResult<Self> {
        let count = shards.len();
        let query = Arc::new(query);
        let max_threads = max_threads.max(1);
        let handle = thread::Builder::new()
            .name("oriondb-scan-collector".into())
            .spawn(move || collect(&store, shards, &query, max_threads))?;
        tracing::debug!(shards = count, max_threads, "parallel scan started");
        Ok(Self {
            handle,
            shards: count,
        })
    }

    /// Number of shards being scanned.
    pub fn shard_count(&self) -> usize {
        self.shards
    }

    /// Returns true once every worker has reported.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the scan settles and returns the matching records.
    pub fn wait(self) -> CoreResult<Vec<Record>> {
        self.handle.join().unwrap_or_else(|payload| {
            Err(CoreError::worker_failure(
                "<collector>",
                panic_message(&*payload),
            ))
        })
    }
}

fn collect(
    store: &ShardStore,
    shards: Vec<ShardName>,
    query: &Arc<Record>,
    max_threads: usize,
) -> CoreResult<Vec<Record>> {
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerReport>();
    let mut pending = shards.into_iter();
    let mut active = 0usize;
    let mut results = Vec::new();
    let mut failure: Option<CoreError> = None;

    loop {
        while failure.is_none() && active < max_threads {
            let Some(shard) = pending.next() else {
                break;
            };
            match spawn_worker(store, shard.clone(), Arc::clone(query), tx.clone()) {
                Ok(()) => active += 1,
                Err(err) => {
                    failure = Some(CoreError::worker_failure(shard.as_str(), err.to_string()));
                }
            }
        }
        if active == 0 {
            break;
        }

        // The collector holds a sender, so the channel stays open.
        let Ok((shard, outcome)) = rx.recv() else {
            break;
        };
        active -= 1;

        match outcome {
            Ok(mut found) if failure.is_none() => results.append(&mut found),
            Ok(_) => {}
            Err(reason) => {
                tracing::debug!(shard = %shard, reason = %reason, "scan worker failed");
                if failure.is_none() {
                    failure = Some(CoreError::worker_failure(shard.as_str(), reason));
                }
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

fn spawn_worker(
    store: &ShardStore,
    shard: ShardName,
    query: Arc<Record>,
    tx: Sender<WorkerReport>,
) -> io::Result<()> {
    let store = store.clone();
    thread::Builder::new()
        .name(format!("oriondb-scan-{shard}"))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| scan_shard(&store, &shard, &query)))
                .unwrap_or_else(|payload| Err(panic_message(&*payload)));
            // A closed channel means the collector is gone; nobody is left to tell.
            let _ = tx.send((shard, outcome));
        })?;
    Ok(())
}

fn scan_shard(store: &ShardStore, shard: &ShardName, query: &Record) -> Result<Vec<Record>, String> {
    let records = store.read(shard).map_err(|e| e.to_string())?;
    Ok(records.into_iter().filter(|r| matches(r, query)).collect())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_owned()
    }
}
