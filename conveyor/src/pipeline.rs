// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Composition
//!
//! A [`Pipeline`] is an ordered sequence of filters composed end to end:
//! the input stream feeds the first filter, each filter's output becomes
//! the next filter's input, and the last output is handed back to the
//! caller. All stages share one error sink, which the pipeline never owns
//! or closes; the caller closes it after fully draining the output.
//!
//! ## Run Accounting
//!
//! The returned output stream is wrapped in a forwarder that times the
//! read loop. When a run drains, the elapsed wall-clock is added to the
//! pipeline's filtering duration and the run counter is incremented, so
//! run bookkeeping lives inside the engine rather than with each caller.
//!
//! ## Statistics
//!
//! [`Pipeline::snapshot`] gathers the per-filter counters plus the run
//! aggregates. [`Pipeline::start_extracting`] additionally spawns a timer
//! task that appends one snapshot record per tick to a sink file created
//! once per pipeline instance; see [`crate::stats`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use conveyor::{
//!     error_channel, item_channel, BoundedParallelFilter, CancellationToken, ConcurrencyBound,
//!     Filter, FnWorker, Item, Pipeline, PipelineName,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let square = FnWorker::new("Sq", |item: Item| {
//!     let n: u64 = item.take_single()?;
//!     Ok(Item::single(n * n))
//! });
//! let filter = BoundedParallelFilter::with_worker(ConcurrencyBound::new(4)?, Arc::new(square));
//! let mut pipeline = Pipeline::new(PipelineName::new("numbers")?);
//! pipeline.add_filter(Arc::new(filter));
//! pipeline.start_extracting(Duration::from_secs(5))?;
//!
//! let ctx = CancellationToken::new();
//! let (input, input_rx) = item_channel(16);
//! let (errors, mut error_rx) = error_channel(16);
//! let mut output = pipeline.filter(ctx, input_rx, errors.clone());
//!
//! for n in 0..16u64 {
//!     input.send(Item::single(n)).await?;
//! }
//! drop(input);
//! while let Some(item) = output.recv().await {
//!     println!("{}", item.take_single::<u64>()?);
//! }
//! drop(errors); // caller closes the sink only after the output drained
//! while let Some(error) = error_rx.recv().await {
//!     eprintln!("{error}");
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use conveyor_bootstrap::shutdown::CancellationToken;
use conveyor_domain::{FilterKind, FilterStatSnapshot, PipelineError, PipelineName, PipelineStat};
use parking_lot::{Mutex, RwLock};

use crate::filter::{item_channel, ErrorSender, Filter, ItemReceiver, DEFAULT_CHANNEL_CAPACITY};
use crate::stats::{spawn_extractor, StatsExtractor};

/// Everything the statistics extractor needs to snapshot a pipeline
/// without holding the pipeline itself.
#[derive(Clone)]
pub(crate) struct StatsSource {
    name: PipelineName,
    filters: Arc<RwLock<Vec<Arc<dyn Filter>>>>,
    runs: Arc<AtomicU64>,
    duration_ns: Arc<AtomicU64>,
}

impl StatsSource {
    pub(crate) fn name(&self) -> &PipelineName {
        &self.name
    }

    pub(crate) fn snapshot(&self) -> PipelineStat {
        let filter_stats = self.filters.read().iter().map(|filter| filter.snapshot()).collect();
        PipelineStat {
            pipeline_name: self.name.to_string(),
            recorded_at: Utc::now(),
            total_duration_ns: self.duration_ns.load(Ordering::Relaxed),
            total_runs: self.runs.load(Ordering::Relaxed),
            filter_stats,
        }
    }
}

/// Ordered filter chain sharing one error sink.
///
/// A pipeline may be run many times sequentially; counters accumulate
/// across runs. Dropping the pipeline stops its statistics extractor.
pub struct Pipeline {
    source: StatsSource,
    extractor: Mutex<Option<StatsExtractor>>,
}

impl Pipeline {
    /// Creates an empty pipeline with the given name.
    pub fn new(name: PipelineName) -> Self {
        Self::with_filters(name, Vec::new())
    }

    /// Creates a pipeline over an ordered filter list.
    pub fn with_filters(name: PipelineName, filters: Vec<Arc<dyn Filter>>) -> Self {
        Self {
            source: StatsSource {
                name,
                filters: Arc::new(RwLock::new(filters)),
                runs: Arc::new(AtomicU64::new(0)),
                duration_ns: Arc::new(AtomicU64::new(0)),
            },
            extractor: Mutex::new(None),
        }
    }

    /// Appends a filter to the end of the chain.
    pub fn add_filter(&mut self, filter: Arc<dyn Filter>) {
        self.source.filters.write().push(filter);
    }

    /// The pipeline's name.
    pub fn name(&self) -> &PipelineName {
        self.source.name()
    }

    /// Number of filters in the chain.
    pub fn filter_count(&self) -> usize {
        self.source.filters.read().len()
    }

    /// Starts a run: threads `input` through every filter and returns the
    /// final output stream.
    ///
    /// With an empty filter list the returned stream is already closed and
    /// the error sink is left untouched. The sink belongs to the caller in
    /// every case; close it only after the output has been fully drained.
    pub fn filter(&self, ctx: CancellationToken, input: ItemReceiver, errors: ErrorSender) -> ItemReceiver {
        let filters: Vec<Arc<dyn Filter>> = self.source.filters.read().clone();
        if filters.is_empty() {
            let (_closed, receiver) = item_channel(1);
            return receiver;
        }

        let mut stream = input;
        for filter in &filters {
            stream = filter.filter(ctx.clone(), stream, errors.clone());
        }

        self.wrap_run(ctx, stream)
    }

    /// Forwards the final filter's output to the caller, timing the read
    /// loop and bumping the run counters when it drains.
    fn wrap_run(&self, ctx: CancellationToken, mut stream: ItemReceiver) -> ItemReceiver {
        let (output, receiver) = item_channel(DEFAULT_CHANNEL_CAPACITY);
        let name = self.source.name.clone();
        let runs = Arc::clone(&self.source.runs);
        let duration_ns = Arc::clone(&self.source.duration_ns);

        tokio::spawn(async move {
            let started = Instant::now();
            let mut forwarding = true;
            while let Some(item) = stream.recv().await {
                if !forwarding {
                    continue;
                }
                tokio::select! {
                    biased;
                    result = output.send(item) => {
                        if result.is_err() {
                            // Consumer went away; keep draining so the
                            // upstream filters can finish and close.
                            forwarding = false;
                        }
                    }
                    _ = ctx.cancelled() => {
                        forwarding = false;
                    }
                }
            }
            let elapsed = started.elapsed();
            duration_ns.fetch_add(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX), Ordering::Relaxed);
            runs.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(pipeline = %name, ?elapsed, "pipeline run drained");
        });

        receiver
    }

    /// Completed runs so far.
    pub fn filtering_runs(&self) -> u64 {
        self.source.runs.load(Ordering::Relaxed)
    }

    /// Wall-clock spent in completed runs, summed.
    pub fn filtering_duration(&self) -> Duration {
        Duration::from_nanos(self.source.duration_ns.load(Ordering::Relaxed))
    }

    /// Gathers the per-filter snapshots plus the run aggregates.
    pub fn snapshot(&self) -> PipelineStat {
        self.source.snapshot()
    }

    /// Presents the pipeline as if it were a single filter: items from the
    /// first filter, durations summed across all of them.
    pub fn aggregate_stat(&self) -> FilterStatSnapshot {
        let mut aggregate = FilterStatSnapshot {
            name: self.source.name.to_string(),
            kind: FilterKind::Pipeline,
            duration_ns: 0,
            work_ns: 0,
            waiting_ns: 0,
            items: 0,
        };
        for (index, filter) in self.source.filters.read().iter().enumerate() {
            let snapshot = filter.snapshot();
            if index == 0 {
                aggregate.items = snapshot.items;
            }
            aggregate.duration_ns += snapshot.duration_ns;
            aggregate.work_ns += snapshot.work_ns;
            aggregate.waiting_ns += snapshot.waiting_ns;
        }
        aggregate
    }

    /// Starts the periodic statistics extractor, returning the sink path.
    ///
    /// The sink file is created once per pipeline instance in the temp
    /// directory, prefixed with the pipeline name. Calling this while an
    /// extractor is already running returns the existing path.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StatsWrite`] when the sink file cannot be
    /// created.
    pub fn start_extracting(&self, interval: Duration) -> Result<PathBuf, PipelineError> {
        let mut guard = self.extractor.lock();
        if let Some(extractor) = guard.as_ref() {
            return Ok(extractor.path().to_path_buf());
        }
        let extractor = spawn_extractor(self.source.clone(), interval)?;
        let path = extractor.path().to_path_buf();
        *guard = Some(extractor);
        Ok(path)
    }

    /// Stops the extractor, returning the sink path if one was running.
    /// The sink file stays on disk for log shippers.
    pub fn stop_extracting(&self) -> Option<PathBuf> {
        self.extractor.lock().take().map(StatsExtractor::stop)
    }

    /// The sink path while the extractor is running.
    pub fn stats_path(&self) -> Option<PathBuf> {
        self.extractor.lock().as_ref().map(|extractor| extractor.path().to_path_buf())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Some(extractor) = self.extractor.lock().take() {
            extractor.stop();
        }
    }
}
