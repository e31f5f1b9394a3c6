// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Serial Filter
//!
//! Processes one item at a time in arrival order: the single consumer loop
//! runs each worker chain to completion before reading the next item, so
//! the output stream preserves the input order exactly. Backpressure is
//! natural; the producer blocks on the input channel while the filter is
//! busy.

use std::sync::Arc;
use std::time::Instant;

use conveyor_bootstrap::shutdown::CancellationToken;
use conveyor_domain::{FilterKind, FilterStat, FilterStatSnapshot};

use crate::filter::{item_channel, process_item, ErrorSender, Filter, ItemReceiver, DEFAULT_CHANNEL_CAPACITY};
use crate::worker::{chain_name, Worker};

/// Order-preserving, one-at-a-time filter stage.
pub struct SerialFilter {
    workers: Arc<[Arc<dyn Worker>]>,
    stat: Arc<FilterStat>,
}

impl SerialFilter {
    /// Creates a serial filter over the given worker chain.
    ///
    /// An empty chain passes items through unchanged.
    pub fn new(workers: Vec<Arc<dyn Worker>>) -> Self {
        let stat = Arc::new(FilterStat::new(chain_name(&workers), FilterKind::Serial));
        Self {
            workers: workers.into(),
            stat,
        }
    }

    /// Convenience constructor for a single-worker chain.
    pub fn with_worker(worker: Arc<dyn Worker>) -> Self {
        Self::new(vec![worker])
    }
}

impl Filter for SerialFilter {
    fn filter(&self, ctx: CancellationToken, mut input: ItemReceiver, errors: ErrorSender) -> ItemReceiver {
        let (output, receiver) = item_channel(DEFAULT_CHANNEL_CAPACITY);
        let workers = Arc::clone(&self.workers);
        let stat = Arc::clone(&self.stat);

        tokio::spawn(async move {
            let run_started = Instant::now();
            while let Some(item) = input.recv().await {
                process_item(&ctx, &workers, &stat, item, &output, &errors).await;
            }
            stat.add_duration(run_started.elapsed());
            // Dropping `output` closes the stream: input drained, no
            // in-flight work remains.
        });

        receiver
    }

    fn name(&self) -> &str {
        self.stat.name()
    }

    fn kind(&self) -> FilterKind {
        FilterKind::Serial
    }

    fn snapshot(&self) -> FilterStatSnapshot {
        self.stat.snapshot()
    }
}
