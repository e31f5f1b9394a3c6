// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Numbers Demo
//!
//! Feeds a range of numbers through a two-stage squaring pipeline and
//! prints the survivors. Exists to show the engine wired end to end: item
//! production, filter variants, the shared error sink, ctrl-c driven
//! cancellation, and the periodic statistics extractor.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use conveyor::{
    error_channel, item_channel, BoundedParallelFilter, ConcurrencyBound, Filter, FnWorker, Item, ParallelFilter,
    Pipeline, PipelineName, SerialFilter, Worker, DEFAULT_CHANNEL_CAPACITY,
};
use conveyor_bootstrap::logger::init_logging;
use conveyor_bootstrap::shutdown::ShutdownCoordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FilterVariant {
    /// One item at a time, order preserved
    Serial,
    /// A task per item, unbounded
    Parallel,
    /// At most `--bound` chains in flight
    Bounded,
}

#[derive(Debug, Parser)]
#[command(name = "conveyor", version, about = "Run the numbers demo pipeline")]
struct Args {
    /// Pipeline name; also prefixes the statistics sink file
    #[arg(long, default_value = "numbers")]
    name: String,

    /// How many numbers to feed through the pipeline
    #[arg(long, default_value_t = 100)]
    items: u64,

    /// Scheduling discipline of both squaring stages
    #[arg(long, value_enum, default_value_t = FilterVariant::Bounded)]
    variant: FilterVariant,

    /// In-flight cap per stage for the bounded variant
    #[arg(long, default_value_t = 8)]
    bound: usize,

    /// Seconds between statistics records
    #[arg(long, default_value_t = 5)]
    stats_interval_secs: u64,
}

fn square_worker() -> Arc<dyn Worker> {
    Arc::new(FnWorker::new("Sq", |item: Item| {
        let n: u64 = item.take_single()?;
        Ok(Item::single(n.saturating_mul(n)))
    }))
}

fn build_filter(args: &Args) -> anyhow::Result<Arc<dyn Filter>> {
    Ok(match args.variant {
        FilterVariant::Serial => Arc::new(SerialFilter::with_worker(square_worker())),
        FilterVariant::Parallel => Arc::new(ParallelFilter::with_worker(square_worker())),
        FilterVariant::Bounded => Arc::new(BoundedParallelFilter::with_worker(
            ConcurrencyBound::new(args.bound)?,
            square_worker(),
        )),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging("info");
    let args = Args::parse();

    let coordinator = ShutdownCoordinator::default();
    {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                coordinator.initiate_shutdown();
            }
        });
    }
    let ctx = coordinator.token();

    let mut pipeline = Pipeline::new(PipelineName::new(&args.name)?);
    pipeline.add_filter(build_filter(&args)?);
    pipeline.add_filter(build_filter(&args)?);

    let stats_path = pipeline.start_extracting(Duration::from_secs(args.stats_interval_secs.max(1)))?;
    info!(path = %stats_path.display(), "statistics sink ready");

    let (input, input_rx) = item_channel(DEFAULT_CHANNEL_CAPACITY);
    let (errors, mut error_rx) = error_channel(DEFAULT_CHANNEL_CAPACITY);
    let mut output = pipeline.filter(ctx, input_rx, errors.clone());

    let total = args.items;
    let producer = tokio::spawn(async move {
        for n in 0..total {
            if input.send(Item::single(n)).await.is_err() {
                break;
            }
        }
        // Dropping the sender closes the input stream.
    });
    let error_reader = tokio::spawn(async move {
        let mut failed = 0u64;
        while let Some(error) = error_rx.recv().await {
            warn!(%error, "item failed");
            failed += 1;
        }
        failed
    });

    let mut delivered = 0u64;
    while let Some(item) = output.recv().await {
        match item.take_single::<u64>() {
            Ok(n) => {
                print!("|{n}|");
                delivered += 1;
            }
            Err(error) => warn!(%error, "unexpected payload shape at pipeline exit"),
        }
    }
    println!();

    producer.await.context("producer task failed")?;
    // Output fully drained; the sink may close now.
    drop(errors);
    let failed = error_reader.await.context("error reader task failed")?;

    let aggregate = pipeline.aggregate_stat();
    info!(
        delivered,
        failed,
        runs = pipeline.filtering_runs(),
        work_ms = aggregate.work().as_millis() as u64,
        waiting_ms = aggregate.waiting().as_millis() as u64,
        "pipeline finished"
    );
    pipeline.stop_extracting();

    if coordinator.is_shutting_down() {
        coordinator.complete_shutdown();
    }
    Ok(())
}
