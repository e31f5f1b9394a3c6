// /////////////////////////////////////////////////////////////////////////////
// Conveyor RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filter Statistics Entities
//!
//! This module contains the per-filter runtime counters and the aggregate
//! pipeline snapshot records.
//!
//! ## Accumulator vs. Snapshot
//!
//! [`FilterStat`] is the live accumulator a filter shares with its worker
//! tasks. Every counter, including the duration sums, is an atomic integer
//! (nanoseconds for durations) mutated with atomic additions, so concurrent
//! workers in the parallel filter variants never tear a read or lose an
//! update.
//!
//! [`FilterStatSnapshot`] and [`PipelineStat`] are the point-in-time,
//! serializable views. Fields are individually consistent; cross-field
//! consistency is not guaranteed while a run is in flight.
//!
//! ## Counter Semantics
//!
//! - `items`: items received by the filter, counted on receipt
//! - `work_ns`: time spent inside the worker chain, summed across items
//! - `waiting_ns`: time spent pushing results downstream or onto the error
//!   sink, summed across items; under backpressure this is where the time
//!   goes
//! - `duration_ns`: wall-clock time of the filter run loop
//!
//! All counters are monotonic non-decreasing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::filter_kind::FilterKind;

/// Converts a duration to whole nanoseconds, saturating at `u64::MAX`.
fn duration_to_ns(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Per-filter runtime counters, shared across the filter's worker tasks.
///
/// The accumulator is identified by the filter's name (derived from its
/// worker chain) and its [`FilterKind`] tag. Counters only ever grow.
#[derive(Debug)]
pub struct FilterStat {
    name: String,
    kind: FilterKind,
    items_processed: AtomicU64,
    total_duration_ns: AtomicU64,
    total_work_ns: AtomicU64,
    total_waiting_ns: AtomicU64,
}

impl FilterStat {
    /// Creates a zeroed accumulator for the named filter.
    pub fn new(name: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            items_processed: AtomicU64::new(0),
            total_duration_ns: AtomicU64::new(0),
            total_work_ns: AtomicU64::new(0),
            total_waiting_ns: AtomicU64::new(0),
        }
    }

    /// The filter name this accumulator belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scheduling discipline tag.
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Counts one received item.
    pub fn record_item(&self) {
        self.items_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds time spent inside the worker chain.
    pub fn add_work(&self, elapsed: Duration) {
        self.total_work_ns.fetch_add(duration_to_ns(elapsed), Ordering::Relaxed);
    }

    /// Adds time spent waiting on the downstream channel or error sink.
    pub fn add_waiting(&self, elapsed: Duration) {
        self.total_waiting_ns
            .fetch_add(duration_to_ns(elapsed), Ordering::Relaxed);
    }

    /// Adds wall-clock time of a filter run loop.
    pub fn add_duration(&self, elapsed: Duration) {
        self.total_duration_ns
            .fetch_add(duration_to_ns(elapsed), Ordering::Relaxed);
    }

    /// Items received so far.
    pub fn items_processed(&self) -> u64 {
        self.items_processed.load(Ordering::Relaxed)
    }

    /// Takes a point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> FilterStatSnapshot {
        FilterStatSnapshot {
            name: self.name.clone(),
            kind: self.kind,
            duration_ns: self.total_duration_ns.load(Ordering::Relaxed),
            work_ns: self.total_work_ns.load(Ordering::Relaxed),
            waiting_ns: self.total_waiting_ns.load(Ordering::Relaxed),
            items: self.items_processed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of one filter's counters.
///
/// This is the record shape serialized into the statistics sink; the `type`
/// field carries the scheduling discipline tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStatSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FilterKind,
    pub duration_ns: u64,
    pub work_ns: u64,
    pub waiting_ns: u64,
    pub items: u64,
}

impl FilterStatSnapshot {
    /// Wall-clock duration of the filter run loops.
    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.duration_ns)
    }

    /// Time spent inside worker chains, summed across items.
    pub fn work(&self) -> Duration {
        Duration::from_nanos(self.work_ns)
    }

    /// Time spent waiting on downstream, summed across items.
    pub fn waiting(&self) -> Duration {
        Duration::from_nanos(self.waiting_ns)
    }
}

/// Aggregate snapshot of a pipeline: one record per extraction tick.
///
/// The record is line-oriented JSON, self-describing enough for an external
/// log shipper to tail the sink file without further context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStat {
    pub pipeline_name: String,
    pub recorded_at: DateTime<Utc>,
    pub total_duration_ns: u64,
    pub total_runs: u64,
    pub filter_stats: Vec<FilterStatSnapshot>,
}
