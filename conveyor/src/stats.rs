// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Periodic Statistics Extraction
//!
//! One timer task per pipeline appends a snapshot record to a durable sink
//! on every tick. The sink is a file in the temp directory whose name is
//! derived from the pipeline name; it is created once per pipeline
//! instance, persisted on disk, and written by exactly one task, so no
//! locking is involved.
//!
//! Records are line-oriented JSON, one [`PipelineStat`] per line, so an
//! external log shipper can tail the file without knowing anything about
//! the engine.
//!
//! Serialization or append failures are logged at `warn` and the timer
//! keeps ticking; statistics are an observability aid, never a reason to
//! disturb a run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use conveyor_bootstrap::shutdown::CancellationToken;
use conveyor_domain::{PipelineError, PipelineStat};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::pipeline::StatsSource;

/// Handle to a running extractor task.
///
/// Owned by the pipeline; stopping (or dropping the pipeline) cancels the
/// task while leaving the sink file on disk.
pub(crate) struct StatsExtractor {
    token: CancellationToken,
    path: PathBuf,
    _handle: JoinHandle<()>,
}

impl StatsExtractor {
    /// The sink file path chosen for this pipeline instance.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Stops the timer task, returning the sink path.
    pub(crate) fn stop(self) -> PathBuf {
        self.token.cancel();
        self.path
    }
}

/// Creates the sink file and spawns the timer task.
pub(crate) fn spawn_extractor(source: StatsSource, interval: Duration) -> Result<StatsExtractor, PipelineError> {
    let named = tempfile::Builder::new()
        .prefix(&format!("{}-stats-", source.name()))
        .suffix(".json")
        .tempfile()
        .map_err(|error| PipelineError::stats_write(format!("failed to create statistics sink: {error}")))?;
    // Persist the file: shippers tail it after the pipeline is gone.
    let (file, path) = named
        .keep()
        .map_err(|error| PipelineError::stats_write(format!("failed to persist statistics sink: {error}")))?;

    let token = CancellationToken::new();
    let task_token = token.clone();
    let task_path = path.clone();
    let mut file = tokio::fs::File::from_std(file);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // A slow write must not cause a burst of catch-up records.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => break,
                _ = ticker.tick() => {
                    let snapshot = source.snapshot();
                    if let Err(error) = append_record(&mut file, &snapshot).await {
                        tracing::warn!(path = %task_path.display(), %error, "skipping statistics record");
                    }
                }
            }
        }
        tracing::debug!(path = %task_path.display(), "statistics extractor stopped");
    });

    Ok(StatsExtractor {
        token,
        path,
        _handle: handle,
    })
}

/// Serializes one snapshot as a JSON line and appends it to the sink.
async fn append_record(file: &mut tokio::fs::File, snapshot: &PipelineStat) -> Result<(), PipelineError> {
    let mut line = serde_json::to_vec(snapshot)
        .map_err(|error| PipelineError::stats_write(format!("serialization failed: {error}")))?;
    line.push(b'\n');
    file.write_all(&line)
        .await
        .map_err(|error| PipelineError::stats_write(format!("append failed: {error}")))?;
    file.flush()
        .await
        .map_err(|error| PipelineError::stats_write(format!("flush failed: {error}")))
}
