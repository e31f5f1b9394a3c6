//! # Cancellation
//!
//! Mid-stream cancellation must drain every pending item to the error sink
//! as a cancellation error, close the output stream promptly, and leave no
//! task waiting on anything.

use std::sync::Arc;
use std::time::{Duration, Instant};

use conveyor::{
    error_channel, BoundedParallelFilter, CancellationToken, ConcurrencyBound, Filter, ParallelFilter, Pipeline,
    PipelineError, PipelineName,
};

use crate::common::{collect_errors, collect_u64, feed, SleepWorker};

/// Ten items sleeping one second each in a parallel filter, cancelled
/// after 100ms: the output closes early and all ten items surface as
/// cancellation errors.
#[tokio::test]
async fn test_cancel_midstream_routes_all_items_to_sink() {
    let filter = ParallelFilter::with_worker(Arc::new(SleepWorker {
        delay: Duration::from_secs(1),
    }));
    let (err_tx, err_rx) = error_channel(16);
    let ctx = CancellationToken::new();

    let started = Instant::now();
    let output = filter.filter(ctx.clone(), feed(0..10), err_tx.clone());

    tokio::time::sleep(Duration::from_millis(100)).await;
    ctx.cancel();

    let results = collect_u64(output).await;
    let elapsed = started.elapsed();
    assert!(results.is_empty());
    assert!(
        elapsed < Duration::from_millis(900),
        "output did not close promptly: {elapsed:?}"
    );

    drop(err_tx);
    let errors = collect_errors(err_rx).await;
    assert_eq!(errors.len(), 10);
    assert!(errors.iter().all(PipelineError::is_cancellation));
}

/// Cancellation before the run starts fails every item without invoking
/// worker sleeps at all.
#[tokio::test]
async fn test_cancel_before_run_fails_everything_fast() {
    let filter = ParallelFilter::with_worker(Arc::new(SleepWorker {
        delay: Duration::from_secs(5),
    }));
    let (err_tx, err_rx) = error_channel(16);
    let ctx = CancellationToken::new();
    ctx.cancel();

    let started = Instant::now();
    let output = filter.filter(ctx, feed(0..10), err_tx.clone());
    assert!(collect_u64(output).await.is_empty());
    assert!(started.elapsed() < Duration::from_secs(1));

    drop(err_tx);
    let errors = collect_errors(err_rx).await;
    assert_eq!(errors.len(), 10);
    assert!(errors.iter().all(PipelineError::is_cancellation));
}

/// Cancelling a multi-stage pipeline still closes the final output and
/// accounts for every fed item on the sink.
#[tokio::test]
async fn test_cancel_multi_stage_pipeline_drains_cleanly() {
    let pipeline = Pipeline::with_filters(
        PipelineName::new("cancelled-run").unwrap(),
        vec![
            Arc::new(BoundedParallelFilter::with_worker(
                ConcurrencyBound::new(2).unwrap(),
                Arc::new(SleepWorker {
                    delay: Duration::from_secs(1),
                }),
            )) as Arc<dyn Filter>,
            Arc::new(ParallelFilter::with_worker(Arc::new(SleepWorker {
                delay: Duration::from_secs(1),
            }))),
        ],
    );
    let (err_tx, err_rx) = error_channel(32);
    let ctx = CancellationToken::new();

    let output = pipeline.filter(ctx.clone(), feed(0..8), err_tx.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    ctx.cancel();

    let results = collect_u64(output).await;
    drop(err_tx);
    let errors = collect_errors(err_rx).await;

    // Every fed item ends somewhere: forwarded or failed, never lost.
    assert_eq!(results.len() + errors.len(), 8);
    assert!(errors.iter().all(PipelineError::is_cancellation));
    assert!(!errors.is_empty());
}

/// After a cancelled run drains, the pipeline still counts the run and
/// can execute a fresh, uncancelled run.
#[tokio::test]
async fn test_pipeline_survives_a_cancelled_run() {
    let pipeline = Pipeline::with_filters(
        PipelineName::new("resilient").unwrap(),
        vec![Arc::new(ParallelFilter::with_worker(Arc::new(SleepWorker {
            delay: Duration::from_millis(10),
        }))) as Arc<dyn Filter>],
    );

    // First run: cancelled immediately.
    let (err_tx, err_rx) = error_channel(8);
    let cancelled_ctx = CancellationToken::new();
    cancelled_ctx.cancel();
    let output = pipeline.filter(cancelled_ctx, feed(0..4), err_tx.clone());
    collect_u64(output).await;
    drop(err_tx);
    collect_errors(err_rx).await;

    // Second run: clean.
    let (err_tx, err_rx) = error_channel(8);
    let output = pipeline.filter(CancellationToken::new(), feed(0..4), err_tx.clone());
    assert_eq!(collect_u64(output).await.len(), 4);
    drop(err_tx);
    assert!(collect_errors(err_rx).await.is_empty());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(pipeline.filtering_runs(), 2);
}
