//! # Statistics Accounting and Extraction
//!
//! Checks the counter semantics end to end (work summed across items vs.
//! wall-clock run duration) and the periodic extractor's sink file.

use std::sync::Arc;
use std::time::Duration;

use conveyor::{
    error_channel, BoundedParallelFilter, CancellationToken, ConcurrencyBound, Filter, FilterKind, Pipeline,
    PipelineName, PipelineStat, SerialFilter,
};

use crate::common::{collect_u64, feed, SleepWorker, SqWorker};

/// 40 items of ~10ms work through a bound of 4: items counted exactly,
/// work sums across items (~400ms), while the wall-clock run duration
/// stays near a quarter of that thanks to the four concurrent chains.
#[tokio::test]
async fn test_bounded_stage_accounting() {
    let filter = Arc::new(BoundedParallelFilter::with_worker(
        ConcurrencyBound::new(4).unwrap(),
        Arc::new(SleepWorker {
            delay: Duration::from_millis(10),
        }),
    ));
    let pipeline = Pipeline::with_filters(
        PipelineName::new("accounting").unwrap(),
        vec![Arc::clone(&filter) as Arc<dyn Filter>],
    );
    let (err_tx, _err_rx) = error_channel(64);

    let output = pipeline.filter(CancellationToken::new(), feed(0..40), err_tx);
    assert_eq!(collect_u64(output).await.len(), 40);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let snapshot = filter.snapshot();
    assert_eq!(snapshot.items, 40);
    // Work is summed across items: at least 40 sleeps of 10ms.
    assert!(
        snapshot.work() >= Duration::from_millis(350),
        "work {:?}",
        snapshot.work()
    );
    // Four chains in flight keep the wall-clock well under the summed work.
    assert!(
        snapshot.work() >= snapshot.duration() * 2,
        "work {:?} vs duration {:?}",
        snapshot.work(),
        snapshot.duration()
    );
    assert!(snapshot.duration() >= Duration::from_millis(90));
}

/// In a serial stage the per-item spans are disjoint slices of the run
/// loop, so summed work plus summed waiting never exceeds the wall-clock.
#[tokio::test]
async fn test_serial_work_plus_waiting_bounded_by_duration() {
    let filter = Arc::new(SerialFilter::with_worker(Arc::new(SqWorker)));
    let (err_tx, _err_rx) = error_channel(32);

    let output = filter.filter(CancellationToken::new(), feed(0..25), err_tx);
    assert_eq!(collect_u64(output).await.len(), 25);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let snapshot = filter.snapshot();
    assert_eq!(snapshot.items, 25);
    assert!(snapshot.work() > Duration::ZERO);
    assert!(
        snapshot.work() + snapshot.waiting() <= snapshot.duration(),
        "work {:?} + waiting {:?} > duration {:?}",
        snapshot.work(),
        snapshot.waiting(),
        snapshot.duration()
    );
}

/// Counters are monotonic across consecutive runs of the same pipeline.
#[tokio::test]
async fn test_counters_accumulate_across_runs() {
    let filter = Arc::new(SerialFilter::with_worker(Arc::new(SqWorker)));
    let pipeline = Pipeline::with_filters(
        PipelineName::new("two-runs").unwrap(),
        vec![Arc::clone(&filter) as Arc<dyn Filter>],
    );

    for _ in 0..2 {
        let (err_tx, _err_rx) = error_channel(16);
        let output = pipeline.filter(CancellationToken::new(), feed(0..10), err_tx);
        collect_u64(output).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(filter.snapshot().items, 20);
    assert_eq!(pipeline.filtering_runs(), 2);
    assert_eq!(pipeline.aggregate_stat().items, 20);
    assert_eq!(pipeline.aggregate_stat().kind, FilterKind::Pipeline);
}

/// The extractor appends one parseable JSON record per tick to a sink
/// file named after the pipeline, and the final record reflects the
/// completed run.
#[tokio::test]
async fn test_extractor_sink_is_tailable() {
    let pipeline = Pipeline::with_filters(
        PipelineName::new("tailable").unwrap(),
        vec![Arc::new(SerialFilter::with_worker(Arc::new(SqWorker))) as Arc<dyn Filter>],
    );
    let path = pipeline.start_extracting(Duration::from_millis(25)).unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("tailable-stats-"));

    let (err_tx, _err_rx) = error_channel(16);
    let output = pipeline.filter(CancellationToken::new(), feed(0..10), err_tx);
    collect_u64(output).await;

    tokio::time::sleep(Duration::from_millis(120)).await;
    pipeline.stop_extracting();

    let contents = std::fs::read_to_string(&path).unwrap();
    let records: Vec<PipelineStat> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("malformed record line"))
        .collect();
    assert!(records.len() >= 2, "expected several ticks, got {}", records.len());

    let last = records.last().unwrap();
    assert_eq!(last.pipeline_name, "tailable");
    assert_eq!(last.filter_stats.len(), 1);
    assert_eq!(last.filter_stats[0].items, 10);
    assert_eq!(last.total_runs, 1);

    std::fs::remove_file(path).unwrap();
}
