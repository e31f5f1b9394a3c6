//! # Quantified Properties
//!
//! Property tests over arbitrary input vectors: the serial discipline is
//! an ordered map of the worker chain, the parallel disciplines are the
//! same map up to ordering, and failed items are exactly the ones the
//! chain rejected.

use std::sync::Arc;

use proptest::prelude::*;

use conveyor::{
    error_channel, BoundedParallelFilter, CancellationToken, ConcurrencyBound, Filter, FnWorker, Item, ParallelFilter,
    Pipeline, PipelineError, PipelineName, SerialFilter, Worker,
};

use crate::common::{collect_errors, collect_u64, feed};

/// Deterministic chain: squares, rejecting multiples of seven.
fn square_reject_sevens() -> Arc<dyn Worker> {
    Arc::new(FnWorker::new("SqRejectSevens", |item: Item| {
        let n: u64 = item.take_single()?;
        if n % 7 == 0 {
            return Err(PipelineError::worker_failure(format!("rejected {n}")));
        }
        Ok(Item::single(n * n))
    }))
}

fn expected_survivors(values: &[u64]) -> Vec<u64> {
    values.iter().filter(|n| *n % 7 != 0).map(|n| n * n).collect()
}

fn expected_failures(values: &[u64]) -> usize {
    values.iter().filter(|n| *n % 7 == 0).count()
}

/// Runs one filter over the values, returning survivors and error count.
async fn run_filter<F: Filter>(filter: &F, values: Vec<u64>) -> (Vec<u64>, usize) {
    let (err_tx, err_rx) = error_channel(values.len().max(1));
    let output = filter.filter(CancellationToken::new(), feed(values), err_tx.clone());
    let survivors = collect_u64(output).await;
    drop(err_tx);
    let failures = collect_errors(err_rx).await.len();
    (survivors, failures)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_serial_filter_is_an_ordered_map(values in proptest::collection::vec(0u64..10_000, 0..40)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let filter = SerialFilter::with_worker(square_reject_sevens());
        let (survivors, failures) = runtime.block_on(run_filter(&filter, values.clone()));

        prop_assert_eq!(survivors, expected_survivors(&values));
        prop_assert_eq!(failures, expected_failures(&values));
    }

    #[test]
    fn prop_parallel_filter_is_a_multiset_map(values in proptest::collection::vec(0u64..10_000, 0..40)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let filter = ParallelFilter::with_worker(square_reject_sevens());
        let (mut survivors, failures) = runtime.block_on(run_filter(&filter, values.clone()));

        let mut expected = expected_survivors(&values);
        survivors.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(survivors, expected);
        prop_assert_eq!(failures, expected_failures(&values));
    }

    #[test]
    fn prop_bounded_filter_is_a_multiset_map(
        values in proptest::collection::vec(0u64..10_000, 0..40),
        bound in 1usize..6,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let filter = BoundedParallelFilter::with_worker(
            ConcurrencyBound::new(bound).unwrap(),
            square_reject_sevens(),
        );
        let (mut survivors, failures) = runtime.block_on(run_filter(&filter, values.clone()));

        let mut expected = expected_survivors(&values);
        survivors.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(survivors, expected);
        prop_assert_eq!(failures, expected_failures(&values));
    }

    #[test]
    fn prop_all_serial_pipeline_preserves_order(values in proptest::collection::vec(0u64..1_000, 0..30)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let add_one = Arc::new(FnWorker::new("AddOne", |item: Item| {
            let n: u64 = item.take_single()?;
            Ok(Item::single(n + 1))
        }));
        let square = Arc::new(FnWorker::new("Sq", |item: Item| {
            let n: u64 = item.take_single()?;
            Ok(Item::single(n * n))
        }));
        let pipeline = Pipeline::with_filters(
            PipelineName::new("prop-ordered").unwrap(),
            vec![
                Arc::new(SerialFilter::with_worker(square)) as Arc<dyn Filter>,
                Arc::new(SerialFilter::with_worker(add_one)),
            ],
        );

        let survivors = runtime.block_on(async {
            let (err_tx, _err_rx) = error_channel(values.len().max(1));
            let output = pipeline.filter(CancellationToken::new(), feed(values.clone()), err_tx);
            collect_u64(output).await
        });

        let expected: Vec<u64> = values.iter().map(|n| n * n + 1).collect();
        prop_assert_eq!(survivors, expected);
    }
}
