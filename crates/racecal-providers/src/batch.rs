//! Chunked writes to storage.

use std::time::Duration;

use racecal_core::RaceRecord;
use tracing::debug;

use crate::port::StoragePort;
use crate::summary::OperationSummary;

/// Default number of records per storage write.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Upserts `records` in chunks of at most `batch_size`, sleeping `pause`
/// between chunks.
///
/// Each chunk's outcome is aggregated independently: a failing chunk does not
/// stop the ones after it. A `batch_size` of 0 is treated as 1.
pub async fn upsert_in_chunks(
    storage: &dyn StoragePort,
    records: Vec<RaceRecord>,
    batch_size: usize,
    pause: Duration,
) -> OperationSummary {
    let batch_size = batch_size.max(1);
    let chunk_count = records.len().div_ceil(batch_size);
    let mut summary = OperationSummary::new();
    let mut records = records.into_iter().peekable();
    let mut index = 0;

    while records.peek().is_some() {
        if index > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        let chunk: Vec<RaceRecord> = records.by_ref().take(batch_size).collect();
        let size = chunk.len();
        let result = storage.upsert_batch(chunk).await;
        debug!(
            storage = storage.name(),
            chunk = index + 1,
            chunks = chunk_count,
            size,
            failed = result.failure_count,
            "Wrote storage chunk"
        );
        summary.merge(result);
        index += 1;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use chrono::NaiveDate;
    use racecal_core::{Participant, RaceType};

    fn records(count: u8) -> Vec<RaceRecord> {
        (0..count)
            .map(|i| {
                let day = NaiveDate::from_ymd_opt(2025, 3, 1 + u32::from(i / 12)).unwrap();
                RaceRecord::builder(
                    RaceType::Autorace,
                    "テスト",
                    day.and_hms_opt(12, 0, 0).unwrap(),
                    "川口",
                    "SG",
                    i % 12 + 1,
                )
                .with_stage("優勝戦")
                .with_participants(vec![Participant::new(1, "3101")])
                .build()
                .unwrap()
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_and_pauses() {
        let storage = MemoryStorage::new();
        let started = tokio::time::Instant::now();
        let summary = upsert_in_chunks(&storage, records(60), 25, Duration::from_secs(2)).await;

        assert_eq!(summary.success_count, 60);
        assert_eq!(storage.batch_sizes(), vec![25, 25, 10]);
        // Two pauses between three chunks.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn failing_chunk_does_not_stop_the_rest() {
        let storage = MemoryStorage::new();
        let all = records(5);
        storage.fail_upsert(all[0].id().as_str());
        let summary = upsert_in_chunks(&storage, all, 2, Duration::ZERO).await;

        assert_eq!(storage.batch_sizes(), vec![2, 2, 1]);
        assert_eq!(summary.success_count, 4);
        assert_eq!(summary.failure_count, 1);
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let storage = MemoryStorage::new();
        let summary = upsert_in_chunks(&storage, Vec::new(), 25, Duration::from_secs(1)).await;
        assert_eq!(summary.total(), 0);
        assert!(storage.batch_sizes().is_empty());
    }
}
