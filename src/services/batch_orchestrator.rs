use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Mutex;

use crate::{
    configuration::PassthroughColumn,
    domain::{InputRecord, MetricRecord, ReportRow},
};

use super::{MetricSource, ReportSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub records: usize,
    pub batches: usize,
    pub pauses: usize,
    pub rows_written: usize,
    pub rows_failed: usize,
}

/// Drives a run: fixed size batches, concurrent fetches inside a batch, a
/// fixed pause between batches.
pub struct BatchOrchestrator<S> {
    source: S,
    sink: Mutex<ReportSink>,
    passthrough: Vec<PassthroughColumn>,
    batch_size: usize,
    inter_batch_delay: Duration,
}

enum RowOutcome {
    Written,
    Failed,
}

impl<S: MetricSource> BatchOrchestrator<S> {
    pub fn new(
        source: S,
        sink: ReportSink,
        passthrough: Vec<PassthroughColumn>,
        batch_size: usize,
        inter_batch_delay: Duration,
    ) -> Self {
        BatchOrchestrator {
            source,
            sink: Mutex::new(sink),
            passthrough,
            // A zero batch size would never make progress
            batch_size: batch_size.max(1),
            inter_batch_delay,
        }
    }

    pub async fn run(&self, records: Vec<InputRecord>) -> RunSummary {
        let total_batches = records.len().div_ceil(self.batch_size);
        let mut summary = RunSummary {
            records: records.len(),
            ..RunSummary::default()
        };

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            log::info!(
                "Processing batch {} of {} ({} urls)",
                index + 1,
                total_batches,
                batch.len()
            );

            let outcomes = join_all(batch.iter().map(|record| self.process_record(record))).await;

            summary.batches += 1;
            for outcome in outcomes {
                match outcome {
                    RowOutcome::Written => summary.rows_written += 1,
                    RowOutcome::Failed => summary.rows_failed += 1,
                }
            }

            if index + 1 < total_batches {
                log::info!(
                    "Waiting {}ms before next batch...",
                    self.inter_batch_delay.as_millis()
                );
                tokio::time::sleep(self.inter_batch_delay).await;
                summary.pauses += 1;
            }
        }

        log::info!(
            "Processed {} urls in {} batches: {} rows written, {} failed",
            summary.records,
            summary.batches,
            summary.rows_written,
            summary.rows_failed
        );
        summary
    }

    async fn process_record(&self, record: &InputRecord) -> RowOutcome {
        log::info!("Processing: {}", record.url);

        let metrics = self.source.fetch_metrics(&record.url).await;
        let row = merge_row(record, &metrics, &self.passthrough);

        let mut sink = self.sink.lock().await;
        match sink.append(&row) {
            Ok(()) => {
                log::info!("Completed: {}", metrics.url());
                RowOutcome::Written
            }
            Err(e) => {
                log::error!("Error processing {}: {}", record.url, e);
                RowOutcome::Failed
            }
        }
    }
}

/// Combines the pass-through columns of `record` with its metrics. Metric
/// fields win on a name clash.
pub fn merge_row(
    record: &InputRecord,
    metrics: &MetricRecord,
    passthrough: &[PassthroughColumn],
) -> ReportRow {
    let mut row: ReportRow = passthrough
        .iter()
        .filter_map(|column| {
            record
                .field(&column.column)
                .map(|value| (column.field.clone(), value.to_string()))
        })
        .collect();
    row.extend(metrics.to_row());
    row
}
