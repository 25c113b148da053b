use anyhow::Context;

use crate::{
    configuration::Settings,
    services::{load_records, report_schema, BatchOrchestrator, PageSpeedClient, ReportSink, RunSummary},
};

/// Loads the input sheet, audits every url and writes the report.
///
/// Fails only before the first request is sent: unreadable input or unusable
/// settings. Per url problems are logged and end up as `N/A` in the report.
pub async fn run(settings: Settings) -> anyhow::Result<RunSummary> {
    let records = load_records(
        &settings.application.input_path,
        &settings.application.url_column,
    )
    .context("Failed to load input records")?;

    let client = PageSpeedClient::from_settings(&settings)
        .context("Failed to build pagespeed client")?;

    let passthrough = settings.report.passthrough_columns;
    let sink = ReportSink::new(
        &settings.application.output_path,
        report_schema(&passthrough),
    );

    let delay = settings.rate_limit.inter_batch_delay();
    log::info!(
        "Auditing {} urls in batches of {}, {}ms between batches",
        records.len(),
        settings.rate_limit.batch_size,
        delay.as_millis()
    );

    let orchestrator = BatchOrchestrator::new(
        client,
        sink,
        passthrough,
        settings.rate_limit.batch_size,
        delay,
    );

    Ok(orchestrator.run(records).await)
}
