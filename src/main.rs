use anyhow::Context;
use pagespeed_report::{configuration::get_configuration, startup::run, telemetry::init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let output_path = configuration.application.output_path.clone();

    let summary = run(configuration).await?;

    match summary.rows_failed {
        0 => log::info!("All URLs processed successfully, report at {:?}", output_path),
        failed => log::warn!("{} rows could not be written to {:?}", failed, output_path),
    }

    Ok(())
}
