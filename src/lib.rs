pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod partition;
pub mod period;
pub mod report;
pub mod source;
pub mod utils;

pub use config::{CliArgs, ReportConfig};
pub use engine::{Engine, Statement};
pub use error::{ErrorCode, RoyaltyError, RoyaltyResult};
pub use logging::{LoggingConfig, init_logging};
pub use period::ReportingPeriod;

use anyhow::{Context, Result};
use chrono::Datelike;
use report::ReportContext;
use source::EventSource;
use std::path::PathBuf;
use tracing::Instrument;

/// Run one report end to end.
///
/// An unusable period is logged and yields `Ok(None)` without touching the
/// source; every other failure is an error.
pub async fn run_report(config: ReportConfig) -> Result<Option<PathBuf>> {
    let current_year = chrono::Local::now().year();
    let period = match ReportingPeriod::parse(&config.period, current_year) {
        Ok(period) => period,
        Err(err) => {
            tracing::error!(
                code = %err.code(),
                category = err.code().category(),
                error = %err,
                "invalid reporting period, nothing generated"
            );
            return Ok(None);
        }
    };

    let source = source::from_config(&config)?;
    generate_report(&config, period, source.as_ref())
        .await
        .map(Some)
}

/// Fetch, compute and write the workbook for an already validated period.
pub async fn generate_report(
    config: &ReportConfig,
    period: ReportingPeriod,
    source: &dyn EventSource,
) -> Result<PathBuf> {
    let span = logging::report_span(&period.code());
    async {
        let engine = Engine::new(config, &period)?;
        tracing::info!(source = %source.describe(), days = engine.days_in_period(), "fetching events");

        let events = source
            .fetch(&period)
            .await
            .with_context(|| format!("failed to load events from {}", source.describe()))?;
        tracing::info!(events = events.len(), "events loaded");

        let statements = engine.run(&events)?;

        let ctx = ReportContext {
            period,
            calendar: &config.calendar,
            layout: &config.layout,
        };
        let book = report::render_workbook(&statements, &ctx)?;
        let path = report::output_path(&config.output, &period);
        report::write_workbook(&book, &path)?;

        tracing::info!(path = %path.display(), statements = statements.len(), "report written");
        Ok(path)
    }
    .instrument(span)
    .await
}
