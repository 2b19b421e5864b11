use clap::Parser;
use royalty_schedules::{
    CliArgs, LoggingConfig, ReportConfig, RoyaltyError, init_logging, run_report,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let config = ReportConfig::from_args(cli)?;

    // Fail fast before any I/O
    config.validate()?;

    match run_report(config).await {
        Ok(Some(path)) => {
            tracing::info!(path = %path.display(), "done");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            let message = format!("{err:#}");
            match err.downcast_ref::<RoyaltyError>() {
                Some(domain) => tracing::error!(
                    code = %domain.code(),
                    category = domain.code().category(),
                    error = %message,
                    "report failed"
                ),
                None => tracing::error!(error = %message, "report failed"),
            }
            Err(err)
        }
    }
}
