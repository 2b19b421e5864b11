//! Input adapters. Each one fully materializes the month's events before the
//! engine starts.

mod api;
mod file;

pub use api::ApiEventSource;
pub use file::{FileEventSource, parse_delimited_events, parse_json_events};

use crate::config::ReportConfig;
use crate::model::RawEventSet;
use crate::period::ReportingPeriod;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short name for logs
    fn describe(&self) -> String;

    async fn fetch(&self, period: &ReportingPeriod) -> Result<RawEventSet>;
}

/// Pick the adapter the configuration asks for: a local file when `input`
/// is set, the events API otherwise.
pub fn from_config(config: &ReportConfig) -> Result<Box<dyn EventSource>> {
    match config.input.as_ref() {
        Some(path) => Ok(Box::new(FileEventSource::new(path.clone(), config.delimiter)?)),
        None => Ok(Box::new(ApiEventSource::new(&config.api)?)),
    }
}
