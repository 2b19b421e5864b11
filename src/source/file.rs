use super::EventSource;
use crate::model::{RawEventRecord, RawEventSet};
use crate::period::ReportingPeriod;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

/// Events exported to disk, either as the API's JSON mapping or as a
/// delimited file whose header row names the fields.
#[derive(Debug, Clone)]
pub struct FileEventSource {
    path: PathBuf,
    delimiter: u8,
}

impl FileEventSource {
    pub fn new(path: PathBuf, delimiter: char) -> Result<Self> {
        anyhow::ensure!(
            delimiter.is_ascii(),
            "delimiter {:?} must be a single ASCII character",
            delimiter
        );
        Ok(Self {
            path,
            delimiter: delimiter as u8,
        })
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

/// Parse the API's JSON shape. A bare array is keyed by position.
pub fn parse_json_events(contents: &str) -> Result<RawEventSet> {
    if contents.trim().is_empty() {
        return Ok(RawEventSet::new());
    }
    let value: Value = serde_json::from_str(contents).context("parse events JSON")?;
    match value {
        Value::Object(_) => serde_json::from_value(value).context("decode event mapping"),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let record: RawEventRecord = serde_json::from_value(item)
                    .with_context(|| format!("decode event at index {idx}"))?;
                Ok((format!("row-{}", idx + 1), record))
            })
            .collect(),
        other => bail!("expected an object or array of events, got {other}"),
    }
}

/// Parse a delimited file. Rows are keyed `row-N`, counting data rows from 1.
pub fn parse_delimited_events(contents: &str, delimiter: u8) -> Result<RawEventSet> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(contents.as_bytes());
    let headers = reader.headers().context("read header row")?.clone();

    let mut events = RawEventSet::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("read data row {}", idx + 1))?;
        let record = RawEventRecord::from_pairs(headers.iter().zip(row.iter()));
        events.insert(format!("row-{}", idx + 1), record);
    }
    Ok(events)
}

#[async_trait]
impl EventSource for FileEventSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn fetch(&self, _period: &ReportingPeriod) -> Result<RawEventSet> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read events file {:?}", self.path))?;
        let parsed = if self.is_json() {
            parse_json_events(&contents)
        } else {
            parse_delimited_events(&contents, self.delimiter)
        };
        parsed.with_context(|| format!("invalid events file {:?}", self.path))
    }
}
