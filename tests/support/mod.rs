#![allow(dead_code)]

use std::path::{Path, PathBuf};

use royalty_schedules::ReportConfig;
use royalty_schedules::config::ProviderRule;
use royalty_schedules::model::{RawEventRecord, RawEventSet};
use royalty_schedules::period::ReportingPeriod;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

/// Year the fixture periods are validated against.
pub const FIXTURE_YEAR: i32 = 2026;

pub fn period(code: &str) -> ReportingPeriod {
    ReportingPeriod::parse(code, FIXTURE_YEAR).expect("fixture period")
}

/// Defaults with a single partition, so most scenarios yield one statement.
pub fn config() -> ReportConfig {
    ReportConfig {
        split_ferry: false,
        ..ReportConfig::default()
    }
}

/// An `airtime` rule charging 4.0 with the standard 40% share for nominated
/// titles, matching the hand-worked scenarios.
pub fn hybrid_config() -> ReportConfig {
    let mut config = config();
    config.providers = vec![ProviderRule {
        pattern: "airtime".to_string(),
        label: "Airtime".to_string(),
        default_rate: 4.0,
        hybrid_sentinel: "1".to_string(),
    }];
    config.shares.nominated = 40.0;
    config
}

/// One event at "Hotel A" in the UK; `overrides` replaces individual fields.
pub fn event(overrides: Value) -> RawEventRecord {
    let mut base = json!({
        "territory": "UK",
        "vat": "20",
        "site": "Hotel A",
        "rooms": "10",
        "title": "Title One",
        "provider_ref": "10000001",
        "views": "100",
        "stg": "50",
        "charge_rate": "4.0",
        "company": "other",
        "nominated": "false",
        "class": "Current",
        "ferry": "false"
    });
    if let (Some(base), Value::Object(overrides)) = (base.as_object_mut(), overrides) {
        for (key, value) in overrides {
            base.insert(key, value);
        }
    }
    serde_json::from_value(base).expect("raw event")
}

pub fn events<I>(records: I) -> RawEventSet
where
    I: IntoIterator<Item = RawEventRecord>,
{
    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| (format!("evt-{}", idx + 1), record))
        .collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub struct TestWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let tempdir = tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        Self {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dir");
        }
        std::fs::write(&path, contents).expect("write fixture");
        path
    }
}
