use crate::engine::aggregate::AggregationMode;
use anyhow::{Context, Result};
use clap::Parser;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_TAX_RATE: f64 = 20.0;
const DEFAULT_NOMINATED_SHARE: f64 = 50.0;
const DEFAULT_STANDARD_SHARE: f64 = 40.0;
const DEFAULT_PROVIDER_RATE: f64 = 4.17;
const DEFAULT_OUTPUT_DIR: &str = "reports";
const DEFAULT_FILE_PREFIX: &str = "Royalty Schedules";
const DEFAULT_DELIMITER: char = ',';
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaxSettings {
    /// Consumption-tax percentage used when an event carries none
    pub default_rate: f64,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            default_rate: DEFAULT_TAX_RATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShareSettings {
    pub nominated: f64,
    pub standard: f64,
}

impl Default for ShareSettings {
    fn default() -> Self {
        Self {
            nominated: DEFAULT_NOMINATED_SHARE,
            standard: DEFAULT_STANDARD_SHARE,
        }
    }
}

/// A provider whose contracts replace the guarantee floor with the
/// hybrid / guest-to-pay pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderRule {
    /// Case-insensitive regex matched against the event's provider tag
    pub pattern: String,
    /// Prefix for the policy label column, e.g. "Airtime"
    pub label: String,
    /// Rate (pence per room per day) used instead of the event's charge rate
    pub default_rate: f64,
    /// Raw charge rate value that marks a title as hybrid
    #[serde(default = "default_hybrid_sentinel")]
    pub hybrid_sentinel: String,
}

fn default_hybrid_sentinel() -> String {
    "1".to_string()
}

impl Default for ProviderRule {
    fn default() -> Self {
        Self {
            pattern: "airtime".to_string(),
            label: "Airtime".to_string(),
            default_rate: DEFAULT_PROVIDER_RATE,
            hybrid_sentinel: default_hybrid_sentinel(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalendarSettings {
    /// Days per month, January first. February stays at 28 every year.
    pub days: Vec<u32>,
    pub names: Vec<String>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            days: DAYS_IN_MONTH.to_vec(),
            names: MONTH_NAMES.iter().map(|name| (*name).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub connector: String,
    pub jwt: String,
    pub command: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 443,
            connector: String::new(),
            jwt: String::new(),
            command: "uipEvents".to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub file_prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FilmSizes {
    pub ferry: String,
    pub other: String,
    pub all: String,
}

/// How the year is printed in sheet titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleYear {
    /// "March 2026"
    #[default]
    Full,
    /// "March 26", as the historical reports printed it
    Short,
}

/// Sheet titles and the header block of the Schedule E sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    pub customer: String,
    pub territory_label: String,
    pub territory_number: String,
    pub currency: String,
    pub film_size: FilmSizes,
    pub title_year: TitleYear,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            customer: String::new(),
            territory_label: "UK".to_string(),
            territory_number: String::new(),
            currency: "GBP".to_string(),
            film_size: FilmSizes::default(),
            title_year: TitleYear::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Raw `YYMM` code as given on the command line
    pub period: String,
    /// Read events from this file instead of the API
    pub input: Option<PathBuf>,
    pub delimiter: char,
    pub tax: TaxSettings,
    pub shares: ShareSettings,
    pub providers: Vec<ProviderRule>,
    pub calendar: CalendarSettings,
    pub api: ApiSettings,
    pub output: OutputSettings,
    pub layout: LayoutSettings,
    pub split_ferry: bool,
    pub aggregation: AggregationMode,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            period: String::new(),
            input: None,
            delimiter: DEFAULT_DELIMITER,
            tax: TaxSettings::default(),
            shares: ShareSettings::default(),
            providers: vec![ProviderRule::default()],
            calendar: CalendarSettings::default(),
            api: ApiSettings::default(),
            output: OutputSettings::default(),
            layout: LayoutSettings::default(),
            split_ferry: true,
            aggregation: AggregationMode::Lenient,
        }
    }
}

impl ReportConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            period,
            config,
            input: cli_input,
            output_dir: cli_output_dir,
            delimiter: cli_delimiter,
            strict,
            single_partition,
            api_jwt,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            input: file_input,
            delimiter: file_delimiter,
            tax,
            shares,
            providers,
            calendar,
            api,
            output,
            layout,
            split_ferry,
            aggregation,
        } = file_config;

        let defaults = ReportConfig::default();

        let mut output = output.unwrap_or(defaults.output);
        if let Some(dir) = cli_output_dir {
            output.dir = dir;
        }

        let mut api = api.unwrap_or(defaults.api);
        if let Some(jwt) = api_jwt {
            api.jwt = jwt;
        }

        let aggregation = if strict {
            AggregationMode::Strict
        } else {
            aggregation.unwrap_or(defaults.aggregation)
        };

        let split_ferry = !single_partition && split_ferry.unwrap_or(defaults.split_ferry);

        Ok(Self {
            period: period.trim().to_string(),
            input: cli_input.or(file_input),
            delimiter: cli_delimiter
                .or(file_delimiter)
                .unwrap_or(defaults.delimiter),
            tax: tax.unwrap_or(defaults.tax),
            shares: shares.unwrap_or(defaults.shares),
            providers: providers.unwrap_or(defaults.providers),
            calendar: calendar.unwrap_or(defaults.calendar),
            api,
            output,
            layout: layout.unwrap_or(defaults.layout),
            split_ferry,
            aggregation,
        })
    }

    /// Fail fast on settings that would make the arithmetic or the layout meaningless.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.calendar.days.len() == 12,
            "calendar.days must list 12 months, got {}",
            self.calendar.days.len()
        );
        anyhow::ensure!(
            self.calendar.names.len() == 12,
            "calendar.names must list 12 months, got {}",
            self.calendar.names.len()
        );
        if let Some(bad) = self.calendar.days.iter().find(|d| !(28..=31).contains(*d)) {
            anyhow::bail!("calendar.days entry {bad} is outside 28..=31");
        }

        for (name, share) in [
            ("shares.nominated", self.shares.nominated),
            ("shares.standard", self.shares.standard),
        ] {
            anyhow::ensure!(
                share.is_finite() && (0.0..=100.0).contains(&share),
                "{name} must be a percentage between 0 and 100, got {share}"
            );
        }

        anyhow::ensure!(
            self.tax.default_rate.is_finite() && self.tax.default_rate > -100.0,
            "tax.default_rate {} would produce a non-positive tax multiplier",
            self.tax.default_rate
        );

        for rule in &self.providers {
            RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("invalid provider pattern {:?}", rule.pattern))?;
        }

        anyhow::ensure!(
            self.delimiter.is_ascii(),
            "delimiter {:?} must be a single ASCII character",
            self.delimiter
        );

        if self.input.is_none() {
            anyhow::ensure!(
                !self.api.host.trim().is_empty(),
                "api.host is required when no --input file is given"
            );
        }

        Ok(())
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "royalty-schedules",
    about = "Generate the monthly Schedule A & E royalty workbook",
    version
)]
pub struct CliArgs {
    #[arg(value_name = "YYMM", help = "Reporting period as a 4-digit year+month code")]
    pub period: String,

    #[arg(
        long,
        env = "ROYALTY_CONFIG",
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "ROYALTY_INPUT",
        value_name = "FILE",
        help = "Read events from a JSON or delimited file instead of the API"
    )]
    pub input: Option<PathBuf>,

    #[arg(
        long,
        env = "ROYALTY_OUTPUT_DIR",
        value_name = "DIR",
        help = "Directory the workbook is written under"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "ROYALTY_DELIMITER",
        value_name = "CHAR",
        help = "Field delimiter for delimited input files"
    )]
    pub delimiter: Option<char>,

    #[arg(
        long,
        env = "ROYALTY_STRICT",
        help = "Fail on repeated events that disagree instead of overwriting"
    )]
    pub strict: bool,

    #[arg(
        long,
        env = "ROYALTY_SINGLE_PARTITION",
        help = "Produce one Schedule A/E pair instead of splitting ferry and other sites"
    )]
    pub single_partition: bool,

    #[arg(
        long,
        env = "ROYALTY_API_JWT",
        value_name = "TOKEN",
        hide_env_values = true,
        help = "Bearer token for the events API"
    )]
    pub api_jwt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    input: Option<PathBuf>,
    delimiter: Option<char>,
    tax: Option<TaxSettings>,
    shares: Option<ShareSettings>,
    providers: Option<Vec<ProviderRule>>,
    calendar: Option<CalendarSettings>,
    api: Option<ApiSettings>,
    output: Option<OutputSettings>,
    layout: Option<LayoutSettings>,
    split_ferry: Option<bool>,
    aggregation: Option<AggregationMode>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
