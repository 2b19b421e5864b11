//! Workbook projection of computed statements.
//!
//! Each statement becomes a Schedule A sheet followed by its Schedule E
//! sheet. Formula cells carry their computed results, so the numbers
//! shown always equal the engine's.

pub mod schedule_a;
pub mod schedule_e;
pub mod styles;

use crate::config::{CalendarSettings, LayoutSettings, OutputSettings, TitleYear};
use crate::engine::Statement;
use crate::error::{RoyaltyError, RoyaltyResult};
use crate::model::Partition;
use crate::period::ReportingPeriod;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use umya_spreadsheet::{Spreadsheet, Worksheet};

pub use schedule_a::write_schedule_a;
pub use schedule_e::write_schedule_e;

/// Header values shared by every sheet of one run.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub period: ReportingPeriod,
    pub calendar: &'a CalendarSettings,
    pub layout: &'a LayoutSettings,
}

impl ReportContext<'_> {
    /// `"Schedule A for March 2026"`, or `"… March 26"` with short title years.
    pub fn sheet_title(&self, schedule: &str) -> String {
        let month = self.period.month_name(self.calendar);
        match self.layout.title_year {
            TitleYear::Full => format!("{schedule} for {month} {}", self.period.full_year()),
            TitleYear::Short => format!("{schedule} for {month} {:02}", self.period.year()),
        }
    }
}

/// `("Schedule A - Ferry", "Schedule E - Ferry")`, or the bare names for a
/// single partition.
pub fn sheet_names(partition: Partition) -> (String, String) {
    match partition {
        Partition::All => ("Schedule A".to_string(), "Schedule E".to_string()),
        other => (
            format!("Schedule A - {other}"),
            format!("Schedule E - {other}"),
        ),
    }
}

fn add_sheet<'b>(
    book: &'b mut Spreadsheet,
    name: &str,
    reuse_default: bool,
) -> RoyaltyResult<&'b mut Worksheet> {
    let sheet = if reuse_default {
        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| RoyaltyError::Render("workbook has no default sheet".to_string()))?;
        sheet.set_name(name);
        sheet
    } else {
        book.new_sheet(name)
            .map_err(|e| RoyaltyError::Render(format!("failed to create sheet {name:?}: {e}")))?
    };
    styles::apply_page_setup(sheet);
    Ok(sheet)
}

pub fn render_workbook(
    statements: &[Statement],
    ctx: &ReportContext<'_>,
) -> RoyaltyResult<Spreadsheet> {
    let mut book = umya_spreadsheet::new_file();
    for (idx, statement) in statements.iter().enumerate() {
        let (detail, summary) = sheet_names(statement.partition);
        write_schedule_a(add_sheet(&mut book, &detail, idx == 0)?, statement, ctx);
        write_schedule_e(add_sheet(&mut book, &summary, false)?, statement, ctx);
    }
    Ok(book)
}

/// `{dir}/{20YY}/{prefix} {YYMM}.xlsx`
pub fn output_path(output: &OutputSettings, period: &ReportingPeriod) -> PathBuf {
    output
        .dir
        .join(period.full_year().to_string())
        .join(format!("{} {}.xlsx", output.file_prefix, period.code()))
}

pub fn write_workbook(book: &Spreadsheet, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {:?}", parent))?;
    }
    umya_spreadsheet::writer::xlsx::write(book, path).context("write spreadsheet failed")
}
