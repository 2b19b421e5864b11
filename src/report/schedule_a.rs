//! Schedule A: one row per (site, title) with the full derivation.

use super::ReportContext;
use super::styles::{
    Align, ColumnSpec, FORMAT_CURRENCY, FORMAT_PERCENT, FORMAT_RATE, SheetWriter,
};
use crate::engine::allocation::TitleAllocation;
use crate::engine::{FIRST_DETAIL_ROW, SiteStatement, Statement};
use crate::model::PaymentPolicy;
use crate::utils::{cell_address, column_range, format_short_date, formula_number};
use umya_spreadsheet::Worksheet;

pub const COL_TERRITORY: u32 = 1;
pub const COL_SITE: u32 = 2;
pub const COL_ROOMS: u32 = 3;
pub const COL_PLAYS: u32 = 4;
pub const COL_TITLE: u32 = 5;
pub const COL_RATE: u32 = 6;
pub const COL_DAYS: u32 = 7;
pub const COL_GUARANTEE: u32 = 8;
pub const COL_GUEST_PRICE: u32 = 9;
pub const COL_GROSS: u32 = 10;
pub const COL_SHARE: u32 = 11;
pub const COL_NET: u32 = 12;
pub const COL_TOTAL_NET: u32 = 13;
pub const COL_TOTAL_DUE: u32 = 14;
pub const COL_SCHEDULE_E: u32 = 15;
pub const COL_START: u32 = 16;
pub const COL_END: u32 = 17;
pub const COL_CLASS: u32 = 18;
pub const COL_POLICY: u32 = 19;

const HEADING_ROW: u32 = 3;

const COLUMNS: [ColumnSpec; 19] = [
    ColumnSpec::new(COL_TERRITORY, 20.0, Align::Left),
    ColumnSpec::new(COL_SITE, 30.0, Align::Left),
    ColumnSpec::new(COL_ROOMS, 7.0, Align::Center),
    ColumnSpec::new(COL_PLAYS, 7.0, Align::Center),
    ColumnSpec::new(COL_TITLE, 40.0, Align::Left),
    ColumnSpec::new(COL_RATE, 9.0, Align::Right).format(FORMAT_RATE),
    ColumnSpec::new(COL_DAYS, 9.0, Align::Center),
    ColumnSpec::new(COL_GUARANTEE, 9.0, Align::Right).format(FORMAT_CURRENCY),
    ColumnSpec::new(COL_GUEST_PRICE, 9.0, Align::Right).format(FORMAT_CURRENCY),
    ColumnSpec::new(COL_GROSS, 9.0, Align::Right).format(FORMAT_CURRENCY),
    ColumnSpec::new(COL_SHARE, 9.0, Align::Right).format(FORMAT_PERCENT),
    ColumnSpec::new(COL_NET, 9.0, Align::Right).format(FORMAT_CURRENCY),
    ColumnSpec::new(COL_TOTAL_NET, 9.0, Align::Right).format(FORMAT_CURRENCY),
    ColumnSpec::new(COL_TOTAL_DUE, 9.0, Align::Right).format(FORMAT_CURRENCY),
    ColumnSpec::new(COL_SCHEDULE_E, 9.0, Align::Right).format(FORMAT_CURRENCY),
    ColumnSpec::new(COL_START, 9.0, Align::Center),
    ColumnSpec::new(COL_END, 9.0, Align::Center),
    ColumnSpec::new(COL_CLASS, 9.0, Align::Center),
    ColumnSpec::new(COL_POLICY, 15.0, Align::Left),
];

const HEADINGS: [&str; 19] = [
    "Territory",
    "Site",
    "Rooms",
    "Plays",
    "Title",
    "Daily Rate (pence)",
    "Days",
    "Daily Guarantee",
    "Price to Guest",
    "Gross Receipt",
    "Percentage",
    "Net Receipts",
    "Total Net",
    "Total Due",
    "Total Sched E",
    "Title Start Date",
    "Title End Date",
    "Class",
    "",
];

/// Columns summed on the grand-total row.
const TOTAL_COLUMNS: [u32; 5] = [COL_GUARANTEE, COL_GROSS, COL_NET, COL_TOTAL_DUE, COL_SCHEDULE_E];

pub fn write_schedule_a(sheet: &mut Worksheet, statement: &Statement, ctx: &ReportContext<'_>) {
    let mut out = SheetWriter::new(sheet, &COLUMNS);
    out.title(ctx.sheet_title("Schedule A"));
    out.headings(HEADING_ROW, &HEADINGS);

    for site in &statement.sites {
        write_site_cells(&mut out, site);
        for title in &site.titles {
            write_title_cells(&mut out, site, title);
        }
    }

    write_totals(&mut out, statement);
}

fn write_site_cells(out: &mut SheetWriter<'_>, site: &SiteStatement) {
    let row = site.liability.rows.start;
    let cell = |column| cell_address(column, row);
    let liability = &site.liability;

    out.text(COL_TERRITORY, row, site.territory.as_str());
    out.text(COL_SITE, row, site.site.as_str());
    out.number(COL_ROOMS, row, site.rooms as f64);
    out.number(COL_RATE, row, liability.rate);
    out.number(COL_DAYS, row, f64::from(liability.days));
    out.formula(
        COL_GUARANTEE,
        row,
        format!("{}*{}*{}/100", cell(COL_ROOMS), cell(COL_RATE), cell(COL_DAYS)),
        liability.guaranteed_minimum,
    );
    out.formula(
        COL_TOTAL_NET,
        row,
        format!(
            "SUM({})",
            column_range(COL_NET, liability.rows.start, liability.rows.end)
        ),
        liability.net_receipts,
    );
    let total_due = match liability.policy {
        PaymentPolicy::Hybrid => format!("{}+{}", cell(COL_TOTAL_NET), cell(COL_GUARANTEE)),
        PaymentPolicy::GuestToPay => cell(COL_TOTAL_NET),
        PaymentPolicy::GuaranteeFloor => {
            format!("MAX({},{})", cell(COL_GUARANTEE), cell(COL_TOTAL_NET))
        }
    };
    out.formula(COL_TOTAL_DUE, row, total_due, liability.total_due);
}

fn write_title_cells(out: &mut SheetWriter<'_>, site: &SiteStatement, title: &TitleAllocation) {
    let row = title.row;
    let cell = |column| cell_address(column, row);

    out.number(COL_PLAYS, row, title.plays as f64);
    out.text(COL_TITLE, row, title.title.as_str());
    out.number(COL_GUEST_PRICE, row, title.guest_charge);
    out.formula(
        COL_GROSS,
        row,
        format!("{}*{}", cell(COL_PLAYS), cell(COL_GUEST_PRICE)),
        title.gross_receipts,
    );
    out.number(COL_SHARE, row, title.share_fraction());
    out.formula(
        COL_NET,
        row,
        format!(
            "{}*{}/{}",
            cell(COL_GROSS),
            cell(COL_SHARE),
            formula_number(site.tax_multiplier)
        ),
        title.net_receipts,
    );
    out.formula(
        COL_SCHEDULE_E,
        row,
        schedule_e_formula(site, row),
        title.allocated_share,
    );
    if let Some(date) = title.release_date {
        out.text(COL_START, row, format_short_date(date));
    }
    if let Some(date) = title.release_end() {
        out.text(COL_END, row, format_short_date(date));
    }
    out.text(COL_CLASS, row, title.age_class.to_string());
    if let Some(label) = &title.policy_label {
        out.text(COL_POLICY, row, label.as_str());
    }
}

/// Spreadsheet rendering of the allocation rule, anchored on the site's first row.
pub fn schedule_e_formula(site: &SiteStatement, row: u32) -> String {
    let rows = site.liability.rows;
    let anchored = |column| {
        format!(
            "{}${}",
            crate::utils::column_number_to_name(column),
            rows.start
        )
    };
    let net = cell_address(COL_NET, row);
    let plays = cell_address(COL_PLAYS, row);
    let due = anchored(COL_TOTAL_DUE);
    let site_net = anchored(COL_TOTAL_NET);
    let site_plays = format!("SUM({})", column_range(COL_PLAYS, rows.start, rows.end));

    format!(
        "IF({net}<>0,{net}*{due}/{site_net},IF({site_net}<>0,0,IF({site_plays}=0,{due}/{count},{plays}*{due}/{site_plays})))",
        count = rows.len()
    )
}

fn write_totals(out: &mut SheetWriter<'_>, statement: &Statement) {
    let row = statement.totals_row;
    let totals = &statement.totals;
    let values = [
        totals.guaranteed_minimum,
        totals.gross_receipts,
        totals.net_receipts,
        totals.total_due,
        totals.allocated_share,
    ];
    for (column, value) in TOTAL_COLUMNS.into_iter().zip(values) {
        if row > FIRST_DETAIL_ROW {
            out.formula(
                column,
                row,
                format!("SUM({})", column_range(column, FIRST_DETAIL_ROW, row - 1)),
                value,
            );
        } else {
            out.number(column, row, value);
        }
        out.bold(column, row);
    }
}
