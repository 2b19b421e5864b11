//! Schedule E: allocated totals per film title.

use super::ReportContext;
use super::styles::{Align, ColumnSpec, FORMAT_CURRENCY, SheetWriter};
use crate::engine::Statement;
use crate::model::Partition;
use crate::utils::column_range;
use umya_spreadsheet::Worksheet;

pub const COL_TITLE: u32 = 1;
pub const COL_REFERENCE: u32 = 3;
pub const COL_RENTAL: u32 = 4;

const HEADING_ROW: u32 = 8;
pub const FIRST_ENTRY_ROW: u32 = 9;

const COLUMNS: [ColumnSpec; 4] = [
    ColumnSpec::new(1, 12.0, Align::Left),
    ColumnSpec::new(2, 30.0, Align::Left),
    ColumnSpec::new(3, 12.0, Align::Left),
    ColumnSpec::new(4, 12.0, Align::Right).format(FORMAT_CURRENCY),
];

const HEADINGS: [&str; 4] = ["Film Title", " ", "Picture Number", "Rental"];

pub fn write_schedule_e(sheet: &mut Worksheet, statement: &Statement, ctx: &ReportContext<'_>) {
    let mut out = SheetWriter::new(sheet, &COLUMNS);
    out.title(ctx.sheet_title("Schedule E"));

    let layout = ctx.layout;
    let film_size = match statement.partition {
        Partition::Ferry => &layout.film_size.ferry,
        Partition::Other => &layout.film_size.other,
        Partition::All => &layout.film_size.all,
    };
    let left = [
        ("Film Size", film_size.as_str()),
        ("Customer", layout.customer.as_str()),
        ("Territory", layout.territory_label.as_str()),
        ("Territory No.", layout.territory_number.as_str()),
    ];
    for (row, (label, value)) in (3..).zip(left) {
        out.text(1, row, label);
        out.bold(1, row);
        out.text(2, row, value);
    }

    out.text(3, 4, "Currency");
    out.bold(3, 4);
    out.text(4, 4, layout.currency.as_str());
    out.text(3, 5, "Year");
    out.bold(3, 5);
    out.number(4, 5, f64::from(ctx.period.full_year()));
    out.text(3, 6, "Period");
    out.bold(3, 6);
    out.number(4, 6, f64::from(ctx.period.month()));

    out.headings(HEADING_ROW, &HEADINGS);

    let mut row = FIRST_ENTRY_ROW;
    for (title, entry) in statement.schedule_e.entries() {
        out.text(COL_TITLE, row, title);
        out.merge(&format!("A{row}:B{row}"));
        out.text(COL_REFERENCE, row, entry.reference_id.as_str());
        out.number(COL_RENTAL, row, entry.allocated);
        row += 1;
    }

    let total = statement.schedule_e.total();
    if row > FIRST_ENTRY_ROW {
        out.formula(
            COL_RENTAL,
            row,
            format!("SUM({})", column_range(COL_RENTAL, FIRST_ENTRY_ROW, row - 1)),
            total,
        );
    } else {
        out.number(COL_RENTAL, row, total);
    }
    out.bold(COL_RENTAL, row);
}
