//! Column layout and cell styling shared by both schedules.

use crate::utils::{cell_address, column_number_to_name};
use umya_spreadsheet::Worksheet;
use umya_spreadsheet::structs::{HorizontalAlignmentValues, VerticalAlignmentValues};

pub const FONT_NAME: &str = "Arial";
pub const BODY_FONT_SIZE: f64 = 8.0;
pub const TITLE_FONT_SIZE: f64 = 14.0;
pub const HEADING_ROW_HEIGHT: f64 = 25.0;

pub const FORMAT_CURRENCY: &str = "\"£\"#,##0.00";
pub const FORMAT_RATE: &str = "0.00";
pub const FORMAT_PERCENT: &str = "0%";

/// A4 in the SpreadsheetML paper size enumeration.
const PAPER_SIZE_A4: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn horizontal(self) -> HorizontalAlignmentValues {
        match self {
            Align::Left => HorizontalAlignmentValues::Left,
            Align::Center => HorizontalAlignmentValues::Center,
            Align::Right => HorizontalAlignmentValues::Right,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    /// 1-based column index
    pub column: u32,
    pub width: f64,
    pub align: Align,
    pub number_format: Option<&'static str>,
}

impl ColumnSpec {
    pub const fn new(column: u32, width: f64, align: Align) -> Self {
        Self {
            column,
            width,
            align,
            number_format: None,
        }
    }

    pub const fn format(mut self, code: &'static str) -> Self {
        self.number_format = Some(code);
        self
    }
}

/// Writes values into a worksheet, styling every cell after its column.
pub struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    columns: &'a [ColumnSpec],
}

impl<'a> SheetWriter<'a> {
    pub fn new(sheet: &'a mut Worksheet, columns: &'a [ColumnSpec]) -> Self {
        for spec in columns {
            sheet
                .get_column_dimension_mut(&column_number_to_name(spec.column))
                .set_width(spec.width);
        }
        Self { sheet, columns }
    }

    fn spec(&self, column: u32) -> Option<ColumnSpec> {
        self.columns.iter().find(|spec| spec.column == column).copied()
    }

    fn style(&mut self, column: u32, row: u32) {
        let spec = self.spec(column);
        let style = self.sheet.get_style_mut(cell_address(column, row).as_str());
        style
            .get_font_mut()
            .set_name(FONT_NAME)
            .set_size(BODY_FONT_SIZE);
        let alignment = style.get_alignment_mut();
        alignment.set_vertical(VerticalAlignmentValues::Center);
        alignment.set_wrap_text(true);
        if let Some(spec) = spec {
            alignment.set_horizontal(spec.align.horizontal());
            if let Some(code) = spec.number_format {
                style.get_number_format_mut().set_format_code(code);
            }
        }
    }

    pub fn text(&mut self, column: u32, row: u32, value: impl Into<String>) {
        self.sheet
            .get_cell_mut(cell_address(column, row).as_str())
            .set_value(value.into());
        self.style(column, row);
    }

    pub fn number(&mut self, column: u32, row: u32, value: f64) {
        self.sheet
            .get_cell_mut(cell_address(column, row).as_str())
            .set_value_number(value);
        self.style(column, row);
    }

    /// A formula cell carrying its computed result, so the workbook reads
    /// correctly before any recalculation.
    pub fn formula(&mut self, column: u32, row: u32, formula: String, result: f64) {
        self.sheet
            .get_cell_mut(cell_address(column, row).as_str())
            .set_formula(formula)
            .set_formula_result_default(result.to_string());
        self.style(column, row);
    }

    pub fn bold(&mut self, column: u32, row: u32) {
        self.sheet
            .get_style_mut(cell_address(column, row).as_str())
            .get_font_mut()
            .set_bold(true);
    }

    pub fn title(&mut self, text: impl Into<String>) {
        self.sheet.get_cell_mut("A1").set_value(text.into());
        self.sheet.add_merge_cells("A1:B1");
        self.sheet
            .get_style_mut("A1")
            .get_font_mut()
            .set_name(FONT_NAME)
            .set_size(TITLE_FONT_SIZE)
            .set_bold(true);
        self.row_height(1, HEADING_ROW_HEIGHT);
    }

    /// Bold headings across consecutive columns starting at A.
    pub fn headings(&mut self, row: u32, labels: &[&str]) {
        for (idx, label) in labels.iter().enumerate() {
            let column = idx as u32 + 1;
            self.text(column, row, *label);
            self.bold(column, row);
        }
        self.row_height(row, HEADING_ROW_HEIGHT);
    }

    pub fn row_height(&mut self, row: u32, height: f64) {
        self.sheet.get_row_dimension_mut(&row).set_height(height);
    }

    pub fn merge(&mut self, range: &str) {
        self.sheet.add_merge_cells(range);
    }
}

/// A4 paper, 0.75" page margins and 0.3" header/footer.
pub fn apply_page_setup(sheet: &mut Worksheet) {
    sheet.get_page_setup_mut().set_paper_size(PAPER_SIZE_A4);
    let margins = sheet.get_page_margins_mut();
    margins.set_left(0.75);
    margins.set_right(0.75);
    margins.set_top(0.75);
    margins.set_bottom(0.75);
    margins.set_header(0.3);
    margins.set_footer(0.3);
}
