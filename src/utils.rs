use chrono::NaiveDate;

pub fn column_number_to_name(column: u32) -> String {
    let mut column = column;
    let mut name = String::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    name
}

pub fn cell_address(column: u32, row: u32) -> String {
    format!("{}{}", column_number_to_name(column), row)
}

/// `D4:D9` style single-column range.
pub fn column_range(column: u32, start_row: u32, end_row: u32) -> String {
    let name = column_number_to_name(column);
    format!("{name}{start_row}:{name}{end_row}")
}

/// Dates in the reports are shown as `DD/MM/YY`.
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}

/// Render a float without trailing noise for formula text, e.g. `1.2`.
pub fn formula_number(value: f64) -> String {
    value.to_string()
}
