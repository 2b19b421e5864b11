use chrono::NaiveDate;
use royalty_schedules::utils::{
    cell_address, column_number_to_name, column_range, format_short_date, formula_number,
};

#[test]
fn column_name_and_cell_address() {
    assert_eq!(column_number_to_name(1), "A");
    assert_eq!(column_number_to_name(19), "S");
    assert_eq!(column_number_to_name(26), "Z");
    assert_eq!(column_number_to_name(27), "AA");
    assert_eq!(column_number_to_name(702), "ZZ");
    assert_eq!(cell_address(1, 1), "A1");
    assert_eq!(cell_address(14, 4), "N4");
}

#[test]
fn column_range_spans_rows() {
    assert_eq!(column_range(12, 4, 9), "L4:L9");
    assert_eq!(column_range(4, 9, 9), "D9:D9");
}

#[test]
fn short_dates_use_two_digit_year() {
    let date = NaiveDate::from_ymd_opt(2016, 10, 20).expect("date");
    assert_eq!(format_short_date(date), "20/10/16");
}

#[test]
fn formula_numbers_have_no_padding() {
    assert_eq!(formula_number(1.2), "1.2");
    assert_eq!(formula_number(1.0), "1");
    assert_eq!(formula_number(1.175), "1.175");
}
