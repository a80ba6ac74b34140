mod csv_sheet;

pub(crate) use csv_sheet::{read_sheet_csv, write_month_csv};
