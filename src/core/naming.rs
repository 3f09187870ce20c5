use chrono::{DateTime, TimeZone};

const FILENAME_FORMAT: &str = "%Y%m%d-%H%M%S%3f";

/// `yyyyMMdd-HHmmssSSS.csv` for the given instant. Runs started in the same
/// millisecond share a name.
pub fn csv_file_name<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}.csv", at.format(FILENAME_FORMAT))
}
