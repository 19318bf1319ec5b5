use chrono::{DateTime, Local, TimeZone, Utc};

const MEDIUM: &str = "%b %-d, %Y, %-I:%M:%S %p";

pub fn format_date_time(at: &DateTime<Utc>) -> String {
    format_in(at, &Local)
}

pub fn format_in<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format(MEDIUM).to_string()
}

/// "1h 05m" style length of a session.
pub fn format_elapsed(from: &DateTime<Utc>, to: &DateTime<Utc>) -> String {
    let minutes = (*to - *from).num_minutes().max(0);
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}
