use time::OffsetDateTime;
use time::macros::format_description;

/// Format a timestamp as an ISO calendar date, `YYYY-MM-DD`.
pub fn iso_date(datetime: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]");
    datetime
        .date()
        .format(format)
        .unwrap_or_else(|_| datetime.date().to_string())
}

/// Today's UTC date as `YYYY-MM-DD`.
pub fn today() -> String {
    iso_date(OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_calendar_date() {
        assert_eq!(iso_date(datetime!(2024-03-07 23:59:59 UTC)), "2024-03-07");
    }

    #[test]
    fn today_has_iso_shape() {
        let today = today();
        assert_eq!(today.len(), 10);
        assert_eq!(today.as_bytes()[4], b'-');
        assert_eq!(today.as_bytes()[7], b'-');
    }
}
