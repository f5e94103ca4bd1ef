use time::OffsetDateTime;
use time::macros::format_description;

/// Current wall-clock time in the local offset.
///
/// Determining the local offset can fail (notably on Unix when more than one
/// thread is running), in which case UTC is used instead.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| {
        tracing::trace!("Local UTC offset could not be determined; falling back to UTC");
        OffsetDateTime::now_utc()
    })
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        // Only fails for years outside of 0000..=9999.
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Formats a timestamp at month/day/hour granularity (`MMDDHH`).
pub fn hourly_ident(at: OffsetDateTime) -> String {
    format!("{:02}{:02}{:02}", u8::from(at.month()), at.day(), at.hour())
}
