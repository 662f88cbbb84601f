use chrono::{DateTime, Days, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use thiserror::Error;

/// Default time for date-only event strings: end of day.
pub const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 0) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid clock time {input:?}, expected 24-hour H:MM (eg. 22:06)")]
    ClockTime { input: String },
    #[error("invalid calendar date {input:?}, expected M/D/YYYY or M-D-YYYY (eg. 5/20/2026)")]
    CalendarDate { input: String },
}

/// A pattern-checked calendar date. Day range is validated against the
/// pattern only; overflow days (Feb 30) are accepted and roll into the
/// next month when resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    pub month: u32,
    pub day: u32,
    pub year: i32,
}

pub fn parse_clock_time(input: &str) -> Result<NaiveTime, FormatError> {
    NaiveTime::parse_from_str(input, "%H:%M").map_err(|_| FormatError::ClockTime {
        input: input.to_string(),
    })
}

pub fn parse_calendar_date(input: &str) -> Result<CalendarDate, FormatError> {
    let reject = || FormatError::CalendarDate {
        input: input.to_string(),
    };

    let parts: Vec<&str> = input.split(['/', '-']).collect();
    let [month_text, day_text, year_text] = parts.as_slice() else {
        return Err(reject());
    };

    let month = numeric_component(month_text, 2).ok_or_else(reject)?;
    let day = numeric_component(day_text, 2).ok_or_else(reject)?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(reject());
    }

    if year_text.len() != 4 {
        return Err(reject());
    }
    let year = numeric_component(year_text, 4).ok_or_else(reject)?;
    if year == 0 {
        return Err(reject());
    }

    Ok(CalendarDate {
        month,
        day,
        year: year as i32,
    })
}

fn numeric_component(text: &str, max_digits: usize) -> Option<u32> {
    if text.is_empty() || text.len() > max_digits || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

pub fn resolve_today(time: NaiveTime, now: &DateTime<Local>) -> Option<DateTime<Local>> {
    resolve_today_in_tz(time, now, &Local)
}

pub(crate) fn resolve_today_in_tz<Tz>(
    time: NaiveTime,
    now: &DateTime<Tz>,
    timezone: &Tz,
) -> Option<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    resolve_local_naive(timezone, now.date_naive().and_time(time))
}

pub fn resolve_on_date(date: &CalendarDate, time: NaiveTime) -> Option<DateTime<Local>> {
    resolve_on_date_in_tz(date, time, &Local)
}

pub(crate) fn resolve_on_date_in_tz<Tz>(
    date: &CalendarDate,
    time: NaiveTime,
    timezone: &Tz,
) -> Option<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    // First-of-month plus a day offset so overflow days roll forward
    // instead of being rejected.
    let first_of_month = NaiveDate::from_ymd_opt(date.year, date.month, 1)?;
    let day = first_of_month.checked_add_days(Days::new(u64::from(date.day.saturating_sub(1))))?;
    resolve_local_naive(timezone, day.and_time(time))
}

pub(crate) fn resolve_local_naive<Tz>(timezone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(first, _second) => Some(first),
        LocalResult::None => None,
    }
}
