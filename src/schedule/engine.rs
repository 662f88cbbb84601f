use chrono::{DateTime, Days, Local, TimeDelta};

use crate::schedule::model::{
    MIN_SCHEDULE_LEN, Period, ScheduleError, current_period_index, next_period_index,
};

#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    /// The calendar day has advanced past the day the schedule was built
    /// for; the caller must rebuild its snapshot (and drop any held
    /// checkout override) before asking again.
    RolloverPending,
    Ready(Evaluation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub current_period: Option<String>,
    pub next_period: String,
    pub until_next: String,
    pub day_end: DayEndStatus,
    pub day_progress_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayEndStatus {
    Remaining(String),
    Ended,
}

/// Pure function of `(schedule, dismissal_override, now)`; the override
/// moves only the day-end countdown, never the period lookups or the
/// progress window.
pub fn evaluate(
    schedule: &[Period],
    dismissal_override: Option<DateTime<Local>>,
    now: DateTime<Local>,
) -> Result<EvalOutcome, ScheduleError> {
    if schedule.len() < MIN_SCHEDULE_LEN {
        return Err(ScheduleError::TooShort {
            len: schedule.len(),
        });
    }

    if now.date_naive() > schedule[0].start.date_naive() {
        return Ok(EvalOutcome::RolloverPending);
    }

    let current = current_period_index(schedule, &now);
    let next = next_period_index(schedule, current);
    let wrapped = matches!(current, Some(index) if index == schedule.len() - 1);
    // Past the last entry the countdown targets tomorrow's first entry,
    // not today's (already elapsed) one.
    let next_start = if wrapped {
        schedule[0]
            .start
            .checked_add_days(Days::new(1))
            .unwrap_or(schedule[0].start)
    } else {
        schedule[next].start
    };

    let dismissal = schedule[schedule.len() - 2].start;
    let day_end_boundary = dismissal_override.unwrap_or(dismissal);
    let day_end = if now < day_end_boundary {
        DayEndStatus::Remaining(format_time_left(day_end_boundary - now))
    } else {
        DayEndStatus::Ended
    };

    let first_period = schedule[1].start;
    let window_ms = (dismissal - first_period).num_milliseconds();
    if window_ms <= 0 {
        return Err(ScheduleError::EmptyProgressWindow);
    }
    let elapsed_ms = (now - first_period).num_milliseconds();
    let day_progress_percent = ((elapsed_ms as f64 / window_ms as f64) * 100.0).clamp(0.0, 100.0);

    Ok(EvalOutcome::Ready(Evaluation {
        current_period: current.map(|index| schedule[index].name.clone()),
        next_period: schedule[next].name.clone(),
        until_next: format_time_left(next_start - now),
        day_end,
        day_progress_percent,
    }))
}

/// Whole hours, minutes, and seconds, each pluralized, with zero-valued
/// higher units omitted. Seconds are always present.
pub fn format_time_left(left: TimeDelta) -> String {
    let total_seconds = left.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut text = String::new();
    if hours > 0 {
        text.push_str(&format!("{hours} hour{} and ", plural(hours)));
    }
    if minutes > 0 {
        text.push_str(&format!("{minutes} minute{} and ", plural(minutes)));
    }
    text.push_str(&format!("{seconds} second{}", plural(seconds)));
    text
}

fn plural(value: i64) -> &'static str {
    if value == 1 { "" } else { "s" }
}
