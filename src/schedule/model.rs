use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveTime};
use serde::Deserialize;
use thiserror::Error;

use crate::convert;

/// Smallest usable schedule: a leading sentinel, at least one real
/// period, the dismissal boundary, and a trailing end-of-day entry.
pub const MIN_SCHEDULE_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    #[allow(dead_code)]
    pub version: u32,
    pub school: String,
    pub periods: Vec<PeriodDef>,
}

#[derive(Debug, Clone)]
pub struct PeriodDef {
    pub name: String,
    pub short_name: String,
    pub start: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub name: String,
    pub short_name: String,
    pub start: DateTime<Local>,
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("schedule needs at least {} entries, got {len}", MIN_SCHEDULE_LEN)]
    TooShort { len: usize },
    #[error("schedule entry {index} ({name}) starts earlier than the entry before it")]
    OutOfOrder { index: usize, name: String },
    #[error("schedule entry {index} ({name}): {start} does not exist on the current day")]
    Unresolvable {
        index: usize,
        name: String,
        start: NaiveTime,
    },
    #[error("dismissal boundary must come after the first period start")]
    EmptyProgressWindow,
}

pub fn load_schedule_config(path: &Path) -> Result<ScheduleConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read schedule file {}", path.display()))?;
    parse_schedule_config_text(&content)
}

pub fn parse_schedule_config_text(content: &str) -> Result<ScheduleConfig> {
    let raw = serde_json::from_str::<ScheduleFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported schedule config version {}; expected version 1",
            raw.version
        );
    }
    if raw.school.is_empty() {
        bail!("schedule config must name a school");
    }

    let mut periods = Vec::with_capacity(raw.periods.len());
    for period in raw.periods {
        let start = convert::parse_clock_time(&period.start)
            .with_context(|| format!("period '{}'", period.name))?;
        periods.push(PeriodDef {
            name: period.name,
            short_name: period.short,
            start,
        });
    }

    Ok(ScheduleConfig {
        version: raw.version,
        school: raw.school,
        periods,
    })
}

/// Resolves each definition against `now`'s calendar date, preserving
/// input order. Misordered definitions are an error, never silently
/// sorted.
pub fn build_schedule(
    defs: &[PeriodDef],
    now: &DateTime<Local>,
) -> Result<Vec<Period>, ScheduleError> {
    if defs.len() < MIN_SCHEDULE_LEN {
        return Err(ScheduleError::TooShort { len: defs.len() });
    }

    let mut schedule: Vec<Period> = Vec::with_capacity(defs.len());
    for (index, def) in defs.iter().enumerate() {
        let start =
            convert::resolve_today(def.start, now).ok_or_else(|| ScheduleError::Unresolvable {
                index,
                name: def.name.clone(),
                start: def.start,
            })?;
        if let Some(previous) = schedule.last()
            && start < previous.start
        {
            return Err(ScheduleError::OutOfOrder {
                index,
                name: def.name.clone(),
            });
        }
        schedule.push(Period {
            name: def.name.clone(),
            short_name: def.short_name.clone(),
            start,
        });
    }

    if schedule[schedule.len() - 2].start <= schedule[1].start {
        return Err(ScheduleError::EmptyProgressWindow);
    }

    Ok(schedule)
}

/// Greatest index whose start is at or before `now`; `None` before the
/// first entry. A period is current the instant it starts.
pub fn current_period_index(schedule: &[Period], now: &DateTime<Local>) -> Option<usize> {
    schedule
        .partition_point(|period| period.start <= *now)
        .checked_sub(1)
}

/// Index after `current`, wrapping to the first entry at the end of the
/// schedule (and before the first entry has started).
pub fn next_period_index(schedule: &[Period], current: Option<usize>) -> usize {
    match current {
        Some(index) if index + 1 < schedule.len() => index + 1,
        _ => 0,
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleFile {
    version: u32,
    school: String,
    periods: Vec<PeriodFile>,
}

#[derive(Debug, Deserialize)]
struct PeriodFile {
    name: String,
    short: String,
    start: String,
}
