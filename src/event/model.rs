use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use serde::Deserialize;
use thiserror::Error;

use crate::convert::{self, FormatError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EventCategory {
    #[serde(rename = "studentCalendar")]
    StudentCalendar,
    #[serde(rename = "extra")]
    Extra,
}

impl EventCategory {
    pub fn token(self) -> &'static str {
        match self {
            EventCategory::StudentCalendar => "studentCalendar",
            EventCategory::Extra => "extra",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventConfig {
    #[allow(dead_code)]
    pub version: u32,
    pub category: EventCategory,
    pub records: Vec<RawEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub special: Option<RawSpecial>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSpecial {
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub early_dismissal: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub date: DateTime<Local>,
    pub special: Option<SpecialWindow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialWindow {
    pub end_date: Option<DateTime<Local>>,
    pub early_dismissal: Option<DateTime<Local>>,
    pub time_range: Option<(DateTime<Local>, DateTime<Local>)>,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event {index}: missing required field \"{field}\"")]
    MissingField { index: usize, field: &'static str },
    #[error("event {index} ({name}): {source}")]
    InvalidDate {
        index: usize,
        name: String,
        source: FormatError,
    },
    #[error("event {index} ({name}): {date:?} does not resolve to a local date")]
    UnresolvableDate {
        index: usize,
        name: String,
        date: String,
    },
    #[error("event {index} ({name}) special window dropped: {reason}")]
    InvalidWindow {
        index: usize,
        name: String,
        reason: WindowError,
    },
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("time range {input:?} must be split using a '-'")]
    MissingRangeSeparator { input: String },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("{input:?} does not resolve to a local time")]
    Unresolvable { input: String },
}

#[derive(Debug)]
pub struct LoadedEvents {
    pub events: Vec<Event>,
    pub errors: Vec<EventError>,
}

pub fn load_event_config(path: &Path) -> Result<EventConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read event file {}", path.display()))?;
    parse_event_config_text(&content)
}

pub fn parse_event_config_text(content: &str) -> Result<EventConfig> {
    let raw = serde_json::from_str::<EventFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported event config version {}; expected version 1",
            raw.version
        );
    }

    Ok(EventConfig {
        version: raw.version,
        category: raw.category,
        records: raw.events,
    })
}

/// Per-record resolution: a bad record is rejected with its index and
/// never aborts the rest. A bad special window drops only the window;
/// the event itself survives.
pub fn resolve_events(records: &[RawEvent]) -> LoadedEvents {
    let mut events = Vec::with_capacity(records.len());
    let mut errors = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let Some(name) = record.name.as_deref().filter(|name| !name.is_empty()) else {
            errors.push(EventError::MissingField {
                index,
                field: "name",
            });
            continue;
        };
        let Some(date_text) = record.date.as_deref().filter(|date| !date.is_empty()) else {
            errors.push(EventError::MissingField {
                index,
                field: "date",
            });
            continue;
        };

        let date = match convert::parse_calendar_date(date_text) {
            Ok(date) => date,
            Err(source) => {
                errors.push(EventError::InvalidDate {
                    index,
                    name: name.to_string(),
                    source,
                });
                continue;
            }
        };
        let Some(timestamp) = convert::resolve_on_date(&date, convert::END_OF_DAY) else {
            errors.push(EventError::UnresolvableDate {
                index,
                name: name.to_string(),
                date: date_text.to_string(),
            });
            continue;
        };

        let special = match &record.special {
            Some(raw) => match resolve_special(raw, &date) {
                Ok(window) => window,
                Err(reason) => {
                    errors.push(EventError::InvalidWindow {
                        index,
                        name: name.to_string(),
                        reason,
                    });
                    None
                }
            },
            None => None,
        };

        events.push(Event {
            name: name.to_string(),
            date: timestamp,
            special,
        });
    }

    LoadedEvents { events, errors }
}

fn resolve_special(
    raw: &RawSpecial,
    event_date: &convert::CalendarDate,
) -> Result<Option<SpecialWindow>, WindowError> {
    let mut window = SpecialWindow::default();

    if let Some(text) = raw.end_date.as_deref() {
        let date = convert::parse_calendar_date(text)?;
        let resolved = convert::resolve_on_date(&date, convert::END_OF_DAY).ok_or_else(|| {
            WindowError::Unresolvable {
                input: text.to_string(),
            }
        })?;
        window.end_date = Some(resolved);
    }

    // Clock-only refinements anchor to the event's own date.
    if let Some(text) = raw.early_dismissal.as_deref() {
        let time = convert::parse_clock_time(text)?;
        let resolved =
            convert::resolve_on_date(event_date, time).ok_or_else(|| WindowError::Unresolvable {
                input: text.to_string(),
            })?;
        window.early_dismissal = Some(resolved);
    }

    if let Some(text) = raw.time.as_deref() {
        let Some((start_text, end_text)) = text.split_once('-') else {
            return Err(WindowError::MissingRangeSeparator {
                input: text.to_string(),
            });
        };
        let start_time = convert::parse_clock_time(start_text)?;
        let end_time = convert::parse_clock_time(end_text)?;
        let start = convert::resolve_on_date(event_date, start_time).ok_or_else(|| {
            WindowError::Unresolvable {
                input: text.to_string(),
            }
        })?;
        let end = convert::resolve_on_date(event_date, end_time).ok_or_else(|| {
            WindowError::Unresolvable {
                input: text.to_string(),
            }
        })?;
        window.time_range = Some((start, end));
    }

    if window == SpecialWindow::default() {
        Ok(None)
    } else {
        Ok(Some(window))
    }
}

#[derive(Debug, Deserialize)]
struct EventFile {
    version: u32,
    category: EventCategory,
    events: Vec<RawEvent>,
}
