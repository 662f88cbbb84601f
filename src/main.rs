mod convert;
mod event;
mod schedule;
mod ticker;

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveTime};
use clap::Parser;

use crate::event::model::{Event, EventCategory, LoadedEvents, load_event_config, resolve_events};
use crate::event::upcoming::{EventRow, visible_events};
use crate::schedule::engine::{self, DayEndStatus, EvalOutcome, Evaluation};
use crate::schedule::model::{Period, build_schedule, load_schedule_config};

#[derive(Parser, Debug)]
#[command(
    name = "schoolclock",
    version,
    about = "School-day period countdown with upcoming events"
)]
struct Cli {
    #[arg(long, default_value = "periods.json")]
    periods: PathBuf,

    #[arg(long)]
    calendar_events: Option<PathBuf>,

    #[arg(long)]
    extra_events: Option<PathBuf>,

    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    #[arg(long, default_value_t = 6)]
    event_count: usize,

    /// Early checkout time (HH:MM); moves the day-end countdown for the
    /// current day only.
    #[arg(long)]
    checkout: Option<String>,

    /// Stop after this many ticks.
    #[arg(long)]
    ticks: Option<u64>,

    #[arg(long)]
    diagnostics: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if cli.interval_ms == 0 {
        bail!("--interval-ms must be greater than zero");
    }

    let checkout = match cli.checkout.as_deref() {
        Some(text) => Some(convert::parse_clock_time(text).context("--checkout")?),
        None => None,
    };

    let now = Local::now();
    let snapshot = DaySnapshot::load(&cli, checkout, &now)?;

    if cli.diagnostics {
        print_diagnostics(&snapshot);
        return Ok(());
    }

    run_loop(cli, snapshot)
}

/// One logical day's worth of state. Replaced wholesale at rollover,
/// never mutated in place.
struct DaySnapshot {
    school: String,
    schedule: Vec<Period>,
    calendar_events: Vec<Event>,
    extra_events: Vec<Event>,
    dismissal_override: Option<DateTime<Local>>,
}

impl DaySnapshot {
    fn load(cli: &Cli, checkout: Option<NaiveTime>, now: &DateTime<Local>) -> Result<Self> {
        let config = load_schedule_config(&cli.periods)
            .with_context(|| format!("failed to load {}", cli.periods.display()))?;
        let schedule = build_schedule(&config.periods, now)
            .with_context(|| format!("failed to build schedule for {}", config.school))?;

        let calendar_events =
            load_category(cli.calendar_events.as_deref(), EventCategory::StudentCalendar)?;
        let extra_events = load_category(cli.extra_events.as_deref(), EventCategory::Extra)?;

        let dismissal_override = match checkout {
            Some(time) => Some(
                convert::resolve_today(time, now)
                    .context("--checkout time does not exist on the current day")?,
            ),
            None => None,
        };

        Ok(Self {
            school: config.school,
            schedule,
            calendar_events,
            extra_events,
            dismissal_override,
        })
    }
}

fn load_category(path: Option<&Path>, category: EventCategory) -> Result<Vec<Event>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let config = load_event_config(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    if config.category != category {
        bail!(
            "{} declares category \"{}\", expected \"{}\"",
            path.display(),
            config.category.token(),
            category.token()
        );
    }
    let LoadedEvents { events, errors } = resolve_events(&config.records);
    for error in &errors {
        eprintln!("warning: {}: {error}", path.display());
    }
    Ok(events)
}

fn run_loop(cli: Cli, mut snapshot: DaySnapshot) -> Result<()> {
    let interval = Duration::from_millis(cli.interval_ms);
    let mut remaining_ticks = cli.ticks;
    let mut last_frame = String::new();

    ticker::run(interval, move |now| {
        if remaining_ticks == Some(0) {
            return ControlFlow::Break(Ok(()));
        }
        if let Err(err) = step(&cli, &mut snapshot, &mut last_frame, &now) {
            return ControlFlow::Break(Err(err));
        }
        if let Some(ticks) = remaining_ticks.as_mut() {
            *ticks -= 1;
            if *ticks == 0 {
                return ControlFlow::Break(Ok(()));
            }
        }
        ControlFlow::Continue(())
    })
}

fn step(
    cli: &Cli,
    snapshot: &mut DaySnapshot,
    last_frame: &mut String,
    now: &DateTime<Local>,
) -> Result<()> {
    let evaluation =
        match engine::evaluate(&snapshot.schedule, snapshot.dismissal_override, *now)? {
            EvalOutcome::Ready(evaluation) => evaluation,
            EvalOutcome::RolloverPending => {
                // A checkout override applies to the day it was entered
                // for; the rebuilt snapshot starts without one.
                *snapshot = DaySnapshot::load(cli, None, now)?;
                match engine::evaluate(&snapshot.schedule, snapshot.dismissal_override, *now)? {
                    EvalOutcome::Ready(evaluation) => evaluation,
                    EvalOutcome::RolloverPending => return Ok(()),
                }
            }
        };

    let frame = render_frame(snapshot, &evaluation, cli.event_count, now);
    if frame != *last_frame {
        print!("{frame}");
        *last_frame = frame;
    }
    Ok(())
}

fn render_frame(
    snapshot: &DaySnapshot,
    evaluation: &Evaluation,
    event_count: usize,
    now: &DateTime<Local>,
) -> String {
    let mut frame = String::new();

    match &evaluation.current_period {
        Some(name) => frame.push_str(&format!("Current period: {name}\n")),
        None => frame.push_str("Current period: (before school)\n"),
    }
    frame.push_str(&format!(
        "{} left until {}\n",
        evaluation.until_next, evaluation.next_period
    ));
    match &evaluation.day_end {
        DayEndStatus::Remaining(left) => {
            frame.push_str(&format!("School day ends in {left}\n"));
        }
        DayEndStatus::Ended => frame.push_str("It's the end of the school day! \u{1F973}\n"),
    }
    frame.push_str(&format!(
        "Day progress: {:.2}%\n",
        evaluation.day_progress_percent
    ));

    push_event_table(
        &mut frame,
        "Student calendar",
        &snapshot.calendar_events,
        event_count,
        now,
    );
    push_event_table(&mut frame, "Extra", &snapshot.extra_events, event_count, now);

    frame.push('\n');
    frame
}

fn push_event_table(
    frame: &mut String,
    title: &str,
    events: &[Event],
    count: usize,
    now: &DateTime<Local>,
) {
    if events.is_empty() {
        return;
    }
    frame.push_str(&format!("\n{title}:\n"));
    for row in visible_events(events, now, count) {
        match row {
            EventRow::Entry {
                name, days_until, ..
            } => {
                let when = match days_until {
                    0 => "Today".to_string(),
                    1 => "1 day".to_string(),
                    days => format!("{days} days"),
                };
                frame.push_str(&format!("  {name:<32} {when}\n"));
            }
            EventRow::Blank => frame.push('\n'),
        }
    }
}

fn print_diagnostics(snapshot: &DaySnapshot) {
    println!(
        "Loaded schedule for {}: {} periods",
        snapshot.school,
        snapshot.schedule.len()
    );
    for period in &snapshot.schedule {
        println!(
            "  {} {} ({})",
            period.start.format("%H:%M"),
            period.name,
            period.short_name
        );
    }
    println!("Student calendar events: {}", snapshot.calendar_events.len());
    println!("Extra events: {}", snapshot.extra_events.len());
    if let Some(checkout) = snapshot.dismissal_override {
        println!("Checkout override: {}", checkout.format("%H:%M"));
    }
}
