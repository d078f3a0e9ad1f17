use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use luna_core::calendar::weeks;
use luna_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "luna")]
#[command(about = "Menstrual cycle tracking and prediction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User to act for (defaults to the configured user)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current cycle day, phase and predictions (default)
    Status,

    /// Show a month calendar with predicted and logged days
    Calendar {
        /// Month to show as YYYY-MM (defaults to the current month)
        #[arg(long, value_parser = parse_month)]
        month: Option<(i32, u32)>,
    },

    /// Log a period
    Period {
        /// First day of the period (defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day of the period, if already over
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Flow (spotting, light, medium, heavy)
        #[arg(long, value_parser = parse_flow, default_value = "medium")]
        flow: Flow,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Log flow, symptoms or notes for a day
    Log {
        /// Day to log (defaults to today)
        date: Option<NaiveDate>,

        #[arg(long, value_parser = parse_flow)]
        flow: Option<Flow>,

        /// Symptom tag; repeat for several
        #[arg(long = "symptom")]
        symptoms: Vec<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Show recently logged periods
    History {
        /// Number of periods to show
        #[arg(long)]
        count: Option<usize>,
    },

    /// Show or change cycle settings
    Settings {
        #[arg(long)]
        cycle_length: Option<u32>,

        #[arg(long)]
        period_length: Option<u32>,

        #[arg(long)]
        notifications: Option<bool>,

        #[arg(long)]
        last_period_start: Option<NaiveDate>,
    },

    /// Export period history to CSV
    Export {
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },

    /// List known symptom tags
    Symptoms,
}

fn parse_flow(s: &str) -> std::result::Result<Flow, String> {
    s.parse::<Flow>().map_err(|e| e.to_string())
}

fn parse_month(s: &str) -> std::result::Result<(i32, u32), String> {
    let parsed = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM, got '{}'", s))?;
    Ok((parsed.year(), parsed.month()))
}

fn main() -> Result<()> {
    luna_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let user = cli
        .user
        .clone()
        .unwrap_or_else(|| config.user.default_user.clone());
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    tracing::debug!("Using data dir {:?} for user {}", data_dir, user);

    let store = FileStore::new(&data_dir);
    let tracker = CycleTracker::new(&store)
        .with_default_lengths(
            config.cycle.default_cycle_length,
            config.cycle.default_period_length,
        )?
        .with_week_start(config.calendar.week_start);

    match cli.command {
        Some(Commands::Status) | None => cmd_status(&tracker, &user, today),
        Some(Commands::Calendar { month }) => {
            let (year, month) = month.unwrap_or((today.year(), today.month()));
            cmd_calendar(&tracker, &user, year, month, today, config.calendar.week_start)
        }
        Some(Commands::Period {
            start,
            end,
            flow,
            notes,
        }) => {
            let entry = PeriodEntry {
                start_date: start.unwrap_or(today),
                end_date: end,
                flow,
                notes,
            };
            cmd_period(&tracker, &user, entry, today)
        }
        Some(Commands::Log {
            date,
            flow,
            symptoms,
            notes,
        }) => {
            let update = DailyLogUpdate {
                flow,
                symptoms: (!symptoms.is_empty()).then(|| symptoms.into_iter().collect()),
                notes,
            };
            cmd_log(&tracker, &user, date.unwrap_or(today), update)
        }
        Some(Commands::History { count }) => {
            cmd_history(&tracker, &user, count.unwrap_or(config.history.recent_count))
        }
        Some(Commands::Settings {
            cycle_length,
            period_length,
            notifications,
            last_period_start,
        }) => {
            let update = SettingsUpdate {
                average_cycle_length: cycle_length,
                average_period_length: period_length,
                notifications_enabled: notifications,
                last_period_start,
            };
            cmd_settings(&tracker, &user, update)
        }
        Some(Commands::Export { out }) => cmd_export(&store, &user, &out),
        Some(Commands::Symptoms) => {
            cmd_symptoms();
            Ok(())
        }
    }
}

fn cmd_status(tracker: &CycleTracker<FileStore>, user: &str, today: NaiveDate) -> Result<()> {
    let settings = tracker.settings(user);
    let info = compute_cycle_info(&settings, today);

    println!();
    println!(
        "  Cycle day {} of {} ({} phase)",
        info.day_of_cycle, info.cycle_length, info.current_phase
    );
    if settings.last_period_start.is_none() {
        println!("  (no period logged yet - showing an estimate)");
    }
    println!();
    println!(
        "  Next period:    {} (in {} days)",
        info.next_period_date,
        info.days_until_next_period()
    );
    println!("  Ovulation:      {}", info.ovulation_date);
    println!(
        "  Fertile window: {} to {}",
        info.fertile_window_start, info.fertile_window_end
    );
    println!();
    Ok(())
}

fn cmd_calendar(
    tracker: &CycleTracker<FileStore>,
    user: &str,
    year: i32,
    month: u32,
    today: NaiveDate,
    week_start: WeekStart,
) -> Result<()> {
    let cells = tracker.month_view(user, year, month, today);
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Err(Error::Validation(format!("invalid month {}-{:02}", year, month)));
    };

    println!();
    println!("  {}", first.format("%B %Y"));
    let header = match week_start {
        WeekStart::Sunday => "  Sun  Mon  Tue  Wed  Thu  Fri  Sat",
        WeekStart::Monday => "  Mon  Tue  Wed  Thu  Fri  Sat  Sun",
    };
    println!("{}", header);

    for week in weeks(&cells) {
        let row: String = week.iter().map(render_cell).collect();
        println!("  {}", row.trim_end());
    }

    println!();
    println!("  P logged period   p predicted period   f fertile   [ ] today");
    println!();
    Ok(())
}

fn render_cell(cell: &CalendarCell) -> String {
    let Some(day) = cell.as_day() else {
        return "     ".to_string();
    };

    let marker = match (day.is_period, day.source) {
        (true, DaySource::Logged) => 'P',
        (true, DaySource::Predicted) => 'p',
        (false, _) if day.is_fertile => 'f',
        _ => ' ',
    };

    if day.is_today {
        format!("[{:>2}{}]", day.day, marker)
    } else {
        format!(" {:>2}{} ", day.day, marker)
    }
}

fn cmd_period(
    tracker: &CycleTracker<FileStore>,
    user: &str,
    entry: PeriodEntry,
    today: NaiveDate,
) -> Result<()> {
    let start = entry.start_date;
    let id: uuid::Uuid = tracker.log_period(user, entry)?;

    println!("✓ Period logged (starting {})", start);
    println!("  id: {}", id);

    let info = tracker.cycle_info(user, today);
    println!("  Next period expected {}", info.next_period_date);
    Ok(())
}

fn cmd_log(
    tracker: &CycleTracker<FileStore>,
    user: &str,
    date: NaiveDate,
    update: DailyLogUpdate,
) -> Result<()> {
    let log = tracker.log_cycle_day(user, date, update)?;

    println!("✓ Logged {}", log.date);
    if let Some(flow) = log.flow {
        println!("  Flow: {}", flow);
    }
    if !log.symptoms.is_empty() {
        let symptoms: Vec<&str> = log.symptoms.iter().map(String::as_str).collect();
        println!("  Symptoms: {}", symptoms.join(", "));
    }
    if let Some(ref notes) = log.notes {
        println!("  Notes: {}", notes);
    }
    Ok(())
}

fn cmd_history(tracker: &CycleTracker<FileStore>, user: &str, count: usize) -> Result<()> {
    let periods = tracker.recent_periods(user, count)?;

    if periods.is_empty() {
        println!("No periods logged yet.");
        return Ok(());
    }

    println!();
    for (idx, period) in periods.iter().enumerate() {
        let end = period
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "ongoing".into());
        let gap = periods
            .get(idx + 1)
            .map(|prev| {
                let days = (period.start_date - prev.start_date).num_days();
                format!("  ({} days after previous)", days)
            })
            .unwrap_or_default();
        println!("  {} to {}  {:<8}{}", period.start_date, end, period.flow, gap);
    }
    println!();
    Ok(())
}

fn cmd_settings(
    tracker: &CycleTracker<FileStore>,
    user: &str,
    update: SettingsUpdate,
) -> Result<()> {
    let settings = if update.is_empty() {
        tracker.settings(user)
    } else {
        let settings = tracker.update_settings(user, update)?;
        println!("✓ Settings updated");
        settings
    };

    println!("  User:             {}", settings.user_id);
    println!("  Cycle length:     {} days", settings.average_cycle_length);
    println!("  Period length:    {} days", settings.average_period_length);
    println!(
        "  Last period:      {}",
        settings
            .last_period_start
            .map(|d| d.to_string())
            .unwrap_or_else(|| "not logged".into())
    );
    println!(
        "  Notifications:    {}",
        if settings.notifications_enabled { "on" } else { "off" }
    );
    Ok(())
}

fn cmd_export(store: &FileStore, user: &str, out: &std::path::Path) -> Result<()> {
    let periods = store.all_periods(user)?;
    let count = export_periods_csv(&periods, out)?;

    println!("✓ Exported {} periods", count);
    println!("  CSV: {}", out.display());
    Ok(())
}

fn cmd_symptoms() {
    let mut symptoms: Vec<_> = default_catalog().symptoms().iter().collect();
    symptoms.sort_by_key(|s| s.tag);

    for symptom in symptoms {
        println!("  {:<18} {}", symptom.tag, symptom.name);
    }
}
