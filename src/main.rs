use anyhow::Context;
use bingo_tracker::config::{AdminArgs, BingoCommand, TrackerCommand, WeightCommand};
use bingo_tracker::core::report::{leaderboard, render_table, write_csv};
use bingo_tracker::core::weight::{calculate_bmi, date_key, parse_date_key, BmiCategory, MonthView};
use bingo_tracker::domain::model::{Position, Student};
use bingo_tracker::domain::ports::{Celebration, ConfigProvider};
use bingo_tracker::utils::{logger, validation::Validate};
use bingo_tracker::{
    BingoTracker, CliConfig, Command, CommandOutcome, HttpSync, LocalStorage, Settings,
    SlotKeys, TrackerError, WeightLog,
};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Terminal stand-in for the confetti.
struct Cheer;

impl Celebration for Cheer {
    fn celebrate(&self, student: &Student, lines: usize) {
        println!("🎉 BINGO! {} now has {} line(s)! \u{7}", student.name, lines);
    }
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<TrackerError>() {
            Some(err) => {
                tracing::error!("❌ {} (exit code {})", err, err.exit_code());
                eprintln!("❌ {}", err.user_friendly_message());
                eprintln!("💡 {}", err.recovery_suggestion());
                std::process::exit(err.exit_code());
            }
            None => {
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: CliConfig) -> anyhow::Result<()> {
    let settings = Settings::load(&cli.config, cli.config_required(), cli.overrides())?;
    settings.validate()?;
    tracing::debug!("Settings: {:?}", settings);

    let storage = LocalStorage::new(settings.data_dir().to_string());

    match cli.command {
        TrackerCommand::Weight(command) => run_weight(command, &settings, storage).await,
        TrackerCommand::Bingo(command) => run_bingo(command, &settings, storage).await,
    }
}

async fn run_bingo(
    command: BingoCommand,
    settings: &Settings,
    storage: LocalStorage,
) -> anyhow::Result<()> {
    let keys = SlotKeys::for_class(settings.class_id());
    let mut tracker = BingoTracker::open(storage, keys, settings.default_password())
        .await?
        .with_celebration(Cheer);

    match command {
        BingoCommand::List => {
            println!("{}", render_table(tracker.students(), settings.class_name()));
        }
        BingoCommand::Map { student } => {
            let id = tracker.resolve(&student).map(|s| s.id.clone());
            if id.is_none() {
                eprintln!("No student matches '{}'", student);
            }
            print!("{}", tracker.map_for(id.as_ref()).render());
        }
        BingoCommand::Export { path } => {
            let rows = leaderboard(tracker.students());
            let file = std::fs::File::create(&path)
                .with_context(|| format!("cannot create {}", path))?;
            write_csv(&rows, file)?;
            println!("📁 Wrote {} rows to {}", rows.len(), path);
        }
        BingoCommand::Add { name, admin } => {
            if !authenticate(&mut tracker, &admin)? {
                return Ok(());
            }
            report(tracker.execute(Command::Add { name }).await?);
        }
        BingoCommand::Remove { student, yes, admin } => {
            if !authenticate(&mut tracker, &admin)? {
                return Ok(());
            }
            let Some(target) = tracker.resolve(&student).cloned() else {
                eprintln!("No student matches '{}'", student);
                return Ok(());
            };
            let confirmed =
                yes || confirm(&format!("Are you sure you want to remove {}?", target.name))?;
            let outcome = tracker
                .execute(Command::Remove { id: target.id, confirmed })
                .await?;
            report(outcome);
        }
        BingoCommand::Inc { student, position, admin } => {
            adjust(&mut tracker, &student, position, &admin, true).await?;
        }
        BingoCommand::Dec { student, position, admin } => {
            adjust(&mut tracker, &student, position, &admin, false).await?;
        }
        BingoCommand::Import { file, admin } => {
            if !authenticate(&mut tracker, &admin)? {
                return Ok(());
            }
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file))?;
            report(tracker.execute(Command::Import { text }).await?);
        }
        BingoCommand::Passwd {
            current_password,
            new_password,
            admin,
        } => {
            if !authenticate(&mut tracker, &admin)? {
                return Ok(());
            }
            let Some(current) = secret_or_prompt(current_password, "Enter Current Password")? else {
                return Ok(());
            };
            let Some(new_secret) = secret_or_prompt(new_password, "Enter New Password")? else {
                return Ok(());
            };
            if tracker.change_secret(&current, &new_secret).await? {
                println!("Password changed successfully.");
            }
        }
    }
    Ok(())
}

async fn adjust(
    tracker: &mut BingoTracker<LocalStorage>,
    student: &str,
    position: u8,
    admin: &AdminArgs,
    increment: bool,
) -> anyhow::Result<()> {
    let position = Position::try_from(position)?;
    if !authenticate(tracker, admin)? {
        return Ok(());
    }
    let Some(id) = tracker.resolve(student).map(|s| s.id.clone()) else {
        eprintln!("No student matches '{}'", student);
        return Ok(());
    };
    let command = if increment {
        Command::Increment { id: id.clone(), position }
    } else {
        Command::Decrement { id: id.clone(), position }
    };
    report(tracker.execute(command).await?);
    print!("{}", tracker.map_for(Some(&id)).render());
    Ok(())
}

async fn run_weight(
    command: WeightCommand,
    settings: &Settings,
    storage: LocalStorage,
) -> anyhow::Result<()> {
    let mut log = WeightLog::open(storage, settings.height_cm()).await?;
    if let Some(endpoint) = settings.sync_endpoint() {
        log = log.with_backend(Arc::new(HttpSync::new(endpoint, settings.sync_timeout())?));
    }
    let today = Local::now().date_naive();

    match command {
        WeightCommand::Set { date, kg } => {
            let day = parse_date_key(&date).ok_or_else(|| TrackerError::ValidationError {
                message: format!("'{}' is not a YYYY-MM-DD date", date),
            })?;
            let weight = kg.trim().parse::<f64>().ok();
            let pending = log.record(day, weight).await?;
            match log.entry(day) {
                Some(entry) => println!(
                    "{}: {}kg, BMI {:.1} ({})",
                    date_key(day),
                    entry.weight,
                    entry.bmi,
                    BmiCategory::classify(entry.bmi).label()
                ),
                None => println!("{}: cleared", date_key(day)),
            }
            if let Some(handle) = pending {
                println!("{}", log.sync_status());
                println!("{}", log.wait_for_push(handle, settings.sync_timeout()).await);
            }
        }
        WeightCommand::Show { month } => {
            let (year, month) = match month {
                Some(m) => parse_month(&m)?,
                None => (today.year(), today.month()),
            };
            let view = MonthView::build(year, month, today, settings.target_date(), log.entries())
                .ok_or_else(|| TrackerError::ValidationError {
                    message: format!("{}-{:02} is not a month", year, month),
                })?;
            println!("{}", view.render());
        }
        WeightCommand::Bmi { kg } => match calculate_bmi(kg, settings.height_cm()) {
            Some(bmi) => {
                let category = BmiCategory::classify(bmi);
                println!("BMI {:.1} {} ({})", bmi, category.label(), category.color());
            }
            None => println!("BMI -- --"),
        },
        WeightCommand::Sync => {
            let merged = log.sync_from_remote().await?;
            println!("☁️ Merged {} remote entries ({})", merged, log.sync_status());
        }
    }
    Ok(())
}

fn parse_month(value: &str) -> Result<(i32, u32), TrackerError> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|_| TrackerError::ValidationError {
            message: format!("'{}' is not a YYYY-MM month", value),
        })?;
    Ok((first.year(), first.month()))
}

fn report(outcome: CommandOutcome) {
    match outcome {
        CommandOutcome::Refused => println!("Read-only mode: log in as admin first."),
        CommandOutcome::NeedsConfirmation => println!("Nothing removed."),
        CommandOutcome::UnknownStudent => println!("No such student."),
        CommandOutcome::Unchanged => println!("Nothing changed."),
        CommandOutcome::Added(id) => println!("✅ Added student {}", id),
        CommandOutcome::Removed => println!("✅ Student removed"),
        CommandOutcome::Counted { count, lines_after, .. } => {
            println!("Count is now {} ({} line(s))", count, lines_after)
        }
        CommandOutcome::Imported(n) => println!("Successfully imported {} students.", n),
    }
}

/// Interactive admin challenge. `Ok(false)` means the user cancelled.
fn authenticate(
    tracker: &mut BingoTracker<LocalStorage>,
    admin: &AdminArgs,
) -> anyhow::Result<bool> {
    let Some(secret) = secret_from(admin, "Enter Admin Password")? else {
        return Ok(false);
    };
    tracker.login(&secret)?;
    Ok(true)
}

fn secret_from(admin: &AdminArgs, title: &str) -> anyhow::Result<Option<String>> {
    secret_or_prompt(admin.password.clone(), title)
}

fn secret_or_prompt(given: Option<String>, title: &str) -> anyhow::Result<Option<String>> {
    match given {
        Some(p) => Ok(Some(p)),
        None => prompt(title),
    }
}

/// Blank input or end of input reads as cancel.
fn prompt(title: &str) -> anyhow::Result<Option<String>> {
    print!("{}: ", title);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    Ok((!line.is_empty()).then_some(line))
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    Ok(matches!(
        prompt(&format!("{} [y/N]", question))?.as_deref().map(str::trim),
        Some("y") | Some("Y") | Some("yes")
    ))
}
