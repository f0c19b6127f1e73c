//! seventyfive CLI - Command-line interface for the 75-day challenge engine
//!
//! Commands:
//! - start / reset: begin or clear a challenge
//! - status: show the challenge summary
//! - complete / advance / sync / baselines: update progress
//! - targets: preview daily targets
//! - simulate: run a synthetic workout through the rep counter
//! - config: print the effective engine configuration

use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use seventyfive::config::DEFAULT_CONFIG_FILE;
use seventyfive::targets::{self, schedule};
use seventyfive::{
    format_date, parse_date, simulate_workout, Baselines, ChallengeError, ChallengeState,
    ChallengeStore, ChallengeSummary, EngineConfig, ExerciseType, JsonFileStore, WorkoutPipeline,
    ENGINE_VERSION,
};

/// seventyfive - 75-day bodyweight challenge tracker with pose-based rep counting
#[derive(Parser)]
#[command(name = "seventyfive")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Track a 75-day push-up, squat, sit-up and plank challenge", long_about = None)]
struct Cli {
    /// Challenge state file
    #[arg(long, global = true, default_value = "seventyfive.json")]
    state: PathBuf,

    /// Engine config file (TOML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override today's date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new challenge today
    Start {
        #[command(flatten)]
        baselines: BaselineArgs,
    },

    /// Show challenge status
    Status,

    /// Mark an exercise completed
    Complete {
        /// pushups, squats, situps or planks
        exercise: ExerciseType,

        /// Reps (or plank seconds) done; defaults to the day's target
        #[arg(long)]
        count: Option<u32>,

        /// Date to record against (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Advance to the next challenge day
    Advance,

    /// Recompute the current day from the calendar
    Sync,

    /// Update baselines (regenerates today's targets)
    Baselines {
        #[command(flatten)]
        baselines: OptionalBaselineArgs,
    },

    /// Reset the challenge to its initial state
    Reset,

    /// Print daily targets
    Targets {
        /// Day to show (defaults to the current day)
        #[arg(long)]
        day: Option<u32>,

        /// Print the full 75-day schedule
        #[arg(long, conflicts_with = "day")]
        all: bool,
    },

    /// Run a synthetic workout through the rep counter
    Simulate {
        exercise: ExerciseType,

        /// Target reps or seconds (defaults to today's target)
        #[arg(long)]
        target: Option<u32>,

        /// Record the exercise as completed if the target is reached
        #[arg(long)]
        record: bool,
    },

    /// Print the effective engine configuration
    Config,
}

#[derive(clap::Args)]
struct BaselineArgs {
    #[arg(long, default_value_t = 10)]
    pushups: u32,
    #[arg(long, default_value_t = 15)]
    squats: u32,
    #[arg(long, default_value_t = 10)]
    situps: u32,
    /// Plank hold in seconds
    #[arg(long, default_value_t = 30)]
    planks: u32,
}

impl From<BaselineArgs> for Baselines {
    fn from(args: BaselineArgs) -> Self {
        Baselines {
            pushups: args.pushups,
            squats: args.squats,
            situps: args.situps,
            planks: args.planks,
        }
    }
}

#[derive(clap::Args)]
struct OptionalBaselineArgs {
    #[arg(long)]
    pushups: Option<u32>,
    #[arg(long)]
    squats: Option<u32>,
    #[arg(long)]
    situps: Option<u32>,
    /// Plank hold in seconds
    #[arg(long)]
    planks: Option<u32>,
}

impl OptionalBaselineArgs {
    fn apply(&self, current: Baselines) -> Baselines {
        Baselines {
            pushups: self.pushups.unwrap_or(current.pushups),
            squats: self.squats.unwrap_or(current.squats),
            situps: self.situps.unwrap_or(current.situps),
            planks: self.planks.unwrap_or(current.planks),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), ChallengeError> {
    let today = match cli.today.as_deref() {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    let mut store = JsonFileStore::new(&cli.state);
    let ctx = Context {
        today,
        json: cli.json,
        config_path: cli.config,
    };

    match cli.command {
        Commands::Start { baselines } => cmd_start(&ctx, &mut store, baselines.into()),
        Commands::Status => cmd_status(&ctx, &store),
        Commands::Complete {
            exercise,
            count,
            date,
        } => cmd_complete(&ctx, &mut store, exercise, count, date.as_deref()),
        Commands::Advance => cmd_advance(&ctx, &mut store),
        Commands::Sync => cmd_sync(&ctx, &mut store),
        Commands::Baselines { baselines } => cmd_baselines(&ctx, &mut store, &baselines),
        Commands::Reset => cmd_reset(&ctx, &mut store),
        Commands::Targets { day, all } => cmd_targets(&ctx, &store, day, all),
        Commands::Simulate {
            exercise,
            target,
            record,
        } => cmd_simulate(&ctx, &mut store, exercise, target, record),
        Commands::Config => cmd_config(&ctx),
    }
}

struct Context {
    today: NaiveDate,
    json: bool,
    config_path: PathBuf,
}

fn cmd_start(
    ctx: &Context,
    store: &mut JsonFileStore,
    baselines: Baselines,
) -> Result<(), ChallengeError> {
    let mut state = store.load_or_default()?;
    state.start_challenge(baselines, ctx.today)?;
    store.save_state(&state)?;
    print_summary(ctx, &state.summary(ctx.today))
}

fn cmd_status(ctx: &Context, store: &JsonFileStore) -> Result<(), ChallengeError> {
    let state = store.load_or_default()?;
    print_summary(ctx, &state.summary(ctx.today))
}

fn cmd_complete(
    ctx: &Context,
    store: &mut JsonFileStore,
    exercise: ExerciseType,
    count: Option<u32>,
    date: Option<&str>,
) -> Result<(), ChallengeError> {
    let date = match date {
        Some(s) => parse_date(s)?,
        None => ctx.today,
    };
    let mut state = store.load_or_default()?;
    let count = count.unwrap_or_else(|| target_for_date(&state, date, exercise));

    let outcome = state.complete_exercise(date, exercise, count)?;
    store.save_state(&state)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "{} done for {}: {} {}",
            exercise.display_name(),
            format_date(date),
            count,
            exercise.unit().as_str()
        );
        if outcome.day_counted {
            println!(
                "All exercises complete! Streak: {} (best {})",
                outcome.current_streak, outcome.best_streak
            );
        }
        if outcome.challenge_completed {
            println!("Congratulations, you finished the 75-day challenge!");
        }
    }
    Ok(())
}

/// Target already fixed on the date's record, or today's target if none exists yet
fn target_for_date(state: &ChallengeState, date: NaiveDate, exercise: ExerciseType) -> u32 {
    state
        .progress_for(date)
        .and_then(|p| p.exercise(exercise))
        .map(|p| p.target)
        .unwrap_or_else(|| state.current_targets().get(exercise))
}

fn cmd_advance(ctx: &Context, store: &mut JsonFileStore) -> Result<(), ChallengeError> {
    let mut state = store.load_or_default()?;
    state.advance_day()?;
    store.save_state(&state)?;
    print_summary(ctx, &state.summary(ctx.today))
}

fn cmd_sync(ctx: &Context, store: &mut JsonFileStore) -> Result<(), ChallengeError> {
    let mut state = store.load_or_default()?;
    state.sync_current_day(ctx.today)?;
    store.save_state(&state)?;
    print_summary(ctx, &state.summary(ctx.today))
}

fn cmd_baselines(
    ctx: &Context,
    store: &mut JsonFileStore,
    args: &OptionalBaselineArgs,
) -> Result<(), ChallengeError> {
    let mut state = store.load_or_default()?;
    let baselines = args.apply(state.baselines);
    state.update_baselines(baselines, ctx.today)?;
    store.save_state(&state)?;
    print_summary(ctx, &state.summary(ctx.today))
}

fn cmd_reset(ctx: &Context, store: &mut JsonFileStore) -> Result<(), ChallengeError> {
    let mut state = store.load_or_default()?;
    state.reset();
    store.save_state(&state)?;
    print_summary(ctx, &state.summary(ctx.today))
}

fn cmd_targets(
    ctx: &Context,
    store: &JsonFileStore,
    day: Option<u32>,
    all: bool,
) -> Result<(), ChallengeError> {
    let state = store.load_or_default()?;
    let rows = if all {
        schedule(&state.baselines)
    } else {
        vec![targets::daily_targets(
            &state.baselines,
            day.unwrap_or(state.current_day),
        )]
    };

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!(
            "{:>4}  {:>8}  {:>6}  {:>7}  {:>9}",
            "Day", "Push-ups", "Squats", "Sit-ups", "Plank (s)"
        );
        for row in rows {
            println!(
                "{:>4}  {:>8}  {:>6}  {:>7}  {:>9}",
                row.day, row.pushups, row.squats, row.situps, row.planks
            );
        }
    }
    Ok(())
}

fn cmd_simulate(
    ctx: &Context,
    store: &mut JsonFileStore,
    exercise: ExerciseType,
    target: Option<u32>,
    record: bool,
) -> Result<(), ChallengeError> {
    let config = EngineConfig::load(&ctx.config_path)?;
    let mut state = store.load_or_default()?;
    let target = target.unwrap_or_else(|| target_for_date(&state, ctx.today, exercise));

    let summary = simulate_workout(&config, exercise, target, Utc::now());

    let outcome = if record {
        let outcome = WorkoutPipeline::record(&mut state, ctx.today, &summary)?;
        store.save_state(&state)?;
        outcome
    } else {
        None
    };

    if ctx.json {
        let payload = serde_json::json!({
            "workout": summary,
            "completion": outcome,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{}: {}/{} {} ({} frames, {} with good form)",
            exercise.display_name(),
            summary.achieved,
            summary.target,
            summary.unit.as_str(),
            summary.frames_processed,
            summary.valid_frames
        );
        match outcome {
            Some(o) if o.day_counted => println!(
                "Recorded. All exercises complete! Streak: {}",
                o.current_streak
            ),
            Some(_) => println!("Recorded for {}", format_date(ctx.today)),
            None if record => println!("Target not reached; nothing recorded"),
            None => {}
        }
    }
    Ok(())
}

fn cmd_config(ctx: &Context) -> Result<(), ChallengeError> {
    let config = EngineConfig::load(&ctx.config_path)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", config.to_toml_string()?);
    }
    Ok(())
}

fn print_summary(ctx: &Context, summary: &ChallengeSummary) -> Result<(), ChallengeError> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("75-Day Challenge");
    println!("================");
    println!("Status:   {:?}", summary.status);
    if let Some(start) = summary.start_date {
        println!("Started:  {}", format_date(start));
    }
    println!(
        "Day:      {} of {} ({} remaining)",
        summary.current_day,
        targets::CHALLENGE_DAYS,
        summary.days_remaining
    );
    println!(
        "Streak:   {} (best {})",
        summary.current_streak, summary.best_streak
    );
    println!(
        "Complete: {} days ({:.1}%)",
        summary.total_days_completed, summary.completion_percentage
    );

    println!("\nToday:");
    for exercise in ExerciseType::ALL {
        let target = summary.targets.get(exercise);
        let done = summary
            .today
            .as_ref()
            .and_then(|p| p.exercise(exercise))
            .is_some_and(|p| p.completed);
        println!(
            "  [{}] {:<9} {} {}",
            if done { "x" } else { " " },
            exercise.display_name(),
            target,
            exercise.unit().as_str()
        );
    }
    Ok(())
}

// Error types

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ChallengeError> for CliError {
    fn from(e: ChallengeError) -> Self {
        let (code, hint) = match &e {
            ChallengeError::SessionNotStarted(_) => ("SESSION_NOT_STARTED", None),
            ChallengeError::ChallengeInactive => (
                "CHALLENGE_INACTIVE",
                Some("Run 'seventyfive start' first"),
            ),
            ChallengeError::ChallengeCompleted => (
                "CHALLENGE_COMPLETED",
                Some("Run 'seventyfive reset' to begin a new challenge"),
            ),
            ChallengeError::InvalidBaseline(_) => (
                "INVALID_BASELINE",
                Some("Baselines must be at least 1"),
            ),
            ChallengeError::UnknownExercise(_) => (
                "UNKNOWN_EXERCISE",
                Some("Use pushups, squats, situps or planks"),
            ),
            ChallengeError::DateParseError(_) => ("DATE_PARSE_ERROR", Some("Use YYYY-MM-DD")),
            ChallengeError::ConfigError(_) | ChallengeError::TomlError(_) => (
                "CONFIG_ERROR",
                Some("Check the config file; 'seventyfive config' prints the defaults"),
            ),
            ChallengeError::JsonError(_) => (
                "JSON_ERROR",
                Some("The state file may be corrupt; check its JSON syntax"),
            ),
            ChallengeError::IoError(_) => ("IO_ERROR", Some("Check file paths and permissions")),
        };

        CliError {
            code: code.to_string(),
            message: e.to_string(),
            hint: hint.map(str::to_string),
        }
    }
}
