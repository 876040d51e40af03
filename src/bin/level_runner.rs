//! Headless Level Runner
//!
//! Plays a level with no teacher input and reports how the classroom ended up.

use classroom_sim::level::{level_path, load_level, Level, LevelSummary};
use clap::Parser;
use serde::Serialize;

/// Headless Level Runner - unattended classroom runs
#[derive(Parser, Debug)]
#[command(name = "level_runner")]
#[command(about = "Run a classroom level without intervention and report the outcome")]
struct Args {
    /// Level name (loaded from data/levels/)
    #[arg(long, default_value = "level_01")]
    level: String,

    /// Simulated seconds before stopping
    #[arg(long, default_value_t = 180.0)]
    seconds: f32,

    /// Tick length in seconds
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Random seed, overriding the level file
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Log every notification to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct RunResult {
    level: String,
    seed: u64,
    ticks: u64,
    outcome: String,
    summary: LevelSummary,
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("classroom_sim=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = match load_level(level_path(&args.level)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load level '{}': {}", args.level, e);
            std::process::exit(1);
        }
    };
    config.seed = args.seed.unwrap_or(config.seed);

    if args.dt <= 0.0 {
        eprintln!("Tick length must be positive, got {}", args.dt);
        std::process::exit(1);
    }

    let world = config.build_world();
    let mut level = Level::from_config(&config);

    if args.verbose {
        eprintln!("=== Level '{}' started (seed {}) ===", level.name(), level.seed());
        eprintln!("Students: {}", level.roster().len());
        eprintln!();
    }

    let mut ticks = 0u64;
    while level.elapsed() < args.seconds && !level.is_ended() {
        level.tick(args.dt, &world);
        ticks += 1;

        let notifications = level.drain_notifications();
        if args.verbose {
            for notification in notifications {
                eprintln!("[{:>6.1}s] {:?}", level.elapsed(), notification);
            }
        }
    }

    let outcome = match level.outcome() {
        Some(outcome) => format!("{:?}", outcome),
        None => String::from("Unfinished"),
    };

    let result = RunResult {
        level: level.name().to_string(),
        seed: level.seed(),
        ticks,
        outcome,
        summary: level.summary(),
    };

    match args.format.as_str() {
        "text" => print_text(&result),
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Failed to serialize result: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn print_text(result: &RunResult) {
    let summary = &result.summary;
    println!("Level Result");
    println!("============");
    println!("Level: {}", result.level);
    println!("Outcome: {}", result.outcome);
    println!("Elapsed: {:.1}s over {} ticks", summary.elapsed, result.ticks);
    println!("Disruption: {:.1} ({})", summary.disruption, summary.mood);
    println!("Outside: {}", summary.outside.len());
    println!("Open messes: {}", summary.open_messes);
    println!("Score: {}", summary.score.score);
    println!();
    for student in &summary.students {
        println!(
            "  {} {}: {} ({} unresolved influences)",
            student.id, student.name, student.state, student.unresolved_influences
        );
    }
    println!();
    println!("Seed: {}", result.seed);
}
