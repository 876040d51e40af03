//! Classroom Sim - interactive console
//!
//! Loads a level, then advances it on command while the user plays the
//! teacher from the prompt.

use classroom_sim::core::error::Result;
use classroom_sim::core::types::{Location, MessId};
use classroom_sim::level::{level_path, load_level, Level, TeacherAction};
use classroom_sim::world::StaticWorld;

use std::io::{self, Write};

const TICK: f32 = 0.1;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classroom_sim=info".into()),
        )
        .init();

    let name = std::env::args().nth(1).unwrap_or_else(|| "level_01".to_string());
    let config = load_level(level_path(&name))?;
    let mut world = config.build_world();
    let mut level = Level::from_config(&config);

    println!("\n=== CLASSROOM SIM: {} ===", level.name());
    println!();
    println!("Commands:");
    println!("  tick / t                 - Advance {:.1}s", TICK);
    println!("  run <seconds>            - Advance several seconds");
    println!("  <action> <student>       - calm, stop, talk, scold, praise, seat,");
    println!("                             callback, escort, force");
    println!("  out <student> / in <student> - Move a student outside or back in");
    println!("  seated <student>         - Report a student back in their seat");
    println!("  take <student> <item>    - Confiscate an item");
    println!("  clean <mess id>          - Clean a mess");
    println!("  status / s               - Show every student");
    println!("  restart                  - Start the level over");
    println!("  quit / q                 - Exit");
    println!();

    loop {
        display_status(&level);

        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let arg = parts.next();

        match (command, arg) {
            ("quit" | "q", _) => break,
            ("tick" | "t", _) => advance(&mut level, &world, TICK),
            ("run", Some(seconds)) => match seconds.parse::<f32>() {
                Ok(seconds) => advance(&mut level, &world, seconds),
                Err(_) => println!("Usage: run <seconds>"),
            },
            ("status" | "s", _) => display_detailed_status(&level),
            ("restart", _) => {
                level.restart();
                world = config.build_world();
                println!("Level restarted.");
            }
            ("out" | "in", Some(who)) => match level.find_student(who) {
                Some(id) => {
                    let location = if command == "out" {
                        Location::Outside
                    } else {
                        Location::Inside
                    };
                    world.set_location(id, location);
                }
                None => println!("No student '{}'", who),
            },
            ("seated", Some(who)) => match level.find_student(who) {
                Some(id) => {
                    level.student_returned_to_seat(id);
                }
                None => println!("No student '{}'", who),
            },
            ("take", Some(who)) => match (level.find_student(who), parts.next()) {
                (Some(id), Some(item)) => println!("{:?}", level.confiscate(id, item)),
                _ => println!("Usage: take <student> <item>"),
            },
            ("clean", Some(raw)) => match raw.trim_start_matches("mess#").parse::<u32>() {
                Ok(n) if level.clean_mess(MessId(n)) => println!("Mess cleaned."),
                _ => println!("No open mess '{}'", raw),
            },
            (action, Some(who)) => match (action.parse::<TeacherAction>(), level.find_student(who)) {
                (Ok(action), Some(id)) => {
                    let outcome = level.apply_teacher_action(id, action);
                    println!("{} -> {:?}", action, outcome);
                }
                (Err(e), _) => println!("{}", e),
                (_, None) => println!("No student '{}'", who),
            },
            _ => println!("Unknown command."),
        }

        if let Some(outcome) = level.outcome() {
            println!("\nLevel over: {:?}", outcome);
        }
    }

    let summary = level.summary();
    println!(
        "\nGoodbye! Final disruption {:.0}, score {}, {:.1}s elapsed.",
        summary.disruption, summary.score.score, summary.elapsed
    );
    Ok(())
}

fn advance(level: &mut Level, world: &StaticWorld, seconds: f32) {
    let steps = (seconds / TICK).round().max(1.0) as u32;
    for _ in 0..steps {
        if level.tick(TICK, world).outcome.is_some() {
            break;
        }
    }
    for notification in level.drain_notifications() {
        tracing::debug!(kind = notification.label(), "{:?}", notification);
    }
}

fn display_status(level: &Level) {
    let aggregate = level.aggregate();
    let score = level.score();
    println!();
    println!(
        "--- {:.1}s | Disruption {:.0} ({}) | Outside {} | Score {} ---",
        level.elapsed(),
        aggregate.disruption(),
        aggregate.mood(),
        aggregate.outside_count(),
        score.score
    );
}

fn display_detailed_status(level: &Level) {
    let summary = level.summary();
    for student in &summary.students {
        let reaction = student
            .reaction
            .map(|r| format!(" [{:?}]", r))
            .unwrap_or_default();
        println!(
            "  {:>3} {:<10} {:<10}{} influenced by {:?}",
            student.id.0, student.name, student.state, reaction, student.influenced_by
        );
    }
    for mess in level.messes() {
        println!("  {} left by {}", mess.id, mess.creator);
    }
    println!(
        "  resolved {} | calm-downs {} | events {}",
        summary.score.problems_resolved, summary.score.calm_downs, summary.events_published
    );
}
