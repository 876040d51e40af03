//! Bundled level files load and play through

use classroom_sim::core::types::StudentId;
use classroom_sim::level::{level_path, load_level, ActionOutcome, Level, TeacherAction};
use classroom_sim::student::{BehaviorState, ReactionKind};

#[test]
fn test_level_01_loads() {
    let config = load_level(level_path("level_01")).unwrap();

    assert_eq!(config.name, "First Morning");
    assert_eq!(config.students.len(), 4);
    assert_eq!(config.triggers.len(), 3);
    assert_eq!(config.sequences.len(), 1);
    assert!(config.goal.is_some());

    let level = Level::from_config(&config);
    assert_eq!(level.roster().len(), 4);
    assert_eq!(level.triggers().len(), 3);
    assert!(level.sequences().is_active(StudentId(1)));
    assert_eq!(level.find_student("milo"), Some(StudentId(1)));
}

#[test]
fn test_level_01_sequence_settles_milo() {
    let config = load_level(level_path("level_01")).unwrap();
    let mut level = Level::from_config(&config);
    let milo = StudentId(1);

    assert_eq!(
        level.apply_teacher_action(milo, TeacherAction::Talk),
        ActionOutcome::SequenceStep { completed: false }
    );
    assert_eq!(
        level.student(milo).unwrap().reaction(),
        Some(ReactionKind::Embarrassed)
    );

    assert_eq!(
        level.apply_teacher_action(milo, TeacherAction::Calm),
        ActionOutcome::SequenceStep { completed: true }
    );
    assert_eq!(level.student(milo).unwrap().state(), BehaviorState::Calm);
    assert!(!level.sequences().is_active(milo));
}

#[test]
fn test_level_01_runs_to_an_outcome() {
    let config = load_level(level_path("level_01")).unwrap();
    let world = config.build_world();
    let mut level = Level::from_config(&config);

    for _ in 0..2500 {
        if level.is_ended() {
            break;
        }
        level.tick(0.1, &world);
    }

    assert!(level.is_ended());
    assert!(level.outcome().is_some());
    assert!(level.elapsed() <= 181.0);
}

#[test]
fn test_same_seed_same_run() {
    let config = load_level(level_path("level_01")).unwrap();
    let world = config.build_world();

    let run = || {
        let mut level = Level::from_config(&config);
        for _ in 0..600 {
            level.tick(0.1, &world);
        }
        level.summary()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_same_seed_same_event_ids() {
    let config = load_level(level_path("level_01")).unwrap();
    let world = config.build_world();

    let run = || {
        let mut level = Level::from_config(&config);
        for _ in 0..600 {
            level.tick(0.1, &world);
        }
        level
            .bus()
            .history()
            .map(|e| (e.id, e.source, e.event_type))
            .collect::<Vec<_>>()
    };

    let first = run();
    assert!(!first.is_empty());
    assert!(first.iter().all(|(id, _, _)| id.is_published()));
    assert_eq!(first, run());
}

#[test]
fn test_missing_level_is_error() {
    assert!(load_level(level_path("no_such_level")).is_err());
}
