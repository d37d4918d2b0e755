use velo::config::Mode;
use velo::engine::{Engine, EXTRAS_CEILING, Status};
use velo::input::EngineInput;
use velo::keystroke::CharOutcome;
use velo::passages::SourceText;
use velo::store::{MemoryStore, SessionStore, SqliteStore};
use velo::word_stats;

fn engine(text: &str, mode: Mode) -> Engine {
    Engine::new(SourceText::custom(text.to_string()), mode)
}

fn type_str(e: &mut Engine, s: &str) {
    for c in s.chars() {
        e.apply(EngineInput::Char(c));
    }
}

#[test]
fn full_passage_session_reaches_the_store() {
    let mut e = engine("hello world", Mode::Passage);
    type_str(&mut e, "hello world");
    assert_eq!(e.status(), Status::Finished);

    let record = e.record().expect("finished session produces a record");
    assert_eq!(record.accuracy, 100);
    assert_eq!(record.error_count, 0);
    assert_eq!(record.char_count, 11);

    let mut store = MemoryStore::default();
    let id = store.save(record).unwrap();
    assert_eq!(id, 1);
    let best = store.personal_best(&Mode::Passage).unwrap().unwrap();
    assert_eq!(best.wpm, record.wpm);
}

#[test]
fn session_with_corrections_matches_hand_computed_metrics() {
    // "hello": h, x, backspace, e, l, l, o
    let mut e = engine("hello", Mode::Passage);
    e.apply(EngineInput::Char('h'));
    e.apply(EngineInput::Char('x'));
    e.apply(EngineInput::Backspace);
    type_str(&mut e, "ello");

    assert_eq!(e.status(), Status::Finished);
    assert_eq!(e.cursor(), 5);
    let states = e.char_states();
    assert!(states.iter().all(|s| s.outcome == CharOutcome::Correct));

    let record = e.record().unwrap();
    // 5 correct of 6 attempts; the backspace is counted by raw only
    assert_eq!(record.accuracy, 83);
    assert_eq!(record.char_count, 6);
    assert_eq!(record.error_count, 1);
    assert_eq!(record.keystrokes.len(), 7);
    assert!(record.raw_wpm >= record.wpm);
}

#[test]
fn countdown_force_finishes_mid_word() {
    let mut e = engine("some words that will not be completed", Mode::Timed(1));
    type_str(&mut e, "some wo");
    assert_eq!(e.status(), Status::Typing);

    std::thread::sleep(std::time::Duration::from_millis(1100));
    e.tick();

    assert_eq!(e.status(), Status::Finished);
    let record = e.record().unwrap();
    assert!(record.duration_ms >= 1000);
    assert_eq!(record.char_count, 7);
}

#[test]
fn pause_survives_into_the_final_duration() {
    let mut e = engine("abcdef", Mode::Passage);
    type_str(&mut e, "abc");
    e.pause();
    let frozen = e.elapsed_ms();
    std::thread::sleep(std::time::Duration::from_millis(120));
    assert_eq!(e.elapsed_ms(), frozen);
    e.resume();
    type_str(&mut e, "def");
    assert_eq!(e.status(), Status::Finished);
    // the paused 120ms must not be part of the session duration
    assert!(e.record().unwrap().duration_ms < 100);
}

#[test]
fn skip_and_lock_interact_correctly_over_a_long_run() {
    let mut e = engine("one two three", Mode::Passage);
    // perfect first word seals it
    type_str(&mut e, "one ");
    assert_eq!(e.locked_cursor(), 4);

    // half-type the second word, then skip out of it
    type_str(&mut e, "tw");
    e.apply(EngineInput::Char(' '));
    assert_eq!(e.cursor(), 8);

    // reversing the skip lands exactly where the jump began
    e.apply(EngineInput::Backspace);
    assert_eq!(e.cursor(), 6);

    // word-delete clamps at the lock, not the word boundary
    e.apply(EngineInput::WordBackspace);
    assert_eq!(e.cursor(), 4);
    for _ in 0..5 {
        e.apply(EngineInput::Backspace);
    }
    assert_eq!(e.cursor(), 4);
}

#[test]
fn extras_are_capped_and_reversible() {
    let mut e = engine("a bc", Mode::Passage);
    e.apply(EngineInput::Char('a'));
    for _ in 0..(EXTRAS_CEILING + 10) {
        e.apply(EngineInput::Char('x'));
    }
    assert_eq!(e.char_states()[1].extras.len(), EXTRAS_CEILING);
    assert_eq!(e.cursor(), 1);

    for _ in 0..EXTRAS_CEILING {
        e.apply(EngineInput::Backspace);
    }
    assert!(e.char_states()[1].extras.is_empty());
    assert_eq!(e.cursor(), 1);
}

#[test]
fn finished_record_round_trips_through_sqlite() {
    let mut e = engine("hello world", Mode::Timed(30));
    type_str(&mut e, "hello world");
    // countdown sessions also finish at text end
    assert_eq!(e.status(), Status::Finished);
    let record = e.record().unwrap().clone();

    let mut store = SqliteStore::open_in_memory().unwrap();
    let id = store.save(&record).unwrap();
    let loaded = store.keystrokes(id).unwrap();
    assert_eq!(loaded, record.keystrokes);

    let recent = store.recent(5).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].mode, Mode::Timed(30));
    assert_eq!(recent[0].wpm, record.wpm);
}

#[test]
fn word_stats_line_up_with_the_finished_log() {
    let mut e = engine("cat dog", Mode::Passage);
    type_str(&mut e, "cxt ");
    // wander back over the space, then forward again
    e.apply(EngineInput::Backspace);
    type_str(&mut e, " dog");

    let record_log = e.log().to_vec();
    let chars: Vec<char> = "cat dog".chars().collect();
    let stats = word_stats::analyze(&chars, &record_log, 40.0);
    assert_eq!(stats.len(), 2);
    assert!(stats[0].has_error);
}

#[test]
fn reset_discards_everything_including_the_record() {
    let mut e = engine("hi", Mode::Passage);
    type_str(&mut e, "hi");
    assert!(e.record().is_some());
    e.reset();
    assert!(e.record().is_none());
    assert!(e.log().is_empty());
    assert_eq!(e.status(), Status::Idle);
    // a fresh run works after reset
    type_str(&mut e, "hi");
    assert_eq!(e.status(), Status::Finished);
}
