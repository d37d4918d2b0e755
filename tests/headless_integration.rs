use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use velo::config::Mode;
use velo::engine::{Engine, Status};
use velo::input;
use velo::passages::SourceText;
use velo::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

/// Drain the runner until the channel runs dry, feeding the engine the same
/// way the app loop does.
fn drive(runner: &Runner<TestEventSource, FixedTicker>, engine: &mut Engine, steps: usize) {
    for _ in 0..steps {
        match runner.step() {
            AppEvent::Key(k) => {
                if let Some(input) = input::classify(&k) {
                    engine.apply(input);
                }
            }
            AppEvent::Tick => engine.tick(),
            AppEvent::FocusLost => engine.pause(),
            AppEvent::FocusGained => engine.resume(),
            AppEvent::Resize => {}
        }
    }
}

#[test]
fn typed_events_flow_through_the_runner_into_the_engine() {
    let (tx, rx) = mpsc::channel();
    for c in "hi".chars() {
        tx.send(key(c)).unwrap();
    }
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    let mut engine = Engine::new(SourceText::custom("hi".into()), Mode::Passage);

    drive(&runner, &mut engine, 2);
    assert_eq!(engine.status(), Status::Finished);
    assert_eq!(engine.record().unwrap().accuracy, 100);
}

#[test]
fn focus_events_pause_and_resume_the_session() {
    let (tx, rx) = mpsc::channel();
    tx.send(key('h')).unwrap();
    tx.send(AppEvent::FocusLost).unwrap();
    tx.send(key('e')).unwrap(); // swallowed while paused
    tx.send(AppEvent::FocusGained).unwrap();
    tx.send(key('e')).unwrap();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    let mut engine = Engine::new(SourceText::custom("hello".into()), Mode::Passage);

    drive(&runner, &mut engine, 5);
    assert_eq!(engine.status(), Status::Typing);
    assert_eq!(engine.cursor(), 2);
}

#[test]
fn exhausted_channel_degrades_to_ticks_without_state_damage() {
    let (tx, rx) = mpsc::channel();
    tx.send(key('h')).unwrap();
    drop(tx);
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(1)));
    let mut engine = Engine::new(SourceText::custom("hello".into()), Mode::Passage);

    drive(&runner, &mut engine, 4);
    // ticks keep arriving after disconnect; the session just keeps typing
    assert_eq!(engine.status(), Status::Typing);
    assert_eq!(engine.cursor(), 1);
}

#[test]
fn backspace_key_events_classify_and_apply() {
    let (tx, rx) = mpsc::channel();
    tx.send(key('h')).unwrap();
    tx.send(key('x')).unwrap();
    tx.send(AppEvent::Key(KeyEvent::new(
        KeyCode::Backspace,
        KeyModifiers::NONE,
    )))
    .unwrap();
    tx.send(key('e')).unwrap();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    let mut engine = Engine::new(SourceText::custom("hello".into()), Mode::Passage);

    drive(&runner, &mut engine, 4);
    assert_eq!(engine.cursor(), 2);
    use velo::keystroke::CharOutcome;
    assert_eq!(engine.char_states()[1].outcome, CharOutcome::Correct);
}
