use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// The engine's input alphabet. Everything else a keyboard can produce is
/// filtered out before any state mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineInput {
    Char(char),
    Backspace,
    WordBackspace,
}

/// Classify a raw terminal key event.
///
/// Printable characters pass through (shift included, for capitals), plain
/// backspace erases one position, and Ctrl/Alt+Backspace or the classic
/// Ctrl+W chord erase a word. Function keys, bare modifiers, and other
/// control chords are None.
pub fn classify(key: &KeyEvent) -> Option<EngineInput> {
    match key.code {
        KeyCode::Backspace => {
            if key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
            {
                Some(EngineInput::WordBackspace)
            } else {
                Some(EngineInput::Backspace)
            }
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(EngineInput::WordBackspace)
        }
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(EngineInput::Char(c))
        }
        _ => None,
    }
}
