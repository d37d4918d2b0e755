use serde::{Deserialize, Serialize};

/// What the user produced for a single input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Typed {
    Char(char),
    Backspace,
}

impl Typed {
    pub fn is_backspace(&self) -> bool {
        matches!(self, Typed::Backspace)
    }
}

/// Immutable record of one physical input event.
///
/// Keystrokes are stored in arrival order; `timestamp_ms` is an offset from
/// session start (paused time excluded) and is used by the metrics engine
/// only, never to reorder state derivation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keystroke {
    pub char_index: usize,
    pub expected: char,
    pub typed: Typed,
    pub is_correct: bool,
    pub timestamp_ms: u64,
    /// For a synthetic space emitted by a word skip: the cursor position the
    /// jump originated from, so a later backspace can restore it exactly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_origin: Option<usize>,
}

impl Keystroke {
    pub fn press(char_index: usize, expected: char, typed: char, timestamp_ms: u64) -> Self {
        Self {
            char_index,
            expected,
            typed: Typed::Char(typed),
            is_correct: typed == expected,
            timestamp_ms,
            skip_origin: None,
        }
    }

    /// Synthetic space recorded at the landing position of a word skip.
    /// Never counted as correct, even when the landing char is a space.
    pub fn skip(char_index: usize, expected: char, origin: usize, timestamp_ms: u64) -> Self {
        Self {
            char_index,
            expected,
            typed: Typed::Char(' '),
            is_correct: false,
            timestamp_ms,
            skip_origin: Some(origin),
        }
    }

    pub fn backspace(char_index: usize, expected: char, timestamp_ms: u64) -> Self {
        Self {
            char_index,
            expected,
            typed: Typed::Backspace,
            is_correct: false,
            timestamp_ms,
            skip_origin: None,
        }
    }

    /// Coarse position bucket, for diagnostics only.
    pub fn position_group(&self) -> usize {
        self.char_index / 10
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CharOutcome {
    #[default]
    Untyped,
    Correct,
    Incorrect,
}

/// Render-ready state of one source-text position, derived from the log.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CharState {
    pub outcome: CharOutcome,
    pub typed: Option<char>,
    /// Characters typed at a position whose expected char is a space.
    pub extras: Vec<char>,
}

/// Project the keystroke log onto per-position display state.
///
/// Processes the log strictly in arrival order; later writes to the same
/// position win. Out-of-range indices are ignored so a malformed event can
/// never corrupt an in-progress test. Pure: same inputs, same output.
pub fn project(source: &[char], log: &[Keystroke]) -> Vec<CharState> {
    let mut states = vec![CharState::default(); source.len()];

    for ks in log {
        let Some(slot) = states.get_mut(ks.char_index) else {
            continue;
        };
        match ks.typed {
            Typed::Char(c) => {
                if source[ks.char_index] == ' ' && c != ' ' {
                    slot.extras.push(c);
                } else {
                    slot.outcome = if ks.is_correct {
                        CharOutcome::Correct
                    } else {
                        CharOutcome::Incorrect
                    };
                    slot.typed = Some(c);
                }
            }
            Typed::Backspace => {
                // most recent overtype at a space goes first; otherwise the
                // position itself is reset
                if slot.extras.pop().is_none() {
                    *slot = CharState::default();
                }
            }
        }
    }

    states
}
