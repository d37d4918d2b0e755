use crate::keystroke::{CharOutcome, CharState, Keystroke};

/// Start of the word containing `pos`.
///
/// A word starts at index 0 or immediately after a space. A `pos` sitting on
/// a space belongs to the word before it, so the search walks back from
/// `pos - 1` either way.
pub fn word_start(chars: &[char], pos: usize) -> usize {
    let mut i = pos.min(chars.len());
    while i > 0 && chars[i - 1] != ' ' {
        i -= 1;
    }
    i
}

/// Landing position for a word-delete (Ctrl/Alt+Backspace) from `pos`:
/// the start of the current word, or of the previous word when `pos` is
/// already at a word boundary.
pub fn word_delete_target(chars: &[char], pos: usize) -> usize {
    let mut i = pos.min(chars.len());
    while i > 0 && chars[i - 1] == ' ' {
        i -= 1;
    }
    while i > 0 && chars[i - 1] != ' ' {
        i -= 1;
    }
    i
}

/// Index of the next space at or after `pos`, or `chars.len()` when the text
/// ends first. This is where a word skip lands.
pub fn skip_landing(chars: &[char], pos: usize) -> usize {
    let mut i = pos;
    while i < chars.len() && chars[i] != ' ' {
        i += 1;
    }
    i
}

/// True when no keystroke has ever targeted `[start, end)`.
pub fn word_is_untouched(log: &[Keystroke], start: usize, end: usize) -> bool {
    log.iter()
        .all(|k| k.char_index < start || k.char_index >= end)
}

/// True when every position in `[start, end_inclusive]` is correct with no
/// extras. This is the condition for sealing a word behind the cursor lock.
pub fn word_is_perfect(states: &[CharState], start: usize, end_inclusive: usize) -> bool {
    states
        .get(start..=end_inclusive)
        .is_some_and(|span| {
            span.iter()
                .all(|s| s.outcome == CharOutcome::Correct && s.extras.is_empty())
        })
}
