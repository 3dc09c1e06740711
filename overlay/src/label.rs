//! Label model: text, placement and remaining lifetime

use crate::region::LabelRect;

/// Longest text a label holds, in Unicode scalar values
pub const MAX_LABEL_CHARS: usize = 4096;

/// Owned label text capped at [`MAX_LABEL_CHARS`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelText {
    text: String,
    chars: usize,
}

impl LabelText {
    /// Replace the contents, truncating at the cap. Returns true if the
    /// input was truncated.
    pub fn set(&mut self, text: &str) -> bool {
        self.text.clear();

        match text.char_indices().nth(MAX_LABEL_CHARS) {
            Some((cut, _)) => {
                self.text.push_str(&text[..cut]);
                self.chars = MAX_LABEL_CHARS;
                true
            }
            None => {
                self.text.push_str(text);
                self.chars = text.chars().count();
                false
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.chars
    }

    /// The first `chars` characters
    pub fn prefix(&self, chars: usize) -> &str {
        match self.text.char_indices().nth(chars) {
            Some((cut, _)) => &self.text[..cut],
            None => &self.text,
        }
    }
}

/// Where a label is in its show cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing visible
    Idle,
    /// Fully opaque and static
    Linger,
    /// Opacity proportional to the remaining fade time
    Fading,
    /// Fade finished, length shrinking each tick
    Erasing,
}

/// Mutable state of the single on-screen label
#[derive(Debug, Clone, Default)]
pub struct LabelState {
    text: LabelText,
    length: usize,
    rect: LabelRect,
    remaining_ms: u32,
    fading: bool,
}

impl LabelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new show cycle. Returns true if the text was truncated.
    pub fn start(&mut self, text: &str, lifetime_ms: u32) -> bool {
        let truncated = self.text.set(text);
        self.length = self.text.char_count();
        self.remaining_ms = lifetime_ms;
        self.fading = true;
        truncated
    }

    pub fn phase(&self, fade_ms: u32) -> Phase {
        if self.length == 0 {
            Phase::Idle
        } else if self.remaining_ms > fade_ms {
            Phase::Linger
        } else if self.remaining_ms > 0 {
            Phase::Fading
        } else {
            Phase::Erasing
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Characters still counted as visible
    pub fn length(&self) -> usize {
        self.length
    }

    /// The part of the text covered by `length`
    pub fn visible_text(&self) -> &str {
        self.text.prefix(self.length)
    }

    pub fn rect(&self) -> LabelRect {
        self.rect
    }

    pub fn remaining_ms(&self) -> u32 {
        self.remaining_ms
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    pub(crate) fn set_rect(&mut self, rect: LabelRect) {
        self.rect = rect;
    }

    pub(crate) fn set_remaining(&mut self, remaining_ms: u32) {
        self.remaining_ms = remaining_ms;
    }

    /// Count down by one tick if the countdown is running
    pub(crate) fn count_down(&mut self, interval_ms: u32) {
        if self.fading {
            self.remaining_ms = self.remaining_ms.saturating_sub(interval_ms);
        }
    }

    pub(crate) fn shrink(&mut self) {
        self.length = self.length.saturating_sub(1);
    }

    pub(crate) fn clear_length(&mut self) {
        self.length = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_stored_verbatim() {
        let mut text = LabelText::default();
        assert!(!text.set("Ctrl + Ä"));
        assert_eq!(text.as_str(), "Ctrl + Ä");
        assert_eq!(text.char_count(), 8);
    }

    #[test]
    fn test_long_text_is_truncated_at_cap() {
        let input: String = "é".repeat(MAX_LABEL_CHARS + 17);
        let mut text = LabelText::default();

        assert!(text.set(&input));
        assert_eq!(text.char_count(), MAX_LABEL_CHARS);
        assert_eq!(text.as_str(), "é".repeat(MAX_LABEL_CHARS));
    }

    #[test]
    fn test_text_at_cap_is_not_truncated() {
        let input = "x".repeat(MAX_LABEL_CHARS);
        let mut text = LabelText::default();
        assert!(!text.set(&input));
        assert_eq!(text.as_str(), input);
    }

    #[test]
    fn test_set_replaces_previous_text() {
        let mut text = LabelText::default();
        text.set(&"a".repeat(MAX_LABEL_CHARS * 2));
        text.set("b");
        assert_eq!(text.as_str(), "b");
        assert_eq!(text.char_count(), 1);
    }

    #[test]
    fn test_prefix() {
        let mut text = LabelText::default();
        text.set("añb");
        assert_eq!(text.prefix(0), "");
        assert_eq!(text.prefix(2), "añ");
        assert_eq!(text.prefix(10), "añb");
    }

    #[test]
    fn test_phases() {
        let mut label = LabelState::new();
        assert_eq!(label.phase(310), Phase::Idle);
        assert!(!label.is_fading());

        label.start("AB", 1510);
        assert!(label.is_fading());
        assert_eq!(label.phase(310), Phase::Linger);

        label.set_remaining(310);
        assert_eq!(label.phase(310), Phase::Fading);

        label.set_remaining(0);
        assert_eq!(label.phase(310), Phase::Erasing);

        label.shrink();
        assert_eq!(label.visible_text(), "A");
        label.shrink();
        assert_eq!(label.phase(310), Phase::Idle);
        assert_eq!(label.text(), "AB");
    }
}
