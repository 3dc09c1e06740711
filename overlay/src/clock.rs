//! Per-tick animation state machine
//!
//! The clock only mutates [`LabelState`]; what the tick means for the canvas
//! is reported back as a [`TickAction`] and carried out by the caller.
use std::time::Duration;

use toastline_types::EraseMode;

use crate::label::LabelState;

/// What a tick requires of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// No label on screen
    Idle,
    /// Label lingering at full opacity, nothing changed
    Hold,
    /// Erase and redraw at the new opacity
    Redraw,
    /// Erase only; the label shrank or vanished
    Erase,
}

impl TickAction {
    /// Whether the canvas changed and must be pushed
    pub fn is_dirty(self) -> bool {
        matches!(self, TickAction::Redraw | TickAction::Erase)
    }
}

/// Fixed-interval clock advancing a label through linger, fade and erase
#[derive(Debug, Clone, Copy)]
pub struct AnimationClock {
    interval_ms: u32,
    erase_mode: EraseMode,
}

impl AnimationClock {
    /// A zero interval is raised to 1 ms
    pub fn new(interval_ms: u32, erase_mode: EraseMode) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            erase_mode,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms as u64)
    }

    pub fn erase_mode(&self) -> EraseMode {
        self.erase_mode
    }

    /// Advance the label by one tick
    pub fn advance(&self, label: &mut LabelState, fade_ms: u32) -> TickAction {
        let remaining = label.remaining_ms();

        if remaining > fade_ms {
            label.count_down(self.interval_ms);
            return TickAction::Hold;
        }

        if remaining >= self.interval_ms {
            label.count_down(self.interval_ms);
            return TickAction::Redraw;
        }

        label.set_remaining(0);
        if label.length() == 0 {
            return TickAction::Idle;
        }

        match self.erase_mode {
            EraseMode::PerCharacter => label.shrink(),
            EraseMode::Instant => label.clear_length(),
        }
        tracing::trace!(length = label.length(), "label erase step");
        TickAction::Erase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Phase;
    use crate::renderer::progress_ratio;

    const FADE: u32 = 310;
    const LIFETIME: u32 = 1510;

    fn clock() -> AnimationClock {
        AnimationClock::new(40, EraseMode::PerCharacter)
    }

    #[test]
    fn test_idle_label_stays_idle() {
        let mut label = LabelState::new();
        for _ in 0..5 {
            assert_eq!(clock().advance(&mut label, FADE), TickAction::Idle);
        }
        assert_eq!(label.remaining_ms(), 0);
    }

    #[test]
    fn test_zero_interval_is_raised() {
        let clock = AnimationClock::new(0, EraseMode::Instant);
        assert_eq!(clock.interval_ms(), 1);
        assert_eq!(clock.interval(), Duration::from_millis(1));
    }

    /// Show("A") with linger 1200, fade 310, tick 40
    #[test]
    fn test_single_char_scenario() {
        let clock = clock();
        let mut label = LabelState::new();
        label.start("A", LIFETIME);

        let mut actions = Vec::new();
        let mut remaining = Vec::new();
        while label.length() > 0 {
            actions.push(clock.advance(&mut label, FADE));
            remaining.push(label.remaining_ms());
            assert!(actions.len() < 100, "label never went idle");
        }

        // 1510 -> 310 lingers for 30 ticks
        let holds = actions.iter().take_while(|a| **a == TickAction::Hold).count();
        assert_eq!(holds, 30);
        assert_eq!(remaining[29], 310);

        // 310 -> 30 fades for 7 ticks
        let redraws = &actions[30..37];
        assert!(redraws.iter().all(|a| *a == TickAction::Redraw));
        assert_eq!(remaining[36], 30);

        // 30 < interval: zeroed, erased in one step
        assert_eq!(&actions[37..], &[TickAction::Erase]);
        assert_eq!(remaining[37], 0);

        assert_eq!(clock.advance(&mut label, FADE), TickAction::Idle);
    }

    #[test]
    fn test_ratio_non_increasing_while_fading() {
        let clock = clock();
        let mut label = LabelState::new();
        label.start("fade me", LIFETIME);

        let mut last = f32::INFINITY;
        while label.phase(FADE) != Phase::Erasing {
            if clock.advance(&mut label, FADE) == TickAction::Redraw {
                let r = progress_ratio(label.remaining_ms(), FADE);
                assert!((0.0..=1.0).contains(&r));
                assert!(r <= last);
                last = r;
            }
        }
        assert!(last < 1.0);
    }

    #[test]
    fn test_per_character_erase() {
        let clock = clock();
        let mut label = LabelState::new();
        label.start("abc", 0);

        assert_eq!(clock.advance(&mut label, FADE), TickAction::Erase);
        assert_eq!(label.visible_text(), "ab");
        assert_eq!(clock.advance(&mut label, FADE), TickAction::Erase);
        assert_eq!(clock.advance(&mut label, FADE), TickAction::Erase);
        assert_eq!(label.length(), 0);
        assert_eq!(clock.advance(&mut label, FADE), TickAction::Idle);
    }

    #[test]
    fn test_instant_erase() {
        let clock = AnimationClock::new(40, EraseMode::Instant);
        let mut label = LabelState::new();
        label.start("abc", 0);

        assert_eq!(clock.advance(&mut label, FADE), TickAction::Erase);
        assert_eq!(label.length(), 0);
        assert_eq!(clock.advance(&mut label, FADE), TickAction::Idle);
    }

    #[test]
    fn test_zero_fade_skips_fading() {
        let clock = clock();
        let mut label = LabelState::new();
        label.start("x", 80);

        assert_eq!(clock.advance(&mut label, 0), TickAction::Hold);
        assert_eq!(clock.advance(&mut label, 0), TickAction::Hold);
        assert_eq!(label.remaining_ms(), 0);
        assert_eq!(clock.advance(&mut label, 0), TickAction::Erase);
    }

    #[test]
    fn test_dirty_actions() {
        assert!(!TickAction::Idle.is_dirty());
        assert!(!TickAction::Hold.is_dirty());
        assert!(TickAction::Redraw.is_dirty());
        assert!(TickAction::Erase.is_dirty());
    }
}
