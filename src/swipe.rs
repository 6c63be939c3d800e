//! Drag-to-swipe on the transaction card.
//!
//! With mouse capture on, a press on the card starts a drag; the horizontal
//! distance at release decides the action. Terminal cells are coarse, so the
//! threshold is in columns rather than pixels.

/// Columns a drag must travel before release counts as a swipe.
pub const SWIPE_THRESHOLD: i32 = 12;

/// Drags shorter than this show no feedback overlay.
pub const FEEDBACK_DEAD_ZONE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    /// Accept the suggested category.
    Right,
    /// Open the category editor.
    Left,
}

#[derive(Debug, Default)]
pub struct SwipeTracker {
    start_x: Option<u16>,
    delta: i32,
    pub disabled: bool,
}

impl SwipeTracker {
    pub fn press(&mut self, column: u16) {
        if self.disabled {
            return;
        }
        self.start_x = Some(column);
        self.delta = 0;
    }

    pub fn drag(&mut self, column: u16) {
        if let Some(start) = self.start_x {
            self.delta = column as i32 - start as i32;
        }
    }

    /// Finish the drag. Returns a swipe only when the threshold was passed.
    pub fn release(&mut self) -> Option<Swipe> {
        self.start_x?;
        let delta = self.delta;
        self.reset();
        if delta.abs() > SWIPE_THRESHOLD {
            Some(if delta > 0 { Swipe::Right } else { Swipe::Left })
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.start_x = None;
        self.delta = 0;
    }

    pub fn is_dragging(&self) -> bool {
        self.start_x.is_some()
    }

    pub fn offset(&self) -> i32 {
        self.delta
    }

    /// Direction the card is currently leaning, once past the dead zone.
    pub fn direction(&self) -> Option<Swipe> {
        if !self.is_dragging() || self.delta.abs() <= FEEDBACK_DEAD_ZONE {
            None
        } else if self.delta > 0 {
            Some(Swipe::Right)
        } else {
            Some(Swipe::Left)
        }
    }

    /// 0.0..=1.0 strength of the accept/edit overlay.
    pub fn feedback_intensity(&self) -> f64 {
        (self.delta.abs() as f64 / SWIPE_THRESHOLD as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_swipe_past_threshold() {
        let mut t = SwipeTracker::default();
        t.press(10);
        t.drag(30);
        assert_eq!(t.direction(), Some(Swipe::Right));
        assert_eq!(t.release(), Some(Swipe::Right));
        assert!(!t.is_dragging());
    }

    #[test]
    fn test_left_swipe_past_threshold() {
        let mut t = SwipeTracker::default();
        t.press(40);
        t.drag(20);
        assert_eq!(t.release(), Some(Swipe::Left));
    }

    #[test]
    fn test_short_drag_is_not_a_swipe() {
        let mut t = SwipeTracker::default();
        t.press(10);
        t.drag(10 + SWIPE_THRESHOLD as u16);
        assert_eq!(t.release(), None);
        assert_eq!(t.offset(), 0);
    }

    #[test]
    fn test_release_without_press() {
        let mut t = SwipeTracker::default();
        t.drag(50);
        assert_eq!(t.release(), None);
    }

    #[test]
    fn test_disabled_ignores_press() {
        let mut t = SwipeTracker {
            disabled: true,
            ..SwipeTracker::default()
        };
        t.press(0);
        t.drag(40);
        assert!(!t.is_dragging());
        assert_eq!(t.release(), None);
    }

    #[test]
    fn test_feedback_dead_zone_and_cap() {
        let mut t = SwipeTracker::default();
        t.press(20);
        t.drag(21);
        assert_eq!(t.direction(), None);
        t.drag(26);
        assert_eq!(t.feedback_intensity(), 0.5);
        t.drag(80);
        assert_eq!(t.feedback_intensity(), 1.0);
    }
}
