//! Horizontal swipe detection for the modal carousel.

/// Minimum horizontal travel before a drag counts as a swipe rather than a tap.
pub const SWIPE_THRESHOLD: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Finger moved right-to-left; shows the next photo.
    Left,
    /// Finger moved left-to-right; shows the previous photo.
    Right,
}

/// Start and latest coordinate of one touch interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwipeTracker {
    start: Option<f32>,
    current: Option<f32>,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(&mut self, x: f32) {
        self.start = Some(x);
        self.current = None;
    }

    pub fn on_move(&mut self, x: f32) {
        self.current = Some(x);
    }

    /// Resolves the interaction and discards the sample.
    ///
    /// A touch with no recorded movement (a tap) resolves to `None`.
    pub fn on_end(&mut self) -> Option<SwipeDirection> {
        let sample = std::mem::take(self);
        let distance = sample.start? - sample.current?;
        if distance > SWIPE_THRESHOLD {
            Some(SwipeDirection::Left)
        } else if distance < -SWIPE_THRESHOLD {
            Some(SwipeDirection::Right)
        } else {
            None
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.start.is_some()
    }
}
