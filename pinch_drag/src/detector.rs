//! Debounced pinch detection.
//!
//! A pinch is two fingertips closer than `pinch_threshold` pixels while a
//! caller-supplied spatial gate holds.  Raw per-frame pinches are noisy, so
//! the confirmed state only flips after `debounce_threshold` consecutive
//! frames agree; in between, it holds its previous value.
//!
//! The detector itself is stateless: streak counters and the previous
//! confirmed flag belong to whatever is being pinched (see
//! [`DragTarget`](crate::DragTarget)) and are passed in on every call.

use hand_geometry::{distance, Point};

use crate::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// PinchStreak / PinchPhase / PinchReading
// ════════════════════════════════════════════════════════════════════════════

/// Consecutive-frame counters.  At most one of them is non-zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinchStreak {
    pub pinch:   u32,
    pub release: u32,
}

/// Confirmed state after one evaluation, relative to the state before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchPhase {
    /// Not confirmed before or after.
    Open,
    /// Confirmed on this frame (false → true).
    Started,
    /// Confirmed before and after.
    Holding,
    /// Released on this frame (true → false).
    Released,
}

impl PinchPhase {
    pub fn is_confirmed(self) -> bool {
        matches!(self, PinchPhase::Started | PinchPhase::Holding)
    }

    fn between(before: bool, after: bool) -> Self {
        match (before, after) {
            (false, false) => PinchPhase::Open,
            (false, true)  => PinchPhase::Started,
            (true,  true)  => PinchPhase::Holding,
            (true,  false) => PinchPhase::Released,
        }
    }
}

/// Result of evaluating one frame that had both fingertips.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchReading {
    /// Fingertip distance in pixels.
    pub distance: f32,
    /// Raw (undebounced) pinch for this frame, gate included.
    pub pinched:  bool,
    pub phase:    PinchPhase,
}

// ════════════════════════════════════════════════════════════════════════════
// PinchDetector
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchDetector {
    pinch_threshold:    f32,
    debounce_threshold: u32,
}

impl PinchDetector {
    /// `pinch_threshold` must be a positive pixel distance and
    /// `debounce_threshold` at least one frame.
    pub fn new(pinch_threshold: f32, debounce_threshold: u32) -> Result<Self, ConfigError> {
        if !(pinch_threshold.is_finite() && pinch_threshold > 0.0) {
            return Err(ConfigError::PinchThreshold(pinch_threshold));
        }
        if debounce_threshold == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        Ok(PinchDetector { pinch_threshold, debounce_threshold })
    }

    pub fn pinch_threshold(&self)    -> f32 { self.pinch_threshold }
    pub fn debounce_threshold(&self) -> u32 { self.debounce_threshold }

    /// Evaluate one frame.
    ///
    /// `tips` is `None` when either fingertip is missing from the frame; the
    /// streak is then left untouched and `None` ("no signal") is returned.
    /// `gate` receives both fingertips and decides whether a close pair
    /// counts (e.g. "first tip inside this box").  `confirmed` is the state
    /// produced by the previous evaluation of the same streak.
    pub fn evaluate<G>(
        &self,
        tips:      Option<(Point, Point)>,
        gate:      G,
        streak:    &mut PinchStreak,
        confirmed: bool,
    ) -> Option<PinchReading>
    where
        G: FnOnce(Point, Point) -> bool,
    {
        let (a, b) = tips?;
        let d = distance(a, b);
        let pinched = d < self.pinch_threshold && gate(a, b);

        if pinched {
            streak.pinch   = streak.pinch.saturating_add(1);
            streak.release = 0;
        } else {
            streak.release = streak.release.saturating_add(1);
            streak.pinch   = 0;
        }

        let now = if streak.pinch >= self.debounce_threshold {
            true
        } else if streak.release >= self.debounce_threshold {
            false
        } else {
            confirmed
        };

        Some(PinchReading { distance: d, pinched, phase: PinchPhase::between(confirmed, now) })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
