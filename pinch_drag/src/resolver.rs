//! Drag-target resolution.
//!
//! [`DragResolver`] owns every draggable target plus the *active lock*: the
//! index of the single target currently allowed to receive drag updates.
//!
//! Per frame:
//!
//! * lock held  → only the locked target is evaluated; the rest are frozen.
//! * lock empty → every target is evaluated, gated on "index fingertip inside
//!   this target's rectangle".  A target whose pinch confirms grabs the lock;
//!   if several confirm together, the [`TieBreak`] policy picks one and the
//!   others are rolled back as if they had not been evaluated.
//!
//! While dragging, the target follows the index/middle fingertip midpoint
//! plus the offset captured at grab time, so it never snaps its center onto
//! the fingers.

use std::fmt;
use std::str::FromStr;

use hand_geometry::landmarks::{INDEX_TIP, MIDDLE_TIP};
use hand_geometry::{distance, BoundingBox, HandFrame, Point, Size};
use log::debug;
use thiserror::Error;

use crate::detector::{PinchDetector, PinchPhase, PinchStreak};

// ════════════════════════════════════════════════════════════════════════════
// TargetId / DragTarget
// ════════════════════════════════════════════════════════════════════════════

/// Index of a target inside its resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(usize);

impl TargetId {
    pub fn from_index(index: usize) -> Self { TargetId(index) }
    pub fn index(self) -> usize { self.0 }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A rectangle that can be pinched and dragged.
#[derive(Clone, Debug, PartialEq)]
pub struct DragTarget {
    center:      Point,
    size:        Size,
    dragging:    bool,
    streak:      PinchStreak,
    /// `center − grip` at grab time.
    drag_offset: Point,
}

impl DragTarget {
    pub fn new(center: Point, size: Size) -> Self {
        DragTarget {
            center,
            size,
            dragging:    false,
            streak:      PinchStreak::default(),
            drag_offset: Point::default(),
        }
    }

    pub fn center(&self)      -> Point       { self.center }
    pub fn size(&self)        -> Size        { self.size }
    pub fn is_dragging(&self) -> bool        { self.dragging }
    pub fn streak(&self)      -> PinchStreak { self.streak }
    pub fn drag_offset(&self) -> Point       { self.drag_offset }

    /// Current on-screen rectangle.
    pub fn rect(&self) -> BoundingBox { BoundingBox::around(self.center, self.size) }
}

// ════════════════════════════════════════════════════════════════════════════
// TieBreak
// ════════════════════════════════════════════════════════════════════════════

/// Which target wins when several confirm a pinch on the same frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// First target in configured order. Targets after the winner end the
    /// grab frame with the streak they had before it.
    #[default]
    ListOrder,
    /// Target whose center is closest to the fingertip midpoint; list order
    /// settles exact ties.
    NearestCenter,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::ListOrder     => "list-order",
            TieBreak::NearestCenter => "nearest-center",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tie-break policy `{0}` (expected list-order or nearest-center)")]
pub struct ParseTieBreakError(String);

impl FromStr for TieBreak {
    type Err = ParseTieBreakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "list-order" | "list" | "first"        => Ok(TieBreak::ListOrder),
            "nearest-center" | "nearest" | "near"  => Ok(TieBreak::NearestCenter),
            _ => Err(ParseTieBreakError(s.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DragEvent / FrameReport
// ════════════════════════════════════════════════════════════════════════════

/// What happened to the lock holder on a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragEvent {
    /// Target took the lock; `offset` is `center − grip`.
    Grabbed { target: TargetId, offset: Point },
    /// Locked target followed the grip to `center`.
    Moved   { target: TargetId, center: Point },
    /// Target released the lock at `center`.
    Dropped { target: TargetId, center: Point },
}

/// Per-frame output of [`DragResolver::step`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Lock holder after this frame.
    pub lock:           Option<TargetId>,
    pub event:          Option<DragEvent>,
    /// Index–middle fingertip distance, when both tips were present.
    pub pinch_distance: Option<f32>,
    /// Index–middle fingertip midpoint, when both tips were present.
    pub grip:           Option<Point>,
}

// ════════════════════════════════════════════════════════════════════════════
// DragResolver
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct DragResolver {
    targets:   Vec<DragTarget>,
    lock:      Option<TargetId>,
    detector:  PinchDetector,
    tie_break: TieBreak,
}

impl DragResolver {
    pub fn new(targets: Vec<DragTarget>, detector: PinchDetector) -> Self {
        DragResolver { targets, lock: None, detector, tie_break: TieBreak::default() }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn targets(&self)   -> &[DragTarget]     { &self.targets }
    pub fn lock(&self)      -> Option<TargetId>  { self.lock }
    pub fn is_locked(&self) -> bool              { self.lock.is_some() }
    pub fn detector(&self)  -> &PinchDetector    { &self.detector }
    pub fn tie_break(&self) -> TieBreak          { self.tie_break }

    pub fn target(&self, id: TargetId) -> Option<&DragTarget> { self.targets.get(id.0) }

    /// Number of targets currently dragging (0 or 1).
    pub fn dragging_count(&self) -> usize {
        self.targets.iter().filter(|t| t.dragging).count()
    }

    /// Advance one frame with the hand used for this frame's decision.
    ///
    /// A missing hand, one without both index and middle fingertips, or one
    /// whose two tips are both the `(0, 0)` placeholder is "no signal":
    /// nothing moves and no streak changes.
    pub fn step(&mut self, hand: Option<&HandFrame>) -> FrameReport {
        let tips = hand.and_then(|h| h.signal_pair(INDEX_TIP, MIDDLE_TIP));
        let mut report = FrameReport {
            lock:           self.lock,
            event:          None,
            pinch_distance: tips.map(|(a, b)| distance(a, b)),
            grip:           tips.map(|(a, b)| a.midpoint(b)),
        };
        let tips = match tips {
            Some(t) => t,
            None    => return report,
        };

        report.event = match self.lock {
            Some(id) => self.advance_locked(id, tips),
            None     => self.contend(tips),
        };
        report.lock = self.lock;

        debug_assert!(self.dragging_count() <= 1, "more than one target dragging");
        report
    }

    fn advance_locked(&mut self, id: TargetId, tips: (Point, Point)) -> Option<DragEvent> {
        let detector = self.detector;
        let target = &mut self.targets[id.0];
        let rect = target.rect();
        let reading = detector.evaluate(
            Some(tips),
            |index, _| rect.contains(index),
            &mut target.streak,
            target.dragging,
        )?;

        match reading.phase {
            PinchPhase::Holding if reading.pinched => {
                target.center = tips.0.midpoint(tips.1) + target.drag_offset;
                Some(DragEvent::Moved { target: id, center: target.center })
            }
            PinchPhase::Released => {
                target.dragging = false;
                self.lock = None;
                debug!("target {} dropped at {}", id, target.center);
                Some(DragEvent::Dropped { target: id, center: target.center })
            }
            _ => None,
        }
    }

    fn contend(&mut self, tips: (Point, Point)) -> Option<DragEvent> {
        let detector = self.detector;
        let grip = tips.0.midpoint(tips.1);

        let before: Vec<PinchStreak> = self.targets.iter().map(|t| t.streak).collect();
        let mut contenders: Vec<TargetId> = Vec::new();
        for (i, target) in self.targets.iter_mut().enumerate() {
            let rect = target.rect();
            let reading = detector.evaluate(
                Some(tips),
                |index, _| rect.contains(index),
                &mut target.streak,
                target.dragging,
            );
            if matches!(reading, Some(r) if r.phase == PinchPhase::Started) {
                contenders.push(TargetId(i));
            }
        }

        let winner = self.pick(&contenders, grip)?;
        for (i, target) in self.targets.iter_mut().enumerate() {
            let id = TargetId(i);
            let lost = id != winner && contenders.contains(&id);
            let skipped = self.tie_break == TieBreak::ListOrder && id > winner;
            if lost || skipped {
                target.streak = before[i];
            }
            if lost {
                debug!("target {} lost tie-break to {} ({})", id, winner, self.tie_break.as_str());
            }
        }

        let target = &mut self.targets[winner.0];
        target.drag_offset = target.center - grip;
        target.dragging = true;
        self.lock = Some(winner);
        debug!("target {} grabbed at {} (offset {})", winner, target.center, target.drag_offset);
        Some(DragEvent::Grabbed { target: winner, offset: target.drag_offset })
    }

    fn pick(&self, contenders: &[TargetId], grip: Point) -> Option<TargetId> {
        match self.tie_break {
            TieBreak::ListOrder => contenders.first().copied(),
            TieBreak::NearestCenter => {
                let mut best: Option<(TargetId, f32)> = None;
                for &id in contenders {
                    let d = distance(self.targets[id.0].center, grip);
                    match best {
                        Some((_, bd)) if bd <= d => {}
                        _ => best = Some((id, d)),
                    }
                }
                best.map(|(id, _)| id)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
