//! Landmark sources: real hardware, pointer simulation, or a fixed script.
//!
//! The frame loop only sees [`LandmarkSource::next_frame`]: zero or more
//! hands per frame, each a [`HandFrame`] in window pixel coordinates.  Hand
//! order is not stable across frames and nothing downstream relies on it.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, TryRecvError};

use hand_geometry::{HandFrame, Point};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("landmark source closed")]
    Closed,

    #[error("scripted frames exhausted")]
    Exhausted,

    #[error("tracking device error: {0}")]
    Device(String),
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait: unified interface for hw, sim and scripts
// ════════════════════════════════════════════════════════════════════════════

pub trait LandmarkSource {
    fn name(&self) -> &str;

    /// Block until the next frame and return every hand detected in it.
    /// An error ends the frame loop; it is not retried.
    fn next_frame(&mut self) -> Result<Vec<HandFrame>, SourceError>;
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedSource: replay a fixed sequence
// ════════════════════════════════════════════════════════════════════════════

/// Replays prepared frames, then reports [`SourceError::Exhausted`].
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Vec<HandFrame>>,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = Vec<HandFrame>>>(frames: I) -> Self {
        ScriptedSource { frames: frames.into_iter().collect() }
    }
}

impl LandmarkSource for ScriptedSource {
    fn name(&self) -> &str { "script" }

    fn next_frame(&mut self) -> Result<Vec<HandFrame>, SourceError> {
        self.frames.pop_front().ok_or(SourceError::Exhausted)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource: pointer-driven synthetic hand (always available)
// ════════════════════════════════════════════════════════════════════════════

/// One pointer snapshot from the overlay window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    /// Pointer position in window pixels; `None` when outside the window
    /// (treated as "no hand").
    pub pos:       Option<(f32, f32)>,
    /// Left button held → index and middle tips pinched together.
    pub pinching:  bool,
    /// Thumb-tip to index-tip distance in pixels.
    pub thumb_gap: f32,
}

/// Index–middle spread of the synthetic hand, pinched and relaxed.
pub const SIM_PINCH_SPREAD: i32 = 12;
pub const SIM_OPEN_SPREAD:  i32 = 70;

/// Builds a 21-landmark hand around the pointer from [`PointerSample`]s sent
/// by the visualizer.
///
/// The visualizer sends samples while polling its window; this source keeps
/// the most recent one.  Both run on the frame-loop thread; the channel
/// only decouples the window from gesture logic.
pub struct SimLandmarkSource {
    rx:   Receiver<PointerSample>,
    last: Option<PointerSample>,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<PointerSample>) -> Self {
        SimLandmarkSource { rx, last: None }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn name(&self) -> &str { "pointer simulation" }

    fn next_frame(&mut self) -> Result<Vec<HandFrame>, SourceError> {
        loop {
            match self.rx.try_recv() {
                Ok(sample)                      => self.last = Some(sample),
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return Err(SourceError::Closed),
            }
        }
        Ok(self.last
            .and_then(|s| {
                let (x, y) = s.pos?;
                Some(synthetic_hand(Point::new(x as i32, y as i32), s.pinching, s.thumb_gap.round() as i32))
            })
            .into_iter()
            .collect())
    }
}

/// A plausible right hand, palm toward the screen, with the index/middle
/// fingertip midpoint on `grip` and the thumb tip exactly `thumb_gap` px
/// left of the index tip.
pub fn synthetic_hand(grip: Point, pinching: bool, thumb_gap: i32) -> HandFrame {
    let spread = if pinching { SIM_PINCH_SPREAD } else { SIM_OPEN_SPREAD };
    let Point { x, y } = grip;

    let index_tip  = Point::new(x - spread / 2, y);
    let middle_tip = Point::new(x + spread - spread / 2, y);
    let thumb_tip  = Point::new(index_tip.x - thumb_gap.max(0), y);

    let wrist      = Point::new(x, y + 200);
    let thumb_cmc  = Point::new(x - 45, y + 170);
    let index_mcp  = Point::new(x - 30, y + 110);
    let middle_mcp = Point::new(x + 5,  y + 105);
    let ring_mcp   = Point::new(x + 35, y + 112);
    let pinky_mcp  = Point::new(x + 60, y + 128);
    // ring and pinky stay curled
    let ring_tip   = Point::new(x + 40, y + 45);
    let pinky_tip  = Point::new(x + 62, y + 75);

    let mut points = Vec::with_capacity(hand_geometry::landmarks::COUNT);
    points.push(wrist);
    for (base, tip) in [
        (thumb_cmc, thumb_tip),
        (index_mcp, index_tip),
        (middle_mcp, middle_tip),
        (ring_mcp, ring_tip),
        (pinky_mcp, pinky_tip),
    ] {
        points.push(base);
        points.push(lerp(base, tip, 1, 3));
        points.push(lerp(base, tip, 2, 3));
        points.push(tip);
    }
    HandFrame::from_points(points)
}

fn lerp(a: Point, b: Point, num: i32, den: i32) -> Point {
    Point::new(a.x + (b.x - a.x) * num / den, a.y + (b.y - a.y) * num / den)
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Each digit's four joints map onto the 21-point convention (thumb 1–4,
/// index 5–8, …); the palm stands in for the wrist.  Leap millimetres are
/// projected onto the window: x ∈ [-200, 200] mm across the width,
/// y ∈ [100, 500] mm (height above the device) up the window.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource {
    connection: leaprs::Connection,
    projection: Projection,
}

/// Run of failed device polls; any successful poll ends the run.
#[cfg(any(feature = "leap", test))]
#[derive(Clone, Copy, Debug, Default)]
struct PollFailures {
    run: u32,
}

#[cfg(any(feature = "leap", test))]
impl PollFailures {
    /// Consecutive failed polls (100 ms each) before the device counts as lost.
    const LIMIT: u32 = 50;

    /// Count one failure; true once the run reaches [`Self::LIMIT`].
    fn fail(&mut self) -> bool {
        self.run += 1;
        self.run >= Self::LIMIT
    }

    fn reset(&mut self) { self.run = 0; }
}

#[cfg(feature = "leap")]
impl LeapLandmarkSource {
    pub fn open(width: usize, height: usize) -> Result<Self, SourceError> {
        use leaprs::{Connection, ConnectionConfig};

        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| SourceError::Device(format!("LeapC connection: {:?}", e)))?;
        connection.open()
            .map_err(|e| SourceError::Device(format!("LeapMotion device: {:?}", e)))?;
        log::info!("LeapMotion connection open");
        let projection = Projection { width: width as f32, height: height as f32 };
        Ok(LeapLandmarkSource { connection, projection })
    }
}

/// Leap millimetres → window pixels.
#[cfg(feature = "leap")]
#[derive(Clone, Copy)]
struct Projection {
    width:  f32,
    height: f32,
}

#[cfg(feature = "leap")]
impl Projection {
    fn point(self, x_mm: f32, y_mm: f32) -> Point {
        let col = (x_mm + 200.0) / 400.0 * self.width;
        let row = self.height - (y_mm - 100.0) / 400.0 * self.height;
        Point::new(col as i32, row as i32)
    }

    fn hand(self, hand: &leaprs::Hand) -> HandFrame {
        let mut points = Vec::with_capacity(hand_geometry::landmarks::COUNT);
        let palm = hand.palm().position();
        points.push(self.point(palm.x, palm.y));
        for digit in hand.digits() {
            for joint in [
                digit.proximal().prev_joint(),
                digit.intermediate().prev_joint(),
                digit.distal().prev_joint(),
                digit.distal().next_joint(),
            ] {
                points.push(self.point(joint.x, joint.y));
            }
        }
        HandFrame::from_points(points)
    }
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn name(&self) -> &str { "LeapMotion" }

    fn next_frame(&mut self) -> Result<Vec<HandFrame>, SourceError> {
        use leaprs::Event;

        let projection = self.projection;
        let mut failures = PollFailures::default();
        loop {
            let msg = match self.connection.poll(100) {
                Ok(m)  => {
                    failures.reset();
                    m
                }
                Err(e) => {
                    if failures.fail() {
                        return Err(SourceError::Device(format!("poll: {:?}", e)));
                    }
                    continue;
                }
            };
            if let Event::Tracking(frame) = msg.event() {
                return Ok(frame.hands().map(|h| projection.hand(&h)).collect());
            }
        }
    }
}

#[cfg(feature = "leap")]
impl Drop for LeapLandmarkSource {
    fn drop(&mut self) {
        log::info!("closing LeapMotion connection");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_geometry::distance;
    use hand_geometry::landmarks::*;
    use std::sync::mpsc;

    #[test]
    fn synthetic_hand_geometry() {
        let h = synthetic_hand(Point::new(400, 300), true, 120);
        assert_eq!(h.len(), COUNT);
        let (index, middle) = h.pair(INDEX_TIP, MIDDLE_TIP).unwrap();
        assert_eq!(index.midpoint(middle), Point::new(400, 300));
        assert_eq!(distance(index, middle), SIM_PINCH_SPREAD as f32);
        assert_eq!(distance(h.landmark(THUMB_TIP).unwrap(), index), 120.0);
        assert_eq!(h.landmark(WRIST), Some(Point::new(400, 500)));
    }

    #[test]
    fn synthetic_hand_open_spread() {
        let h = synthetic_hand(Point::new(400, 300), false, 60);
        let (index, middle) = h.pair(INDEX_TIP, MIDDLE_TIP).unwrap();
        assert_eq!(distance(index, middle), SIM_OPEN_SPREAD as f32);
        assert_eq!(index.midpoint(middle), Point::new(400, 300));
    }

    #[test]
    fn scripted_source_replays_then_ends() {
        let hand = synthetic_hand(Point::new(10, 10), false, 50);
        let mut src = ScriptedSource::new(vec![vec![hand.clone()], vec![]]);
        assert_eq!(src.next_frame().unwrap(), vec![hand]);
        assert!(src.next_frame().unwrap().is_empty());
        assert!(matches!(src.next_frame(), Err(SourceError::Exhausted)));
    }

    #[test]
    fn sim_source_uses_latest_sample() {
        let (tx, rx) = mpsc::channel();
        let mut src = SimLandmarkSource::new(rx);
        assert!(src.next_frame().unwrap().is_empty(), "no sample yet → no hand");

        tx.send(PointerSample { pos: Some((100.0, 100.0)), pinching: false, thumb_gap: 80.0 }).unwrap();
        tx.send(PointerSample { pos: Some((200.0, 150.0)), pinching: true, thumb_gap: 80.0 }).unwrap();
        let hands = src.next_frame().unwrap();
        assert_eq!(hands.len(), 1);
        let (i, m) = hands[0].pair(INDEX_TIP, MIDDLE_TIP).unwrap();
        assert_eq!(i.midpoint(m), Point::new(200, 150));

        // No new sample: the last one still describes the hand.
        assert_eq!(src.next_frame().unwrap().len(), 1);

        tx.send(PointerSample { pos: None, pinching: false, thumb_gap: 80.0 }).unwrap();
        assert!(src.next_frame().unwrap().is_empty(), "pointer left the window");

        drop(tx);
        assert!(matches!(src.next_frame(), Err(SourceError::Closed)));
    }

    #[test]
    fn poll_failures_count_only_unbroken_runs() {
        let mut failures = PollFailures::default();
        for _ in 1..PollFailures::LIMIT {
            assert!(!failures.fail());
        }
        failures.reset();
        for _ in 1..PollFailures::LIMIT {
            assert!(!failures.fail());
        }
        assert!(failures.fail(), "the limit-th failure in a row gives up");
    }
}
