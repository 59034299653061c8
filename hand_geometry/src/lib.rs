//! # hand_geometry
//!
//! Pixel-space geometry for hand-landmark streams: points, per-hand landmark
//! frames, axis-aligned boxes, and clamped linear interpolation between
//! calibration ranges.
//!
//! Everything in this crate is a pure value or a pure function.  Frame state
//! (debounce streaks, drag ownership) lives in `pinch_drag`.
//!
//! ## Quick start
//!
//! ```rust
//! use hand_geometry::{bounding_box, clamp_interp, distance, Point};
//!
//! let d = distance(Point::new(0, 0), Point::new(3, 4));
//! assert_eq!(d, 5.0);
//!
//! let bb = bounding_box(&[Point::new(10, 50), Point::new(30, 5), Point::new(20, 40)]).unwrap();
//! assert_eq!((bb.x_min, bb.y_min, bb.x_max, bb.y_max), (10, 5, 30, 50));
//!
//! // Finger distance 175 px on a 50–300 px span → 50 %.
//! assert_eq!(clamp_interp(175.0_f32, 50.0, 300.0, 0.0, 100.0).unwrap(), 50.0);
//! ```

use std::fmt;
use std::ops::{Add, Sub};

use num_traits::Float;
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Errors raised by geometry helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Malformed geometry input, e.g. an empty point set.
    #[error("invalid geometry input: {0}")]
    InvalidInput(&'static str),

    /// Degenerate or non-finite input interval for interpolation.
    #[error("invalid calibration range [{lo}, {hi}]")]
    InvalidRange { lo: f64, hi: f64 },

    /// A landmark id required by the caller is absent from the hand frame.
    #[error("landmark {id} missing from hand frame")]
    MissingLandmark { id: u8 },
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark ids: fixed anatomical convention (21 points per hand)
// ════════════════════════════════════════════════════════════════════════════

/// Landmark ids of the 21-point hand model.
pub mod landmarks {
    pub const WRIST:       u8 = 0;
    pub const THUMB_CMC:   u8 = 1;
    pub const THUMB_MCP:   u8 = 2;
    pub const THUMB_IP:    u8 = 3;
    pub const THUMB_TIP:   u8 = 4;
    pub const INDEX_MCP:   u8 = 5;
    pub const INDEX_PIP:   u8 = 6;
    pub const INDEX_DIP:   u8 = 7;
    pub const INDEX_TIP:   u8 = 8;
    pub const MIDDLE_MCP:  u8 = 9;
    pub const MIDDLE_PIP:  u8 = 10;
    pub const MIDDLE_DIP:  u8 = 11;
    pub const MIDDLE_TIP:  u8 = 12;
    pub const RING_MCP:    u8 = 13;
    pub const RING_PIP:    u8 = 14;
    pub const RING_DIP:    u8 = 15;
    pub const RING_TIP:    u8 = 16;
    pub const PINKY_MCP:   u8 = 17;
    pub const PINKY_PIP:   u8 = 18;
    pub const PINKY_DIP:   u8 = 19;
    pub const PINKY_TIP:   u8 = 20;

    /// Number of landmarks in a complete hand.
    pub const COUNT: usize = 21;

    /// Bone connections used when drawing a hand skeleton.
    pub const CONNECTIONS: [(u8, u8); 21] = [
        (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
        (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
        (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
        (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
        (RING_MCP, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
        (WRIST, PINKY_MCP),
    ];
}

// ════════════════════════════════════════════════════════════════════════════
// Point / Size
// ════════════════════════════════════════════════════════════════════════════

/// Integer pixel coordinate (column `x`, row `y`).  Also used as a
/// displacement vector (e.g. a drag offset).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self { Point { x, y } }

    /// Pixel midpoint, rounding toward negative infinity on both axes.
    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x).div_euclid(2),
            y: (self.y + other.y).div_euclid(2),
        }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point { Point::new(self.x + rhs.x, self.y + rhs.y) }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point { Point::new(self.x - rhs.x, self.y - rhs.y) }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self { Point { x, y } }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width × height in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width:  i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self { Size { width, height } }
}

// ════════════════════════════════════════════════════════════════════════════
// Pure geometry
// ════════════════════════════════════════════════════════════════════════════

/// Euclidean distance between two pixel points.
pub fn distance(a: Point, b: Point) -> f32 {
    let dx = b.x as f32 - a.x as f32;
    let dy = b.y as f32 - a.y as f32;
    dx.hypot(dy)
}

/// Tight axis-aligned box around `points`.
///
/// Fails with [`GeometryError::InvalidInput`] when `points` is empty.
pub fn bounding_box<'a, I>(points: I) -> Result<BoundingBox, GeometryError>
where
    I: IntoIterator<Item = &'a Point>,
{
    let mut iter = points.into_iter();
    let first = iter.next().ok_or(GeometryError::InvalidInput("empty point set"))?;
    let init = BoundingBox { x_min: first.x, y_min: first.y, x_max: first.x, y_max: first.y };
    Ok(iter.fold(init, |bb, p| BoundingBox {
        x_min: bb.x_min.min(p.x),
        y_min: bb.y_min.min(p.y),
        x_max: bb.x_max.max(p.x),
        y_max: bb.y_max.max(p.y),
    }))
}

/// Map `value` linearly from `[in_lo, in_hi]` onto `[out_lo, out_hi]` and
/// clamp the result to the output interval.
///
/// The output interval may be descending (`out_lo > out_hi`); the clamp then
/// uses `[out_hi, out_lo]`.  A zero-width or non-finite input interval is
/// rejected with [`GeometryError::InvalidRange`].
pub fn clamp_interp<T: Float>(value: T, in_lo: T, in_hi: T, out_lo: T, out_hi: T) -> Result<T, GeometryError> {
    if in_lo == in_hi || !in_lo.is_finite() || !in_hi.is_finite() {
        return Err(GeometryError::InvalidRange {
            lo: in_lo.to_f64().unwrap_or(f64::NAN),
            hi: in_hi.to_f64().unwrap_or(f64::NAN),
        });
    }
    Ok(interp_unchecked(value, in_lo, in_hi, out_lo, out_hi))
}

fn interp_unchecked<T: Float>(value: T, in_lo: T, in_hi: T, out_lo: T, out_hi: T) -> T {
    let t   = (value - in_lo) / (in_hi - in_lo);
    let raw = out_lo + t * (out_hi - out_lo);
    let (lo, hi) = if out_lo <= out_hi { (out_lo, out_hi) } else { (out_hi, out_lo) };
    // Float::max/min discard NaN, so a NaN value lands on `lo`.
    raw.max(lo).min(hi)
}

// ════════════════════════════════════════════════════════════════════════════
// BoundingBox
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned box, inclusive on all four edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    /// The rectangle a `size` box centred on `center` occupies:
    /// `center ± size / 2` using integer halves.
    pub fn around(center: Point, size: Size) -> Self {
        let hw = size.width / 2;
        let hh = size.height / 2;
        BoundingBox {
            x_min: center.x - hw,
            y_min: center.y - hh,
            x_max: center.x + hw,
            y_max: center.y + hh,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.x_min <= p.x && p.x <= self.x_max && self.y_min <= p.y && p.y <= self.y_max
    }

    /// Grow the box by `margin` pixels on every side.
    pub fn expanded(&self, margin: i32) -> Self {
        BoundingBox {
            x_min: self.x_min - margin,
            y_min: self.y_min - margin,
            x_max: self.x_max + margin,
            y_max: self.y_max + margin,
        }
    }

    pub fn width(&self)  -> i32 { self.x_max - self.x_min }
    pub fn height(&self) -> i32 { self.y_max - self.y_min }

    pub fn center(&self) -> Point {
        Point::new(self.x_min, self.y_min).midpoint(Point::new(self.x_max, self.y_max))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark / HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// One anatomically identified keypoint of a detected hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Landmark {
    pub id:  u8,
    pub pos: Point,
}

impl Landmark {
    pub const fn new(id: u8, x: i32, y: i32) -> Self {
        Landmark { id, pos: Point::new(x, y) }
    }
}

/// Landmarks of one hand in one image frame.
///
/// A frame may hold only a subset of the 21 ids; lookups go by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HandFrame {
    landmarks: Vec<Landmark>,
}

impl HandFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self { HandFrame { landmarks } }

    /// Build a frame from points listed in id order (id 0 first).
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let landmarks = points.into_iter()
            .enumerate()
            .map(|(i, pos)| Landmark { id: i as u8, pos })
            .collect();
        HandFrame { landmarks }
    }

    pub fn landmarks(&self) -> &[Landmark] { &self.landmarks }
    pub fn len(&self)       -> usize       { self.landmarks.len() }
    pub fn is_empty(&self)  -> bool        { self.landmarks.is_empty() }

    /// Position of landmark `id`, if the detector reported it.
    pub fn landmark(&self, id: u8) -> Option<Point> {
        // Complete frames are stored in id order; try the direct slot first.
        match self.landmarks.get(id as usize) {
            Some(lm) if lm.id == id => Some(lm.pos),
            _ => self.landmarks.iter().find(|lm| lm.id == id).map(|lm| lm.pos),
        }
    }

    /// Like [`landmark`](Self::landmark) but reports the missing id.
    pub fn require(&self, id: u8) -> Result<Point, GeometryError> {
        self.landmark(id).ok_or(GeometryError::MissingLandmark { id })
    }

    /// Both landmarks of a fingertip pair, or `None` if either is absent.
    pub fn pair(&self, a: u8, b: u8) -> Option<(Point, Point)> {
        Some((self.landmark(a)?, self.landmark(b)?))
    }

    /// Like [`pair`](Self::pair), but a pair with both points at the origin
    /// is also `None`: detectors report untracked landmarks as `(0, 0)`, and
    /// that placeholder says nothing about where the fingers are.
    pub fn signal_pair(&self, a: u8, b: u8) -> Option<(Point, Point)> {
        self.pair(a, b).filter(|&(pa, pb)| pa != Point::default() || pb != Point::default())
    }

    /// Box around every landmark in the frame.
    pub fn bounding_box(&self) -> Result<BoundingBox, GeometryError> {
        bounding_box(self.landmarks.iter().map(|lm| &lm.pos))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CalibrationRange
// ════════════════════════════════════════════════════════════════════════════

/// Validated pair of intervals for a fixed linear mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationRange {
    input:  (f32, f32),
    output: (f32, f32),
}

impl CalibrationRange {
    /// Reject degenerate input intervals up front so [`map`](Self::map)
    /// never has to.
    pub fn new(input: (f32, f32), output: (f32, f32)) -> Result<Self, GeometryError> {
        clamp_interp(input.0, input.0, input.1, output.0, output.1)?;
        Ok(CalibrationRange { input, output })
    }

    pub fn input(&self)  -> (f32, f32) { self.input }
    pub fn output(&self) -> (f32, f32) { self.output }

    pub fn map(&self, value: f32) -> f32 {
        interp_unchecked(value, self.input.0, self.input.1, self.output.0, self.output.1)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use super::landmarks::*;

    // ── distance / midpoint ──────────────────────────────────────────────
    #[test]
    fn distance_pythagorean() {
        assert_eq!(distance(Point::new(0, 0), Point::new(3, 4)), 5.0);
        assert_eq!(distance(Point::new(7, 7), Point::new(7, 7)), 0.0);
    }

    #[test]
    fn distance_symmetric() {
        let a = Point::new(-12, 40);
        let b = Point::new(30, -2);
        assert_eq!(distance(a, b), distance(b, a));
    }

    #[test]
    fn midpoint_floors() {
        assert_eq!(Point::new(200, 200).midpoint(Point::new(211, 200)), Point::new(205, 200));
        // -3 / 2 floors to -2, not -1
        assert_eq!(Point::new(-3, 0).midpoint(Point::new(0, 0)), Point::new(-2, 0));
    }

    // ── bounding box ─────────────────────────────────────────────────────
    #[test]
    fn bounding_box_tight() {
        let pts = [Point::new(10, 50), Point::new(30, 5), Point::new(20, 40)];
        let bb = bounding_box(&pts).unwrap();
        assert_eq!((bb.x_min, bb.y_min, bb.x_max, bb.y_max), (10, 5, 30, 50));
    }

    #[test]
    fn bounding_box_ties_and_single_point() {
        let pts = [Point::new(4, 4), Point::new(4, 9), Point::new(4, 9)];
        let bb = bounding_box(&pts).unwrap();
        assert_eq!((bb.x_min, bb.y_min, bb.x_max, bb.y_max), (4, 4, 4, 9));

        let one = bounding_box(&[Point::new(1, 2)]).unwrap();
        assert_eq!(one.width(), 0);
        assert_eq!(one.height(), 0);
    }

    #[test]
    fn bounding_box_empty_is_invalid_input() {
        let empty: [Point; 0] = [];
        assert!(matches!(bounding_box(&empty), Err(GeometryError::InvalidInput(_))));
    }

    #[test]
    fn box_around_is_inclusive() {
        let bb = BoundingBox::around(Point::new(200, 200), Size::new(150, 150));
        assert_eq!((bb.x_min, bb.y_min, bb.x_max, bb.y_max), (125, 125, 275, 275));
        assert!(bb.contains(Point::new(125, 275)));
        assert!(!bb.contains(Point::new(124, 200)));
        assert_eq!(bb.center(), Point::new(200, 200));
        assert_eq!(bb.expanded(20).x_min, 105);
    }

    // ── clamp_interp ─────────────────────────────────────────────────────
    #[test]
    fn interp_reference_points() {
        assert_eq!(clamp_interp(50.0_f32, 50.0, 300.0, 0.0, 100.0).unwrap(), 0.0);
        assert_eq!(clamp_interp(300.0_f32, 50.0, 300.0, 0.0, 100.0).unwrap(), 100.0);
        assert_eq!(clamp_interp(175.0_f32, 50.0, 300.0, 0.0, 100.0).unwrap(), 50.0);
    }

    #[test]
    fn interp_clamps_outside_input() {
        assert_eq!(clamp_interp(-40.0_f64, 50.0, 300.0, 0.0, 100.0).unwrap(), 0.0);
        assert_eq!(clamp_interp(900.0_f64, 50.0, 300.0, 0.0, 100.0).unwrap(), 100.0);
    }

    #[test]
    fn interp_descending_output() {
        // Volume bar: larger distance → smaller row (taller bar).
        assert_eq!(clamp_interp(50.0_f32, 50.0, 300.0, 400.0, 150.0).unwrap(), 400.0);
        assert_eq!(clamp_interp(300.0_f32, 50.0, 300.0, 400.0, 150.0).unwrap(), 150.0);
        assert_eq!(clamp_interp(10.0_f32, 50.0, 300.0, 400.0, 150.0).unwrap(), 400.0);
        assert_eq!(clamp_interp(1e6_f32, 50.0, 300.0, 400.0, 150.0).unwrap(), 150.0);
    }

    #[test]
    fn interp_monotonic() {
        let mut prev_up = f32::MIN;
        let mut prev_dn = f32::MAX;
        for d in 0..400 {
            let up = clamp_interp(d as f32, 50.0, 300.0, 0.0, 100.0).unwrap();
            let dn = clamp_interp(d as f32, 50.0, 300.0, 400.0, 150.0).unwrap();
            assert!(up >= prev_up, "ascending broke at {}", d);
            assert!(dn <= prev_dn, "descending broke at {}", d);
            prev_up = up;
            prev_dn = dn;
        }
    }

    #[test]
    fn interp_degenerate_range() {
        let err = clamp_interp(1.0_f32, 50.0, 50.0, 0.0, 100.0).unwrap_err();
        assert_eq!(err, GeometryError::InvalidRange { lo: 50.0, hi: 50.0 });
        assert!(clamp_interp(1.0_f32, f32::NAN, 50.0, 0.0, 1.0).is_err());
    }

    // ── HandFrame ────────────────────────────────────────────────────────
    #[test]
    fn hand_frame_lookup_by_id() {
        let hand = HandFrame::from_points((0..21).map(|i| Point::new(i * 10, i)));
        assert_eq!(hand.len(), COUNT);
        assert_eq!(hand.landmark(INDEX_TIP), Some(Point::new(80, 8)));
        assert_eq!(hand.pair(THUMB_TIP, MIDDLE_TIP), Some((Point::new(40, 4), Point::new(120, 12))));
    }

    #[test]
    fn hand_frame_subset_and_missing() {
        let hand = HandFrame::new(vec![Landmark::new(MIDDLE_TIP, 5, 5), Landmark::new(INDEX_TIP, 1, 1)]);
        assert_eq!(hand.landmark(INDEX_TIP), Some(Point::new(1, 1)));
        assert_eq!(hand.pair(THUMB_TIP, INDEX_TIP), None);
        assert_eq!(hand.require(THUMB_TIP), Err(GeometryError::MissingLandmark { id: THUMB_TIP }));
    }

    #[test]
    fn signal_pair_drops_all_zero_placeholder() {
        let blank = HandFrame::new(vec![Landmark::new(INDEX_TIP, 0, 0), Landmark::new(MIDDLE_TIP, 0, 0)]);
        assert_eq!(blank.pair(INDEX_TIP, MIDDLE_TIP), Some((Point::default(), Point::default())));
        assert_eq!(blank.signal_pair(INDEX_TIP, MIDDLE_TIP), None);

        // One real point at the origin is still a measurement.
        let edge = HandFrame::new(vec![Landmark::new(INDEX_TIP, 0, 0), Landmark::new(MIDDLE_TIP, 8, 0)]);
        assert_eq!(edge.signal_pair(INDEX_TIP, MIDDLE_TIP), Some((Point::new(0, 0), Point::new(8, 0))));
        assert_eq!(edge.signal_pair(THUMB_TIP, INDEX_TIP), None);
    }

    #[test]
    fn hand_frame_bounding_box() {
        let hand = HandFrame::new(vec![
            Landmark::new(WRIST, 10, 50),
            Landmark::new(THUMB_TIP, 30, 5),
            Landmark::new(INDEX_TIP, 20, 40),
        ]);
        let bb = hand.bounding_box().unwrap();
        assert_eq!((bb.x_min, bb.y_min, bb.x_max, bb.y_max), (10, 5, 30, 50));
        assert!(HandFrame::default().bounding_box().is_err());
    }

    // ── CalibrationRange ─────────────────────────────────────────────────
    #[test]
    fn calibration_range_validates_once() {
        assert!(CalibrationRange::new((50.0, 50.0), (0.0, 100.0)).is_err());
        let r = CalibrationRange::new((50.0, 300.0), (0.0, 100.0)).unwrap();
        assert_eq!(r.map(175.0), 50.0);
        assert_eq!(r.map(20.0), 0.0);
        assert_eq!(r.input(), (50.0, 300.0));
    }
}
