//! # pinch_drag
//!
//! Stateful gesture core: turns per-frame hand landmarks into debounced
//! pinch events and exclusive drag ownership over a set of on-screen
//! targets.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Fingertips | Action |
//! |---|---|---|
//! | Pinch held `debounce` frames inside a box | index + middle | Grab box, take the active lock |
//! | Pinch held while grabbed | index + middle | Box follows the fingertip midpoint (+ grab offset) |
//! | Fingers apart `debounce` frames | index + middle | Drop box, release the lock |
//! | Hand missing | any | Nothing changes (no signal) |
//!
//! ## Quick start
//!
//! ```rust
//! use hand_geometry::{landmarks::{INDEX_TIP, MIDDLE_TIP}, HandFrame, Landmark, Point, Size};
//! use pinch_drag::{DragEvent, DragResolver, DragTarget, PinchDetector};
//!
//! let detector = PinchDetector::new(35.0, 5).unwrap();
//! let mut resolver = DragResolver::new(
//!     vec![DragTarget::new(Point::new(200, 200), Size::new(150, 150))],
//!     detector,
//! );
//!
//! let pinch = HandFrame::new(vec![
//!     Landmark::new(INDEX_TIP,  195, 200),
//!     Landmark::new(MIDDLE_TIP, 205, 200),
//! ]);
//! for _ in 0..4 { resolver.step(Some(&pinch)); }
//! let report = resolver.step(Some(&pinch));
//! assert!(matches!(report.event, Some(DragEvent::Grabbed { .. })));
//! assert!(resolver.is_locked());
//! ```

pub mod detector;
pub mod resolver;

pub use detector::{PinchDetector, PinchPhase, PinchReading, PinchStreak};
pub use resolver::{
    DragEvent, DragResolver, DragTarget, FrameReport, ParseTieBreakError, TargetId, TieBreak,
};

use thiserror::Error;

/// Invalid gesture configuration.  Raised at startup, never per frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("pinch threshold must be a positive pixel distance, got {0}")]
    PinchThreshold(f32),

    #[error("debounce threshold must be at least one frame")]
    ZeroDebounce,
}
