//! # hand_control
//!
//! Hand-landmark gesture controller: pinch-and-drag boxes and a
//! thumb–index distance volume control, with a software-rendered overlay.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Fingertips | Action |
//! |---|---|---|
//! | Pinch inside a box, held `debounce` frames | index + middle | Grab the box |
//! | Keep pinching, move the hand | index + middle | Box follows the hand |
//! | Open the fingers, held `debounce` frames | index + middle | Drop the box |
//! | Spread / close | thumb + index | Volume up / down (held while a box is grabbed) |
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: the mouse drives a synthetic hand.
//! * `leap`: **Hardware mode**: projects a real LeapMotion hand skeleton
//!   via LeapC; falls back to simulation when no device opens.
//!
//! ### Simulation controls
//!
//! | Input | Effect |
//! |---|---|
//! | Mouse | Index/middle fingertip midpoint |
//! | Left button (hold) | Pinch index + middle |
//! | `Up` / `Down`, scroll wheel | Widen / narrow the thumb–index gap |
//! | Pointer outside window | No hand |
//! | `Q` / `Escape` | Quit |
//!
//! Volume goes to MIDI channel volume (CC 7) on the first synthesiser-like
//! output port, or to a null sink when none is available.

pub mod config;
pub mod source;
pub mod sink;
pub mod visualizer;
pub mod app;
