//! Top-level frame loop.
//!
//! `AppState` owns the drag resolver and the volume mapping.  Each frame it
//! takes the hands the source reported, lets the first one drive the drag
//! resolver and the volume mapping, writes the volume level to the sink, and
//! returns a [`FrameOutput`] for the overlay.

use std::fmt;
use std::sync::mpsc;
use std::time::Instant;

use hand_geometry::landmarks::{INDEX_TIP, THUMB_TIP};
use hand_geometry::{distance, HandFrame, Point};
use hand_volume::{VolumeMapping, VolumeReading};
use log::{debug, info, warn};
use pinch_drag::{DragEvent, DragResolver, FrameReport};
use thiserror::Error;

use crate::config::{AppConfig, ConfigError, Mode, Settings};
use crate::sink::{open_volume_sink, VolumeSink};
use crate::source::{LandmarkSource, PointerSample, SimLandmarkSource, SourceError};
use crate::visualizer::Visualizer;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot open overlay window: {0}")]
    Window(#[from] minifb::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// FrameClock: smoothed frames per second
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
    fps:  f32,
}

impl FrameClock {
    /// Weight of the previous estimate in the running average.
    const SMOOTHING: f32 = 0.9;

    pub fn new() -> Self { FrameClock::default() }

    /// Record a frame at `now` and return the updated estimate (0 until two
    /// frames have been seen).
    pub fn tick(&mut self, now: Instant) -> f32 {
        if let Some(prev) = self.last.replace(now) {
            let dt = now.saturating_duration_since(prev).as_secs_f32();
            if dt > 0.0 {
                let instant = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    instant
                } else {
                    self.fps * Self::SMOOTHING + instant * (1.0 - Self::SMOOTHING)
                };
            }
        }
        self.fps
    }

    pub fn fps(&self) -> f32 { self.fps }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

/// Everything the overlay needs about one processed frame.
#[derive(Clone, Debug, Default)]
pub struct FrameOutput {
    /// All hands reported this frame; only the first drove decisions.
    pub hands:       Vec<HandFrame>,
    pub drag:        FrameReport,
    /// Fresh volume reading, `None` when no reading was taken this frame.
    pub volume:      Option<VolumeReading>,
    /// Thumb and index tips of the deciding hand, in volume modes.
    pub volume_tips: Option<(Point, Point)>,
    pub fps:         f32,
}

pub struct AppState {
    mode:        Mode,
    resolver:    DragResolver,
    volume:      VolumeMapping,
    last_volume: Option<VolumeReading>,
    clock:       FrameClock,
    frames:      u64,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        AppState {
            mode:        settings.mode,
            resolver:    settings.resolver,
            volume:      settings.volume,
            last_volume: None,
            clock:       FrameClock::new(),
            frames:      0,
        }
    }

    /// Process one frame's hands.
    ///
    /// In `Both` mode the volume is held while a box is locked, so dragging
    /// does not also change the level.  A failed sink write is logged and
    /// the frame completes.
    pub fn process_frame(
        &mut self,
        hands: Vec<HandFrame>,
        now:   Instant,
        sink:  &mut dyn VolumeSink,
    ) -> FrameOutput {
        let fps = self.clock.tick(now);
        self.frames += 1;
        let primary = hands.first();

        let drag = if self.mode.drags() {
            self.resolver.step(primary)
        } else {
            FrameReport::default()
        };
        match drag.event {
            Some(DragEvent::Grabbed { target, .. }) => info!("grabbed box {}", target),
            Some(DragEvent::Dropped { target, center }) => info!("dropped box {} at {}", target, center),
            _ => {}
        }

        let mut volume = None;
        let mut volume_tips = None;
        if self.mode.controls_volume() {
            volume_tips = primary.and_then(|h| h.signal_pair(THUMB_TIP, INDEX_TIP));
            match volume_tips {
                Some(_) if self.resolver.is_locked() => {}
                Some((thumb, index)) => {
                    let reading = self.volume.read(distance(thumb, index));
                    if let Err(e) = sink.set_level(reading.device_level) {
                        warn!("volume write to '{}' failed: {}", sink.name(), e);
                    }
                    self.last_volume = Some(reading);
                    volume = Some(reading);
                }
                None => {}
            }
        }

        FrameOutput { hands, drag, volume, volume_tips, fps }
    }

    pub fn mode(&self)        -> Mode                  { self.mode }
    pub fn resolver(&self)    -> &DragResolver         { &self.resolver }
    /// Most recent volume reading; the bar keeps showing it while volume
    /// is held or no hand is visible.
    pub fn last_volume(&self) -> Option<VolumeReading> { self.last_volume }
    pub fn frames(&self)      -> u64                   { self.frames }
}

// ════════════════════════════════════════════════════════════════════════════
// drive(): source → state → sink, until quit or source failure
// ════════════════════════════════════════════════════════════════════════════

/// Why the frame loop stopped.
#[derive(Debug)]
pub enum StopReason {
    UserQuit,
    SourceEnded(SourceError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::UserQuit       => write!(f, "user quit"),
            StopReason::SourceEnded(e) => write!(f, "{}", e),
        }
    }
}

/// Run frames until `on_frame` returns false or the source fails.
///
/// Takes ownership of the source and sink; both are dropped, and their
/// devices released, before this returns.
pub fn drive<F>(
    state:        &mut AppState,
    mut source:   Box<dyn LandmarkSource>,
    mut sink:     Box<dyn VolumeSink>,
    mut on_frame: F,
) -> StopReason
where
    F: FnMut(&AppState, &FrameOutput) -> bool,
{
    info!("frame loop: source '{}', volume sink '{}'", source.name(), sink.name());
    loop {
        let hands = match source.next_frame() {
            Ok(h)  => h,
            Err(e) => {
                debug!("source '{}' stopped after {} frames", source.name(), state.frames());
                return StopReason::SourceEnded(e);
            }
        };
        let out = state.process_frame(hands, Instant::now(), sink.as_mut());
        if !on_frame(state, &out) {
            return StopReason::UserQuit;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Opens the volume sink first (its level range is the device calibration
/// output), validates the configuration, then opens the overlay window and
/// the landmark source (pointer simulation by default, hardware with
/// `--features leap`) and drives the frame loop.
pub fn run(cfg: AppConfig) -> Result<StopReason, AppError> {
    let sink = open_volume_sink(&cfg.midi);
    let settings = cfg.validate(sink.level_range())?;
    let window = settings.window;

    // ── Pointer channel: window → simulated hand ─────────────────────────
    let (pointer_tx, pointer_rx) = mpsc::channel::<PointerSample>();
    let mut vis = Visualizer::new(window, pointer_tx)?;
    let source = open_source(window, pointer_rx);

    info!(
        "mode {}, {} boxes, pinch < {} px for {} frames, tie-break {}",
        settings.mode.as_str(),
        settings.resolver.targets().len(),
        settings.resolver.detector().pinch_threshold(),
        settings.resolver.detector().debounce_threshold(),
        settings.resolver.tie_break().as_str(),
    );
    let mut state = AppState::new(settings);

    if !vis.poll_input() {
        return Ok(StopReason::UserQuit);
    }
    let reason = drive(&mut state, source, sink, |state, out| {
        vis.render(state, out);
        vis.poll_input()
    });
    info!("stopped: {} ({} frames)", reason, state.frames());
    Ok(reason)
}

fn open_source(
    (width, height): (usize, usize),
    pointer_rx: mpsc::Receiver<PointerSample>,
) -> Box<dyn LandmarkSource> {
    #[cfg(feature = "leap")]
    {
        match crate::source::LeapLandmarkSource::open(width, height) {
            Ok(src) => return Box::new(src),
            Err(e)  => warn!("{}; falling back to pointer simulation", e),
        }
    }
    debug!("pointer simulation on a {}×{} window", width, height);
    Box::new(SimLandmarkSource::new(pointer_rx))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
