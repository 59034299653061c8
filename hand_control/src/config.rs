//! Startup configuration.
//!
//! [`AppConfig`] is the raw, serde-friendly form (TOML file and CLI
//! overrides).  [`AppConfig::validate`] turns it into [`Settings`], the
//! runtime types the frame loop uses; every configuration error surfaces
//! there, before the first frame is read.

use std::fs;
use std::path::{Path, PathBuf};

use hand_geometry::{GeometryError, Point, Size};
use hand_volume::VolumeMapping;
use pinch_drag::{DragResolver, DragTarget, PinchDetector, TieBreak};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}", .path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Gesture(#[from] pinch_drag::ConfigError),

    #[error("{which} calibration: {source}")]
    Range { which: &'static str, #[source] source: GeometryError },

    #[error("window must be at least 320×240, got {0}×{1}")]
    Window(usize, usize),

    #[error("target {index} has non-positive size {width}×{height}")]
    TargetSize { index: usize, width: i32, height: i32 },

    #[error("MIDI channel must be 0–15, got {0}")]
    MidiChannel(u8),
}

// ════════════════════════════════════════════════════════════════════════════
// Mode
// ════════════════════════════════════════════════════════════════════════════

/// Which interactions run in the frame loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Pinch-and-drag boxes only.
    Drag,
    /// Thumb–index volume control only.
    Volume,
    /// Both; volume is held while a box is being dragged.
    #[default]
    Both,
}

impl Mode {
    pub fn drags(self)            -> bool { matches!(self, Mode::Drag | Mode::Both) }
    pub fn controls_volume(self)  -> bool { matches!(self, Mode::Volume | Mode::Both) }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Drag   => "drag",
            Mode::Volume => "volume",
            Mode::Both   => "both",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig: raw form
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub mode:               Mode,
    pub window_width:       usize,
    pub window_height:      usize,
    /// Fingertip distance (px) below which fingers count as touching.
    pub pinch_threshold:    f32,
    /// Consecutive frames needed to confirm a pinch or a release.
    pub debounce_threshold: u32,
    /// `list-order` or `nearest-center`.
    #[serde(deserialize_with = "de_tie_break")]
    pub tie_break:          TieBreak,
    pub targets:            Vec<TargetSpec>,
    pub volume:             VolumeConfig,
    pub midi:               MidiConfig,
}

fn de_tie_break<'de, D: Deserializer<'de>>(d: D) -> Result<TieBreak, D::Error> {
    String::deserialize(d)?.parse().map_err(serde::de::Error::custom)
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    pub center: [i32; 2],
    #[serde(default = "default_target_size")]
    pub size:   [i32; 2],
}

fn default_target_size() -> [i32; 2] { [150, 150] }

/// Input span and the two display ranges; the device range comes from the
/// volume sink at startup.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolumeConfig {
    pub input:   [f32; 2],
    pub percent: [f32; 2],
    pub bar:     [f32; 2],
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MidiConfig {
    pub enabled:   bool,
    pub channel:   u8,
    /// Case-insensitive substring of the preferred output port name.
    pub port_hint: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            mode:               Mode::default(),
            window_width:       1280,
            window_height:      720,
            pinch_threshold:    35.0,
            debounce_threshold: 5,
            tie_break:          TieBreak::default(),
            targets: [(200, 200), (500, 200), (800, 200), (300, 500), (700, 500)]
                .iter()
                .map(|&(x, y)| TargetSpec { center: [x, y], size: default_target_size() })
                .collect(),
            volume:             VolumeConfig::default(),
            midi:               MidiConfig::default(),
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        let (i, p, b) = (hand_volume::STANDARD_INPUT, hand_volume::STANDARD_PERCENT, hand_volume::STANDARD_BAR);
        VolumeConfig { input: [i.0, i.1], percent: [p.0, p.1], bar: [b.0, b.1] }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig { enabled: true, channel: 0, port_hint: None }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Settings: validated runtime form
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Settings {
    pub mode:     Mode,
    pub window:   (usize, usize),
    pub resolver: DragResolver,
    pub volume:   VolumeMapping,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        AppConfig::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Check everything and build the runtime objects.  `device_range` is
    /// the level range reported by the volume sink.
    pub fn validate(&self, device_range: (f32, f32)) -> Result<Settings, ConfigError> {
        if self.window_width < 320 || self.window_height < 240 {
            return Err(ConfigError::Window(self.window_width, self.window_height));
        }
        if self.midi.channel > 15 {
            return Err(ConfigError::MidiChannel(self.midi.channel));
        }

        let detector = PinchDetector::new(self.pinch_threshold, self.debounce_threshold)?;

        let mut targets = Vec::with_capacity(self.targets.len());
        for (index, target) in self.targets.iter().enumerate() {
            let [width, height] = target.size;
            if width <= 0 || height <= 0 {
                return Err(ConfigError::TargetSize { index, width, height });
            }
            let [x, y] = target.center;
            targets.push(DragTarget::new(Point::new(x, y), Size::new(width, height)));
        }

        let v = &self.volume;
        let input = (v.input[0], v.input[1]);
        let volume = VolumeMapping::new(input, device_range, (v.percent[0], v.percent[1]), (v.bar[0], v.bar[1]))
            .map_err(|source| ConfigError::Range { which: "volume", source })?;

        Ok(Settings {
            mode:     self.mode,
            window:   (self.window_width, self.window_height),
            resolver: DragResolver::new(targets, detector).with_tie_break(self.tie_break),
            volume,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const MIDI_RANGE: (f32, f32) = (0.0, 127.0);

    #[test]
    fn defaults_validate() {
        let s = AppConfig::default().validate(MIDI_RANGE).unwrap();
        assert_eq!(s.mode, Mode::Both);
        assert_eq!(s.window, (1280, 720));
        assert_eq!(s.resolver.targets().len(), 5);
        assert_eq!(s.resolver.detector().pinch_threshold(), 35.0);
        assert_eq!(s.resolver.detector().debounce_threshold(), 5);
        assert_eq!(s.resolver.tie_break(), TieBreak::ListOrder);
        assert_eq!(s.volume.input(), (50.0, 300.0));
        assert_eq!(s.volume.device_range(), MIDI_RANGE);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml_str(r#"
            mode = "drag"
            debounce_threshold = 3
            tie_break = "nearest-center"

            [[targets]]
            center = [640, 360]

            [[targets]]
            center = [100, 100]
            size = [80, 40]

            [midi]
            enabled = false
        "#).unwrap();

        assert_eq!(cfg.mode, Mode::Drag);
        assert_eq!(cfg.pinch_threshold, 35.0);
        assert_eq!(cfg.targets[0].size, [150, 150]);
        assert!(!cfg.midi.enabled);

        let s = cfg.validate(MIDI_RANGE).unwrap();
        assert_eq!(s.resolver.tie_break(), TieBreak::NearestCenter);
        assert_eq!(s.resolver.targets()[1].size(), Size::new(80, 40));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(AppConfig::from_toml_str("pinch = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn degenerate_volume_range_is_fatal() {
        let mut cfg = AppConfig::default();
        cfg.volume.input = [120.0, 120.0];
        assert!(matches!(cfg.validate(MIDI_RANGE), Err(ConfigError::Range { which: "volume", .. })));
    }

    #[test]
    fn gesture_errors_surface() {
        let mut cfg = AppConfig::default();
        cfg.debounce_threshold = 0;
        assert!(matches!(
            cfg.validate(MIDI_RANGE),
            Err(ConfigError::Gesture(pinch_drag::ConfigError::ZeroDebounce))
        ));
    }

    #[test]
    fn unknown_tie_break_is_a_parse_error() {
        let err = AppConfig::from_toml_str(r#"tie_break = "random""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("unknown tie-break policy `random`"), "{}", err);
    }

    #[test]
    fn bad_targets_and_channel() {
        let mut cfg = AppConfig::default();
        cfg.targets[2].size = [0, 150];
        assert!(matches!(cfg.validate(MIDI_RANGE), Err(ConfigError::TargetSize { index: 2, .. })));

        let mut cfg = AppConfig::default();
        cfg.midi.channel = 16;
        assert!(matches!(cfg.validate(MIDI_RANGE), Err(ConfigError::MidiChannel(16))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::load(Path::new("/nonexistent/hand_control.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/hand_control.toml"));
    }

    #[test]
    fn shipped_file_matches_defaults() {
        let cfg = AppConfig::from_toml_str(include_str!("../config/default.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn mode_flags() {
        assert!(Mode::Both.drags() && Mode::Both.controls_volume());
        assert!(!Mode::Volume.drags());
        assert!(!Mode::Drag.controls_volume());
    }
}
