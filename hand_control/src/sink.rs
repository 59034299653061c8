//! Volume output.
//!
//! The frame loop only ever *writes* a level; where it goes is behind
//! [`VolumeSink`].  The hardware backend drives MIDI channel volume
//! (controller 7) through `midir`; [`NullVolumeSink`] stands in when no port
//! is available and in tests.
//!
//! Sinks release their device in `Drop`, so the port is closed on every exit
//! path of the frame loop.

use log::{info, warn};
use thiserror::Error;

use crate::config::MidiConfig;

/// MIDI controller number for channel volume.
const CC_CHANNEL_VOLUME: u8 = 7;

/// Level range of MIDI channel volume.
pub const MIDI_LEVEL_RANGE: (f32, f32) = (0.0, 127.0);

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("MIDI init failed: {0}")]
    Init(#[from] midir::InitError),

    #[error("no MIDI output ports available")]
    NoPorts,

    #[error("MIDI connect failed: {0}")]
    Connect(String),

    #[error("MIDI send failed: {0}")]
    Send(#[from] midir::SendError),

    #[error("level {0} is not a finite number")]
    NotFinite(f32),
}

// ════════════════════════════════════════════════════════════════════════════
// VolumeSink: abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

pub trait VolumeSink {
    fn name(&self) -> &str;

    /// Inclusive `(min, max)` level this sink accepts.  Read once at startup
    /// to build the device calibration range.
    fn level_range(&self) -> (f32, f32);

    fn set_level(&mut self, level: f32) -> Result<(), SinkError>;
}

// ── midir backend ─────────────────────────────────────────────────────────

pub struct MidiVolumeSink {
    conn:      Option<midir::MidiOutputConnection>,
    port_name: String,
    channel:   u8,
    /// Last value sent; repeated levels are not re-sent.
    last:      Option<u8>,
}

impl MidiVolumeSink {
    /// Open an output port: the first whose name contains `port_hint`, else a
    /// likely software synthesiser, else the first port.
    pub fn open(channel: u8, port_hint: Option<&str>) -> Result<Self, SinkError> {
        let midi_out = midir::MidiOutput::new("hand_control")?;

        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(SinkError::NoPorts);
        }

        let names: Vec<String> = ports.iter()
            .map(|p| midi_out.port_name(p).unwrap_or_default().to_lowercase())
            .collect();
        let hint = port_hint.map(str::to_lowercase);
        let port_idx = hint.as_deref()
            .and_then(|h| names.iter().position(|n| n.contains(h)))
            .or_else(|| names.iter().position(|n| {
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("gm") ||
                n.contains("synth")
            }))
            .unwrap_or(0);

        let port = &ports[port_idx];
        let port_name = midi_out.port_name(port).unwrap_or_else(|_| format!("port {}", port_idx));
        let conn = midi_out.connect(port, "hand-volume")
            .map_err(|e| SinkError::Connect(e.to_string()))?;

        info!("volume → MIDI '{}' channel {} (CC {})", port_name, channel, CC_CHANNEL_VOLUME);
        Ok(MidiVolumeSink { conn: Some(conn), port_name, channel: channel & 0x0F, last: None })
    }
}

impl VolumeSink for MidiVolumeSink {
    fn name(&self) -> &str { &self.port_name }

    fn level_range(&self) -> (f32, f32) { MIDI_LEVEL_RANGE }

    fn set_level(&mut self, level: f32) -> Result<(), SinkError> {
        if !level.is_finite() {
            return Err(SinkError::NotFinite(level));
        }
        let value = level.round().clamp(MIDI_LEVEL_RANGE.0, MIDI_LEVEL_RANGE.1) as u8;
        if self.last == Some(value) {
            return Ok(());
        }
        if let Some(conn) = self.conn.as_mut() {
            conn.send(&[0xB0 | self.channel, CC_CHANNEL_VOLUME, value])?;
            self.last = Some(value);
        }
        Ok(())
    }
}

impl Drop for MidiVolumeSink {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.close();
            info!("closed MIDI port '{}'", self.port_name);
        }
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

/// Accepts every level and remembers the most recent one.
#[derive(Debug, Clone)]
pub struct NullVolumeSink {
    range:  (f32, f32),
    last:   Option<f32>,
    writes: usize,
}

impl NullVolumeSink {
    pub fn new(range: (f32, f32)) -> Self {
        NullVolumeSink { range, last: None, writes: 0 }
    }

    pub fn last_level(&self) -> Option<f32> { self.last }
    pub fn writes(&self)     -> usize       { self.writes }
}

impl VolumeSink for NullVolumeSink {
    fn name(&self) -> &str { "null" }

    fn level_range(&self) -> (f32, f32) { self.range }

    fn set_level(&mut self, level: f32) -> Result<(), SinkError> {
        if !level.is_finite() {
            return Err(SinkError::NotFinite(level));
        }
        self.last = Some(level);
        self.writes += 1;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// open_volume_sink: pick MIDI or fall back to null
// ════════════════════════════════════════════════════════════════════════════

/// Open the configured sink, falling back to [`NullVolumeSink`] with a
/// warning when MIDI is disabled or unavailable.
pub fn open_volume_sink(cfg: &MidiConfig) -> Box<dyn VolumeSink> {
    if !cfg.enabled {
        info!("MIDI disabled, volume goes to the null sink");
        return Box::new(NullVolumeSink::new(MIDI_LEVEL_RANGE));
    }
    match MidiVolumeSink::open(cfg.channel, cfg.port_hint.as_deref()) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            warn!("{}; using null volume output", e);
            warn!("install a MIDI synthesiser such as:");
            warn!("  • macOS: built-in CoreMIDI (always available)");
            warn!("  • Linux: `timidity -iA` or `fluidsynth`");
            warn!("  • Windows: built-in GS Wavetable Synth");
            Box::new(NullVolumeSink::new(MIDI_LEVEL_RANGE))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
