//! # hand_volume
//!
//! Continuous control from a fingertip distance.
//!
//! A [`ContinuousMapper`] is one fixed, validated linear mapping.  A
//! [`VolumeMapping`] bundles the three mappings the volume overlay needs
//! (device level, 0–100 display percentage, the bar's top row in pixels)
//! and always evaluates them from the same distance so the bar, the label
//! and the device never disagree within a frame.
//!
//! ```rust
//! use hand_volume::VolumeMapping;
//!
//! let mapping = VolumeMapping::standard((0.0, 127.0)).unwrap();
//! let r = mapping.read(175.0);
//! assert_eq!(r.percent, 50.0);
//! assert_eq!(r.bar_top, 275.0);
//! assert_eq!(r.device_level, 63.5);
//! ```

use hand_geometry::{CalibrationRange, GeometryError};

/// Thumb–index distance span (pixels) used by the standard mapping.
pub const STANDARD_INPUT:   (f32, f32) = (50.0, 300.0);
/// Display percentage.
pub const STANDARD_PERCENT: (f32, f32) = (0.0, 100.0);
/// Bar top row: 400 px (empty) up to 150 px (full).
pub const STANDARD_BAR:     (f32, f32) = (400.0, 150.0);

// ════════════════════════════════════════════════════════════════════════════
// ContinuousMapper
// ════════════════════════════════════════════════════════════════════════════

/// Stateless distance → scalar transform over one [`CalibrationRange`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContinuousMapper {
    range: CalibrationRange,
}

impl ContinuousMapper {
    pub fn new(range: CalibrationRange) -> Self { ContinuousMapper { range } }

    pub fn from_ranges(input: (f32, f32), output: (f32, f32)) -> Result<Self, GeometryError> {
        Ok(ContinuousMapper::new(CalibrationRange::new(input, output)?))
    }

    pub fn range(&self) -> &CalibrationRange { &self.range }

    pub fn map(&self, distance: f32) -> f32 { self.range.map(distance) }
}

// ════════════════════════════════════════════════════════════════════════════
// VolumeMapping / VolumeReading
// ════════════════════════════════════════════════════════════════════════════

/// All three outputs for one distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeReading {
    pub distance:     f32,
    /// Value written to the volume sink, in the sink's own units.
    pub device_level: f32,
    /// 0–100 for the on-screen label.
    pub percent:      f32,
    /// Pixel row of the top of the filled volume bar.
    pub bar_top:      f32,
    floor:            f32,
}

impl VolumeReading {
    /// Fingers closer than the bottom of the input span; the overlay marks
    /// this with a "minimum" dot between the fingertips.
    pub fn is_at_floor(&self) -> bool { self.distance < self.floor }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeMapping {
    device:  ContinuousMapper,
    percent: ContinuousMapper,
    bar:     ContinuousMapper,
}

impl VolumeMapping {
    /// Three mappings sharing one input span.
    pub fn new(
        input:   (f32, f32),
        device:  (f32, f32),
        percent: (f32, f32),
        bar:     (f32, f32),
    ) -> Result<Self, GeometryError> {
        Ok(VolumeMapping {
            device:  ContinuousMapper::from_ranges(input, device)?,
            percent: ContinuousMapper::from_ranges(input, percent)?,
            bar:     ContinuousMapper::from_ranges(input, bar)?,
        })
    }

    /// 50–300 px onto `device_range`, 0–100 %, and bar rows 400→150.
    pub fn standard(device_range: (f32, f32)) -> Result<Self, GeometryError> {
        VolumeMapping::new(STANDARD_INPUT, device_range, STANDARD_PERCENT, STANDARD_BAR)
    }

    pub fn input(&self) -> (f32, f32) { self.device.range().input() }

    pub fn device_range(&self) -> (f32, f32) { self.device.range().output() }

    pub fn read(&self, distance: f32) -> VolumeReading {
        let (lo, hi) = self.input();
        VolumeReading {
            distance,
            device_level: self.device.map(distance),
            percent:      self.percent.map(distance),
            bar_top:      self.bar.map(distance),
            floor:        lo.min(hi),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_reference_points() {
        let m = ContinuousMapper::from_ranges((50.0, 300.0), (0.0, 100.0)).unwrap();
        assert_eq!(m.map(50.0), 0.0);
        assert_eq!(m.map(300.0), 100.0);
        assert_eq!(m.map(175.0), 50.0);
    }

    #[test]
    fn degenerate_input_rejected() {
        assert!(ContinuousMapper::from_ranges((80.0, 80.0), (0.0, 1.0)).is_err());
        assert!(VolumeMapping::new((10.0, 10.0), (0.0, 1.0), (0.0, 100.0), (400.0, 150.0)).is_err());
    }

    #[test]
    fn standard_mapping_consistent() {
        // dB range as reported by a typical Windows endpoint
        let m = VolumeMapping::standard((-65.25, 0.0)).unwrap();

        let lo = m.read(20.0);
        assert_eq!((lo.device_level, lo.percent, lo.bar_top), (-65.25, 0.0, 400.0));
        assert!(lo.is_at_floor());

        let hi = m.read(500.0);
        assert_eq!((hi.device_level, hi.percent, hi.bar_top), (0.0, 100.0, 150.0));
        assert!(!hi.is_at_floor());
    }

    #[test]
    fn outputs_move_together() {
        let m = VolumeMapping::standard((0.0, 127.0)).unwrap();
        let mut prev = m.read(0.0);
        for d in 1..350 {
            let r = m.read(d as f32);
            assert!(r.device_level >= prev.device_level);
            assert!(r.percent >= prev.percent);
            assert!(r.bar_top <= prev.bar_top, "bar grows upward as distance grows");
            prev = r;
        }
    }

    #[test]
    fn mapping_reports_ranges() {
        let m = VolumeMapping::standard((0.0, 127.0)).unwrap();
        assert_eq!(m.input(), STANDARD_INPUT);
        assert_eq!(m.device_range(), (0.0, 127.0));
    }
}
