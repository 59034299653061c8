//! hand_control: interactive entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use hand_control::app::{run, StopReason};
use hand_control::config::{AppConfig, Mode};
use log::error;
use pinch_drag::TieBreak;

/// Pinch-and-drag boxes and finger-distance volume control.
#[derive(Debug, Parser)]
#[command(name = "hand_control", version)]
struct Args {
    /// TOML configuration file; unset fields keep their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which interactions run.
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Fingertip distance (px) below which fingers count as touching.
    #[arg(long)]
    pinch_threshold: Option<f32>,

    /// Consecutive frames needed to confirm a pinch or a release.
    #[arg(long)]
    debounce: Option<u32>,

    /// Winner when several boxes confirm on one frame: list-order or nearest-center.
    #[arg(long, value_parser = str::parse::<TieBreak>)]
    tie_break: Option<TieBreak>,

    /// Do not open a MIDI port; volume goes to the null sink.
    #[arg(long)]
    no_midi: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<AppConfig> {
        let mut cfg = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AppConfig::default(),
        };
        if let Some(mode) = self.mode                  { cfg.mode = mode; }
        if let Some(px)   = self.pinch_threshold       { cfg.pinch_threshold = px; }
        if let Some(n)    = self.debounce              { cfg.debounce_threshold = n; }
        if let Some(tb)   = self.tie_break             { cfg.tie_break = tb; }
        if self.no_midi                                { cfg.midi.enabled = false; }
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn real_main() -> anyhow::Result<()> {
    let cfg = Args::parse().into_config()?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Hand Control — Pinch-and-Drag & Volume Overlay        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Source: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Source: mouse simulation  (use --features leap for hardware)");
    println!("  Mode:   {}", cfg.mode.as_str());
    println!();
    println!("  Opening overlay window…");
    println!();

    match run(cfg).context("hand_control failed to start")? {
        StopReason::UserQuit       => Ok(()),
        StopReason::SourceEnded(e) => Err(anyhow::Error::new(e).context("landmark source stopped")),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_break_flag_is_checked_at_parse_time() {
        assert!(Args::try_parse_from(["hand_control", "--tie-break", "bogus"]).is_err());

        let args = Args::try_parse_from(["hand_control", "--tie-break", "nearest-center"]).unwrap();
        assert_eq!(args.tie_break, Some(TieBreak::NearestCenter));
        let cfg = args.into_config().unwrap();
        assert_eq!(cfg.tie_break, TieBreak::NearestCenter);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Args::try_parse_from(["hand_control", "--mode", "volume", "--debounce", "3", "--no-midi"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(cfg.mode, Mode::Volume);
        assert_eq!(cfg.debounce_threshold, 3);
        assert_eq!(cfg.tie_break, TieBreak::ListOrder);
        assert!(!cfg.midi.enabled);
    }
}
