//! roomtone - terminal soundscape mixer
//!
//! Run with: cargo run --bin roomtone -- rain.ogg fire.wav wind.mp3
//!
//! Each file becomes a looping source on the room plane. Drag sources
//! around with the keyboard and hear the spatial mapping, per-source EQ,
//! and shared effects respond live.

mod app;
mod ui;

use std::fs;
use std::path::Path;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait};

use roomtone::{build, EngineConfig};

use app::App;

/// Display emoji assigned to sources in load order.
const EMOJI: [&str; 8] = ["🌧️", "🔥", "🌊", "🍃", "⚡", "🦗", "🐦", "🎵"];

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        return Err(eyre!("usage: roomtone <audio file> [more files...]"));
    }

    // The engine runs at whatever rate the output device wants.
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;
    let sample_rate = config.sample_rate().0 as f32;

    let (mut registry, engine) = build(EngineConfig {
        sample_rate,
        ..EngineConfig::default()
    });

    for (index, path) in paths.iter().enumerate() {
        let id = Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("sound")
            .to_owned();
        let emoji = EMOJI[index % EMOJI.len()];

        let bytes = fs::read(path).wrap_err_with(|| format!("reading {path}"))?;
        registry
            .load_sound(&id, emoji, &bytes)
            .wrap_err_with(|| format!("decoding {path}"))?;
    }

    App::new(registry).run(&device, &config.into(), engine)
}
