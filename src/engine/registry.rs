//! The control path: the public API every caller goes through.
//!
//! The registry owns the id→slot map and a mirror of each source's
//! clamped control state, so getters answer immediately and consistently
//! without ever touching the render path. Mutations are clamped here,
//! recorded in the mirror, and forwarded to the render path as commands.
//!
//! Per the engine's error philosophy: decoding problems are reported,
//! unknown ids are silent no-ops, and out-of-range values are clamped
//! rather than rejected.

use std::collections::HashMap;

use log::{info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::decode;
use crate::effects::{EffectKind, EffectParams};
use crate::engine::command::{Command, Retired};
use crate::engine::mixer::MixEngine;
use crate::eq::{self, EqBand, BAND_COUNT};
use crate::error::{DecodeError, SceneError};
use crate::scene;
use crate::source::SoundSource;
use crate::spatial::SpatialMapper;

/// Engine construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Half-extent `R` of the square room `[-R, R] × [-R, R]`.
    pub room_half_extent: f32,
    /// Maximum simultaneous sources (render slots).
    pub max_sources: usize,
    /// Command ring capacity; sized for bursts of drag updates.
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            room_half_extent: 1.0,
            max_sources: 32,
            command_capacity: 1_024,
        }
    }
}

/// Volume a newly loaded source ramps up to.
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Build a connected registry/engine pair.
///
/// The registry stays with the caller; the engine moves into the audio
/// callback (or is driven directly in headless use).
pub fn build(config: EngineConfig) -> (SourceRegistry, MixEngine) {
    let (command_tx, command_rx) = RingBuffer::new(config.command_capacity.max(64));
    let (reclaim_tx, reclaim_rx) = RingBuffer::new(config.max_sources.max(1));

    let engine = MixEngine::new(
        config.sample_rate,
        config.max_sources,
        command_rx,
        reclaim_tx,
    );
    let registry = SourceRegistry {
        commands: command_tx,
        reclaim: reclaim_rx,
        sources: HashMap::new(),
        free_slots: (0..config.max_sources).rev().collect(),
        mapper: SpatialMapper::new(config.room_half_extent),
        sample_rate: config.sample_rate,
        effects: EffectsMirror::default(),
    };

    (registry, engine)
}

/// Control-side record of one loaded source.
struct SourceEntry {
    slot: usize,
    emoji: String,
    volume: f32,
    muted: bool,
    position: (f32, f32),
    eq: [EqBand; BAND_COUNT],
}

#[derive(Default)]
struct EffectsMirror {
    reverb_enabled: bool,
    delay_enabled: bool,
    lofi_enabled: bool,
}

pub struct SourceRegistry {
    commands: Producer<Command>,
    reclaim: Consumer<Retired>,
    sources: HashMap<String, SourceEntry>,
    free_slots: Vec<usize>,
    mapper: SpatialMapper,
    sample_rate: f32,
    effects: EffectsMirror,
}

impl SourceRegistry {
    /// Decode `bytes` and start the source looping at the room center,
    /// faded in over ~20 ms.
    ///
    /// Failures leave the registry and every other source untouched.
    pub fn load_sound(
        &mut self,
        id: &str,
        emoji: &str,
        bytes: &[u8],
    ) -> Result<(), DecodeError> {
        self.drain_reclaim();

        if self.sources.contains_key(id) {
            return Err(DecodeError::DuplicateId(id.to_owned()));
        }

        let clip = decode::decode_blob(bytes)?;

        let slot = self
            .free_slots
            .pop()
            .ok_or(DecodeError::NoFreeSlots(self.slot_count()))?;

        let position = (0.0, 0.0);
        let spatial = self.mapper.map(position.0, position.1);
        let source = Box::new(SoundSource::new(
            id,
            emoji,
            clip,
            self.sample_rate,
            DEFAULT_VOLUME,
            spatial,
        ));

        if let Err(rtrb::PushError::Full(_)) =
            self.commands.push(Command::AddSource { slot, source })
        {
            // Engine not draining; give the slot back and report.
            self.free_slots.push(slot);
            warn!("command ring full; load of {id:?} dropped");
            return Err(DecodeError::DecodeFailure(
                "engine command queue full".into(),
            ));
        }

        self.sources.insert(
            id.to_owned(),
            SourceEntry {
                slot,
                emoji: emoji.to_owned(),
                volume: DEFAULT_VOLUME,
                muted: false,
                position,
                eq: eq::default_bands(),
            },
        );
        info!("loaded sound {id:?} into slot {slot}");
        Ok(())
    }

    /// Fade the source out and release it. Unknown id is a no-op.
    ///
    /// The id is free for reuse immediately; the render slot returns to
    /// the pool once the fade-out completes and the carcass comes back.
    pub fn remove_sound(&mut self, id: &str) {
        self.drain_reclaim();

        if let Some(entry) = self.sources.remove(id) {
            self.send(Command::RemoveSource { slot: entry.slot });
            info!("removed sound {id:?}");
        }
    }

    pub fn set_sound_volume(&mut self, id: &str, volume: f32) {
        self.drain_reclaim();

        if let Some(entry) = self.sources.get_mut(id) {
            entry.volume = volume.clamp(0.0, 1.0);
            let command = Command::SetVolume {
                slot: entry.slot,
                volume: entry.volume,
            };
            self.send(command);
        }
    }

    pub fn get_sound_volume(&self, id: &str) -> Option<f32> {
        self.sources.get(id).map(|entry| entry.volume)
    }

    pub fn set_mute(&mut self, id: &str, muted: bool) {
        self.drain_reclaim();

        if let Some(entry) = self.sources.get_mut(id) {
            entry.muted = muted;
            let command = Command::SetMuted {
                slot: entry.slot,
                muted,
            };
            self.send(command);
        }
    }

    pub fn is_muted(&self, id: &str) -> Option<bool> {
        self.sources.get(id).map(|entry| entry.muted)
    }

    /// Move a source on the room plane; out-of-room positions clamp to
    /// the walls, and all three spatial parameters re-derive.
    pub fn set_sound_position(&mut self, id: &str, x: f32, y: f32) {
        self.drain_reclaim();

        let mapper = self.mapper;
        if let Some(entry) = self.sources.get_mut(id) {
            entry.position = mapper.clamp_position(x, y);
            let params = mapper.map(entry.position.0, entry.position.1);
            let command = Command::SetSpatial {
                slot: entry.slot,
                params,
            };
            self.send(command);
        }
    }

    pub fn get_sound_position(&self, id: &str) -> Option<(f32, f32)> {
        self.sources.get(id).map(|entry| entry.position)
    }

    /// Set one EQ band's gain; slot layout is fixed, gain clamps to
    /// ±12 dB. Invalid band indices are ignored.
    pub fn set_eq_band(&mut self, id: &str, band: usize, gain_db: f32) {
        self.drain_reclaim();

        if band >= BAND_COUNT {
            return;
        }
        if let Some(entry) = self.sources.get_mut(id) {
            let gain_db = eq::clamp_gain_db(gain_db);
            entry.eq[band].gain_db = gain_db;
            let command = Command::SetEqGain {
                slot: entry.slot,
                band,
                gain_db,
            };
            self.send(command);
        }
    }

    /// Set one band's Q (peaking width). Invalid indices are ignored.
    pub fn set_eq_band_q(&mut self, id: &str, band: usize, q: f32) {
        self.drain_reclaim();

        if band >= BAND_COUNT {
            return;
        }
        if let Some(entry) = self.sources.get_mut(id) {
            let q = q.max(0.05);
            entry.eq[band].q = q;
            let command = Command::SetEqQ {
                slot: entry.slot,
                band,
                q,
            };
            self.send(command);
        }
    }

    pub fn get_sound_eq(&self, id: &str) -> Option<[EqBand; BAND_COUNT]> {
        self.sources.get(id).map(|entry| entry.eq)
    }

    /// Apply all five gains atomically (one command, one quantum).
    pub fn apply_eq_preset(&mut self, id: &str, gains: [f32; BAND_COUNT]) {
        self.drain_reclaim();

        if let Some(entry) = self.sources.get_mut(id) {
            let mut clamped = gains;
            for gain in &mut clamped {
                *gain = eq::clamp_gain_db(*gain);
            }
            for (band, gain) in entry.eq.iter_mut().zip(clamped) {
                band.gain_db = gain;
            }
            let command = Command::SetEqGains {
                slot: entry.slot,
                gains: clamped,
            };
            self.send(command);
        }
    }

    /// Apply a built-in soundscape preset.
    ///
    /// Every referenced id is validated before anything is sent, so a
    /// failure changes nothing.
    pub fn load_scene(&mut self, name: &str) -> Result<(), SceneError> {
        self.drain_reclaim();

        let scene =
            scene::find(name).ok_or_else(|| SceneError::UnknownScene(name.to_owned()))?;

        for sound in scene.sounds {
            if !self.sources.contains_key(sound.id) {
                return Err(SceneError::UnknownSound {
                    id: sound.id.to_owned(),
                });
            }
        }

        for sound in scene.sounds {
            self.set_sound_volume(sound.id, sound.volume);
            self.set_sound_position(sound.id, sound.position.0, sound.position.1);
            self.set_mute(sound.id, sound.muted);
            if let Some(gains) = sound.eq_gains {
                self.apply_eq_preset(sound.id, gains);
            }
        }
        info!("applied soundscape preset {:?}", scene.name);
        Ok(())
    }

    /// Enable/disable one effect and push its parameters, leaving the
    /// other two untouched.
    pub fn set_effect(&mut self, enabled: bool, params: EffectParams) {
        self.drain_reclaim();

        self.set_effect_enabled(params.kind(), enabled);
        self.send(Command::SetEffectParams(params));
    }

    /// Toggle one effect without touching its (or anyone's) parameters.
    pub fn set_effect_enabled(&mut self, kind: EffectKind, enabled: bool) {
        match kind {
            EffectKind::Reverb => self.effects.reverb_enabled = enabled,
            EffectKind::Delay => self.effects.delay_enabled = enabled,
            EffectKind::Lofi => self.effects.lofi_enabled = enabled,
        }
        self.send(Command::SetEffectEnabled { kind, enabled });
    }

    pub fn is_effect_enabled(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Reverb => self.effects.reverb_enabled,
            EffectKind::Delay => self.effects.delay_enabled,
            EffectKind::Lofi => self.effects.lofi_enabled,
        }
    }

    /// Ids of all loaded sources, unordered.
    pub fn sound_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn sound_emoji(&self, id: &str) -> Option<&str> {
        self.sources.get(id).map(|entry| entry.emoji.as_str())
    }

    pub fn sound_count(&self) -> usize {
        self.sources.len()
    }

    pub fn room_half_extent(&self) -> f32 {
        self.mapper.half_extent()
    }

    fn slot_count(&self) -> usize {
        self.sources.len() + self.free_slots.len()
    }

    fn send(&mut self, command: Command) {
        if self.commands.push(command).is_err() {
            // Last-write-wins semantics make a dropped intermediate
            // update harmless as long as callers keep sending; log so a
            // stalled render path is visible.
            warn!("command ring full; parameter update dropped");
        }
    }

    /// Pull retired sources back, freeing their render slots and
    /// dropping their buffers here on the control path.
    fn drain_reclaim(&mut self) {
        while let Ok(retired) = self.reclaim.pop() {
            self.free_slots.push(retired.slot);
            drop(retired.source);
        }
    }
}
