//! The render path: source slots, effects bus, and the master limiter.
//!
//! `render_block` is the engine's heartbeat. Each block it:
//!
//!   1. drains the whole command ring (so every parameter holds one value
//!      for the entire quantum),
//!   2. renders every live source into the dry and reverb buses,
//!   3. folds in the effect returns,
//!   4. limits the sum and writes it out,
//!   5. ships fully faded-out sources back to the control path.
//!
//! Everything here is allocation-free and lock-free in steady state; the
//! only allocations happen on the control path before a source arrives.

use log::warn;
use rtrb::{Consumer, Producer};

use crate::dsp::limiter::Limiter;
use crate::effects::EffectsBus;
use crate::engine::command::{Command, Retired};
use crate::source::SoundSource;
use crate::MAX_BLOCK_SIZE;

pub struct MixEngine {
    commands: Consumer<Command>,
    reclaim: Producer<Retired>,

    slots: Vec<Option<Box<SoundSource>>>,
    effects: EffectsBus,
    limiter: Limiter,

    scratch: Vec<f32>,
    dry_bus: Vec<f32>,
    reverb_bus: Vec<f32>,

    sample_rate: f32,
}

impl MixEngine {
    pub(crate) fn new(
        sample_rate: f32,
        max_sources: usize,
        commands: Consumer<Command>,
        reclaim: Producer<Retired>,
    ) -> Self {
        Self {
            commands,
            reclaim,
            slots: (0..max_sources).map(|_| None).collect(),
            effects: EffectsBus::new(sample_rate),
            limiter: Limiter::new(sample_rate, 0.08),
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            dry_bus: vec![0.0; MAX_BLOCK_SIZE],
            reverb_bus: vec![0.0; MAX_BLOCK_SIZE],
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Render the next `out.len()` mono samples.
    ///
    /// Blocks larger than [`MAX_BLOCK_SIZE`] are processed in chunks, so
    /// callers can hand over whatever buffer the device gives them.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.drain_commands();

        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }

        self.ship_retired();
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let frames = out.len();
        let dry = &mut self.dry_bus[..frames];
        let reverb = &mut self.reverb_bus[..frames];
        let scratch = &mut self.scratch[..frames];

        dry.fill(0.0);
        reverb.fill(0.0);

        for slot in self.slots.iter_mut().flatten() {
            slot.render_add(scratch, dry, reverb);
        }

        self.effects.process_block(dry, reverb);
        self.limiter.process_block(dry);

        out.copy_from_slice(dry);
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::AddSource { slot, source } => {
                if let Some(slot_ref) = self.slots.get_mut(slot) {
                    // The registry never reuses a slot before reclaiming
                    // it, so an occupied slot here means a logic error on
                    // the control side; last write wins regardless.
                    debug_assert!(slot_ref.is_none(), "slot {slot} already occupied");
                    *slot_ref = Some(source);
                }
            }
            Command::RemoveSource { slot } => {
                if let Some(Some(source)) = self.slots.get_mut(slot) {
                    source.begin_retire();
                }
            }
            Command::SetVolume { slot, volume } => {
                if let Some(Some(source)) = self.slots.get_mut(slot) {
                    source.set_volume(volume);
                }
            }
            Command::SetMuted { slot, muted } => {
                if let Some(Some(source)) = self.slots.get_mut(slot) {
                    source.set_muted(muted);
                }
            }
            Command::SetSpatial { slot, params } => {
                if let Some(Some(source)) = self.slots.get_mut(slot) {
                    source.set_spatial(params);
                }
            }
            Command::SetEqGain {
                slot,
                band,
                gain_db,
            } => {
                if let Some(Some(source)) = self.slots.get_mut(slot) {
                    source.set_eq_gain(band, gain_db);
                }
            }
            Command::SetEqGains { slot, gains } => {
                if let Some(Some(source)) = self.slots.get_mut(slot) {
                    source.set_eq_gains(gains);
                }
            }
            Command::SetEqQ { slot, band, q } => {
                if let Some(Some(source)) = self.slots.get_mut(slot) {
                    source.set_eq_q(band, q);
                }
            }
            Command::SetEffectEnabled { kind, enabled } => {
                self.effects.set_enabled(kind, enabled);
            }
            Command::SetEffectParams(params) => {
                self.effects.set_params(params);
            }
        }
    }

    /// Move fully faded sources onto the reclaim ring.
    fn ship_retired(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.as_ref().is_some_and(|source| source.is_retired()) {
                let source = slot.take().expect("checked above");
                if let Err(rtrb::PushError::Full(retired)) = self.reclaim.push(Retired {
                    slot: index,
                    source,
                }) {
                    // Control path stopped draining; dropping here keeps
                    // the render path moving at the cost of one
                    // deallocation on the audio thread.
                    warn!("reclaim ring full; dropping source on render path");
                    drop(retired);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::AudioClip;
    use crate::engine::command::Command;
    use crate::spatial::SpatialParams;
    use rtrb::RingBuffer;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn harness() -> (Producer<Command>, Consumer<Retired>, MixEngine) {
        let (command_tx, command_rx) = RingBuffer::new(256);
        let (reclaim_tx, reclaim_rx) = RingBuffer::new(16);
        let engine = MixEngine::new(SAMPLE_RATE, 8, command_rx, reclaim_tx);
        (command_tx, reclaim_rx, engine)
    }

    fn test_source(id: &str) -> Box<SoundSource> {
        let clip = AudioClip {
            samples: (0..4_800)
                .map(|i| (std::f32::consts::TAU * i as f32 / 4_800.0).sin())
                .collect(),
            sample_rate: 48_000,
        };
        Box::new(SoundSource::new(
            id,
            "🎵",
            clip,
            SAMPLE_RATE,
            0.8,
            SpatialParams {
                attenuation: 1.0,
                muffle_cutoff_hz: 16_000.0,
                reverb_send: 0.05,
            },
        ))
    }

    #[test]
    fn empty_engine_renders_silence() {
        let (_tx, _rx, mut engine) = harness();
        let mut out = vec![1.0; 1_024];
        engine.render_block(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn added_source_becomes_audible() {
        let (mut tx, _rx, mut engine) = harness();
        tx.push(Command::AddSource {
            slot: 0,
            source: test_source("rain"),
        })
        .unwrap();

        let mut out = vec![0.0; 8_192];
        engine.render_block(&mut out);

        let peak = out[4_096..].iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(peak > 0.3, "source should be audible after its fade-in");
        assert!(out.iter().all(|s| s.abs() < 1.0), "limited output");
    }

    #[test]
    fn oversized_blocks_are_chunked() {
        let (mut tx, _rx, mut engine) = harness();
        tx.push(Command::AddSource {
            slot: 0,
            source: test_source("rain"),
        })
        .unwrap();

        // 3x MAX_BLOCK_SIZE in one call must not panic and must fill all.
        let mut out = vec![0.0; MAX_BLOCK_SIZE * 3];
        engine.render_block(&mut out);
        engine.render_block(&mut out);
        assert!(out.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn removal_fades_then_reclaims_the_slot() {
        let (mut tx, mut rx, mut engine) = harness();
        tx.push(Command::AddSource {
            slot: 3,
            source: test_source("rain"),
        })
        .unwrap();

        let mut out = vec![0.0; 8_192];
        engine.render_block(&mut out);

        tx.push(Command::RemoveSource { slot: 3 }).unwrap();
        engine.render_block(&mut out);

        let retired = rx.pop().expect("faded source should be reclaimed");
        assert_eq!(retired.slot, 3);
        assert_eq!(retired.source.id(), "rain");

        // And the engine is silent again.
        engine.render_block(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn commands_for_vacant_slots_are_ignored() {
        let (mut tx, _rx, mut engine) = harness();
        tx.push(Command::SetVolume {
            slot: 5,
            volume: 0.4,
        })
        .unwrap();
        tx.push(Command::RemoveSource { slot: 99 }).unwrap();

        let mut out = vec![0.0; 512];
        engine.render_block(&mut out); // must not panic
    }

    #[test]
    fn many_hot_sources_stay_inside_full_scale() {
        let (mut tx, _rx, mut engine) = harness();
        for slot in 0..8 {
            tx.push(Command::AddSource {
                slot,
                source: test_source(&format!("s{slot}")),
            })
            .unwrap();
            tx.push(Command::SetVolume { slot, volume: 1.0 }).unwrap();
        }

        let mut out = vec![0.0; 8_192];
        for _ in 0..8 {
            engine.render_block(&mut out);
            assert!(
                out.iter().all(|s| s.abs() < 1.0),
                "8 unison sources must not clip the master"
            );
        }
    }

    #[test]
    fn effect_commands_reach_the_bus() {
        let (mut tx, _rx, mut engine) = harness();
        tx.push(Command::AddSource {
            slot: 0,
            source: test_source("rain"),
        })
        .unwrap();
        tx.push(Command::SetEffectEnabled {
            kind: crate::effects::EffectKind::Lofi,
            enabled: true,
        })
        .unwrap();
        tx.push(Command::SetEffectParams(crate::effects::EffectParams::Lofi(
            crate::effects::LofiParams {
                cutoff_hz: 500.0,
                amount: 1.0,
            },
        )))
        .unwrap();

        let mut out = vec![0.0; 4_096];
        engine.render_block(&mut out);
        assert!(out.iter().all(|s| s.is_finite()));
    }
}
