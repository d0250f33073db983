//! Control→render messages.
//!
//! Every public API call becomes one of these, pushed onto an SPSC ring
//! and drained by the render path before each block. Updates are
//! idempotent and last-write-wins, so a drag gesture that floods the
//! ring simply converges on its final value; the render path applies
//! everything before touching audio, so a block never sees a parameter
//! half-applied.
//!
//! Sources are addressed by slot index, not id string: the registry owns
//! the id→slot map, and only Copy data (plus one `Box` per load) crosses
//! to the render path.

use crate::effects::{EffectKind, EffectParams};
use crate::eq::BAND_COUNT;
use crate::source::SoundSource;
use crate::spatial::SpatialParams;

pub enum Command {
    /// Install a fully-built source in a vacant slot.
    AddSource {
        slot: usize,
        source: Box<SoundSource>,
    },
    /// Begin the fade-out; the slot frees once the fade completes.
    RemoveSource { slot: usize },
    SetVolume { slot: usize, volume: f32 },
    SetMuted { slot: usize, muted: bool },
    SetSpatial { slot: usize, params: SpatialParams },
    SetEqGain {
        slot: usize,
        band: usize,
        gain_db: f32,
    },
    SetEqGains {
        slot: usize,
        gains: [f32; BAND_COUNT],
    },
    SetEqQ { slot: usize, band: usize, q: f32 },
    SetEffectEnabled { kind: EffectKind, enabled: bool },
    SetEffectParams(EffectParams),
}

/// A retired source travelling back to the control path, which frees the
/// slot and drops the buffer off the audio thread.
pub struct Retired {
    pub slot: usize,
    pub source: Box<SoundSource>,
}
