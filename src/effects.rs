//! The shared effects bus: Reverb, Delay, and Lofi.
//!
//! Reverb is a true send — each source feeds it according to its own
//! spatially derived send level, and the wet return is added to the mix.
//! Delay taps the dry bus and returns its echoes scaled by the mix
//! parameter. Lofi reshapes the summed bus in place.
//!
//! The three are strictly orthogonal: each owns its parameters, enabling
//! or disabling one never touches another, and a disabled effect is
//! skipped entirely rather than processed at zero gain.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::delay::Echo;
use crate::dsp::lofi::Lofi;
use crate::dsp::reverb::RoomReverb;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Reverb,
    Delay,
    Lofi,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    /// 0 = closet, 1 = hall.
    pub room_size: f32,
    /// High-frequency absorption, 0..1.
    pub damping: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.55,
            damping: 0.35,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    pub time_seconds: f32,
    pub feedback: f32,
    /// Return level of the echo into the mix, 0..1.
    pub mix: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            time_seconds: 0.35,
            feedback: 0.35,
            mix: 0.25,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LofiParams {
    pub cutoff_hz: f32,
    /// Bit-reduction / hiss amount, 0..1.
    pub amount: f32,
}

impl Default for LofiParams {
    fn default() -> Self {
        Self {
            cutoff_hz: 3_500.0,
            amount: 0.4,
        }
    }
}

/// Typed parameter update for one effect; the variant names the effect.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParams {
    Reverb(ReverbParams),
    Delay(DelayParams),
    Lofi(LofiParams),
}

impl EffectParams {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectParams::Reverb(_) => EffectKind::Reverb,
            EffectParams::Delay(_) => EffectKind::Delay,
            EffectParams::Lofi(_) => EffectKind::Lofi,
        }
    }
}

pub struct EffectsBus {
    reverb: RoomReverb,
    reverb_enabled: bool,
    reverb_params: ReverbParams,

    delay: Echo,
    delay_enabled: bool,
    delay_params: DelayParams,

    lofi: Lofi,
    lofi_enabled: bool,
    lofi_params: LofiParams,
}

impl EffectsBus {
    pub fn new(sample_rate: f32) -> Self {
        let mut bus = Self {
            reverb: RoomReverb::new(sample_rate),
            reverb_enabled: false,
            reverb_params: ReverbParams::default(),
            delay: Echo::new(sample_rate),
            delay_enabled: false,
            delay_params: DelayParams::default(),
            lofi: Lofi::new(sample_rate),
            lofi_enabled: false,
            lofi_params: LofiParams::default(),
        };
        bus.apply_reverb_params();
        bus.apply_delay_params();
        bus.apply_lofi_params();
        bus
    }

    pub fn set_enabled(&mut self, kind: EffectKind, enabled: bool) {
        match kind {
            EffectKind::Reverb => {
                if self.reverb_enabled && !enabled {
                    // Drop the tail so re-enabling starts clean.
                    self.reverb.reset();
                }
                self.reverb_enabled = enabled;
            }
            EffectKind::Delay => {
                if self.delay_enabled && !enabled {
                    self.delay.reset();
                }
                self.delay_enabled = enabled;
            }
            EffectKind::Lofi => {
                if self.lofi_enabled && !enabled {
                    self.lofi.reset();
                }
                self.lofi_enabled = enabled;
            }
        }
    }

    pub fn is_enabled(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Reverb => self.reverb_enabled,
            EffectKind::Delay => self.delay_enabled,
            EffectKind::Lofi => self.lofi_enabled,
        }
    }

    pub fn set_params(&mut self, params: EffectParams) {
        match params {
            EffectParams::Reverb(p) => {
                self.reverb_params = p;
                self.apply_reverb_params();
            }
            EffectParams::Delay(p) => {
                self.delay_params = p;
                self.apply_delay_params();
            }
            EffectParams::Lofi(p) => {
                self.lofi_params = p;
                self.apply_lofi_params();
            }
        }
    }

    fn apply_reverb_params(&mut self) {
        self.reverb.set_room_size(self.reverb_params.room_size);
        self.reverb.set_damping(self.reverb_params.damping);
    }

    fn apply_delay_params(&mut self) {
        self.delay.set_time_seconds(self.delay_params.time_seconds);
        self.delay.set_feedback(self.delay_params.feedback);
    }

    fn apply_lofi_params(&mut self) {
        self.lofi.set_cutoff_hz(self.lofi_params.cutoff_hz);
        self.lofi.set_amount(self.lofi_params.amount);
    }

    /// Fold the effect returns into `mix` in place. `reverb_in` carries
    /// the per-source spatial sends accumulated by the render loop.
    pub fn process_block(&mut self, mix: &mut [f32], reverb_in: &[f32]) {
        debug_assert_eq!(mix.len(), reverb_in.len());

        if self.reverb_enabled {
            for (out, send) in mix.iter_mut().zip(reverb_in.iter()) {
                *out += self.reverb.process(*send);
            }
        }

        if self.delay_enabled {
            let return_level = self.delay_params.mix.clamp(0.0, 1.0);
            for out in mix.iter_mut() {
                let wet = self.delay.process(*out);
                *out += wet * return_level;
            }
        }

        if self.lofi_enabled {
            self.lofi.process_block(mix);
        }
    }
}
