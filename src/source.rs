//! One looping sound on the room plane.
//!
//! A source owns its decoded buffer and the whole per-source chain:
//!
//!   loop playhead → fade & gain stage → 5-band EQ → muffle lowpass
//!
//! plus the smoothed reverb-send level that feeds the shared reverb bus.
//! The struct is built on the control path and then lives on the render
//! path; every mutation afterwards arrives as a target write, and all
//! audible values glide to their targets.
//!
//! Lifecycle: a source fades in from silence over ~20 ms when it starts,
//! plays until it is told to retire, fades out over the same window, and
//! then reports `is_retired` so the engine can hand the carcass back to
//! the control path for deallocation.

use log::debug;

use crate::decode::AudioClip;
use crate::dsp::biquad::Biquad;
use crate::dsp::smooth::Smoothed;
use crate::eq::{self, EqChain};
use crate::spatial::SpatialParams;

/// Fade window for load, removal, and mute transitions.
pub const FADE_SECONDS: f32 = 0.02;

/// Ramp for volume writes; slightly longer than the fade so slider
/// gestures feel smooth rather than stepped.
const VOLUME_RAMP_SECONDS: f32 = 0.03;

/// Ramp for spatial parameter writes (drag gestures).
const SPATIAL_RAMP_SECONDS: f32 = 0.05;

pub struct SoundSource {
    id: String,
    emoji: String,
    clip: AudioClip,

    /// Loop position in clip samples; fractional for resampling.
    playhead: f64,
    /// Playhead increment per output sample (clip rate / engine rate).
    step: f64,

    volume: f32,
    muted: bool,

    /// Smoothed user gain: volume, or zero while muted.
    gain: Smoothed,
    /// Smoothed spatial attenuation from the mapper.
    attenuation: Smoothed,
    /// 0 → 1 on load, → 0 on retire.
    fade: Smoothed,
    retiring: bool,

    eq: EqChain,
    muffle: Biquad,
    muffle_cutoff: Smoothed,
    reverb_send: Smoothed,
}

impl SoundSource {
    pub fn new(
        id: &str,
        emoji: &str,
        clip: AudioClip,
        engine_sample_rate: f32,
        volume: f32,
        spatial: SpatialParams,
    ) -> Self {
        let volume = volume.clamp(0.0, 1.0);
        let step = clip.sample_rate as f64 / engine_sample_rate as f64;

        let mut fade = Smoothed::new(0.0, FADE_SECONDS, engine_sample_rate);
        fade.set(1.0);

        let mut muffle = Biquad::lowpass(spatial.muffle_cutoff_hz, engine_sample_rate);
        muffle.set_q(0.707);

        Self {
            id: id.to_owned(),
            emoji: emoji.to_owned(),
            clip,
            playhead: 0.0,
            step,
            volume,
            muted: false,
            gain: Smoothed::new(volume, VOLUME_RAMP_SECONDS, engine_sample_rate),
            attenuation: Smoothed::new(
                spatial.attenuation,
                SPATIAL_RAMP_SECONDS,
                engine_sample_rate,
            ),
            fade,
            retiring: false,
            eq: EqChain::new(engine_sample_rate),
            muffle,
            muffle_cutoff: Smoothed::new(
                spatial.muffle_cutoff_hz,
                SPATIAL_RAMP_SECONDS,
                engine_sample_rate,
            ),
            reverb_send: Smoothed::new(
                spatial.reverb_send,
                SPATIAL_RAMP_SECONDS,
                engine_sample_rate,
            ),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn emoji(&self) -> &str {
        &self.emoji
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if !self.muted {
            self.gain.set(self.volume);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.gain.set(if muted { 0.0 } else { self.volume });
    }

    pub fn set_spatial(&mut self, params: SpatialParams) {
        self.attenuation.set(params.attenuation);
        self.muffle_cutoff.set(params.muffle_cutoff_hz);
        self.reverb_send.set(params.reverb_send);
    }

    pub fn set_eq_gain(&mut self, slot: usize, gain_db: f32) {
        self.eq.set_gain_db(slot, gain_db);
    }

    pub fn set_eq_gains(&mut self, gains: [f32; eq::BAND_COUNT]) {
        self.eq.set_gains_db(gains);
    }

    pub fn set_eq_q(&mut self, slot: usize, q: f32) {
        self.eq.set_q(slot, q);
    }

    /// Begin the fade-out; `is_retired` turns true once it completes.
    pub fn begin_retire(&mut self) {
        if !self.retiring {
            self.retiring = true;
            self.fade.set(0.0);
            debug!("source {:?} retiring", self.id);
        }
    }

    pub fn is_retired(&self) -> bool {
        self.retiring && !self.fade.is_smoothing() && self.fade.value() == 0.0
    }

    /// Read one sample off the loop with linear interpolation and advance.
    #[inline]
    fn next_clip_sample(&mut self) -> f32 {
        let len = self.clip.samples.len();
        let position = self.playhead;

        let index = position as usize;
        let frac = (position - index as f64) as f32;

        let a = self.clip.samples[index];
        let b = self.clip.samples[(index + 1) % len];
        let sample = a + (b - a) * frac;

        self.playhead += self.step;
        if self.playhead >= len as f64 {
            // Modulo rather than subtraction: a very short clip can be
            // shorter than one resampling step.
            self.playhead %= len as f64;
        }

        sample
    }

    /// Render one block into `scratch`, then add it to the dry bus and
    /// (scaled by the send level) the reverb bus.
    pub fn render_add(
        &mut self,
        scratch: &mut [f32],
        dry_bus: &mut [f32],
        reverb_bus: &mut [f32],
    ) {
        debug_assert_eq!(scratch.len(), dry_bus.len());
        debug_assert_eq!(scratch.len(), reverb_bus.len());

        // Fully retired: contribute nothing, cheaply.
        if self.is_retired() {
            return;
        }

        for sample in scratch.iter_mut() {
            let gain = self.gain.next() * self.attenuation.next() * self.fade.next();
            *sample = self.next_clip_sample() * gain;
        }

        self.eq.process_block(scratch);

        // The muffle cutoff glides at block rate; the filter keeps its
        // state across updates so the sweep is continuous.
        if self.muffle_cutoff.is_smoothing() {
            self.muffle
                .set_frequency(self.muffle_cutoff.advance(scratch.len()));
        }
        self.muffle.process_block(scratch);

        for ((out, dry), wet) in scratch
            .iter()
            .zip(dry_bus.iter_mut())
            .zip(reverb_bus.iter_mut())
        {
            let send = self.reverb_send.next();
            *dry += out;
            *wet += out * send;
        }
    }
}
