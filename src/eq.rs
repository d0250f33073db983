//! Per-source 5-band equalizer: the fixed band layout, the aggregate
//! response curve shared by the engine and every preview surface, the
//! built-in gain presets, and the live biquad cascade.
//!
//! The band slots never move: slot identity, filter kind, and center
//! frequency are fixed at compile time. Only gain (and Q) are mutable.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::biquad::Biquad;
use crate::dsp::smooth::Smoothed;

/// Number of bands; the slot layout below is the only layout.
pub const BAND_COUNT: usize = 5;

/// Gain limits in dB, applied on every write.
pub const MIN_GAIN_DB: f32 = -12.0;
pub const MAX_GAIN_DB: f32 = 12.0;

pub const DEFAULT_Q: f32 = 1.0;

/// Seconds over which a gain write glides to its target.
const GAIN_RAMP_SECONDS: f32 = 0.03;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    LowShelf,
    Peaking,
    HighShelf,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqBand {
    pub kind: BandKind,
    pub frequency_hz: f32,
    pub gain_db: f32,
    pub q: f32,
}

/// Fixed slot layout: Low / Low-Mid / Mid / High-Mid / High.
pub const BAND_LAYOUT: [(BandKind, f32); BAND_COUNT] = [
    (BandKind::LowShelf, 100.0),
    (BandKind::Peaking, 400.0),
    (BandKind::Peaking, 1_000.0),
    (BandKind::Peaking, 2_500.0),
    (BandKind::HighShelf, 8_000.0),
];

/// The five bands at rest: 0 dB everywhere, Q = 1.
pub fn default_bands() -> [EqBand; BAND_COUNT] {
    BAND_LAYOUT.map(|(kind, frequency_hz)| EqBand {
        kind,
        frequency_hz,
        gain_db: 0.0,
        q: DEFAULT_Q,
    })
}

#[inline]
pub fn clamp_gain_db(gain_db: f32) -> f32 {
    gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
}

/*
Aggregate response curve
------------------------

One formula, used by both the engine and any preview renderer, so the
curve a user sees while editing is exactly the curve the engine reasons
about. It is a deliberate approximation of the filter magnitude response,
chosen to be smooth and cheap:

  shelf    gain · r/(1+r)       r = band_freq/f (low) or f/band_freq (high)
  peaking  gain · exp(-oct²/(2·(bw/band_freq)²))
           bw = band_freq/Q, oct = |log2(f/band_freq)|

Summing the per-band dB contributions gives the total curve.
*/

/// Contribution of a single band to the response at `frequency_hz`, in dB.
pub fn band_response_db(band: &EqBand, frequency_hz: f32) -> f32 {
    debug_assert!(frequency_hz > 0.0);

    match band.kind {
        BandKind::LowShelf => {
            let r = band.frequency_hz / frequency_hz;
            band.gain_db * r / (1.0 + r)
        }
        BandKind::HighShelf => {
            let r = frequency_hz / band.frequency_hz;
            band.gain_db * r / (1.0 + r)
        }
        BandKind::Peaking => {
            let bandwidth = band.frequency_hz / band.q;
            let octaves = (frequency_hz / band.frequency_hz).log2().abs();
            let spread = bandwidth / band.frequency_hz;
            band.gain_db * (-0.5 * (octaves / spread).powi(2)).exp()
        }
    }
}

/// Aggregate response of all five bands at `frequency_hz`, in dB.
pub fn response_db(bands: &[EqBand; BAND_COUNT], frequency_hz: f32) -> f32 {
    bands
        .iter()
        .map(|band| band_response_db(band, frequency_hz))
        .sum()
}

/// A named set of 5 gains, applied to a source's bands atomically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqPreset {
    pub name: &'static str,
    pub gains: [f32; BAND_COUNT],
}

/// Built-in presets, band order Low/Low-Mid/Mid/High-Mid/High.
pub const EQ_PRESETS: [EqPreset; 6] = [
    EqPreset { name: "Flat", gains: [0.0, 0.0, 0.0, 0.0, 0.0] },
    EqPreset { name: "Bass Boost", gains: [6.0, 3.0, 0.0, -2.0, -2.0] },
    EqPreset { name: "Vocal", gains: [-2.0, -1.0, 4.0, 2.0, 1.0] },
    EqPreset { name: "Bright", gains: [-2.0, 1.0, 2.0, 4.0, 6.0] },
    EqPreset { name: "Warm", gains: [3.0, 2.0, 0.0, -1.0, -2.0] },
    EqPreset { name: "Presence", gains: [-1.0, 2.0, 4.0, 3.0, 1.0] },
];

/// Look up a built-in preset by name (case-insensitive).
pub fn preset(name: &str) -> Option<&'static EqPreset> {
    EQ_PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}

/// The live filter cascade for one source.
///
/// Gains glide through smoothers and the biquad coefficients are
/// refreshed once per block while a glide is in flight, so gain writes
/// and preset changes never step the audio.
pub struct EqChain {
    filters: [Biquad; BAND_COUNT],
    gains: [Smoothed; BAND_COUNT],
    qs: [f32; BAND_COUNT],
}

impl EqChain {
    pub fn new(sample_rate: f32) -> Self {
        let filters = BAND_LAYOUT.map(|(kind, frequency_hz)| {
            let mut filter = match kind {
                BandKind::LowShelf => Biquad::low_shelf(frequency_hz, sample_rate),
                BandKind::Peaking => Biquad::peaking(frequency_hz, sample_rate),
                BandKind::HighShelf => Biquad::high_shelf(frequency_hz, sample_rate),
            };
            filter.set_q(DEFAULT_Q);
            filter
        });

        Self {
            filters,
            gains: std::array::from_fn(|_| {
                Smoothed::new(0.0, GAIN_RAMP_SECONDS, sample_rate)
            }),
            qs: [DEFAULT_Q; BAND_COUNT],
        }
    }

    /// Set one band's gain target. Out-of-range values are clamped.
    pub fn set_gain_db(&mut self, slot: usize, gain_db: f32) {
        if slot < BAND_COUNT {
            self.gains[slot].set(clamp_gain_db(gain_db));
        }
    }

    /// Set all five gains in one call (preset application).
    pub fn set_gains_db(&mut self, gains: [f32; BAND_COUNT]) {
        for (smoother, gain_db) in self.gains.iter_mut().zip(gains) {
            smoother.set(clamp_gain_db(gain_db));
        }
    }

    pub fn set_q(&mut self, slot: usize, q: f32) {
        if slot < BAND_COUNT {
            let q = q.max(0.05);
            self.qs[slot] = q;
            self.filters[slot].set_q(q);
        }
    }

    /// Process a block in place, advancing gain glides at block rate.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for (filter, gain) in self.filters.iter_mut().zip(self.gains.iter_mut()) {
            if gain.is_smoothing() {
                filter.set_gain_db(gain.advance(buffer.len()));
            }
            filter.process_block(buffer);
        }
    }

    /// Current band state (gain targets, so a snapshot taken right after
    /// a write already reflects it).
    pub fn snapshot(&self) -> [EqBand; BAND_COUNT] {
        std::array::from_fn(|slot| {
            let (kind, frequency_hz) = BAND_LAYOUT[slot];
            EqBand {
                kind,
                frequency_hz,
                gain_db: self.gains[slot].target(),
                q: self.qs[slot],
            }
        })
    }

    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_FREQUENCIES: [f32; 7] =
        [50.0, 100.0, 400.0, 1_000.0, 2_500.0, 8_000.0, 16_000.0];

    fn bands_with_gains(gains: [f32; BAND_COUNT]) -> [EqBand; BAND_COUNT] {
        let mut bands = default_bands();
        for (band, gain) in bands.iter_mut().zip(gains) {
            band.gain_db = gain;
        }
        bands
    }

    #[test]
    fn flat_bands_respond_zero_everywhere() {
        let bands = default_bands();
        for &frequency in &TEST_FREQUENCIES {
            assert_eq!(response_db(&bands, frequency), 0.0);
        }
    }

    #[test]
    fn bass_boost_tilts_low_over_high() {
        let bands = bands_with_gains([6.0, 3.0, 0.0, -2.0, -2.0]);
        let low = response_db(&bands, 100.0);
        let high = response_db(&bands, 8_000.0);
        assert!(
            low > high,
            "Bass Boost must favor 100 Hz over 8 kHz ({low} vs {high})"
        );
    }

    #[test]
    fn bright_tilts_high_over_low() {
        let bands = bands_with_gains([-2.0, 1.0, 2.0, 4.0, 6.0]);
        assert!(response_db(&bands, 8_000.0) > response_db(&bands, 100.0));
    }

    #[test]
    fn shelf_response_approaches_full_gain_deep_in_the_shelf() {
        let mut bands = default_bands();
        bands[0].gain_db = 6.0;

        // Far below the low-shelf corner, r is huge and r/(1+r) -> 1.
        let deep = band_response_db(&bands[0], 10.0);
        assert!(deep > 5.0 && deep < 6.0);

        // Far above, the shelf contributes almost nothing.
        let far = band_response_db(&bands[0], 10_000.0);
        assert!(far < 0.1);
    }

    #[test]
    fn peaking_response_is_centered_and_symmetric_in_octaves() {
        let mut bands = default_bands();
        bands[2].gain_db = 8.0; // 1 kHz peak

        let center = band_response_db(&bands[2], 1_000.0);
        assert_eq!(center, 8.0);

        let below = band_response_db(&bands[2], 500.0);
        let above = band_response_db(&bands[2], 2_000.0);
        assert!((below - above).abs() < 1e-4, "octave symmetry");
        assert!(below < center);
    }

    #[test]
    fn higher_q_narrows_the_peak() {
        let mut wide = default_bands()[2];
        wide.gain_db = 6.0;

        let mut narrow = wide;
        narrow.q = 4.0;

        // Same center gain, less spill one octave out.
        assert_eq!(
            band_response_db(&wide, 1_000.0),
            band_response_db(&narrow, 1_000.0)
        );
        assert!(band_response_db(&narrow, 2_000.0) < band_response_db(&wide, 2_000.0));
    }

    #[test]
    fn builtin_presets_are_found_case_insensitively() {
        assert!(preset("bass boost").is_some());
        assert!(preset("FLAT").is_some());
        assert!(preset("does not exist").is_none());

        let bass = preset("Bass Boost").unwrap();
        assert_eq!(bass.gains, [6.0, 3.0, 0.0, -2.0, -2.0]);
    }

    #[test]
    fn chain_snapshot_round_trips_writes() {
        let mut chain = EqChain::new(48_000.0);
        chain.set_gain_db(0, 6.0);
        chain.set_gain_db(3, -30.0); // clamps to -12

        let snapshot = chain.snapshot();
        assert_eq!(snapshot[0].gain_db, 6.0);
        assert_eq!(snapshot[1].gain_db, 0.0);
        assert_eq!(snapshot[3].gain_db, MIN_GAIN_DB);
        assert_eq!(snapshot[0].frequency_hz, 100.0);
        assert_eq!(snapshot[4].kind, BandKind::HighShelf);
    }

    #[test]
    fn chain_ignores_out_of_range_slots() {
        let mut chain = EqChain::new(48_000.0);
        chain.set_gain_db(BAND_COUNT, 6.0);
        chain.set_q(17, 2.0);

        let snapshot = chain.snapshot();
        assert!(snapshot.iter().all(|band| band.gain_db == 0.0));
    }

    #[test]
    fn preset_application_is_idempotent() {
        let mut chain = EqChain::new(48_000.0);
        let gains = preset("Warm").unwrap().gains;

        chain.set_gains_db(gains);
        let first = chain.snapshot();
        chain.set_gains_db(gains);
        let second = chain.snapshot();

        assert_eq!(first, second);
    }

    #[test]
    fn flat_chain_passes_audio_through() {
        let sample_rate = 48_000.0;
        let mut chain = EqChain::new(sample_rate);

        let mut buffer: Vec<f32> = (0..2_048)
            .map(|i| (std::f32::consts::TAU * 440.0 * i as f32 / sample_rate).sin())
            .collect();
        let reference = buffer.clone();

        chain.process_block(&mut buffer);

        for (out, dry) in buffer.iter().zip(reference.iter()).skip(256) {
            assert!((out - dry).abs() < 1e-2);
        }
    }

    #[test]
    fn boosted_chain_changes_the_signal_smoothly() {
        let sample_rate = 48_000.0;
        let mut chain = EqChain::new(sample_rate);

        // Render one settled block, then write a big boost and make sure
        // the next block has no discontinuity at the seam.
        let sine =
            |i: usize| (std::f32::consts::TAU * 250.0 * i as f32 / sample_rate).sin();

        let mut first: Vec<f32> = (0..512).map(sine).collect();
        chain.process_block(&mut first);

        chain.set_gain_db(0, 12.0);
        let mut second: Vec<f32> = (512..1_024).map(sine).collect();
        chain.process_block(&mut second);

        let seam_jump = (second[0] - first[511]).abs();
        assert!(
            seam_jump < 0.2,
            "gain write should not step the waveform, jump {seam_jump}"
        );
        assert!(second.iter().all(|s| s.is_finite()));
    }
}
