/*
Master Limiter
==============

Keeps the summed mix inside the converter's range no matter how many
sources play at once. Two stages:

1. Peak limiter: when |input| would exceed the threshold, gain reduction
   snaps down instantly to the exact ratio that puts the peak at the
   threshold (instant attack); when the signal falls back, the reduction
   recovers along a one-pole release so the level swells back smoothly
   instead of pumping.

2. Soft clip safety net: inter-sample wiggles that slip past stage 1 are
   folded by the x/(1+|x|)-style transfer curve above the threshold, so
   the output provably never reaches ±1.

The release one-pole is the same smoothing filter the comb damping uses:
   gain += coeff * (1 - gain)
*/

pub struct Limiter {
    threshold: f32,
    gain: f32,
    release_coeff: f32,
}

impl Limiter {
    /// `release_seconds` is the time constant for gain recovery.
    pub fn new(sample_rate: f32, release_seconds: f32) -> Self {
        let release = release_seconds.max(0.001);
        Self {
            threshold: 0.89,
            gain: 1.0,
            release_coeff: 1.0 - (-1.0 / (release * sample_rate)).exp(),
        }
    }

    /// Ceiling for the peak stage, in linear amplitude.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.clamp(0.1, 1.0);
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let peak = sample.abs();

        if peak * self.gain > self.threshold {
            // Instant attack: land exactly on the threshold.
            self.gain = self.threshold / peak;
        } else {
            // Smooth release back toward unity.
            self.gain += self.release_coeff * (1.0 - self.gain);
        }

        soft_knee(sample * self.gain, self.threshold)
    }

    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.gain = 1.0;
    }
}

/// Saturating transfer curve: linear below the knee, compressing above
/// it, asymptotic to ±1. Excess amplitude `e` maps to `e / (1 + e)`.
#[inline]
pub fn soft_knee(sample: f32, knee: f32) -> f32 {
    let magnitude = sample.abs();
    if magnitude <= knee {
        return sample;
    }
    let excess = magnitude - knee;
    let headroom = 1.0 - knee;
    let shaped = knee + headroom * (excess / (excess + headroom));
    shaped.copysign(sample)
}
