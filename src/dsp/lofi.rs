//! Vintage degradation stage: bit-depth reduction, hiss, and a dark
//! one-pole lowpass. Together they give the master bus the worn,
//! tape-like character of old field recordings.
//!
//! The `amount` control drives both the quantizer depth and the hiss
//! level, so one knob sweeps from "slightly dusty" to "shortwave radio".

use std::f32::consts::TAU;

pub struct Lofi {
    sample_rate: f32,
    cutoff_hz: f32,
    amount: f32,

    lowpass_coeff: f32,
    lowpass_state: f32,
    noise_state: u32,
}

impl Lofi {
    pub fn new(sample_rate: f32) -> Self {
        let mut lofi = Self {
            sample_rate,
            cutoff_hz: 3_500.0,
            amount: 0.4,
            lowpass_coeff: 0.0,
            lowpass_state: 0.0,
            noise_state: 0x9e37_79b9,
        };
        lofi.update_lowpass();
        lofi
    }

    pub fn set_cutoff_hz(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz.clamp(200.0, self.sample_rate * 0.45);
        self.update_lowpass();
    }

    /// Degradation amount 0..1: scales quantizer coarseness and hiss.
    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 1.0);
    }

    fn update_lowpass(&mut self) {
        // One-pole coefficient: state += coeff * (input - state)
        let omega = TAU * self.cutoff_hz / self.sample_rate;
        self.lowpass_coeff = (1.0 - (-omega).exp()).clamp(0.0, 1.0);
    }

    #[inline]
    fn next_noise(&mut self) -> f32 {
        // xorshift32; cheap and deterministic
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise_state = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        // Quantize: amount 0 leaves ~16 effective bits, amount 1 leaves ~5.
        let bits = 16.0 - self.amount * 11.0;
        let levels = 2.0_f32.powf(bits);
        let crushed = (sample * levels).round() / levels;

        let hissed = crushed + self.next_noise() * self.amount * 0.004;

        self.lowpass_state += self.lowpass_coeff * (hissed - self.lowpass_state);
        self.lowpass_state
    }

    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.lowpass_state = 0.0;
    }
}
