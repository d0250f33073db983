use std::f32::consts::TAU;

/*
| kind       | used for                         | gain-dependent |
| ---------- | -------------------------------- | -------------- |
| low-shelf  | EQ band 0 (100 Hz)               | yes            |
| peaking    | EQ bands 1-3 (400/1000/2500 Hz)  | yes            |
| high-shelf | EQ band 4 (8 kHz)                | yes            |
| lowpass    | spatial muffling stage           | no             |

Coefficients follow the Audio-EQ-Cookbook (RBJ) forms, normalized by a0.
Shelves use unit slope; peaking and lowpass use the Q parameter. The state
is transposed direct form II, which keeps the memory small (two words) and
behaves well when coefficients are refreshed every block by a smoothed
gain or cutoff.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadKind {
    LowShelf,
    Peaking,
    HighShelf,
    Lowpass,
}

#[derive(Debug, Clone)]
pub struct Biquad {
    kind: BiquadKind,
    sample_rate: f32,
    frequency_hz: f32,
    gain_db: f32,
    q: f32,

    // Normalized coefficients
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // Transposed direct form II state
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(kind: BiquadKind, frequency_hz: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            kind,
            sample_rate,
            frequency_hz,
            gain_db: 0.0,
            q: 1.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn low_shelf(frequency_hz: f32, sample_rate: f32) -> Self {
        Self::new(BiquadKind::LowShelf, frequency_hz, sample_rate)
    }

    pub fn peaking(frequency_hz: f32, sample_rate: f32) -> Self {
        Self::new(BiquadKind::Peaking, frequency_hz, sample_rate)
    }

    pub fn high_shelf(frequency_hz: f32, sample_rate: f32) -> Self {
        Self::new(BiquadKind::HighShelf, frequency_hz, sample_rate)
    }

    pub fn lowpass(frequency_hz: f32, sample_rate: f32) -> Self {
        Self::new(BiquadKind::Lowpass, frequency_hz, sample_rate)
    }

    pub fn kind(&self) -> BiquadKind {
        self.kind
    }

    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn set_gain_db(&mut self, gain_db: f32) {
        if gain_db != self.gain_db {
            self.gain_db = gain_db;
            self.update_coefficients();
        }
    }

    pub fn set_q(&mut self, q: f32) {
        let q = q.max(0.05);
        if q != self.q {
            self.q = q;
            self.update_coefficients();
        }
    }

    /// Move the center/cutoff frequency. Clamped below Nyquist.
    pub fn set_frequency(&mut self, frequency_hz: f32) {
        let frequency_hz = frequency_hz.clamp(10.0, self.sample_rate * 0.45);
        if frequency_hz != self.frequency_hz {
            self.frequency_hz = frequency_hz;
            self.update_coefficients();
        }
    }

    fn update_coefficients(&mut self) {
        let a = 10.0_f32.powf(self.gain_db / 40.0);
        let w0 = TAU * self.frequency_hz / self.sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();

        let (b0, b1, b2, a0, a1, a2) = match self.kind {
            BiquadKind::Peaking => {
                let alpha = sin_w0 / (2.0 * self.q);
                (
                    1.0 + alpha * a,
                    -2.0 * cos_w0,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos_w0,
                    1.0 - alpha / a,
                )
            }
            BiquadKind::LowShelf => {
                // Unit shelf slope
                let alpha = sin_w0 / 2.0 * std::f32::consts::SQRT_2;
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            BiquadKind::HighShelf => {
                let alpha = sin_w0 / 2.0 * std::f32::consts::SQRT_2;
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            BiquadKind::Lowpass => {
                let alpha = sin_w0 / (2.0 * self.q);
                (
                    (1.0 - cos_w0) / 2.0,
                    1.0 - cos_w0,
                    (1.0 - cos_w0) / 2.0,
                    1.0 + alpha,
                    -2.0 * cos_w0,
                    1.0 - alpha,
                )
            }
        };

        let inv_a0 = 1.0 / a0;
        self.b0 = b0 * inv_a0;
        self.b1 = b1 * inv_a0;
        self.b2 = b2 * inv_a0;
        self.a1 = a1 * inv_a0;
        self.a2 = a2 * inv_a0;
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let out = self.b0 * sample + self.z1;
        self.z1 = self.b1 * sample - self.a1 * out + self.z2;
        self.z2 = self.b2 * sample - self.a2 * out;
        out
    }

    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
