use crate::dsp::smooth::Smoothed;

/// Circular delay line with linear-interpolated fractional reads.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(capacity_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity_samples.max(2)],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Read `delay_samples` behind the write head. Fractional delays
    /// interpolate between the two neighboring samples.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1.0, (len - 1) as f32);

        let whole = delay as usize;
        let frac = delay - whole as f32;

        let a_pos = (self.write_pos + len - whole) % len;
        let b_pos = (a_pos + len - 1) % len;

        let a = self.buffer[a_pos];
        let b = self.buffer[b_pos];
        a + (b - a) * frac
    }

    #[inline]
    pub fn write_advance(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Feedback echo used by the effects bus.
///
/// The echo returns the wet signal only; the bus decides how much of it
/// reaches the mix. Delay time is smoothed so live edits slide the echo
/// rather than snapping it.
pub struct Echo {
    line: DelayLine,
    time_samples: Smoothed,
    feedback: f32,
    sample_rate: f32,
}

/// Longest representable echo in seconds.
pub const MAX_ECHO_SECONDS: f32 = 2.0;

impl Echo {
    pub fn new(sample_rate: f32) -> Self {
        let capacity = (MAX_ECHO_SECONDS * sample_rate) as usize + 2;
        Self {
            line: DelayLine::new(capacity),
            time_samples: Smoothed::new(0.35 * sample_rate, 0.05, sample_rate),
            feedback: 0.35,
            sample_rate,
        }
    }

    pub fn set_time_seconds(&mut self, seconds: f32) {
        let seconds = seconds.clamp(0.01, MAX_ECHO_SECONDS);
        self.time_samples.set(seconds * self.sample_rate);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delay = self.time_samples.next();
        let wet = self.line.read(delay);
        self.line.write_advance(input + wet * self.feedback);
        wet
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_line_echoes_after_the_delay() {
        let mut line = DelayLine::new(64);

        line.write_advance(1.0);
        for _ in 0..9 {
            line.write_advance(0.0);
        }

        // The impulse is now 10 samples behind the write head.
        assert!((line.read(10.0) - 1.0).abs() < 1e-6);
        assert!(line.read(5.0).abs() < 1e-6);
    }

    #[test]
    fn fractional_read_interpolates() {
        let mut line = DelayLine::new(16);
        line.write_advance(0.0);
        line.write_advance(1.0);

        // Halfway between the two written samples.
        let v = line.read(1.5);
        assert!((v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn echo_produces_delayed_repeats() {
        let sample_rate = 1_000.0;
        let mut echo = Echo::new(sample_rate);
        echo.set_time_seconds(0.05); // 50 samples
        echo.set_feedback(0.5);

        // Let the time smoother settle before exciting the line.
        for _ in 0..200 {
            echo.process(0.0);
        }

        let first = echo.process(1.0);
        assert!(first.abs() < 1e-6, "echo output should be delayed");

        let mut peak = 0.0f32;
        for _ in 0..60 {
            peak = peak.max(echo.process(0.0).abs());
        }
        assert!(peak > 0.5, "impulse should come back around, got {peak}");
    }

    #[test]
    fn echo_feedback_decays() {
        let sample_rate = 1_000.0;
        let mut echo = Echo::new(sample_rate);
        echo.set_time_seconds(0.02);
        echo.set_feedback(0.4);

        for _ in 0..100 {
            echo.process(0.0);
        }
        echo.process(1.0);

        let mut last_peak = f32::MAX;
        for _ in 0..6 {
            let mut peak = 0.0f32;
            for _ in 0..20 {
                peak = peak.max(echo.process(0.0).abs());
            }
            assert!(peak < last_peak + 1e-3, "repeats must decay");
            last_peak = peak;
        }
        assert!(last_peak < 0.05);
    }

    #[test]
    fn feedback_is_clamped_stable() {
        let mut echo = Echo::new(1_000.0);
        echo.set_time_seconds(0.01);
        echo.set_feedback(10.0); // clamped to 0.95

        for _ in 0..200 {
            echo.process(0.0);
        }
        echo.process(1.0);
        for _ in 0..10_000 {
            let out = echo.process(0.0);
            assert!(out.is_finite() && out.abs() < 10.0);
        }
    }
}
