/*
Room Reverb
===========

Send reverb for the effects bus, built on the classic Schroeder topology:

  Input ──┬──→ [Comb 1] ──┐
          ├──→ [Comb 2] ──┤
          ├──→ [Comb 3] ──┼──→ (+) ──→ [Allpass 1] ──→ [Allpass 2] ──→ Wet
          └──→ [Comb 4] ──┘

Four parallel feedback combs build the decaying tail; their delay lengths
share no common factors so the echoes smear into a dense wash instead of
ringing at one pitch. Two series allpasses diffuse the result without
coloring it. Each comb runs a one-pole lowpass in its feedback loop so the
tail darkens as it decays, like air absorption in a real room.

The output is wet-only: this unit sits on a send bus, so the dry path
never passes through it.

  Room size  scales comb feedback (0 = closet, 1 = hall)
  Damping    high-frequency absorption in the feedback loop
*/

struct Comb {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
    damp: f32,
    lowpass_state: f32,
}

impl Comb {
    fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: 0.8,
            damp: 0.3,
            lowpass_state: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        // Absorb highs in the loop so each pass around gets darker.
        self.lowpass_state =
            output * (1.0 - self.damp) + self.lowpass_state * self.damp;

        self.buffer[self.write_pos] = input + self.lowpass_state * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.lowpass_state = 0.0;
        self.write_pos = 0;
    }
}

struct Allpass {
    buffer: Vec<f32>,
    write_pos: usize,
    gain: f32,
}

impl Allpass {
    fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            gain: 0.5,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let output = -self.gain * input + delayed;

        self.buffer[self.write_pos] = input + self.gain * output;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

// Delay tunings in seconds, mutually prime in samples at common rates.
const COMB_TUNING: [f32; 4] = [0.0253, 0.0311, 0.0367, 0.0427];
const ALLPASS_TUNING: [f32; 2] = [0.0051, 0.0017];

pub struct RoomReverb {
    combs: [Comb; 4],
    allpasses: [Allpass; 2],
}

impl RoomReverb {
    pub fn new(sample_rate: f32) -> Self {
        let comb_len = |seconds: f32| ((seconds * sample_rate) as usize).max(1);

        Self {
            combs: [
                Comb::new(comb_len(COMB_TUNING[0])),
                Comb::new(comb_len(COMB_TUNING[1])),
                Comb::new(comb_len(COMB_TUNING[2])),
                Comb::new(comb_len(COMB_TUNING[3])),
            ],
            allpasses: [
                Allpass::new(comb_len(ALLPASS_TUNING[0])),
                Allpass::new(comb_len(ALLPASS_TUNING[1])),
            ],
        }
    }

    /// Room size 0..1, mapped onto comb feedback 0.72..0.97.
    pub fn set_room_size(&mut self, size: f32) {
        let feedback = 0.72 + size.clamp(0.0, 1.0) * 0.25;
        for comb in &mut self.combs {
            comb.feedback = feedback;
        }
    }

    /// Damping 0..1: high-frequency absorption per feedback pass.
    pub fn set_damping(&mut self, damping: f32) {
        let damp = damping.clamp(0.0, 1.0);
        for comb in &mut self.combs {
            comb.damp = damp;
        }
    }

    /// One wet sample out for one send sample in.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(input);
        }
        wet *= 0.25;

        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }

        wet
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_grows_a_tail() {
        let mut reverb = RoomReverb::new(48_000.0);
        reverb.set_room_size(0.6);
        reverb.set_damping(0.3);

        reverb.process(1.0);

        let mut tail_energy = 0.0;
        for _ in 0..48_000 {
            let wet = reverb.process(0.0);
            tail_energy += wet * wet;
        }

        assert!(tail_energy > 0.01, "expected a reverb tail after an impulse");
    }

    #[test]
    fn larger_rooms_ring_longer() {
        let late_energy = |size: f32| {
            let mut reverb = RoomReverb::new(48_000.0);
            reverb.set_room_size(size);
            reverb.set_damping(0.2);
            reverb.process(1.0);

            // Skip the early reflections, measure the late tail.
            for _ in 0..24_000 {
                reverb.process(0.0);
            }
            let mut energy = 0.0;
            for _ in 0..24_000 {
                let wet = reverb.process(0.0);
                energy += wet * wet;
            }
            energy
        };

        assert!(late_energy(0.9) > late_energy(0.1) * 2.0);
    }

    #[test]
    fn stays_stable_at_maximum_settings() {
        let mut reverb = RoomReverb::new(48_000.0);
        reverb.set_room_size(1.0);
        reverb.set_damping(0.0);

        for _ in 0..96_000 {
            let wet = reverb.process(0.2);
            assert!(wet.is_finite());
            assert!(wet.abs() < 10.0, "reverb must not run away: {wet}");
        }
    }

    #[test]
    fn reset_silences_the_tail() {
        let mut reverb = RoomReverb::new(48_000.0);
        reverb.set_room_size(0.8);
        reverb.process(1.0);
        for _ in 0..1_000 {
            reverb.process(0.0);
        }

        reverb.reset();

        for _ in 0..4_000 {
            assert_eq!(reverb.process(0.0), 0.0);
        }
    }
}
