//! Spatial mapping: where a source sits on the room plane decides how
//! loud, how dark, and how wet it sounds.
//!
//! The room is the square `[-R, R] × [-R, R]` with the listener at the
//! center. Three rules, all continuous and monotonic:
//!
//!   - distance from the center attenuates (farther = quieter),
//!   - distance from the center muffles (farther = lower lowpass cutoff,
//!     like a sound heard through intervening air and objects),
//!   - proximity to any wall raises the reverb send (sources near a
//!     boundary excite the room more).
//!
//! The mapper is a pure function of position, so the engine and any
//! position-preview UI derive identical parameters from the same inputs.
//! The exact curves are a design choice; the contract is monotonicity,
//! and the constants below are the single place to retune the feel.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Attenuation floor: a source parked on the wall is ~-60 dB, not gone.
const MIN_ATTENUATION: f32 = 1e-3;

/// Muffle cutoff at the center (effectively open) and at the wall.
const CUTOFF_NEAR_HZ: f32 = 16_000.0;
const CUTOFF_FAR_HZ: f32 = 700.0;

/// Reverb send at the center and at a wall/corner.
const BASE_REVERB_SEND: f32 = 0.04;
const MAX_REVERB_SEND: f32 = 0.60;

/// Derived per-source spatial parameters, applied to the live chain.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialParams {
    /// Gain multiplier in (0, 1].
    pub attenuation: f32,
    /// Lowpass cutoff for the muffle stage.
    pub muffle_cutoff_hz: f32,
    /// Send level into the shared reverb.
    pub reverb_send: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct SpatialMapper {
    half_extent: f32,
}

impl SpatialMapper {
    pub fn new(half_extent: f32) -> Self {
        Self {
            half_extent: half_extent.max(1e-3),
        }
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    /// Clamp a position onto the room plane.
    pub fn clamp_position(&self, x: f32, y: f32) -> (f32, f32) {
        let r = self.half_extent;
        (x.clamp(-r, r), y.clamp(-r, r))
    }

    /// Map a position (clamped first) to its spatial parameters.
    pub fn map(&self, x: f32, y: f32) -> SpatialParams {
        let (x, y) = self.clamp_position(x, y);
        let r = self.half_extent;

        // Center distance, normalized so the wall midpoint is 1. The
        // corner reaches sqrt(2); clamp so attenuation bottoms out there.
        let distance = (x * x + y * y).sqrt() / r;
        let d = distance.min(1.0);

        let attenuation = ((1.0 - d) * (1.0 - d)).max(MIN_ATTENUATION);

        // Interpolate the cutoff in log-frequency so equal drag distances
        // sound like equal timbre steps.
        let muffle_cutoff_hz =
            CUTOFF_NEAR_HZ * (CUTOFF_FAR_HZ / CUTOFF_NEAR_HZ).powf(d);

        // Wall proximity uses the Chebyshev distance: touching any wall
        // counts, independent of how far from the center the source is.
        let edge = (x.abs().max(y.abs()) / r).min(1.0);
        let reverb_send = BASE_REVERB_SEND + (MAX_REVERB_SEND - BASE_REVERB_SEND) * edge * edge;

        SpatialParams {
            attenuation,
            muffle_cutoff_hz,
            reverb_send,
        }
    }
}
