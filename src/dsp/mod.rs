//! Low-level DSP primitives used by the mixing engine.
//!
//! These components are allocation-free after construction and
//! realtime-safe, so they can live inside source chains and the effects
//! bus on the render path. They stay focused on the signal math; the
//! engine layer handles orchestration and parameter traffic.

/// RBJ biquad filters: EQ shelves/peaks and the spatial muffle lowpass.
pub mod biquad;
/// Delay line and the feedback echo effect.
pub mod delay;
/// Master-bus peak limiter and soft-knee clipper.
pub mod limiter;
/// Bit-crush / hiss / vintage-lowpass degradation stage.
pub mod lofi;
/// Schroeder-style send reverb.
pub mod reverb;
/// Linear anti-zipper parameter ramps.
pub mod smooth;
