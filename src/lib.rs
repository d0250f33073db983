pub mod decode;
pub mod dsp;
pub mod effects;
pub mod engine; // Control/render split and the public API
pub mod eq; // Shared response math for engine and previews
pub mod error;
pub mod scene;
pub mod source;
pub mod spatial;

pub use engine::{build, EngineConfig, MixEngine, SourceRegistry};
pub use error::{DecodeError, SceneError};

/// Largest chunk the render path processes at once; device buffers
/// bigger than this are split internally.
pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
