//! The two halves of the engine and the ring that joins them.
//!
//! [`registry::SourceRegistry`] is the control path: it owns the id map,
//! decodes audio, clamps and mirrors every parameter, and emits
//! commands. [`mixer::MixEngine`] is the render path: it owns the source
//! slots and effects, drains the command ring once per block, and never
//! blocks, locks, or allocates while audio is running.

pub mod command;
pub mod mixer;
pub mod registry;

pub use command::Command;
pub use mixer::MixEngine;
pub use registry::{build, EngineConfig, SourceRegistry, DEFAULT_VOLUME};
