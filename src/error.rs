use thiserror::Error;

/// Failure to turn an audio byte blob into a playable source.
///
/// A decode failure is always local to the offending `load_sound` call;
/// sources that are already playing are never affected.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The container/codec could not be identified at all.
    #[error("unsupported audio format")]
    UnsupportedFormat,

    /// The format was recognized but the payload could not be decoded.
    #[error("failed to decode audio payload: {0}")]
    DecodeFailure(String),

    /// A source with this id is already loaded.
    #[error("a sound with id {0:?} is already loaded")]
    DuplicateId(String),

    /// Every source slot is occupied.
    #[error("no free source slots (limit {0})")]
    NoFreeSlots(usize),
}

/// Failure to apply a named soundscape preset.
///
/// Validation happens before any update is sent, so a failed application
/// leaves every source exactly as it was.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unknown soundscape preset {0:?}")]
    UnknownScene(String),

    #[error("soundscape preset references sound {id:?} which is not loaded")]
    UnknownSound { id: String },
}
