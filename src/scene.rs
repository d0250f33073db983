//! Built-in soundscape presets: a named arrangement of sources on the
//! room plane with volumes, mutes, and optional EQ shapes.
//!
//! A preset only positions sources that are already loaded — it carries
//! no audio. Application is atomic: the registry validates every id
//! before sending a single update.

use crate::eq::BAND_COUNT;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSound {
    pub id: &'static str,
    pub volume: f32,
    pub position: (f32, f32),
    pub muted: bool,
    pub eq_gains: Option<[f32; BAND_COUNT]>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scene {
    pub name: &'static str,
    pub sounds: &'static [SceneSound],
}

pub const SCENES: [Scene; 3] = [
    Scene {
        name: "Rainy Night",
        sounds: &[
            SceneSound {
                id: "rain",
                volume: 0.8,
                position: (0.0, 0.1),
                muted: false,
                eq_gains: Some([3.0, 2.0, 0.0, -1.0, -2.0]), // Warm
            },
            SceneSound {
                id: "thunder",
                volume: 0.5,
                position: (-0.7, 0.8),
                muted: false,
                eq_gains: Some([6.0, 3.0, 0.0, -2.0, -2.0]), // Bass Boost
            },
            SceneSound {
                id: "wind",
                volume: 0.35,
                position: (0.9, -0.2),
                muted: false,
                eq_gains: None,
            },
        ],
    },
    Scene {
        name: "Campfire",
        sounds: &[
            SceneSound {
                id: "fire",
                volume: 0.75,
                position: (0.0, 0.0),
                muted: false,
                eq_gains: Some([3.0, 2.0, 0.0, -1.0, -2.0]), // Warm
            },
            SceneSound {
                id: "crickets",
                volume: 0.4,
                position: (0.6, 0.6),
                muted: false,
                eq_gains: Some([-2.0, 1.0, 2.0, 4.0, 6.0]), // Bright
            },
            SceneSound {
                id: "wind",
                volume: 0.25,
                position: (-0.8, -0.5),
                muted: false,
                eq_gains: None,
            },
        ],
    },
    Scene {
        name: "Seaside",
        sounds: &[
            SceneSound {
                id: "waves",
                volume: 0.85,
                position: (0.0, 0.4),
                muted: false,
                eq_gains: None,
            },
            SceneSound {
                id: "gulls",
                volume: 0.3,
                position: (0.5, -0.9),
                muted: false,
                eq_gains: Some([-1.0, 2.0, 4.0, 3.0, 1.0]), // Presence
            },
            SceneSound {
                id: "wind",
                volume: 0.45,
                position: (-0.9, 0.9),
                muted: false,
                eq_gains: None,
            },
        ],
    },
];

/// Look up a built-in scene by name (case-insensitive).
pub fn find(name: &str) -> Option<&'static Scene> {
    SCENES
        .iter()
        .find(|scene| scene.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eq::{clamp_gain_db, MAX_GAIN_DB, MIN_GAIN_DB};

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(find("rainy night").is_some());
        assert!(find("CAMPFIRE").is_some());
        assert!(find("underwater").is_none());
    }

    #[test]
    fn builtin_scene_values_are_in_range() {
        for scene in &SCENES {
            assert!(!scene.sounds.is_empty());
            for sound in scene.sounds {
                assert!((0.0..=1.0).contains(&sound.volume), "{}", scene.name);
                if let Some(gains) = sound.eq_gains {
                    for gain in gains {
                        assert!((MIN_GAIN_DB..=MAX_GAIN_DB).contains(&gain));
                        assert_eq!(gain, clamp_gain_db(gain));
                    }
                }
            }
        }
    }

    #[test]
    fn scene_ids_are_unique_within_a_scene() {
        for scene in &SCENES {
            for (i, a) in scene.sounds.iter().enumerate() {
                for b in &scene.sounds[i + 1..] {
                    assert_ne!(a.id, b.id, "duplicate id in {}", scene.name);
                }
            }
        }
    }
}
