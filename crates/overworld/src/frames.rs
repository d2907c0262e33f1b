use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::geometry::Vec2;

/// Name of the one-entry transparent set used by trigger-only events.
pub const NEUTRAL_FRAME_SET: &str = "neutral";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureKeyError {
    #[error("texture key must not be empty")]
    Empty,
    #[error("texture key '{key}' contains invalid character '{character}'")]
    InvalidCharacter { key: String, character: char },
    #[error("texture key '{key}' has an empty path segment")]
    EmptySegment { key: String },
}

/// Path-like handle of a texture owned by the resource loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureKey(String);

impl TextureKey {
    pub fn new(key: impl Into<String>) -> Result<Self, TextureKeyError> {
        let key = key.into();
        validate_texture_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase ascii, digits, `_` and `-` in `/`-separated segments. Rejecting
/// `.` and empty segments rules out absolute and parent-relative paths.
fn validate_texture_key(key: &str) -> Result<(), TextureKeyError> {
    if key.is_empty() {
        return Err(TextureKeyError::Empty);
    }
    let invalid = key.chars().find(|ch| {
        !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-' | '/'))
    });
    if let Some(character) = invalid {
        return Err(TextureKeyError::InvalidCharacter {
            key: key.to_string(),
            character,
        });
    }
    if key.split('/').any(str::is_empty) {
        return Err(TextureKeyError::EmptySegment {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Ordered frames shared between every event drawn with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSet {
    name: String,
    frames: Vec<TextureKey>,
}

impl FrameSet {
    pub fn new(name: impl Into<String>, frames: Vec<TextureKey>) -> Self {
        Self {
            name: name.into(),
            frames,
        }
    }

    /// Builds a set whose frames are `<prefix>/<index>`.
    pub fn numbered(prefix: &str, count: usize) -> Result<Self, TextureKeyError> {
        let frames = (0..count)
            .map(|index| TextureKey::new(format!("{prefix}/{index}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(prefix, frames))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TextureKey> {
        self.frames.get(index)
    }
}

/// Index of the frame currently displayed. Always in bounds of its set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCursor {
    index: usize,
}

impl FrameCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Points at `index`, clamping to the last frame when the set is too short.
    pub fn select(&mut self, frames: &FrameSet, index: usize) {
        if index < frames.len() {
            self.index = index;
            return;
        }
        warn!(
            frame_set = frames.name(),
            index,
            len = frames.len(),
            "frame_index_out_of_range"
        );
        self.index = frames.len().saturating_sub(1);
    }
}

/// Renderer-facing state owned by one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub texture: Option<TextureKey>,
    pub scale: f32,
    pub origin: Vec2,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            texture: None,
            scale: 1.0,
            origin: Vec2::ZERO,
        }
    }
}

/// Resource cache of frame sets, shared by reference count with the events.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    sets: HashMap<String, Arc<FrameSet>>,
}

impl Default for FrameCatalog {
    fn default() -> Self {
        let mut sets = HashMap::new();
        let neutral = FrameSet::new(
            NEUTRAL_FRAME_SET,
            vec![TextureKey(String::from("system/alpha"))],
        );
        sets.insert(NEUTRAL_FRAME_SET.to_string(), Arc::new(neutral));
        Self { sets }
    }
}

impl FrameCatalog {
    pub fn insert(&mut self, set: FrameSet) -> Arc<FrameSet> {
        let set = Arc::new(set);
        self.sets.insert(set.name().to_string(), Arc::clone(&set));
        set
    }

    pub fn get(&self, name: &str) -> Option<Arc<FrameSet>> {
        self.sets.get(name).cloned()
    }

    pub fn neutral(&self) -> Arc<FrameSet> {
        self.sets
            .get(NEUTRAL_FRAME_SET)
            .cloned()
            .unwrap_or_else(|| {
                Arc::new(FrameSet::new(
                    NEUTRAL_FRAME_SET,
                    vec![TextureKey(String::from("system/alpha"))],
                ))
            })
    }
}
