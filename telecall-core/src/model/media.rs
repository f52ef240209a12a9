use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// Which devices a capture request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub fn wants(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
        }
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// User-facing switches for the local tracks. Lives only as long as the call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaState {
    pub muted: bool,
    pub video_off: bool,
}

impl MediaState {
    /// Whether tracks of `kind` should currently carry samples.
    pub fn is_enabled(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => !self.muted,
            MediaKind::Video => !self.video_off,
        }
    }

    /// Flips the switch for `kind` and returns the new enabled flag for its tracks.
    pub fn toggle(&mut self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.muted = !self.muted,
            MediaKind::Video => self.video_off = !self.video_off,
        }
        self.is_enabled(kind)
    }
}
