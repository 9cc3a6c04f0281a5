//! Types for the formats module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A group of extensions that can be converted into one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFamily {
    Video,
    Audio,
    Image,
}

impl MediaFamily {
    /// Families in lookup order. An extension listed in several families
    /// resolves to the first one here.
    pub const ALL: [MediaFamily; 3] = [Self::Video, Self::Audio, Self::Image];

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for MediaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
