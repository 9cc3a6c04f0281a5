//! Per-family conversion flags.

use serde::{Deserialize, Serialize};

use crate::formats::MediaFamily;

/// Extra ffmpeg flags inserted between the input and the output, chosen by
/// the family of the target format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionProfiles {
    #[serde(default)]
    pub video: Vec<String>,

    #[serde(default = "default_audio_flags")]
    pub audio: Vec<String>,

    /// Single-frame outputs get square pixels.
    #[serde(default = "default_image_flags")]
    pub image: Vec<String>,
}

fn default_audio_flags() -> Vec<String> {
    vec!["-vn".to_string()]
}

fn default_image_flags() -> Vec<String> {
    ["-vf", "setsar=1", "-frames:v", "1"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ConversionProfiles {
    fn default() -> Self {
        Self {
            video: Vec::new(),
            audio: default_audio_flags(),
            image: default_image_flags(),
        }
    }
}

impl ConversionProfiles {
    pub fn flags_for(&self, family: MediaFamily) -> &[String] {
        match family {
            MediaFamily::Video => &self.video,
            MediaFamily::Audio => &self.audio,
            MediaFamily::Image => &self.image,
        }
    }
}
