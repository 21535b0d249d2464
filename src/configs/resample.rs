use serde::{Deserialize, Serialize};

use crate::audio::constants::DEFAULT_BLOCK_FRAMES;
use crate::audio::resample::QualityLevel;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ResampleConfig {
    #[serde(default)]
    pub quality: QualityLevel,
    #[serde(default = "default_true")]
    pub interpolate: bool,
    #[serde(default = "default_block_frames")]
    pub block_frames: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            quality: QualityLevel::default(),
            interpolate: true,
            block_frames: DEFAULT_BLOCK_FRAMES,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_block_frames() -> usize {
    DEFAULT_BLOCK_FRAMES
}
