//! Display-time policy: how long a word stays on screen before recall is required.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{ExposureStage, LearningStatus, ProgressRecord, StageScheme, WordStage};

/// Stability upper bounds and the display time for each bucket; above the
/// last bound words flash for [`FLASH_MS`].
const STABILITY_BUCKETS: [(f64, u32); 4] = [(0.3, 3000), (0.8, 2000), (2.0, 1500), (4.0, 1000)];
const FLASH_MS: u32 = 200;

/// One mapping per deployment; every word of a batch uses the same one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "scheme")]
pub enum DisplayTimePolicy {
    /// Fixed duration per stage; new words get unlimited time
    StageBucketed(StageScheme),
    /// Duration shrinks continuously as stability grows
    StabilityContinuous,
}

impl Default for DisplayTimePolicy {
    fn default() -> Self {
        Self::StabilityContinuous
    }
}

impl DisplayTimePolicy {
    /// Display time in milliseconds, `None` for unlimited.
    pub fn display_time_ms(&self, record: &ProgressRecord) -> Option<u32> {
        match self {
            Self::StageBucketed(scheme) => stage_display_time(WordStage::of(record, *scheme)),
            Self::StabilityContinuous => Some(stability_display_time(record.stability)),
        }
    }
}

pub fn stage_display_time(stage: WordStage) -> Option<u32> {
    match stage {
        WordStage::Exposure(ExposureStage::New) | WordStage::Stability(LearningStatus::New) => {
            None
        }
        WordStage::Exposure(ExposureStage::Learning)
        | WordStage::Stability(LearningStatus::Learning) => Some(5000),
        WordStage::Exposure(ExposureStage::Practicing)
        | WordStage::Stability(LearningStatus::Reviewing) => Some(3000),
        WordStage::Exposure(ExposureStage::Known)
        | WordStage::Stability(LearningStatus::Mastered) => Some(1500),
    }
}

pub fn stability_display_time(stability: f64) -> u32 {
    STABILITY_BUCKETS
        .iter()
        .find(|(bound, _)| stability <= *bound)
        .map(|(_, ms)| *ms)
        .unwrap_or(FLASH_MS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePolicyError(String);

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown display time policy: {}", self.0)
    }
}

impl std::error::Error for ParsePolicyError {}

impl FromStr for DisplayTimePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stability" | "stability_continuous" => Ok(Self::StabilityContinuous),
            "stage" | "stage_exposure" => Ok(Self::StageBucketed(StageScheme::Exposure)),
            "stage_stability" => Ok(Self::StageBucketed(StageScheme::Stability)),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}
