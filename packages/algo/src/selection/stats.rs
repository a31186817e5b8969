//! Aggregate learning statistics over a user's progress records.

use serde::Serialize;

use crate::types::{ExposureStage, ProgressRecord};

/// Error-rate bucket upper bounds (exclusive)
const EASY_BELOW: f64 = 0.2;
const MEDIUM_BELOW: f64 = 0.4;
const HARD_BELOW: f64 = 0.6;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCounts {
    pub new: usize,
    pub learning: usize,
    pub practicing: usize,
    pub known: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyCounts {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    pub very_hard: usize,
    /// Words never answered, so without an error rate
    pub unrated: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub total: usize,
    pub by_stage: StageCounts,
    pub by_difficulty: DifficultyCounts,
}

pub fn learning_stats(records: &[ProgressRecord]) -> LearningStats {
    let mut stats = LearningStats {
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        match record.exposure_stage() {
            ExposureStage::New => stats.by_stage.new += 1,
            ExposureStage::Learning => stats.by_stage.learning += 1,
            ExposureStage::Practicing => stats.by_stage.practicing += 1,
            ExposureStage::Known => stats.by_stage.known += 1,
        }

        if record.times_seen == 0 {
            stats.by_difficulty.unrated += 1;
            continue;
        }
        let rate = record.error_rate();
        if rate < EASY_BELOW {
            stats.by_difficulty.easy += 1;
        } else if rate < MEDIUM_BELOW {
            stats.by_difficulty.medium += 1;
        } else if rate < HARD_BELOW {
            stats.by_difficulty.hard += 1;
        } else {
            stats.by_difficulty.very_hard += 1;
        }
    }

    stats
}
