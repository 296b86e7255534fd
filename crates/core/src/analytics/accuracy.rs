use crate::analytics::round2;
use crate::domain::records::AiLearningRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorAccuracy {
    /// Mean score in percentage points.
    pub average: f64,
    /// How many records defined this score.
    pub samples: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracySummary {
    pub total_records: usize,
    pub rsi: IndicatorAccuracy,
    pub macd: IndicatorAccuracy,
    pub sentiment: IndicatorAccuracy,
    pub volume: IndicatorAccuracy,
    pub overall: IndicatorAccuracy,
}

/// Averages `field` across the records that define it, scaled to percentage points.
///
/// Missing values are skipped rather than counted as zero.
pub fn average_field<F>(records: &[AiLearningRecord], field: F) -> IndicatorAccuracy
where
    F: Fn(&AiLearningRecord) -> Option<f64>,
{
    let values: Vec<f64> = records.iter().filter_map(&field).collect();
    if values.is_empty() {
        return IndicatorAccuracy::default();
    }
    IndicatorAccuracy {
        average: round2(values.iter().sum::<f64>() / values.len() as f64 * 100.0),
        samples: values.len(),
    }
}

pub fn summarize_accuracy(records: &[AiLearningRecord]) -> AccuracySummary {
    let per_record: Vec<f64> = records.iter().filter_map(|r| r.average_accuracy()).collect();
    let overall = if per_record.is_empty() {
        IndicatorAccuracy::default()
    } else {
        IndicatorAccuracy {
            average: round2(per_record.iter().sum::<f64>() / per_record.len() as f64),
            samples: per_record.len(),
        }
    };

    AccuracySummary {
        total_records: records.len(),
        rsi: average_field(records, |r| r.rsi_accuracy),
        macd: average_field(records, |r| r.macd_accuracy),
        sentiment: average_field(records, |r| r.sentiment_accuracy),
        volume: average_field(records, |r| r.volume_accuracy),
        overall,
    }
}
