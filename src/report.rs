use crate::pipeline::{ConversionResult, ConversionStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub engine: Option<PathBuf>,
    pub started: String,
    pub finished: String,
    pub summary: BatchSummary,
    pub results: Vec<ConversionResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub converted: usize,
    pub missing_source: usize,
    pub unsupported_format: usize,
    pub engine_failure: usize,
    pub engine_not_found: usize,
    pub other_error: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ConversionResult]) -> Self {
        let mut s = BatchSummary {
            total: results.len(),
            ..Default::default()
        };
        for r in results {
            match r.status {
                ConversionStatus::Success => s.converted += 1,
                ConversionStatus::MissingSource => s.missing_source += 1,
                ConversionStatus::UnsupportedFormat => s.unsupported_format += 1,
                ConversionStatus::EngineFailure => s.engine_failure += 1,
                ConversionStatus::EngineNotFound => s.engine_not_found += 1,
                ConversionStatus::OtherError => s.other_error += 1,
            }
        }
        s
    }

    pub fn failed(&self) -> usize {
        self.total - self.converted
    }
}

impl BatchReport {
    pub fn all_converted(&self) -> bool {
        self.summary.failed() == 0
    }
}
