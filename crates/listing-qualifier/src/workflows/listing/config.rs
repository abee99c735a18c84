use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::domain::DisclosureCategory;
use super::extraction::{CompiledDictionary, DictionaryError, PhraseDictionary};
use super::scoring::{ChecklistField, ScoringConfig};

const DEFAULT_FSBO_THRESHOLD: f32 = 0.3;
const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Everything one pipeline run depends on. Passed explicitly; nothing is read from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub dictionary: PhraseDictionary,
    pub scoring: ScoringConfig,
    pub disclosure: DisclosureConfig,
    /// FSBO phrases at or below this confidence stay out of `fsboSignals`.
    #[serde(default = "default_fsbo_threshold")]
    pub fsbo_threshold: f32,
    #[serde(default)]
    pub required_fields: Vec<ChecklistField>,
    /// Reject listings whose price fits none of the configured segments.
    #[serde(default)]
    pub reject_unfit_price: bool,
    pub resolver_timeout_ms: u64,
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureConfig {
    pub categories: Vec<DisclosureCategory>,
    /// Transit within this distance is a known noise source.
    pub noise_radius_m: u32,
}

fn default_fsbo_threshold() -> f32 {
    DEFAULT_FSBO_THRESHOLD
}

fn default_batch_concurrency() -> usize {
    DEFAULT_BATCH_CONCURRENCY
}

impl PipelineConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PipelineConfigError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineConfigError> {
        self.scoring.validate()?;

        if !(0.0..=1.0).contains(&self.fsbo_threshold) {
            return Err(PipelineConfigError::InvalidThreshold(self.fsbo_threshold));
        }
        if self.disclosure.categories.is_empty() {
            return Err(PipelineConfigError::NoDisclosureCategories);
        }
        if self.resolver_timeout_ms == 0 {
            return Err(PipelineConfigError::ZeroTimeout);
        }
        if self.batch_concurrency == 0 {
            return Err(PipelineConfigError::ZeroConcurrency);
        }

        Ok(())
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }

    pub(crate) fn compile_dictionary(&self) -> Result<CompiledDictionary, PipelineConfigError> {
        Ok(CompiledDictionary::compile(&self.dictionary)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineConfigError {
    #[error("failed to read pipeline configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid pipeline configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid phrase dictionary: {0}")]
    Dictionary(#[from] DictionaryError),
    #[error("{name} weight must be finite and non-negative (found {value})")]
    InvalidWeight { name: &'static str, value: f32 },
    #[error("{group} weights must not all be zero")]
    ZeroWeights { group: &'static str },
    #[error("no target segments configured")]
    NoSegments,
    #[error("segment '{0}' has min_price above max_price")]
    InvertedSegment(String),
    #[error("segment '{0}' is configured more than once")]
    DuplicateSegment(String),
    #[error("target segment '{0}' is not among the configured segments")]
    UnknownTargetSegment(String),
    #[error("fsbo_threshold must be within 0..=1 (found {0})")]
    InvalidThreshold(f32),
    #[error("no disclosure categories configured")]
    NoDisclosureCategories,
    #[error("resolver_timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("batch_concurrency must be greater than zero")]
    ZeroConcurrency,
}
