use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::{PipelineConfig, PipelineConfigError};
use super::disclosure::{DisclosureEnforcer, DisclosureReport, Violation, ViolationCategory};
use super::domain::{PropertyRecord, RawListing};
use super::extraction::{self, CompiledDictionary};
use super::georisk::{DegradedReason, GeoQuery, GeoRiskResolver, GeoRiskResult, ResolverError};
use super::normalizer::SchemaNormalizer;
use super::scoring::{is_populated, LeadScorer, ScoreReport};

/// Outcome of one run. A record with any undisclosed known risk never reaches `Valid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ValidationResult {
    Valid {
        record: Box<PropertyRecord>,
        scores: ScoreReport,
        disclosure: DisclosureReport,
        degradations: Vec<DegradedReason>,
    },
    Invalid {
        violations: Vec<Violation>,
        disclosure: DisclosureReport,
        degradations: Vec<DegradedReason>,
    },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid { .. })
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationResult::Valid { .. } => &[],
            ValidationResult::Invalid { violations, .. } => violations,
        }
    }

    pub fn disclosure(&self) -> &DisclosureReport {
        match self {
            ValidationResult::Valid { disclosure, .. }
            | ValidationResult::Invalid { disclosure, .. } => disclosure,
        }
    }

    pub fn degradations(&self) -> &[DegradedReason] {
        match self {
            ValidationResult::Valid { degradations, .. }
            | ValidationResult::Invalid { degradations, .. } => degradations,
        }
    }

    pub fn record(&self) -> Option<&PropertyRecord> {
        match self {
            ValidationResult::Valid { record, .. } => Some(record.as_ref()),
            ValidationResult::Invalid { .. } => None,
        }
    }

    pub fn scores(&self) -> Option<&ScoreReport> {
        match self {
            ValidationResult::Valid { scores, .. } => Some(scores),
            ValidationResult::Invalid { .. } => None,
        }
    }
}

/// Fatal for the one listing being processed; a batch carries on.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("malformed listing: {0}")]
    MalformedListing(String),
    #[error(transparent)]
    Configuration(#[from] PipelineConfigError),
    #[error("geo-risk resolver unreachable: {0}")]
    ResolverUnreachable(String),
}

/// Cooperative stop signal for batch runs, checked before each listing starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "detail")]
pub enum BatchOutcome {
    Completed(ValidationResult),
    Failed { error: String },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub outcome: BatchOutcome,
}

/// Extract, resolve, normalize, enforce and score one listing at a time.
pub struct ListingPipeline<G> {
    resolver: Arc<G>,
    config: PipelineConfig,
    dictionary: CompiledDictionary,
    normalizer: SchemaNormalizer,
    enforcer: DisclosureEnforcer,
    scorer: LeadScorer,
}

impl<G> ListingPipeline<G>
where
    G: GeoRiskResolver + 'static,
{
    pub fn new(resolver: Arc<G>, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let dictionary = config.compile_dictionary()?;

        Ok(Self {
            normalizer: SchemaNormalizer::from_config(&config),
            enforcer: DisclosureEnforcer::from_config(&config),
            scorer: LeadScorer::new(config.scoring.clone()),
            resolver,
            config,
            dictionary,
        })
    }

    /// Sibling pipeline sharing this resolver under a different configuration.
    pub fn with_config(&self, config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::new(Arc::clone(&self.resolver), config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decode a JSON payload and run it; undecodable input is a malformed listing.
    pub async fn run_json(&self, bytes: &[u8]) -> Result<ValidationResult, PipelineError> {
        let listing = RawListing::from_json_slice(bytes)
            .map_err(|error| PipelineError::MalformedListing(error.to_string()))?;
        self.run(&listing).await
    }

    pub async fn run(&self, listing: &RawListing) -> Result<ValidationResult, PipelineError> {
        if listing.is_blank() {
            return Err(PipelineError::MalformedListing(
                "listing carries no text, contact or hints".to_string(),
            ));
        }

        let url = listing.url.as_deref().unwrap_or("-");
        let signals = extraction::extract(&listing.text, listing.contact.as_deref(), &self.dictionary);
        debug!(url, signals = signals.len(), "extracted listing signals");

        let geo = self.resolve(listing).await?;
        let degradations: Vec<DegradedReason> = geo.degraded_reason().cloned().into_iter().collect();

        let record = self.normalizer.normalize(listing, &signals, &geo);
        let disclosure = self.enforcer.enforce(&record, &geo);

        let mut violations = disclosure.violations.clone();
        violations.extend(self.quality_violations(&record, &disclosure));

        if !violations.is_empty() {
            info!(
                url,
                violations = violations.len(),
                degraded = !degradations.is_empty(),
                "listing rejected"
            );
            return Ok(ValidationResult::Invalid {
                violations,
                disclosure,
                degradations,
            });
        }

        let scores = self.scorer.score(&signals, &record, &disclosure);
        info!(
            url,
            overall_score = scores.overall_score,
            degraded = !degradations.is_empty(),
            "listing validated"
        );

        Ok(ValidationResult::Valid {
            record: Box::new(record),
            scores,
            disclosure,
            degradations,
        })
    }

    /// Runs listings with bounded concurrency; output keeps input order.
    pub async fn run_batch(
        &self,
        listings: &[RawListing],
        cancel: &CancellationFlag,
    ) -> Vec<BatchEntry> {
        // Owned listings keep the stream future `Send` for the HTTP handler.
        let entries: Vec<BatchEntry> = stream::iter(listings.iter().cloned().enumerate())
            .map(|(index, listing)| async move {
                let url = listing.url.clone();
                if cancel.is_cancelled() {
                    return BatchEntry {
                        index,
                        url,
                        outcome: BatchOutcome::Skipped,
                    };
                }

                let outcome = match self.run(&listing).await {
                    Ok(result) => BatchOutcome::Completed(result),
                    Err(error) => {
                        warn!(index, error = %error, "listing failed");
                        BatchOutcome::Failed {
                            error: error.to_string(),
                        }
                    }
                };
                BatchEntry { index, url, outcome }
            })
            .buffered(self.config.batch_concurrency)
            .collect()
            .await;

        let skipped = entries
            .iter()
            .filter(|entry| entry.outcome == BatchOutcome::Skipped)
            .count();
        info!(listings = entries.len(), skipped, "batch finished");
        entries
    }

    async fn resolve(&self, listing: &RawListing) -> Result<GeoRiskResult, PipelineError> {
        let Some(query) = GeoQuery::for_listing(listing) else {
            warn!("listing has no locality or coordinates; geo-risk unknown");
            return Ok(GeoRiskResult::degraded(DegradedReason::NoLocation));
        };

        let timeout = self.config.resolver_timeout();
        match tokio::time::timeout(timeout, self.resolver.resolve(&query)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(ResolverError::NoMatch(described))) => {
                warn!(query = %described, "geo-risk resolver had no match; geo-risk unknown");
                Ok(GeoRiskResult::degraded(DegradedReason::NoMatch { query: described }))
            }
            Ok(Err(ResolverError::Unreachable(reason))) => {
                warn!(query = %query.describe(), error = %reason, "geo-risk resolver unreachable");
                Err(PipelineError::ResolverUnreachable(reason))
            }
            Err(_) => {
                let after_ms = duration_ms(timeout);
                warn!(query = %query.describe(), after_ms, "geo-risk resolver timed out; geo-risk unknown");
                Ok(GeoRiskResult::degraded(DegradedReason::Timeout { after_ms }))
            }
        }
    }

    fn quality_violations(
        &self,
        record: &PropertyRecord,
        disclosure: &DisclosureReport,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();

        for field in &self.config.required_fields {
            if !is_populated(*field, record, disclosure) {
                violations.push(Violation {
                    category: ViolationCategory::MissingField(*field),
                    reason: format!("required field {} is missing", field.label()),
                });
            }
        }

        if self.config.reject_unfit_price {
            if let Some(price) = record.offers.price {
                let fits_any = self
                    .config
                    .scoring
                    .segments
                    .iter()
                    .any(|segment| segment.fit(price) > 0.0);
                if !fits_any {
                    violations.push(Violation {
                        category: ViolationCategory::PriceOutsideSegments,
                        reason: format!("price {price} fits none of the configured segments"),
                    });
                }
            }
        }

        violations
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
