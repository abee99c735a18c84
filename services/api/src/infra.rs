use crate::cli::PipelineArgs;
use listing_qualifier::config::{AppConfig, PipelineSettings};
use listing_qualifier::error::AppError;
use listing_qualifier::workflows::listing::{ListingPipeline, PipelineConfig, StaticGeoRiskTable};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) type TablePipeline = ListingPipeline<StaticGeoRiskTable>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn apply_overrides(config: &mut AppConfig, mut args: PipelineArgs) {
    if let Some(path) = args.config.take() {
        config.pipeline.config_path = path;
    }
    if let Some(path) = args.geo_table.take() {
        config.pipeline.geo_table_path = Some(path);
    }
}

/// Builds the pipeline from the configured files. Without a geo table every
/// listing resolves as degraded (no match).
pub(crate) fn load_pipeline(settings: &PipelineSettings) -> Result<TablePipeline, AppError> {
    let config = PipelineConfig::from_path(&settings.config_path)?;
    let table = match &settings.geo_table_path {
        Some(path) => {
            let table = StaticGeoRiskTable::from_path(path, settings.geo_match_radius_km)?;
            info!(path = %path.display(), localities = table.len(), "geo-risk table loaded");
            table
        }
        None => {
            warn!("no geo-risk table configured; location risks will resolve as unknown");
            StaticGeoRiskTable::empty()
        }
    };

    Ok(ListingPipeline::new(Arc::new(table), config)?)
}
