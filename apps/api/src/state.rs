use std::sync::Arc;

use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Config;
use crate::reports::store::ReportStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Scanner, extractor and catalog are chosen once at startup and live here.
    pub pipeline: AnalysisPipeline,
    pub store: Arc<dyn ReportStore>,
    #[allow(dead_code)]
    pub config: Config,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline, config: Config) -> Self {
        Self {
            store: pipeline.store().clone(),
            pipeline,
            config,
        }
    }
}
