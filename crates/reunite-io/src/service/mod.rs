//! Concrete [`AnalysisService`] implementations.

mod http;
mod simulated;

use std::rc::Rc;

use reunite_analysis::AnalysisService;

use crate::config::ServiceConfig;

pub use http::HttpAnalysisService;
pub use simulated::SimulatedAnalysisService;

/// Build the service selected by `config`.
#[must_use]
pub fn build_service(config: &ServiceConfig) -> Rc<dyn AnalysisService> {
    match config {
        ServiceConfig::Simulated { latency_ms } => {
            tracing::info!(latency_ms, "using simulated analysis service");
            Rc::new(SimulatedAnalysisService::new(*latency_ms))
        }
        ServiceConfig::Http {
            base_url,
            timeout_ms,
        } => {
            tracing::info!(%base_url, timeout_ms, "using HTTP analysis service");
            Rc::new(HttpAnalysisService::new(base_url.clone(), *timeout_ms))
        }
    }
}
