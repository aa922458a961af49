//! reunite-io: Browser I/O and Dioxus component library.
//!
//! Handles image previews and result downloads through Blob URLs,
//! clipboard sharing, analytics events, and the analysis service
//! backends (simulated and HTTP), and provides the workbench UI
//! components for the reunite web application.

pub mod analytics;
pub mod blob;
pub mod clipboard;
pub mod components;
pub mod config;
pub mod download;
pub mod service;

pub use blob::BlobUrls;
pub use components::{AgeControls, AnalysisWorkbench, ComparisonPanel, ImageDropZone};
pub use config::{ConfigError, ServiceConfig};
pub use service::{HttpAnalysisService, SimulatedAnalysisService, build_service};
