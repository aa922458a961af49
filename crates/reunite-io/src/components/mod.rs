//! Dioxus UI components for reunite.
//!
//! Provides the image drop zone, the age transform controls, the
//! before/after comparison panel, and the workbench that ties them to
//! an analysis controller.

mod age_controls;
mod comparison;
mod upload;
mod workbench;

pub use age_controls::AgeControls;
pub use comparison::ComparisonPanel;
pub use upload::ImageDropZone;
pub use workbench::AnalysisWorkbench;
