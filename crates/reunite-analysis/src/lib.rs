//! reunite-analysis: Media analysis request lifecycle (sans-IO).
//!
//! Models one reusable workbench that stages user images, submits an
//! age transform or facial match to an external service, and turns the
//! answer into something the UI can compare side by side:
//!
//! intake (validate + preview URI) -> lifecycle controller ->
//! service dispatch -> result normalization -> comparison view.
//!
//! This crate has **no browser dependencies**. Preview URIs and the
//! analysis service are injected through the [`PreviewUrls`] and
//! [`AnalysisService`] traits; all browser interaction lives in
//! `reunite-io`.

pub mod error;
pub mod intake;
pub mod lifecycle;
pub mod present;
pub mod request;
pub mod service;
pub mod types;
pub mod view;

pub use error::{IntakeError, PreviewError, ServiceError, SubmitError, ValidationError};
pub use intake::{
    FileCandidate, IntakePolicy, IntakeSource, MAX_ASSET_BYTES, MediaAsset, PreviewUrls,
    SourceBlob, stage_asset,
};
pub use lifecycle::{
    AgeSettings, AnalysisController, Completion, LifecycleState, LifecycleStatus, Submission,
};
pub use present::{
    AnalysisResult, Confidence, DownloadPayload, ResultOrigin, SummaryMetric,
    build_download_payload, normalize, share_text,
};
pub use request::{AnalysisParameters, AnalysisRequest};
pub use service::{
    AgeTransformResponse, AnalysisService, FacialMatchResponse, ResultImage, ServiceResponse,
    dispatch,
};
pub use types::{Dimensions, Direction, ImageMime, MatchPoint, RequestKind, Slot, TargetAge};
pub use view::ComparisonView;
