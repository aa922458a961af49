//! The external analysis service seam.
//!
//! Implementations own the transport (HTTP, simulated latency, test
//! fakes). The core only ever talks to a service through [`dispatch`].

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::intake::SourceBlob;
use crate::request::{AnalysisParameters, AnalysisRequest};
use crate::types::{Direction, ImageMime, MatchPoint, RequestKind, TargetAge};

/// A stateless collaborator that performs the actual inference.
///
/// Both calls are asynchronous and single-shot. The browser runtime is
/// single-threaded, so futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait AnalysisService {
    /// Render `asset` as the subject would look at `target_age`.
    async fn request_age_transform(
        &self,
        asset: &SourceBlob,
        target_age: TargetAge,
        direction: Direction,
    ) -> Result<AgeTransformResponse, ServiceError>;

    /// Compare the face in `reference` against the face in `target`.
    async fn request_facial_match(
        &self,
        reference: &SourceBlob,
        target: &SourceBlob,
    ) -> Result<FacialMatchResponse, ServiceError>;
}

/// Reference to an image produced or returned by the service.
#[derive(Clone, PartialEq, Eq)]
pub enum ResultImage {
    /// Hosted by the service (or any other origin).
    Remote { url: String },
    /// Delivered inline.
    Inline { bytes: Rc<[u8]>, mime: ImageMime },
}

impl ResultImage {
    /// Whether the reference actually points at something.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Remote { url } => url.trim().is_empty(),
            Self::Inline { bytes, .. } => bytes.is_empty(),
        }
    }
}

impl fmt::Debug for ResultImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { url } => f.debug_struct("Remote").field("url", url).finish(),
            Self::Inline { bytes, mime } => f
                .debug_struct("Inline")
                .field("len", &bytes.len())
                .field("mime", mime)
                .finish(),
        }
    }
}

/// Raw answer to an age transform request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeTransformResponse {
    /// The transformed image, if the service produced one.
    pub image: Option<ResultImage>,
}

/// Raw answer to a facial match request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacialMatchResponse {
    /// Similarity in `[0, 1]`. Not yet validated; `None` when the
    /// service sent no score.
    #[serde(default)]
    pub similarity: Option<f64>,
    /// Landmarks the service matched, in target-image coordinates.
    #[serde(default)]
    pub match_points: Vec<MatchPoint>,
}

/// Either kind of service answer, tagged.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResponse {
    AgeTransform(AgeTransformResponse),
    FacialMatch(FacialMatchResponse),
}

impl ServiceResponse {
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::AgeTransform(_) => RequestKind::AgeTransform,
            Self::FacialMatch(_) => RequestKind::FacialMatch,
        }
    }
}

/// Route `request` to the matching service call.
///
/// This is the only suspension point of a submission.
///
/// # Errors
///
/// Passes through whatever [`ServiceError`] the service returns.
#[allow(clippy::future_not_send)] // WASM is single-threaded; services are !Send
pub async fn dispatch(
    service: &dyn AnalysisService,
    request: &AnalysisRequest,
) -> Result<ServiceResponse, ServiceError> {
    match request.parameters() {
        AnalysisParameters::AgeTransform {
            subject,
            target_age,
            direction,
        } => service
            .request_age_transform(subject, *target_age, *direction)
            .await
            .map(ServiceResponse::AgeTransform),
        AnalysisParameters::FacialMatch { reference, target } => service
            .request_facial_match(reference, target)
            .await
            .map(ServiceResponse::FacialMatch),
    }
}
