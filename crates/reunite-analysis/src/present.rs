//! Normalization of service answers into renderable results, plus the
//! download and share side-effect payloads.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::request::{AnalysisParameters, AnalysisRequest};
use crate::service::{ResultImage, ServiceResponse};
use crate::types::{Dimensions, Direction, MatchPoint, RequestKind, TargetAge};

/// Similarity at or above which a match is labeled [`Confidence::High`].
pub const HIGH_CONFIDENCE: f64 = 0.80;

/// Similarity at or above which a match is labeled [`Confidence::Moderate`].
pub const MODERATE_CONFIDENCE: f64 = 0.60;

/// Discrete bucket for a facial similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Moderate,
    Low,
}

impl Confidence {
    /// Bucket a similarity score.
    #[must_use]
    pub fn from_similarity(similarity: f64) -> Self {
        if similarity >= HIGH_CONFIDENCE {
            Self::High
        } else if similarity >= MODERATE_CONFIDENCE {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }
}

/// Facial-match score with its derived confidence label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetric {
    /// Similarity in `[0, 1]`.
    pub similarity: f64,
    pub confidence: Confidence,
}

impl SummaryMetric {
    /// Similarity as a percentage with one decimal, e.g. `"85.0%"`.
    #[must_use]
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.similarity * 100.0)
    }
}

/// The request parameters a result was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOrigin {
    AgeTransform {
        target_age: TargetAge,
        direction: Direction,
    },
    FacialMatch,
}

/// Normalized output of a completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    origin: ResultOrigin,
    summary_metric: Option<SummaryMetric>,
    result_asset: ResultImage,
    result_dimensions: Option<Dimensions>,
    annotations: Vec<MatchPoint>,
}

impl AnalysisResult {
    #[must_use]
    pub const fn origin(&self) -> ResultOrigin {
        self.origin
    }

    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self.origin {
            ResultOrigin::AgeTransform { .. } => RequestKind::AgeTransform,
            ResultOrigin::FacialMatch => RequestKind::FacialMatch,
        }
    }

    /// Similarity and confidence. Always `None` for age transforms.
    #[must_use]
    pub const fn summary_metric(&self) -> Option<&SummaryMetric> {
        self.summary_metric.as_ref()
    }

    /// The transformed image, or the matched target image.
    #[must_use]
    pub const fn result_asset(&self) -> &ResultImage {
        &self.result_asset
    }

    /// Pixel size of [`result_asset`](Self::result_asset) when known,
    /// for scaling the annotation overlay.
    #[must_use]
    pub const fn result_dimensions(&self) -> Option<Dimensions> {
        self.result_dimensions
    }

    /// Matched landmarks in service order. Empty for age transforms.
    #[must_use]
    pub fn annotations(&self) -> &[MatchPoint] {
        &self.annotations
    }
}

/// Turn a raw service answer into an [`AnalysisResult`].
///
/// # Errors
///
/// Returns [`ValidationError::MalformedResponse`] when the answer is for
/// the wrong kind of request, an age transform carries no image, or a
/// facial match has no similarity or one outside `[0, 1]` (including
/// NaN). Out-of-range
/// scores are rejected rather than clamped.
pub fn normalize(
    response: ServiceResponse,
    request: &AnalysisRequest,
) -> Result<AnalysisResult, ValidationError> {
    match (response, request.parameters()) {
        (
            ServiceResponse::AgeTransform(answer),
            AnalysisParameters::AgeTransform {
                target_age,
                direction,
                ..
            },
        ) => {
            let image = answer
                .image
                .filter(|image| !image.is_empty())
                .ok_or_else(|| {
                    ValidationError::MalformedResponse("age transform returned no image".into())
                })?;
            Ok(AnalysisResult {
                origin: ResultOrigin::AgeTransform {
                    target_age: *target_age,
                    direction: *direction,
                },
                summary_metric: None,
                result_asset: image,
                result_dimensions: None,
                annotations: Vec::new(),
            })
        }
        (ServiceResponse::FacialMatch(answer), AnalysisParameters::FacialMatch { target, .. }) => {
            let Some(similarity) = answer.similarity else {
                return Err(ValidationError::MalformedResponse(
                    "facial match returned no similarity".into(),
                ));
            };
            if !(0.0..=1.0).contains(&similarity) {
                return Err(ValidationError::MalformedResponse(format!(
                    "similarity {similarity} is outside [0, 1]"
                )));
            }
            Ok(AnalysisResult {
                origin: ResultOrigin::FacialMatch,
                summary_metric: Some(SummaryMetric {
                    similarity,
                    confidence: Confidence::from_similarity(similarity),
                }),
                result_asset: ResultImage::Inline {
                    bytes: target.shared_bytes(),
                    mime: target.mime(),
                },
                result_dimensions: target.dimensions(),
                annotations: answer.match_points,
            })
        }
        (response, parameters) => Err(ValidationError::MalformedResponse(format!(
            "{} response for a {} request",
            response.kind(),
            parameters.kind()
        ))),
    }
}

/// What a download writes to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPayload {
    pub filename: String,
    pub data: ResultImage,
}

/// Build the download for a result.
///
/// Filenames are a pure function of the request parameters:
/// `age-{direction}-{age}.jpg` for age transforms and
/// `facial-match-result.jpg` for facial matches.
#[must_use]
pub fn build_download_payload(result: &AnalysisResult) -> DownloadPayload {
    let filename = match result.origin {
        ResultOrigin::AgeTransform {
            target_age,
            direction,
        } => format!("age-{direction}-{target_age}.jpg"),
        ResultOrigin::FacialMatch => "facial-match-result.jpg".to_owned(),
    };
    DownloadPayload {
        filename,
        data: result.result_asset.clone(),
    }
}

/// Text summary placed on the clipboard when a result is shared.
#[must_use]
pub fn share_text(result: &AnalysisResult) -> String {
    match (result.origin, result.summary_metric()) {
        (
            ResultOrigin::AgeTransform {
                target_age,
                direction,
            },
            _,
        ) => format!("{} to age {target_age}", direction.label()),
        (ResultOrigin::FacialMatch, Some(metric)) => format!(
            "Facial match: {} similarity ({} confidence), {} matched features",
            metric.percent_label(),
            metric.confidence.label(),
            result.annotations.len()
        ),
        (ResultOrigin::FacialMatch, None) => "Facial match result".to_owned(),
    }
}
