//! Error taxonomy for intake, submission, and the external analysis service.

/// Local, synchronous, user-correctable errors.
///
/// These are filtered at intake or raised by result normalization and
/// are never treated as system faults.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The file is not a JPEG or PNG image.
    #[error("unsupported file type {mime:?}: please upload a JPG or PNG image")]
    UnsupportedType { mime: String },

    /// The file exceeds the intake size limit.
    #[error("image is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// A required image slot is empty.
    #[error("required input image is missing")]
    MissingInput,

    /// The service returned a payload that violates the result contract.
    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),

    /// A target age outside `1..=100`.
    #[error("target age {0} is outside 1..=100")]
    AgeOutOfRange(u32),
}

/// Errors surfaced by an [`AnalysisService`](crate::AnalysisService).
///
/// Recorded as the terminal state of the request that produced them.
/// There is no automatic retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The request never reached the service or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The service did not answer in time.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a rejection.
    #[error("server rejected request{}: {message}", status_suffix(.status))]
    ServerRejected {
        /// HTTP-style status code, when the transport has one.
        status: Option<u16>,
        message: String,
    },
}

impl ServiceError {
    /// Message suitable for showing to the user.
    ///
    /// Server-supplied messages are shown verbatim; everything else gets
    /// a generic fallback.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ServerRejected { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::ServerRejected { .. } => "The analysis service rejected the request.".into(),
            Self::Timeout => "The analysis service took too long to respond. Please try again.".into(),
            Self::Network(_) => {
                "Could not reach the analysis service. Check your connection and try again.".into()
            }
        }
    }
}

#[allow(clippy::ref_option)] // thiserror passes fields by reference
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Synchronous rejection of a [`submit`](crate::AnalysisController::submit) call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The request's inputs are incomplete or invalid.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// A request is already pending for this controller.
    #[error("an analysis request is already in progress")]
    InFlight,
}

/// Failure to issue a preview URI for a staged image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not create image preview: {0}")]
pub struct PreviewError(pub String);

/// Why a file could not be staged into a slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Preview(#[from] PreviewError),
}
