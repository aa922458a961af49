//! Submitted units of work.

use crate::intake::SourceBlob;
use crate::types::{Direction, RequestKind, TargetAge};

/// Kind-specific inputs of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisParameters {
    AgeTransform {
        subject: SourceBlob,
        target_age: TargetAge,
        direction: Direction,
    },
    FacialMatch {
        reference: SourceBlob,
        target: SourceBlob,
    },
}

impl AnalysisParameters {
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::AgeTransform { .. } => RequestKind::AgeTransform,
            Self::FacialMatch { .. } => RequestKind::FacialMatch,
        }
    }
}

/// One immutable submission.
///
/// A retry is a new request with a new sequence number; a request is
/// never re-submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    sequence: u64,
    parameters: AnalysisParameters,
}

impl AnalysisRequest {
    pub(crate) const fn new(sequence: u64, parameters: AnalysisParameters) -> Self {
        Self {
            sequence,
            parameters,
        }
    }

    /// Position of this request in its controller's submission order.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub const fn parameters(&self) -> &AnalysisParameters {
        &self.parameters
    }

    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.parameters.kind()
    }
}
