//! What the comparison area should show, independent of request kind.

use std::rc::Rc;

use crate::lifecycle::{AnalysisController, LifecycleState};
use crate::present::AnalysisResult;

/// Display state of the comparison area.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonView {
    /// Nothing staged yet.
    NoInput,
    /// Images staged; waiting for the user to finish inputs and submit.
    AwaitingParameters,
    /// A request is in flight.
    Processing,
    /// Before/after comparison is available.
    ReadyForComparison(Rc<AnalysisResult>),
    /// The last request failed.
    Error(String),
}

impl ComparisonView {
    /// Project a controller's state onto a display state.
    ///
    /// `ReadyForComparison` carries the result it was derived from, so it
    /// can only be produced from a succeeded lifecycle.
    #[must_use]
    pub fn project(controller: &AnalysisController) -> Self {
        match controller.state() {
            LifecycleState::Pending { .. } => Self::Processing,
            LifecycleState::Succeeded(result) => Self::ReadyForComparison(Rc::clone(result)),
            LifecycleState::Failed { message } => Self::Error(message.clone()),
            LifecycleState::Idle if controller.has_any_asset() => Self::AwaitingParameters,
            LifecycleState::Idle => Self::NoInput,
        }
    }

    /// Whether a request is in flight (the submit control is disabled).
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::intake::IntakeSource;
    use crate::intake::tests::{CountingUrls, candidate};
    use crate::service::{FacialMatchResponse, ServiceResponse};
    use crate::types::{RequestKind, Slot};

    fn facial_controller() -> AnalysisController {
        let (_, urls) = CountingUrls::shared();
        AnalysisController::new(RequestKind::FacialMatch, urls)
    }

    #[test]
    fn empty_controller_has_no_input() {
        assert_eq!(ComparisonView::project(&facial_controller()), ComparisonView::NoInput);
    }

    #[test]
    fn partial_inputs_await_parameters() {
        let mut ctl = facial_controller();
        ctl.select(Slot::Primary, IntakeSource::FilePicker, candidate("r.png", "image/png", 4))
            .unwrap();
        assert_eq!(
            ComparisonView::project(&ctl),
            ComparisonView::AwaitingParameters
        );
    }

    #[test]
    fn walks_through_processing_to_ready() {
        let mut ctl = facial_controller();
        ctl.select(Slot::Primary, IntakeSource::FilePicker, candidate("r.png", "image/png", 4))
            .unwrap();
        ctl.select(Slot::Secondary, IntakeSource::FilePicker, candidate("t.png", "image/png", 4))
            .unwrap();
        let submission = ctl.submit().unwrap();
        let view = ComparisonView::project(&ctl);
        assert_eq!(view, ComparisonView::Processing);
        assert!(view.is_busy());

        ctl.complete(
            submission.sequence(),
            Ok(ServiceResponse::FacialMatch(FacialMatchResponse {
                similarity: Some(0.7),
                match_points: Vec::new(),
            })),
        );
        let ComparisonView::ReadyForComparison(result) = ComparisonView::project(&ctl) else {
            unreachable!("expected a ready comparison");
        };
        assert!(Rc::ptr_eq(&result, ctl.result().unwrap()));
    }

    #[test]
    fn failure_projects_message() {
        let mut ctl = facial_controller();
        ctl.select(Slot::Primary, IntakeSource::FilePicker, candidate("r.png", "image/png", 4))
            .unwrap();
        ctl.select(Slot::Secondary, IntakeSource::FilePicker, candidate("t.png", "image/png", 4))
            .unwrap();
        let submission = ctl.submit().unwrap();
        ctl.complete(submission.sequence(), Err(ServiceError::Timeout));
        assert_eq!(
            ComparisonView::project(&ctl),
            ComparisonView::Error(ServiceError::Timeout.user_message())
        );
    }
}
