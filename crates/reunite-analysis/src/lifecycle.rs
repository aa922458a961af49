//! Request lifecycle controller.
//!
//! One [`AnalysisController`] backs one workbench. It owns the staged
//! images, the age settings, and the `Idle -> Pending -> {Succeeded,
//! Failed}` state machine.
//!
//! Submission is split in two so the controller never has to be held
//! across an `.await`:
//!
//! 1. [`submit`](AnalysisController::submit) validates, moves to
//!    `Pending`, and hands back a [`Submission`].
//! 2. The caller awaits [`dispatch`](crate::dispatch) on the
//!    submission's request, then reports the outcome through
//!    [`complete`](AnalysisController::complete).
//!
//! Each submission carries a sequence number. A completion whose
//! sequence is not the one currently pending (because the user reset,
//! reselected an image, or tore the workbench down) is discarded.

use std::rc::Rc;

use web_time::Instant;

use crate::error::{IntakeError, ServiceError, SubmitError, ValidationError};
use crate::intake::{FileCandidate, IntakePolicy, IntakeSource, MediaAsset, PreviewUrls, stage_asset};
use crate::present::{AnalysisResult, normalize};
use crate::request::{AnalysisParameters, AnalysisRequest};
use crate::service::ServiceResponse;
use crate::types::{Direction, RequestKind, Slot, TargetAge};

/// Lifecycle of the controller's current request.
///
/// The result lives inside `Succeeded`, so a succeeded state without a
/// result cannot be observed.
#[derive(Debug, Clone)]
pub enum LifecycleState {
    Idle,
    Pending {
        request: AnalysisRequest,
        started: Instant,
    },
    Succeeded(Rc<AnalysisResult>),
    Failed {
        /// User-facing explanation.
        message: String,
    },
}

/// Payload-free view of [`LifecycleState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStatus {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl LifecycleState {
    #[must_use]
    pub const fn status(&self) -> LifecycleStatus {
        match self {
            Self::Idle => LifecycleStatus::Idle,
            Self::Pending { .. } => LifecycleStatus::Pending,
            Self::Succeeded(_) => LifecycleStatus::Succeeded,
            Self::Failed { .. } => LifecycleStatus::Failed,
        }
    }
}

/// An accepted submission, to be dispatched by the caller.
#[derive(Debug, Clone)]
pub struct Submission {
    request: AnalysisRequest,
}

impl Submission {
    #[must_use]
    pub const fn request(&self) -> &AnalysisRequest {
        &self.request
    }

    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.request.sequence()
    }
}

/// What [`complete`](AnalysisController::complete) did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The outcome became the controller's terminal state.
    Applied,
    /// The outcome belonged to a superseded request and was dropped.
    Stale,
}

/// User-adjustable age transform parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgeSettings {
    pub target_age: TargetAge,
    pub direction: Direction,
}

/// State machine for one media analysis workbench.
pub struct AnalysisController {
    kind: RequestKind,
    policy: IntakePolicy,
    urls: Rc<dyn PreviewUrls>,
    slots: [Option<MediaAsset>; 2],
    age: AgeSettings,
    state: LifecycleState,
    /// Most recent successful result. Survives later failed requests;
    /// cleared only by a new selection, reset, or release.
    last_result: Option<Rc<AnalysisResult>>,
    last_sequence: u64,
}

impl AnalysisController {
    /// Create an idle controller with the default intake policy.
    #[must_use]
    pub fn new(kind: RequestKind, urls: Rc<dyn PreviewUrls>) -> Self {
        Self::with_policy(kind, IntakePolicy::default(), urls)
    }

    #[must_use]
    pub fn with_policy(kind: RequestKind, policy: IntakePolicy, urls: Rc<dyn PreviewUrls>) -> Self {
        Self {
            kind,
            policy,
            urls,
            slots: [None, None],
            age: AgeSettings::default(),
            state: LifecycleState::Idle,
            last_result: None,
            last_sequence: 0,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    #[must_use]
    pub const fn state(&self) -> &LifecycleState {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> LifecycleStatus {
        self.state.status()
    }

    /// The current result, present only in the `Succeeded` state.
    #[must_use]
    pub const fn result(&self) -> Option<&Rc<AnalysisResult>> {
        match &self.state {
            LifecycleState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    /// The most recent successful result, even while a later request is
    /// pending or after it failed.
    ///
    /// Equal to [`result`](Self::result) in the `Succeeded` state.
    #[must_use]
    pub const fn last_result(&self) -> Option<&Rc<AnalysisResult>> {
        self.last_result.as_ref()
    }

    #[must_use]
    pub const fn asset(&self, slot: Slot) -> Option<&MediaAsset> {
        self.slots[slot.index()].as_ref()
    }

    /// Whether any slot holds an image.
    #[must_use]
    pub fn has_any_asset(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    /// Whether every slot this kind of request needs is filled.
    #[must_use]
    pub fn inputs_ready(&self) -> bool {
        self.kind
            .required_slots()
            .iter()
            .all(|slot| self.asset(*slot).is_some())
    }

    #[must_use]
    pub const fn age_settings(&self) -> AgeSettings {
        self.age
    }

    /// Set the target age for the next submission.
    ///
    /// Does not affect a pending request or the current result.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AgeOutOfRange`] outside `1..=100`; the
    /// previous value is kept.
    pub fn set_target_age(&mut self, age: u32) -> Result<(), ValidationError> {
        self.age.target_age = TargetAge::new(age)?;
        Ok(())
    }

    pub const fn set_direction(&mut self, direction: Direction) {
        self.age.direction = direction;
    }

    /// Stage a file into `slot`.
    ///
    /// On success the previous image in the slot is released (revoking
    /// its preview URI), any result is discarded, and a pending request
    /// is abandoned; the controller returns to `Idle`. On failure
    /// nothing changes.
    ///
    /// # Errors
    ///
    /// Returns the [`IntakeError`] from validation or preview creation.
    pub fn select(
        &mut self,
        slot: Slot,
        source: IntakeSource,
        candidate: FileCandidate,
    ) -> Result<(), IntakeError> {
        let asset = stage_asset(&self.policy, &self.urls, source, candidate)?;
        self.slots[slot.index()] = Some(asset);
        self.return_to_idle("new selection");
        self.last_result = None;
        Ok(())
    }

    /// Return to `Idle`, abandoning any pending request and discarding
    /// any result. Staged images are kept.
    pub fn reset(&mut self) {
        self.return_to_idle("reset");
        self.last_result = None;
    }

    /// Release every staged image and return to `Idle`.
    ///
    /// Called on teardown; dropping the controller has the same effect.
    pub fn release(&mut self) {
        self.slots = [None, None];
        self.return_to_idle("release");
        self.last_result = None;
    }

    /// Start a request with the currently staged inputs.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::InFlight`] while a request is pending (the
    /// pending request is untouched), and
    /// [`SubmitError::Invalid`]`(`[`ValidationError::MissingInput`]`)`
    /// when a required image is not staged.
    pub fn submit(&mut self) -> Result<Submission, SubmitError> {
        if let LifecycleState::Pending { request, .. } = &self.state {
            tracing::debug!(
                pending = request.sequence(),
                "submission rejected: request already in flight"
            );
            return Err(SubmitError::InFlight);
        }

        let parameters = self.parameters()?;
        self.last_sequence += 1;
        let request = AnalysisRequest::new(self.last_sequence, parameters);
        tracing::info!(
            sequence = request.sequence(),
            kind = %self.kind,
            "submitting analysis request"
        );
        self.state = LifecycleState::Pending {
            request: request.clone(),
            started: Instant::now(),
        };
        Ok(Submission { request })
    }

    /// Apply the outcome of the request numbered `sequence`.
    ///
    /// Outcomes for anything but the currently pending request are
    /// dropped. A service answer that fails normalization fails the
    /// request; no partial result is kept.
    pub fn complete(
        &mut self,
        sequence: u64,
        outcome: Result<ServiceResponse, ServiceError>,
    ) -> Completion {
        let LifecycleState::Pending { request, started } = &self.state else {
            tracing::debug!(sequence, "discarding completion: nothing pending");
            return Completion::Stale;
        };
        if request.sequence() != sequence {
            tracing::debug!(
                sequence,
                pending = request.sequence(),
                "discarding completion for superseded request"
            );
            return Completion::Stale;
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let next = match outcome.map(|response| normalize(response, request)) {
            Ok(Ok(result)) => {
                tracing::info!(sequence, kind = %self.kind, elapsed_ms, "analysis succeeded");
                let result = Rc::new(result);
                self.last_result = Some(Rc::clone(&result));
                LifecycleState::Succeeded(result)
            }
            Ok(Err(invalid)) => {
                tracing::warn!(sequence, kind = %self.kind, elapsed_ms, error = %invalid, "analysis response rejected");
                LifecycleState::Failed {
                    message: "The analysis service returned an unexpected result. Please try again."
                        .into(),
                }
            }
            Err(err) => {
                tracing::warn!(sequence, kind = %self.kind, elapsed_ms, error = %err, "analysis failed");
                LifecycleState::Failed {
                    message: err.user_message(),
                }
            }
        };
        self.state = next;
        Completion::Applied
    }

    fn parameters(&self) -> Result<AnalysisParameters, ValidationError> {
        let staged = |slot: Slot| {
            self.asset(slot)
                .map(|asset| asset.source().clone())
                .ok_or(ValidationError::MissingInput)
        };
        Ok(match self.kind {
            RequestKind::AgeTransform => AnalysisParameters::AgeTransform {
                subject: staged(Slot::Primary)?,
                target_age: self.age.target_age,
                direction: self.age.direction,
            },
            RequestKind::FacialMatch => AnalysisParameters::FacialMatch {
                reference: staged(Slot::Primary)?,
                target: staged(Slot::Secondary)?,
            },
        })
    }

    fn return_to_idle(&mut self, reason: &'static str) {
        if let LifecycleState::Pending { request, .. } = &self.state {
            tracing::debug!(sequence = request.sequence(), reason, "abandoning pending request");
        }
        self.state = LifecycleState::Idle;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::intake::tests::{CountingUrls, candidate};
    use crate::service::{AgeTransformResponse, FacialMatchResponse, ResultImage};

    fn controller(kind: RequestKind) -> (Rc<CountingUrls>, AnalysisController) {
        let (counting, urls) = CountingUrls::shared();
        (counting, AnalysisController::new(kind, urls))
    }

    fn png(name: &str) -> FileCandidate {
        candidate(name, "image/png", 64)
    }

    fn aged() -> Result<ServiceResponse, ServiceError> {
        Ok(ServiceResponse::AgeTransform(AgeTransformResponse {
            image: Some(ResultImage::Remote {
                url: "https://cdn.example/aged.jpg".into(),
            }),
        }))
    }

    #[test]
    fn submit_without_input_is_rejected() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        assert_eq!(
            ctl.submit().unwrap_err(),
            SubmitError::Invalid(ValidationError::MissingInput)
        );
        assert_eq!(ctl.status(), LifecycleStatus::Idle);
    }

    #[test]
    fn facial_match_needs_both_slots() {
        let (_, mut ctl) = controller(RequestKind::FacialMatch);
        ctl.select(Slot::Secondary, IntakeSource::DragAndDrop, png("target.png"))
            .unwrap();
        assert!(!ctl.inputs_ready());
        assert_eq!(
            ctl.submit().unwrap_err(),
            SubmitError::Invalid(ValidationError::MissingInput)
        );
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("reference.png"))
            .unwrap();
        assert!(ctl.inputs_ready());
        assert!(ctl.submit().is_ok());
    }

    #[test]
    fn submit_while_pending_leaves_request_untouched() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let first = ctl.submit().unwrap();
        assert_eq!(ctl.submit().unwrap_err(), SubmitError::InFlight);
        let LifecycleState::Pending { request, .. } = ctl.state() else {
            unreachable!("still pending");
        };
        assert_eq!(request, first.request());
    }

    #[test]
    fn rejected_selection_keeps_staged_asset() {
        let (counting, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let before = ctl.asset(Slot::Primary).unwrap().preview_uri().to_owned();

        let err = ctl
            .select(
                Slot::Primary,
                IntakeSource::FilePicker,
                candidate("a.gif", "image/gif", 8),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::Invalid(ValidationError::UnsupportedType { .. })
        ));
        assert_eq!(ctl.asset(Slot::Primary).unwrap().preview_uri(), before);
        assert!(counting.revoked.borrow().is_empty());
    }

    #[test]
    fn reselection_revokes_each_previous_uri_once() {
        let (counting, mut ctl) = controller(RequestKind::AgeTransform);
        for i in 0..5 {
            ctl.select(Slot::Primary, IntakeSource::FilePicker, png(&format!("{i}.png")))
                .unwrap();
        }
        let created = counting.created.borrow().clone();
        assert_eq!(created.len(), 5);
        assert_eq!(*counting.revoked.borrow(), created[..4].to_vec());
        assert_eq!(counting.live(), 1);

        drop(ctl);
        assert_eq!(*counting.revoked.borrow(), created);
    }

    #[test]
    fn release_revokes_everything_once() {
        let (counting, mut ctl) = controller(RequestKind::FacialMatch);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("r.png"))
            .unwrap();
        ctl.select(Slot::Secondary, IntakeSource::FilePicker, png("t.png"))
            .unwrap();
        ctl.release();
        assert_eq!(counting.live(), 0);
        assert!(!ctl.has_any_asset());
        drop(ctl);
        assert_eq!(counting.revoked.borrow().len(), 2);
    }

    #[test]
    fn new_selection_clears_result() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let submission = ctl.submit().unwrap();
        assert_eq!(ctl.complete(submission.sequence(), aged()), Completion::Applied);
        assert!(ctl.result().is_some());

        ctl.select(Slot::Primary, IntakeSource::DragAndDrop, png("b.png"))
            .unwrap();
        assert_eq!(ctl.status(), LifecycleStatus::Idle);
        assert!(ctl.result().is_none());
        assert!(ctl.last_result().is_none());
    }

    #[test]
    fn failed_resubmission_keeps_previous_result() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let first = ctl.submit().unwrap();
        ctl.complete(first.sequence(), aged());
        let succeeded = Rc::clone(ctl.result().unwrap());

        ctl.set_target_age(60).unwrap();
        let second = ctl.submit().unwrap();
        assert_eq!(ctl.status(), LifecycleStatus::Pending);
        assert!(Rc::ptr_eq(ctl.last_result().unwrap(), &succeeded));

        assert_eq!(
            ctl.complete(second.sequence(), Err(ServiceError::Timeout)),
            Completion::Applied
        );
        assert_eq!(ctl.status(), LifecycleStatus::Failed);
        assert!(ctl.result().is_none());
        assert!(Rc::ptr_eq(ctl.last_result().unwrap(), &succeeded));
    }

    #[test]
    fn reset_and_release_drop_previous_result() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let submission = ctl.submit().unwrap();
        ctl.complete(submission.sequence(), aged());
        ctl.reset();
        assert!(ctl.last_result().is_none());

        let submission = ctl.submit().unwrap();
        ctl.complete(submission.sequence(), aged());
        assert!(ctl.last_result().is_some());
        ctl.release();
        assert!(ctl.last_result().is_none());
    }

    #[test]
    fn response_after_reselection_is_discarded() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let stale = ctl.submit().unwrap();
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("b.png"))
            .unwrap();
        let fresh = ctl.submit().unwrap();

        assert_eq!(ctl.complete(stale.sequence(), aged()), Completion::Stale);
        assert_eq!(ctl.status(), LifecycleStatus::Pending);
        assert_eq!(ctl.complete(fresh.sequence(), aged()), Completion::Applied);
        assert_eq!(ctl.status(), LifecycleStatus::Succeeded);
    }

    #[test]
    fn response_after_reset_is_discarded() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let submission = ctl.submit().unwrap();
        ctl.reset();
        assert_eq!(ctl.complete(submission.sequence(), aged()), Completion::Stale);
        assert_eq!(ctl.status(), LifecycleStatus::Idle);
    }

    #[test]
    fn terminal_state_cannot_be_completed_again() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let submission = ctl.submit().unwrap();
        ctl.complete(submission.sequence(), Err(ServiceError::Timeout));
        assert_eq!(ctl.complete(submission.sequence(), aged()), Completion::Stale);
        assert_eq!(ctl.status(), LifecycleStatus::Failed);
    }

    #[test]
    fn malformed_response_fails_without_result() {
        let (_, mut ctl) = controller(RequestKind::FacialMatch);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("r.png"))
            .unwrap();
        ctl.select(Slot::Secondary, IntakeSource::FilePicker, png("t.png"))
            .unwrap();
        let submission = ctl.submit().unwrap();
        let outcome = Ok(ServiceResponse::FacialMatch(FacialMatchResponse {
            similarity: Some(1.5),
            match_points: Vec::new(),
        }));
        assert_eq!(ctl.complete(submission.sequence(), outcome), Completion::Applied);
        assert_eq!(ctl.status(), LifecycleStatus::Failed);
        assert!(ctl.result().is_none());
    }

    #[test]
    fn sequence_numbers_increase() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let first = ctl.submit().unwrap();
        ctl.complete(first.sequence(), Err(ServiceError::Network("down".into())));
        let second = ctl.submit().unwrap();
        assert!(second.sequence() > first.sequence());
    }

    #[test]
    fn age_settings_are_validated() {
        let (_, mut ctl) = controller(RequestKind::AgeTransform);
        ctl.set_target_age(40).unwrap();
        assert_eq!(
            ctl.set_target_age(0),
            Err(ValidationError::AgeOutOfRange(0))
        );
        assert_eq!(ctl.age_settings().target_age.get(), 40);
        ctl.set_direction(Direction::Regression);
        ctl.select(Slot::Primary, IntakeSource::FilePicker, png("a.png"))
            .unwrap();
        let submission = ctl.submit().unwrap();
        assert!(matches!(
            submission.request().parameters(),
            AnalysisParameters::AgeTransform {
                direction: Direction::Regression,
                ..
            }
        ));
    }
}
