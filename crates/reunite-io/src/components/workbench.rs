//! One analysis workbench: staging zones, parameters, submit, and the
//! comparison panel, driven by an [`AnalysisController`].

use std::rc::Rc;

use dioxus::core::Task;
use dioxus::prelude::*;
use reunite_analysis::{
    AnalysisController, AnalysisService, ComparisonView, Completion, Direction, FileCandidate,
    IntakeSource, RequestKind, Slot, dispatch,
};

use crate::blob::BlobUrls;
use crate::components::{AgeControls, ComparisonPanel, ImageDropZone};

/// Label of the submit button for `kind`.
const fn submit_label(kind: RequestKind, busy: bool) -> &'static str {
    match (kind, busy) {
        (_, true) => "Processing...",
        (RequestKind::AgeTransform, false) => "Generate Transformation",
        (RequestKind::FacialMatch, false) => "Compare Faces",
    }
}

/// Workbench for one kind of analysis.
///
/// Expects an `Rc<dyn AnalysisService>` in context. The request in
/// flight is tied to this component: selecting a new image, resetting,
/// or unmounting abandons it, and its answer is discarded if it still
/// arrives.
#[allow(clippy::too_many_lines)]
#[component]
pub fn AnalysisWorkbench(kind: RequestKind) -> Element {
    let service = use_context::<Rc<dyn AnalysisService>>();
    let mut controller = use_signal(|| AnalysisController::new(kind, Rc::new(BlobUrls)));
    let mut in_flight = use_signal(|| Option::<Task>::None);
    let mut slot_errors = use_signal(|| [Option::<String>::None, None]);
    let mut submit_error = use_signal(|| Option::<String>::None);

    // Previews are revoked when the staged images are released; the
    // scope's tasks are cancelled by the runtime.
    use_drop(move || {
        if let Ok(mut controller) = controller.try_write() {
            controller.release();
        }
    });

    let mut abandon_in_flight = move || {
        if let Some(task) = in_flight.take() {
            task.cancel();
        }
    };

    let mut on_file = move |slot: Slot, (candidate, source): (FileCandidate, IntakeSource)| {
        let outcome = controller.write().select(slot, source, candidate);
        match outcome {
            Ok(()) => {
                abandon_in_flight();
                slot_errors.write()[slot.index()] = None;
                submit_error.set(None);
            }
            Err(e) => slot_errors.write()[slot.index()] = Some(e.to_string()),
        }
    };

    let mut on_reject = move |slot: Slot, message: String| {
        slot_errors.write()[slot.index()] = Some(message);
    };

    let on_submit = move |_| {
        let submission = match controller.write().submit() {
            Ok(submission) => submission,
            Err(e) => {
                submit_error.set(Some(e.to_string()));
                return;
            }
        };
        submit_error.set(None);
        let service = Rc::clone(&service);
        let task = spawn(async move {
            let outcome = dispatch(service.as_ref(), submission.request()).await;
            if controller.write().complete(submission.sequence(), outcome) == Completion::Applied {
                in_flight.set(None);
            }
        });
        in_flight.set(Some(task));
    };

    let on_reset = move |_| {
        abandon_in_flight();
        controller.write().reset();
        submit_error.set(None);
    };

    let on_age = move |age: u32| {
        if let Err(e) = controller.write().set_target_age(age) {
            tracing::debug!(error = %e, "ignoring target age");
        }
    };

    let on_direction = move |direction: Direction| {
        controller.write().set_direction(direction);
    };

    let ctl = controller.read();
    let view = ComparisonView::project(&ctl);
    let busy = view.is_busy();
    let can_submit = ctl.inputs_ready() && !busy;
    let settings = ctl.age_settings();
    let slots: Vec<(Slot, usize, Option<String>, Option<String>)> = kind
        .required_slots()
        .iter()
        .map(|slot| {
            let asset = ctl.asset(*slot);
            (
                *slot,
                slot.index(),
                asset.map(|a| a.preview_uri().to_owned()),
                asset.map(|a| a.source().name().to_owned()),
            )
        })
        .collect();
    let before = ctl.asset(Slot::Primary).map(|a| a.preview_uri().to_owned());
    let previous = ctl.last_result().cloned();
    drop(ctl);
    let multi_slot = slots.len() > 1;

    let errors = slot_errors();
    let submit_class = if can_submit {
        "px-4 py-2 bg-[var(--btn-primary)] hover:bg-[var(--btn-primary-hover)] rounded text-white font-medium transition-colors cursor-pointer"
    } else {
        "px-4 py-2 bg-[var(--btn-disabled)] rounded text-[var(--text-disabled)] cursor-not-allowed"
    };
    let secondary_class = "px-4 py-2 rounded border border-[var(--border)] text-[var(--text)] hover:bg-[var(--surface-active)] transition-colors cursor-pointer";

    rsx! {
        section { class: "space-y-6",
            h2 { class: "text-xl font-semibold text-[var(--text-heading)]", {kind.title()} }

            div { class: "grid grid-cols-1 lg:grid-cols-2 gap-6",
                div { class: "space-y-4",
                    div { class: if multi_slot { "grid grid-cols-1 md:grid-cols-2 gap-4" } else { "" },
                        for (slot, index, preview, file_name) in slots {
                            ImageDropZone {
                                key: "{index}",
                                label: kind.slot_label(slot).to_owned(),
                                preview,
                                file_name,
                                error: errors[index].clone(),
                                on_file: move |picked| on_file(slot, picked),
                                on_reject: move |message| on_reject(slot, message),
                            }
                        }
                    }

                    if kind == RequestKind::AgeTransform {
                        AgeControls { settings, on_age, on_direction }
                    }

                    if let Some(ref err) = submit_error() {
                        p { class: "text-[var(--text-error)] text-sm", "{err}" }
                    }

                    div { class: "flex flex-wrap gap-2",
                        button {
                            class: submit_class,
                            disabled: !can_submit,
                            onclick: on_submit,
                            {submit_label(kind, busy)}
                        }
                        if !matches!(view, ComparisonView::NoInput) {
                            button { class: secondary_class, onclick: on_reset, "Reset" }
                        }
                    }
                }

                div { class: "bg-[var(--surface)] rounded-lg p-4",
                    ComparisonPanel { kind, view: view.clone(), before, previous }
                }
            }
        }
    }
}
