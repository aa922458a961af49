//! Before/after comparison of an analysis result.

use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdDownload, LdShare2};
use reunite_analysis::{
    AnalysisResult, ComparisonView, Dimensions, MatchPoint, RequestKind, ResultImage,
    ResultOrigin, build_download_payload, share_text,
};

use crate::analytics::{self, ResultAction};
use crate::blob;
use crate::clipboard;
use crate::download;

/// Radius of a landmark marker, as a fraction of the image width.
const MARKER_RADIUS_FRACTION: f64 = 0.015;

/// Props for the [`ComparisonPanel`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ComparisonPanelProps {
    kind: RequestKind,
    view: ComparisonView,
    /// Preview URI of the "before" image (photo or reference image).
    before: Option<String>,
    /// Earlier successful result, kept visible below a failure.
    previous: Option<Rc<AnalysisResult>>,
}

/// Shows the state of the workbench's request and, once a result is
/// available, the before and after images side by side with the
/// download and share actions.
#[component]
pub fn ComparisonPanel(props: ComparisonPanelProps) -> Element {
    let hint = match props.kind {
        RequestKind::AgeTransform => "Choose a target age, then start the transformation.",
        RequestKind::FacialMatch => "Add both images, then compare faces.",
    };

    match props.view {
        ComparisonView::NoInput => rsx! {
            p { class: "text-[var(--text-secondary)] text-center py-12",
                "Upload an image to get started."
            }
        },
        ComparisonView::AwaitingParameters => rsx! {
            p { class: "text-[var(--text-secondary)] text-center py-12", "{hint}" }
        },
        ComparisonView::Processing => rsx! {
            div { class: "flex flex-col items-center gap-3 py-12",
                div { class: "w-8 h-8 border-4 border-[var(--border-muted)] border-t-[var(--btn-primary)] rounded-full animate-spin" }
                p { class: "text-[var(--text-secondary)]", "Processing..." }
            }
        },
        ComparisonView::Error(message) => rsx! {
            div { class: "space-y-4",
                div { class: "bg-[var(--error-bg)] border border-[var(--error-border)] rounded p-3",
                    p { class: "text-[var(--text-error)] text-sm", "{message}" }
                }
                if let Some(result) = props.previous {
                    ResultComparison { result, before: props.before }
                }
            }
        },
        ComparisonView::ReadyForComparison(result) => rsx! {
            ResultComparison { result, before: props.before }
        },
    }
}

#[derive(Props, Clone)]
struct ResultComparisonProps {
    result: Rc<AnalysisResult>,
    before: Option<String>,
}

impl PartialEq for ResultComparisonProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.result, &other.result) && self.before == other.before
    }
}

#[component]
fn ResultComparison(props: ResultComparisonProps) -> Element {
    let mut action_error = use_signal(|| Option::<String>::None);
    let mut share_notice = use_signal(|| Option::<&'static str>::None);

    // Blob URL for an inline result, keyed by the result it was made for.
    let mut inline_url: Signal<Option<(Rc<AnalysisResult>, String)>> = use_signal(|| None);
    use_drop(move || {
        if let Some((_, ref url)) = *inline_url.peek() {
            blob::revoke_blob_url(url);
        }
    });

    let after_src = match props.result.result_asset() {
        ResultImage::Remote { url } => Some(url.clone()),
        ResultImage::Inline { bytes, mime } => {
            let cached = inline_url
                .peek()
                .as_ref()
                .filter(|(for_result, _)| Rc::ptr_eq(for_result, &props.result))
                .map(|(_, url)| url.clone());
            if cached.is_some() {
                cached
            } else {
                if let Some((_, ref old)) = inline_url.take() {
                    blob::revoke_blob_url(old);
                }
                match blob::bytes_to_blob_url(bytes, mime.as_str()) {
                    Ok(url) => {
                        inline_url.set(Some((Rc::clone(&props.result), url.clone())));
                        Some(url)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "could not display analysis result");
                        None
                    }
                }
            }
        }
    };

    let kind = props.result.kind();
    let metric = props
        .result
        .summary_metric()
        .map(|m| (m.percent_label(), m.confidence.label()));
    let (before_title, after_title) = match props.result.origin() {
        ResultOrigin::AgeTransform { .. } => ("Original", "Transformed"),
        ResultOrigin::FacialMatch => ("Reference", "Target"),
    };
    let caption = match props.result.origin() {
        ResultOrigin::AgeTransform {
            target_age,
            direction,
        } => Some(format!("{} to age {target_age}", direction.label())),
        ResultOrigin::FacialMatch => None,
    };

    let download_click = {
        let result = Rc::clone(&props.result);
        move |_| {
            let payload = build_download_payload(&result);
            match download::trigger_download(&payload) {
                Ok(()) => {
                    action_error.set(None);
                    analytics::track_result_action(ResultAction::Download, kind);
                }
                Err(e) => action_error.set(Some(format!("Download failed: {e}"))),
            }
        }
    };

    let share_click = {
        let result = Rc::clone(&props.result);
        move |_| {
            let text = share_text(&result);
            spawn(async move {
                match clipboard::write_text(&text).await {
                    Ok(()) => {
                        action_error.set(None);
                        share_notice.set(Some("Summary copied to clipboard"));
                        analytics::track_result_action(ResultAction::Share, kind);
                    }
                    Err(e) => {
                        share_notice.set(None);
                        action_error.set(Some(format!("Share failed: {e}")));
                    }
                }
            });
        }
    };

    let button_class = "inline-flex items-center gap-2 px-4 py-2 bg-[var(--btn-primary)] hover:bg-[var(--btn-primary-hover)] rounded text-white font-medium transition-colors cursor-pointer";

    rsx! {
        div { class: "space-y-4",
            if let Some((percent, confidence)) = metric {
                div { class: "rounded-lg p-4 bg-[var(--surface-active)] text-center",
                    p { class: "text-2xl font-semibold text-[var(--text-heading)] tabular-nums",
                        "Similarity Score: {percent}"
                    }
                    p { class: "text-[var(--text-secondary)]", "{confidence} confidence" }
                }
            }

            div { class: "grid grid-cols-1 md:grid-cols-2 gap-4",
                figure { class: "space-y-2",
                    figcaption { class: "text-sm font-medium text-[var(--text-heading)]", "{before_title}" }
                    if let Some(ref uri) = props.before {
                        img {
                            src: "{uri}",
                            alt: "{before_title} image",
                            class: "w-full h-auto max-h-[60vh] rounded object-contain bg-[var(--preview-bg)]",
                        }
                    }
                }
                figure { class: "space-y-2",
                    figcaption { class: "text-sm font-medium text-[var(--text-heading)]", "{after_title}" }
                    if let Some(ref src) = after_src {
                        div { class: "relative",
                            img {
                                src: "{src}",
                                alt: "{after_title} image",
                                class: "w-full h-auto max-h-[60vh] rounded object-contain bg-[var(--preview-bg)]",
                            }
                            if let Some(dimensions) = props.result.result_dimensions() {
                                if !props.result.annotations().is_empty() {
                                    {landmark_overlay(props.result.annotations(), dimensions)}
                                }
                            }
                        }
                    } else {
                        p { class: "text-[var(--text-error)] text-sm", "The result image could not be displayed." }
                    }
                    if let Some(ref caption) = caption {
                        p { class: "text-sm text-[var(--text-secondary)]", "{caption}" }
                    }
                }
            }

            if !props.result.annotations().is_empty() {
                ul { class: "flex flex-wrap gap-2 text-sm",
                    for point in props.result.annotations() {
                        li { class: "px-2 py-1 rounded bg-[var(--surface)] text-[var(--text)]",
                            "{point.label}"
                        }
                    }
                }
            }

            if let Some(err) = action_error() {
                p { class: "text-[var(--text-error)] text-sm", "{err}" }
            }
            if let Some(notice) = share_notice() {
                p { class: "text-[var(--text-success)] text-sm", "{notice}" }
            }

            div { class: "flex flex-wrap gap-2",
                button { class: button_class, onclick: download_click,
                    Icon { icon: LdDownload, width: 16, height: 16 }
                    "Download"
                }
                button { class: button_class, onclick: share_click,
                    Icon { icon: LdShare2, width: 16, height: 16 }
                    "Share"
                }
            }
        }
    }
}

/// SVG markers for matched landmarks, scaled to the image through its
/// pixel dimensions.
fn landmark_overlay(points: &[MatchPoint], dimensions: Dimensions) -> Element {
    let view_box = format!("0 0 {} {}", dimensions.width, dimensions.height);
    let radius = f64::from(dimensions.width) * MARKER_RADIUS_FRACTION;
    let font_size = radius * 2.0;
    let stroke = radius / 3.0;
    let markers: Vec<(f64, f64, f64, String)> = points
        .iter()
        .map(|p| (p.x, p.y, p.x + radius * 1.5, p.label.clone()))
        .collect();

    rsx! {
        svg {
            class: "absolute inset-0 w-full h-full pointer-events-none",
            view_box: "{view_box}",
            preserve_aspect_ratio: "xMidYMid meet",
            for (x, y, label_x, label) in markers {
                g {
                    circle {
                        cx: "{x}",
                        cy: "{y}",
                        r: "{radius}",
                        fill: "none",
                        stroke: "var(--marker)",
                        stroke_width: "{stroke}",
                    }
                    text {
                        x: "{label_x}",
                        y: "{y}",
                        font_size: "{font_size}",
                        fill: "var(--marker)",
                        "{label}"
                    }
                }
            }
        }
    }
}
