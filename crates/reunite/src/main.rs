use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdClock, LdUsers};
use reunite_analysis::{AnalysisService, RequestKind};
use reunite_io::{AnalysisWorkbench, ServiceConfig, build_service};

fn main() {
    dioxus::launch(app);
}

/// Service backing both workbenches, falling back to the simulated one
/// when the baked-in configuration is malformed.
fn resolve_service() -> Rc<dyn AnalysisService> {
    let config = ServiceConfig::from_build_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid service configuration; using simulated service");
        ServiceConfig::default()
    });
    build_service(&config)
}

/// Root application component.
///
/// Provides the analysis service to the workbenches and switches
/// between the age transform and facial match tools.
fn app() -> Element {
    use_context_provider(resolve_service);
    let mut active = use_signal(|| RequestKind::AgeTransform);

    let tab_class = |kind: RequestKind| {
        if active() == kind {
            "inline-flex items-center gap-2 px-4 py-2 border-b-2 border-[var(--border-accent)] text-[var(--text-heading)] font-medium"
        } else {
            "inline-flex items-center gap-2 px-4 py-2 border-b-2 border-transparent text-[var(--text-secondary)] hover:text-[var(--text)] cursor-pointer"
        }
    };
    let age_tab = tab_class(RequestKind::AgeTransform);
    let match_tab = tab_class(RequestKind::FacialMatch);

    rsx! {
        // Tailwind CSS utilities, compiled by build.rs via npx @tailwindcss/cli.
        style { dangerous_inner_html: include_str!(env!("TAILWIND_CSS_PATH")) }
        style { dangerous_inner_html: include_str!("../assets/theme.css") }

        div { class: "min-h-screen bg-(--bg) text-(--text) flex flex-col",
            header { class: "px-6 py-4 border-b border-(--border)",
                h1 { class: "text-2xl font-semibold text-[var(--text-heading)]", "Reunite" }
                p { class: "text-(--muted) text-sm",
                    "Age progression and facial matching for missing-person cases"
                }
            }

            nav { class: "px-6 border-b border-(--border) flex gap-2",
                button {
                    class: age_tab,
                    onclick: move |_| active.set(RequestKind::AgeTransform),
                    Icon { icon: LdClock, width: 16, height: 16 }
                    {RequestKind::AgeTransform.title()}
                }
                button {
                    class: match_tab,
                    onclick: move |_| active.set(RequestKind::FacialMatch),
                    Icon { icon: LdUsers, width: 16, height: 16 }
                    {RequestKind::FacialMatch.title()}
                }
            }

            main { class: "flex-1 p-6",
                // Keyed by kind so switching tools tears down the other
                // workbench along with its staged images.
                AnalysisWorkbench { key: "{active()}", kind: active() }
            }
        }
    }
}
