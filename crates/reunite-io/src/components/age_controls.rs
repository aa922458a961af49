//! Target age and direction controls for the age transform workbench.

use dioxus::prelude::*;
use reunite_analysis::{AgeSettings, Direction, TargetAge};

const DIRECTIONS: [Direction; 2] = [Direction::Progression, Direction::Regression];

/// Props for the [`AgeControls`] component.
#[derive(Props, Clone, PartialEq)]
pub struct AgeControlsProps {
    /// Current settings.
    settings: AgeSettings,
    /// Called with the slider position; the controller range-checks it.
    on_age: EventHandler<u32>,
    on_direction: EventHandler<Direction>,
}

/// Direction select and target age slider.
#[component]
pub fn AgeControls(props: AgeControlsProps) -> Element {
    let age = props.settings.target_age.get();
    let selected = props.settings.direction.as_str();
    let (min_age, max_age) = (TargetAge::MIN, TargetAge::MAX);

    rsx! {
        div { class: "space-y-4",
            div { class: "flex flex-col gap-1",
                label { r#for: "age-direction",
                    class: "text-sm text-[var(--text-heading)] font-medium",
                    "Transformation Type"
                }
                select {
                    id: "age-direction",
                    class: "px-2 py-1 rounded border border-[var(--border)] bg-[var(--surface)]
                            text-[var(--text)] text-sm",
                    value: "{selected}",
                    onchange: move |e| {
                        match DIRECTIONS.iter().find(|d| d.as_str() == e.value()) {
                            Some(direction) => props.on_direction.call(*direction),
                            None => web_sys::console::warn_1(
                                &format!("unknown direction {:?}", e.value()).into(),
                            ),
                        }
                    },

                    for direction in DIRECTIONS {
                        option {
                            value: direction.as_str(),
                            selected: direction.as_str() == selected,
                            {direction.label()}
                        }
                    }
                }
            }

            div { class: "flex flex-col gap-1",
                div { class: "flex justify-between text-sm",
                    label { r#for: "target-age",
                        class: "text-[var(--text-heading)] font-medium",
                        "Target Age"
                    }
                    span { class: "text-[var(--text-secondary)] tabular-nums", "{age} years" }
                }
                input {
                    r#type: "range",
                    id: "target-age",
                    min: "{min_age}",
                    max: "{max_age}",
                    step: "1",
                    value: "{age}",
                    class: "w-full accent-[var(--btn-primary)]",
                    oninput: move |e| {
                        match e.value().parse::<u32>() {
                            Ok(v) => props.on_age.call(v),
                            Err(err) => {
                                web_sys::console::warn_1(
                                    &format!("slider parse failure: {err:?} from {:?}", e.value())
                                        .into(),
                                );
                            }
                        }
                    },
                }
            }
        }
    }
}
