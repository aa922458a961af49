//! Image drop zone with drag-and-drop and file picker.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;
use reunite_analysis::{FileCandidate, IntakePolicy, IntakeSource};

/// MIME type implied by a filename's extension, for browsers that
/// report no content type (common for drag-and-drop on some platforms).
fn mime_from_name(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "",
    }
}

/// Props for the [`ImageDropZone`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ImageDropZoneProps {
    /// Heading above the zone, e.g. "Reference Image".
    label: String,
    /// Preview URI of the staged image, if any.
    preview: Option<String>,
    /// Filename of the staged image, if any.
    file_name: Option<String>,
    /// Rejection message for the last file offered to this zone.
    error: Option<String>,
    /// Called with a file that passed the type and size checks.
    on_file: EventHandler<(FileCandidate, IntakeSource)>,
    /// Called with a user-facing message when a file is rejected before
    /// its bytes are read.
    on_reject: EventHandler<String>,
}

/// A drag-and-drop zone with a file picker button.
///
/// Accepts JPEG and PNG images up to 10 MB. The type and size are
/// checked against the file metadata before the bytes are read, so an
/// oversized file is never loaded into memory.
#[component]
pub fn ImageDropZone(props: ImageDropZoneProps) -> Element {
    let mut dragging = use_signal(|| false);

    // Shared by the picker and drop paths so both apply the same checks.
    let process_files = move |files: Vec<FileData>, source: IntakeSource| async move {
        let Some(file) = files.first() else {
            return;
        };
        let policy = IntakePolicy::default();
        let name = file.name();
        let mime = file
            .content_type()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| mime_from_name(&name).to_owned());
        if let Err(e) = policy.validate(&mime, file.size()) {
            props.on_reject.call(e.to_string());
            return;
        }
        match file.read_bytes().await {
            Ok(bytes) => props.on_file.call((
                FileCandidate {
                    name,
                    mime,
                    bytes: bytes.to_vec(),
                },
                source,
            )),
            Err(e) => props.on_reject.call(format!("Failed to read file: {e}")),
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        process_files(evt.files(), IntakeSource::FilePicker).await;
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        process_files(evt.files(), IntakeSource::DragAndDrop).await;
    };

    let border_class = if dragging() {
        "border-[var(--border-accent)] bg-[var(--surface-active)]"
    } else {
        "border-[var(--border-muted)] bg-[var(--surface)]"
    };

    rsx! {
        div { class: "space-y-2",
            h3 { class: "text-lg font-semibold text-[var(--text-heading)]", "{props.label}" }

            div {
                class: "border-2 border-dashed rounded-lg p-6 text-center transition-colors {border_class}",
                ondragover: move |evt| {
                    evt.prevent_default();
                    dragging.set(true);
                },
                ondragleave: move |_| {
                    dragging.set(false);
                },
                ondrop: handle_drop,

                if let Some(ref uri) = props.preview {
                    img {
                        src: "{uri}",
                        alt: "{props.label} preview",
                        class: "mx-auto mb-3 max-h-64 rounded object-contain bg-[var(--preview-bg)]",
                    }
                }

                if let Some(ref name) = props.file_name {
                    p { class: "text-[var(--text-success)] mb-2", "Loaded: {name}" }
                }

                if let Some(ref err) = props.error {
                    p { class: "text-[var(--text-error)] mb-2", "{err}" }
                }

                p { class: "text-[var(--text-secondary)] mb-3",
                    if props.preview.is_some() { "Drop another image here or " } else { "Drop an image here or " }
                }

                label {
                    class: "inline-block px-4 py-2 bg-[var(--btn-primary)] hover:bg-[var(--btn-primary-hover)] rounded cursor-pointer text-white font-medium transition-colors",
                    input {
                        r#type: "file",
                        accept: "image/jpeg,image/png",
                        class: "hidden",
                        onchange: handle_files,
                    }
                    "Choose File"
                }

                p { class: "text-[var(--muted)] text-sm mt-2", "PNG, JPG up to 10MB" }
            }
        }
    }
}
