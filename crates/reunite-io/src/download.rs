//! File download via a temporary anchor element.
//!
//! Dioxus has no built-in file download API. This module triggers
//! downloads by programmatically clicking a temporary `<a download>`
//! element. Inline results are wrapped in a Blob URL first; remote
//! results link straight to their URL.
//!
//! All functions in this module require a browser environment
//! (`wasm32-unknown-unknown` target).

use reunite_analysis::{DownloadPayload, ResultImage};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;

use crate::blob::{self, BlobError};

/// Errors that can occur when triggering a file download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

impl From<BlobError> for DownloadError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::JsError(msg) => Self::JsError(msg),
        }
    }
}

/// Trigger a browser download of an analysis result.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if any browser API call fails
/// (e.g., `Blob` creation, `URL.createObjectURL`, element creation).
pub fn trigger_download(payload: &DownloadPayload) -> Result<(), DownloadError> {
    match &payload.data {
        ResultImage::Remote { url } => click_anchor(url, &payload.filename),
        ResultImage::Inline { bytes, mime } => {
            let url = blob::bytes_to_blob_url(bytes, mime.as_str())?;
            let clicked = click_anchor(&url, &payload.filename);
            // The download is already initiated once the click returns.
            blob::revoke_blob_url(&url);
            clicked
        }
    }
}

/// Append a temporary `<a href download>` to the body, click it, and
/// remove it again.
fn click_anchor(href: &str, filename: &str) -> Result<(), DownloadError> {
    let window =
        web_sys::window().ok_or_else(|| DownloadError::JsError("no global window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| DownloadError::JsError("no document".into()))?;

    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|e| DownloadError::JsError(format!("failed to cast element: {e:?}")))?;

    anchor.set_href(href);
    anchor.set_download(filename);

    let body = document
        .body()
        .ok_or_else(|| DownloadError::JsError("no document body".into()))?;
    body.append_child(&anchor)?;
    anchor.click();

    // Best-effort cleanup; failures here are not a failed download.
    let _ = body.remove_child(&anchor);

    Ok(())
}
