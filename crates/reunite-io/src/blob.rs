//! Blob object URLs for staged and returned images.
//!
//! Wraps `URL.createObjectURL` / `URL.revokeObjectURL`. Every URL
//! created here must eventually be revoked; staged images do that
//! through [`reunite_analysis::intake::PreviewUri`], one-shot URLs via
//! [`revoke_blob_url`].

use reunite_analysis::{PreviewError, PreviewUrls, SourceBlob};
use wasm_bindgen::JsValue;
use web_sys::BlobPropertyBag;

/// Errors that can occur while creating a Blob URL.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for BlobError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

impl From<BlobError> for PreviewError {
    fn from(err: BlobError) -> Self {
        Self(err.to_string())
    }
}

/// Create a Blob URL for raw bytes with the given MIME type.
///
/// The returned URL must be revoked via [`revoke_blob_url`] when no
/// longer needed to avoid memory leaks.
///
/// # Errors
///
/// Returns [`BlobError::JsError`] if Blob or URL creation fails.
pub fn bytes_to_blob_url(bytes: &[u8], mime_type: &str) -> Result<String, BlobError> {
    let uint8_array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&uint8_array);

    let opts = BlobPropertyBag::new();
    opts.set_type(mime_type);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)?;

    let url = web_sys::Url::create_object_url_with_blob(&blob)?;
    Ok(url)
}

/// Revoke a Blob URL previously created by [`bytes_to_blob_url`].
///
/// Best-effort: failures are silently ignored since the URL may have
/// already been revoked or garbage collected.
pub fn revoke_blob_url(url: &str) {
    let _ = web_sys::Url::revoke_object_url(url);
}

/// [`PreviewUrls`] backed by browser object URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlobUrls;

impl PreviewUrls for BlobUrls {
    fn create(&self, blob: &SourceBlob) -> Result<String, PreviewError> {
        Ok(bytes_to_blob_url(blob.bytes(), blob.mime().as_str())?)
    }

    fn revoke(&self, uri: &str) {
        revoke_blob_url(uri);
    }
}
