//! Image intake: validation, staging, and preview-URI ownership.
//!
//! Every entry point (file picker, drag-and-drop) funnels through
//! [`stage_asset`], so there is exactly one set of acceptance rules.
//!
//! Preview URIs are the only externally visible resource a staged image
//! holds. [`PreviewUri`] revokes its URI when dropped, which covers
//! replacement, reset, and component teardown with a single code path.

use std::fmt;
use std::io::Cursor;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, PreviewError, ValidationError};
use crate::types::{Dimensions, ImageMime};

/// Largest accepted image, in bytes (10 MiB, inclusive).
pub const MAX_ASSET_BYTES: u64 = 10 * 1024 * 1024;

/// Acceptance rules for staged images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakePolicy {
    /// Largest accepted file size in bytes. Files of exactly this size
    /// are accepted.
    pub max_bytes: u64,
    /// Formats accepted; anything else is an unsupported type.
    pub accepted: Vec<ImageMime>,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_ASSET_BYTES,
            accepted: vec![ImageMime::Jpeg, ImageMime::Png],
        }
    }
}

impl IntakePolicy {
    /// Check a file's declared MIME type and size.
    ///
    /// This is cheap enough to call before reading the file's bytes,
    /// and [`stage_asset`] calls it again on the bytes actually read.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedType`] for a type outside
    /// [`accepted`](Self::accepted), and [`ValidationError::TooLarge`]
    /// when `size` exceeds [`max_bytes`](Self::max_bytes).
    pub fn validate(&self, mime: &str, size: u64) -> Result<ImageMime, ValidationError> {
        let parsed = ImageMime::parse(mime)
            .filter(|parsed| self.accepted.contains(parsed))
            .ok_or_else(|| ValidationError::UnsupportedType {
                mime: mime.to_owned(),
            })?;
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(parsed)
    }
}

/// How a file reached the intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeSource {
    FilePicker,
    DragAndDrop,
}

impl fmt::Display for IntakeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FilePicker => "file picker",
            Self::DragAndDrop => "drag and drop",
        })
    }
}

/// A file the user picked or dropped, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Original filename.
    pub name: String,
    /// MIME type as reported by the browser.
    pub mime: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// The validated binary content of a staged image.
///
/// Cloning is cheap: the bytes are shared, so a submitted request can
/// carry its inputs without copying them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlob {
    name: String,
    mime: ImageMime,
    bytes: Rc<[u8]>,
    dimensions: Option<Dimensions>,
}

impl SourceBlob {
    /// Wrap bytes already known to be `mime`, probing their dimensions.
    ///
    /// Size limits are not checked here; [`stage_asset`] enforces them.
    #[must_use]
    pub fn new(name: impl Into<String>, mime: ImageMime, bytes: impl Into<Rc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let dimensions = probe_dimensions(&bytes, mime);
        Self {
            name: name.into(),
            mime,
            bytes,
            dimensions,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn mime(&self) -> ImageMime {
        self.mime
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the bytes.
    #[must_use]
    pub fn shared_bytes(&self) -> Rc<[u8]> {
        Rc::clone(&self.bytes)
    }

    /// Pixel dimensions read from the image header, if it could be parsed.
    #[must_use]
    pub const fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Size of the image in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Issues and revokes display URIs for staged images.
///
/// The browser implementation wraps `URL.createObjectURL` and
/// `URL.revokeObjectURL`.
pub trait PreviewUrls {
    /// Create a display URI for `blob`.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError`] if the platform refuses to create one.
    fn create(&self, blob: &SourceBlob) -> Result<String, PreviewError>;

    /// Release a URI previously returned by [`create`](Self::create).
    fn revoke(&self, uri: &str);
}

/// A display URI that is revoked exactly once, when dropped.
pub struct PreviewUri {
    uri: String,
    urls: Rc<dyn PreviewUrls>,
}

impl PreviewUri {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl fmt::Debug for PreviewUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewUri").field(&self.uri).finish()
    }
}

impl Drop for PreviewUri {
    fn drop(&mut self) {
        self.urls.revoke(&self.uri);
    }
}

/// A user-supplied image staged for analysis, with its preview URI.
///
/// The URI lives exactly as long as the asset: dropping the asset
/// revokes it.
#[derive(Debug)]
pub struct MediaAsset {
    source: SourceBlob,
    preview: PreviewUri,
}

impl MediaAsset {
    #[must_use]
    pub const fn source(&self) -> &SourceBlob {
        &self.source
    }

    #[must_use]
    pub fn preview_uri(&self) -> &str {
        self.preview.as_str()
    }
}

/// Validate a candidate file and stage it with a fresh preview URI.
///
/// Nothing is allocated through `urls` unless validation succeeds, so a
/// rejected file leaks nothing. `source` only affects logging: the
/// picker and drag-and-drop paths are held to the same rules.
///
/// # Errors
///
/// Returns [`IntakeError::Invalid`] for an unsupported type or an
/// oversized file, and [`IntakeError::Preview`] if no preview URI could
/// be created.
pub fn stage_asset(
    policy: &IntakePolicy,
    urls: &Rc<dyn PreviewUrls>,
    source: IntakeSource,
    candidate: FileCandidate,
) -> Result<MediaAsset, IntakeError> {
    let FileCandidate { name, mime, bytes } = candidate;
    let size = bytes.len() as u64;
    let mime = policy.validate(&mime, size).inspect_err(|e| {
        tracing::debug!(%source, %name, size, error = %e, "rejected image");
    })?;

    let blob = SourceBlob::new(name, mime, bytes);
    let uri = urls.create(&blob)?;
    tracing::debug!(%source, name = %blob.name, size, %mime, dimensions = ?blob.dimensions, "staged image");

    Ok(MediaAsset {
        source: blob,
        preview: PreviewUri {
            uri,
            urls: Rc::clone(urls),
        },
    })
}

/// Read width and height from the image header without decoding pixels.
fn probe_dimensions(bytes: &[u8], mime: ImageMime) -> Option<Dimensions> {
    image::ImageReader::with_format(Cursor::new(bytes), mime.image_format())
        .into_dimensions()
        .ok()
        .map(|(width, height)| Dimensions { width, height })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Preview URI fake that records every create and revoke.
    #[derive(Default)]
    pub(crate) struct CountingUrls {
        pub(crate) created: RefCell<Vec<String>>,
        pub(crate) revoked: RefCell<Vec<String>>,
    }

    impl CountingUrls {
        pub(crate) fn shared() -> (Rc<Self>, Rc<dyn PreviewUrls>) {
            let urls = Rc::new(Self::default());
            let dyn_urls: Rc<dyn PreviewUrls> = Rc::clone(&urls) as Rc<dyn PreviewUrls>;
            (urls, dyn_urls)
        }

        pub(crate) fn live(&self) -> usize {
            self.created.borrow().len() - self.revoked.borrow().len()
        }
    }

    impl PreviewUrls for CountingUrls {
        fn create(&self, blob: &SourceBlob) -> Result<String, PreviewError> {
            let uri = format!("blob:test/{}/{}", self.created.borrow().len(), blob.name());
            self.created.borrow_mut().push(uri.clone());
            Ok(uri)
        }

        fn revoke(&self, uri: &str) {
            self.revoked.borrow_mut().push(uri.to_owned());
        }
    }

    struct FailingUrls;

    impl PreviewUrls for FailingUrls {
        fn create(&self, _blob: &SourceBlob) -> Result<String, PreviewError> {
            Err(PreviewError("blob store unavailable".into()))
        }

        fn revoke(&self, _uri: &str) {}
    }

    pub(crate) fn candidate(name: &str, mime: &str, len: usize) -> FileCandidate {
        FileCandidate {
            name: name.into(),
            mime: mime.into(),
            bytes: vec![0u8; len],
        }
    }

    fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, _y| {
            if x < width / 2 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn validate_accepts_exact_limit() {
        let policy = IntakePolicy::default();
        assert_eq!(policy.validate("image/png", MAX_ASSET_BYTES), Ok(ImageMime::Png));
    }

    #[test]
    fn validate_rejects_one_byte_over() {
        let policy = IntakePolicy::default();
        assert_eq!(
            policy.validate("image/jpeg", MAX_ASSET_BYTES + 1),
            Err(ValidationError::TooLarge {
                size: MAX_ASSET_BYTES + 1,
                limit: MAX_ASSET_BYTES,
            })
        );
    }

    #[test]
    fn validate_checks_type_before_size() {
        let policy = IntakePolicy::default();
        assert!(matches!(
            policy.validate("image/gif", MAX_ASSET_BYTES * 2),
            Err(ValidationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn validate_honors_accepted_formats() {
        let policy = IntakePolicy {
            accepted: vec![ImageMime::Png],
            ..IntakePolicy::default()
        };
        assert_eq!(policy.validate("image/png", 1), Ok(ImageMime::Png));
        assert_eq!(
            policy.validate("image/jpeg", 1),
            Err(ValidationError::UnsupportedType {
                mime: "image/jpeg".into(),
            })
        );
    }

    #[test]
    fn png_only_policy_stages_no_jpeg() {
        let (counting, urls) = CountingUrls::shared();
        let policy = IntakePolicy {
            accepted: vec![ImageMime::Png],
            ..IntakePolicy::default()
        };
        let result = stage_asset(
            &policy,
            &urls,
            IntakeSource::DragAndDrop,
            candidate("photo.jpg", "image/jpeg", 16),
        );
        assert!(matches!(
            result,
            Err(IntakeError::Invalid(ValidationError::UnsupportedType { .. }))
        ));
        assert!(counting.created.borrow().is_empty());
    }

    #[test]
    fn stage_rejection_allocates_no_preview() {
        let (counting, urls) = CountingUrls::shared();
        let policy = IntakePolicy::default();
        let result = stage_asset(
            &policy,
            &urls,
            IntakeSource::FilePicker,
            candidate("notes.txt", "text/plain", 16),
        );
        assert!(matches!(
            result,
            Err(IntakeError::Invalid(ValidationError::UnsupportedType { .. }))
        ));
        assert!(counting.created.borrow().is_empty());
    }

    #[test]
    fn picker_and_drop_follow_identical_rules() {
        let policy = IntakePolicy {
            max_bytes: 64,
            ..IntakePolicy::default()
        };
        let cases = [
            candidate("a.png", "image/png", 10),
            candidate("b.jpg", "image/jpg", 64),
            candidate("c.jpeg", "image/jpeg", 65),
            candidate("d.gif", "image/gif", 10),
            candidate("e.webp", "image/webp", 1),
            candidate("f", "", 0),
        ];
        for case in cases {
            let (_, picker_urls) = CountingUrls::shared();
            let (_, drop_urls) = CountingUrls::shared();
            let via_picker =
                stage_asset(&policy, &picker_urls, IntakeSource::FilePicker, case.clone())
                    .map(|asset| asset.source().clone());
            let via_drop = stage_asset(&policy, &drop_urls, IntakeSource::DragAndDrop, case.clone())
                .map(|asset| asset.source().clone());
            assert_eq!(via_picker, via_drop, "divergent intake for {:?}", case.name);
        }
    }

    #[test]
    fn preview_failure_surfaces_as_intake_error() {
        let urls: Rc<dyn PreviewUrls> = Rc::new(FailingUrls);
        let result = stage_asset(
            &IntakePolicy::default(),
            &urls,
            IntakeSource::DragAndDrop,
            candidate("a.png", "image/png", 8),
        );
        assert!(matches!(result, Err(IntakeError::Preview(_))));
    }

    #[test]
    fn dropping_asset_revokes_its_uri_once() {
        let (counting, urls) = CountingUrls::shared();
        let asset = stage_asset(
            &IntakePolicy::default(),
            &urls,
            IntakeSource::FilePicker,
            candidate("a.png", "image/png", 8),
        )
        .unwrap();
        let uri = asset.preview_uri().to_owned();
        assert_eq!(counting.live(), 1);
        drop(asset);
        assert_eq!(*counting.revoked.borrow(), vec![uri]);
        assert_eq!(counting.live(), 0);
    }

    #[test]
    fn dimensions_probed_from_real_png() {
        let (_, urls) = CountingUrls::shared();
        let asset = stage_asset(
            &IntakePolicy::default(),
            &urls,
            IntakeSource::FilePicker,
            FileCandidate {
                name: "face.png".into(),
                mime: "image/png".into(),
                bytes: tiny_png(12, 7),
            },
        )
        .unwrap();
        assert_eq!(
            asset.source().dimensions(),
            Some(Dimensions {
                width: 12,
                height: 7
            })
        );
    }

    #[test]
    fn unreadable_header_leaves_dimensions_unknown() {
        let (_, urls) = CountingUrls::shared();
        let asset = stage_asset(
            &IntakePolicy::default(),
            &urls,
            IntakeSource::FilePicker,
            candidate("blank.jpg", "image/jpeg", 32),
        )
        .unwrap();
        assert_eq!(asset.source().dimensions(), None);
    }
}
