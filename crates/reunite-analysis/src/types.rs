//! Shared types for the reunite media analysis core.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Image formats accepted at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMime {
    Jpeg,
    Png,
}

impl ImageMime {
    /// Parse a browser-reported MIME type.
    ///
    /// Accepts `image/jpeg`, the non-standard `image/jpg` some platforms
    /// report, and `image/png`. Matching is case-insensitive and any
    /// `;`-separated parameters are ignored.
    #[must_use]
    pub fn parse(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("image/jpeg") || essence.eq_ignore_ascii_case("image/jpg") {
            Some(Self::Jpeg)
        } else if essence.eq_ignore_ascii_case("image/png") {
            Some(Self::Png)
        } else {
            None
        }
    }

    /// Canonical MIME string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Conventional file extension (without the dot).
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub(crate) const fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A labeled facial landmark in target-image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPoint {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
    /// Feature name, e.g. `"Eyes"`.
    pub label: String,
}

/// Whether an age transform moves the subject forward or backward in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Progression,
    Regression,
}

impl Direction {
    /// Lowercase name used in filenames and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Progression => "progression",
            Self::Regression => "regression",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Progression => "Age Progression",
            Self::Regression => "Age Regression",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target age for an age transform, always within `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TargetAge(u8);

impl TargetAge {
    /// Youngest allowed target age.
    pub const MIN: u32 = 1;
    /// Oldest allowed target age.
    pub const MAX: u32 = 100;

    /// Validate and wrap an age.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AgeOutOfRange`] outside `1..=100`.
    pub fn new(age: u32) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&age) {
            u8::try_from(age)
                .map(Self)
                .map_err(|_| ValidationError::AgeOutOfRange(age))
        } else {
            Err(ValidationError::AgeOutOfRange(age))
        }
    }

    #[must_use]
    pub fn get(self) -> u32 {
        u32::from(self.0)
    }
}

impl Default for TargetAge {
    fn default() -> Self {
        Self(25)
    }
}

impl TryFrom<u32> for TargetAge {
    type Error = ValidationError;

    fn try_from(age: u32) -> Result<Self, Self::Error> {
        Self::new(age)
    }
}

impl From<TargetAge> for u32 {
    fn from(age: TargetAge) -> Self {
        age.get()
    }
}

impl fmt::Display for TargetAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which analysis a workbench performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    AgeTransform,
    FacialMatch,
}

impl RequestKind {
    /// Slots that must be staged before a request of this kind can be submitted.
    #[must_use]
    pub const fn required_slots(self) -> &'static [Slot] {
        match self {
            Self::AgeTransform => &[Slot::Primary],
            Self::FacialMatch => &[Slot::Primary, Slot::Secondary],
        }
    }

    /// Heading shown above a slot's drop zone.
    #[must_use]
    pub const fn slot_label(self, slot: Slot) -> &'static str {
        match (self, slot) {
            (Self::AgeTransform, _) => "Photo",
            (Self::FacialMatch, Slot::Primary) => "Reference Image",
            (Self::FacialMatch, Slot::Secondary) => "Target Image",
        }
    }

    /// Page title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::AgeTransform => "Age Progression/Regression",
            Self::FacialMatch => "Facial Similarity Matching",
        }
    }

    /// Lowercase alphanumeric/underscore name for analytics events.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::AgeTransform => "age_transform",
            Self::FacialMatch => "facial_match",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// One staging slot of a workbench.
///
/// Age transforms use only [`Slot::Primary`]. Facial matching uses
/// [`Slot::Primary`] for the reference image and [`Slot::Secondary`]
/// for the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Primary,
    Secondary,
}

impl Slot {
    /// Both slots, in display order.
    pub const ALL: [Self; 2] = [Self::Primary, Self::Secondary];

    /// Position in per-slot arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }
}
