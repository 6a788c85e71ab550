//! Instruction payloads surfaced to the driver.
//!
//! Payloads are compared by value: two banners with identical text and
//! geometry are the same instruction, wherever they came from.

/// One line of a banner (primary, secondary, or sub).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BannerText {
    pub text: String,

    /// Maneuver type, e.g. `"turn"`, `"merge"`, `"arrive"`.
    pub maneuver_type: Option<String>,

    /// Maneuver modifier, e.g. `"left"`, `"slight right"`.
    pub modifier: Option<String>,

    /// Roundabout exit angle in degrees.
    pub degrees: Option<f64>,
}

impl BannerText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text:          text.into(),
            maneuver_type: None,
            modifier:      None,
            degrees:       None,
        }
    }
}

/// A visual maneuver instruction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BannerInstruction {
    /// Distance before the end of the step at which the banner becomes active.
    pub distance_along_geometry: f64,
    pub primary:   BannerText,
    pub secondary: Option<BannerText>,
    pub sub:       Option<BannerText>,
}

impl BannerInstruction {
    /// A banner with only a primary line.
    pub fn primary(text: impl Into<String>, distance_along_geometry: f64) -> Self {
        Self {
            distance_along_geometry,
            primary:   BannerText::plain(text),
            secondary: None,
            sub:       None,
        }
    }
}

/// A spoken instruction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoiceInstruction {
    pub announcement: String,
    pub ssml_announcement: Option<String>,
    pub distance_along_geometry: f64,
}

impl VoiceInstruction {
    pub fn new(announcement: impl Into<String>, distance_along_geometry: f64) -> Self {
        Self {
            announcement: announcement.into(),
            ssml_announcement: None,
            distance_along_geometry,
        }
    }
}
