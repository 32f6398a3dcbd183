//! Input mode selection.
//!
//! [`FormMode`] decides which sections of the form are active and which
//! parts end up in the outgoing payload. [`ModeSelector`] owns the active
//! mode and pushes visibility changes to a [`FormView`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::view::FormView;

/// Which input sections are active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    /// Image and clinical fields together.
    #[default]
    Combined,
    /// Clinical fields only.
    Clinical,
    /// Image only.
    Image,
}

impl FormMode {
    pub const ALL: [FormMode; 3] = [FormMode::Combined, FormMode::Clinical, FormMode::Image];

    /// Whether the image section is visible and serialized.
    pub fn shows_image(self) -> bool {
        self != FormMode::Clinical
    }

    /// Whether the clinical section is visible and serialized.
    pub fn shows_clinical(self) -> bool {
        self != FormMode::Image
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormMode::Combined => "combined",
            FormMode::Clinical => "clinical",
            FormMode::Image => "image",
        }
    }
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown form mode '{0}' (expected combined, clinical or image)")]
pub struct ParseModeError(String);

impl FromStr for FormMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combined" | "both" => Ok(FormMode::Combined),
            "clinical" => Ok(FormMode::Clinical),
            "image" => Ok(FormMode::Image),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Holds the single active [`FormMode`].
#[derive(Debug, Default)]
pub struct ModeSelector {
    current: FormMode,
}

impl ModeSelector {
    pub fn new(initial: FormMode) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> FormMode {
        self.current
    }

    /// Activate `mode`, update section visibility and clear the prior result.
    ///
    /// Selecting the already-active mode re-applies the same view state.
    pub fn select<V: FormView + ?Sized>(&mut self, mode: FormMode, view: &mut V) {
        if self.current != mode {
            tracing::debug!(from = %self.current, to = %mode, "Form mode changed");
        }
        self.current = mode;
        view.show_sections(mode.shows_image(), mode.shows_clinical());
        view.clear_result();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::HeadlessView;

    #[test]
    fn default_mode_is_combined() {
        assert_eq!(FormMode::default(), FormMode::Combined);
        assert_eq!(ModeSelector::default().current(), FormMode::Combined);
    }

    #[test]
    fn section_visibility_per_mode() {
        assert!(FormMode::Combined.shows_image() && FormMode::Combined.shows_clinical());
        assert!(!FormMode::Clinical.shows_image() && FormMode::Clinical.shows_clinical());
        assert!(FormMode::Image.shows_image() && !FormMode::Image.shows_clinical());
    }

    #[test]
    fn parse_and_display_agree() {
        for mode in FormMode::ALL {
            assert_eq!(mode.to_string().parse::<FormMode>().unwrap(), mode);
        }
        assert_eq!(" IMAGE ".parse::<FormMode>().unwrap(), FormMode::Image);
        assert!("tabular".parse::<FormMode>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&FormMode::Clinical).unwrap();
        assert_eq!(json, "\"clinical\"");
    }

    #[test]
    fn select_updates_sections_and_clears_result() {
        let mut view = HeadlessView::default();
        view.show_error("stale");

        let mut selector = ModeSelector::default();
        selector.select(FormMode::Image, &mut view);

        assert_eq!(selector.current(), FormMode::Image);
        assert_eq!(view.sections, (true, false));
        assert!(view.error.is_none());
        assert!(view.result.is_none());
    }

    #[test]
    fn select_same_mode_is_idempotent() {
        let mut view = HeadlessView::default();
        let mut selector = ModeSelector::new(FormMode::Clinical);

        selector.select(FormMode::Clinical, &mut view);
        let first = view.sections;
        selector.select(FormMode::Clinical, &mut view);

        assert_eq!(selector.current(), FormMode::Clinical);
        assert_eq!(view.sections, first);
        assert_eq!(view.sections, (false, true));
    }
}
