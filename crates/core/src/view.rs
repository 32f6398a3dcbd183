//! The seam between the form controller and whatever displays it.
//!
//! A terminal front end, a GUI, or a test recorder implements
//! [`FormView`]; the controller only ever talks to the view through it.

use crate::render::RenderedResult;

/// Display surface driven by the mode selector and the form controller.
pub trait FormView {
    /// Show or hide the image and clinical input sections.
    fn show_sections(&mut self, image: bool, clinical: bool);

    /// Remove any result or error currently on display.
    fn clear_result(&mut self);

    /// Enable or disable the submit control.
    fn set_submit_enabled(&mut self, enabled: bool);

    /// Display a successful diagnosis.
    fn show_result(&mut self, result: &RenderedResult);

    /// Display a user-facing error message.
    fn show_error(&mut self, message: &str);
}

/// A [`FormView`] that keeps the latest display state in memory.
///
/// Used by non-interactive drivers and tests to inspect what a visual
/// front end would be showing.
#[derive(Debug, Clone)]
pub struct HeadlessView {
    /// `(image_visible, clinical_visible)`.
    pub sections: (bool, bool),
    pub submit_enabled: bool,
    pub result: Option<RenderedResult>,
    pub error: Option<String>,
    /// Number of times the submit control was disabled.
    pub submit_disabled_count: usize,
}

impl Default for HeadlessView {
    fn default() -> Self {
        Self {
            sections: (true, true),
            submit_enabled: true,
            result: None,
            error: None,
            submit_disabled_count: 0,
        }
    }
}

impl FormView for HeadlessView {
    fn show_sections(&mut self, image: bool, clinical: bool) {
        self.sections = (image, clinical);
    }

    fn clear_result(&mut self) {
        self.result = None;
        self.error = None;
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.submit_disabled_count += 1;
        }
        self.submit_enabled = enabled;
    }

    fn show_result(&mut self, result: &RenderedResult) {
        self.error = None;
        self.result = Some(result.clone());
    }

    fn show_error(&mut self, message: &str) {
        self.result = None;
        self.error = Some(message.to_string());
    }
}
