//! [`FormView`] that writes to the terminal.

use std::io::Write;

use dxform_core::{FormView, RenderedResult};

/// Prints results to stdout and errors/progress to stderr.
pub struct TerminalView<O: Write, E: Write> {
    out: O,
    err: E,
}

impl TerminalView<std::io::Stdout, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self {
            out: std::io::stdout(),
            err: std::io::stderr(),
        }
    }
}

impl<O: Write, E: Write> TerminalView<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

fn on_off(visible: bool) -> &'static str {
    if visible {
        "on"
    } else {
        "off"
    }
}

// Terminal write failures (closed pipe) are not worth aborting a submission for.
impl<O: Write, E: Write> FormView for TerminalView<O, E> {
    fn show_sections(&mut self, image: bool, clinical: bool) {
        let _ = writeln!(
            self.err,
            "Sections: image {}, clinical {}",
            on_off(image),
            on_off(clinical)
        );
    }

    fn clear_result(&mut self) {}

    fn set_submit_enabled(&mut self, enabled: bool) {
        if !enabled {
            let _ = writeln!(self.err, "Analyzing...");
        }
    }

    fn show_result(&mut self, result: &RenderedResult) {
        let _ = write!(self.out, "{result}");
        let _ = self.out.flush();
    }

    fn show_error(&mut self, message: &str) {
        let _ = writeln!(self.err, "Error: {message}");
    }
}

#[cfg(test)]
mod tests {
    use dxform_core::{render, Diagnosis};

    use super::*;

    fn view() -> TerminalView<Vec<u8>, Vec<u8>> {
        TerminalView::new(Vec::new(), Vec::new())
    }

    #[test]
    fn result_goes_to_stdout() {
        let mut v = view();
        v.show_result(&render(&Diagnosis::new("Benign", 0.62)));
        let (out, err) = v.into_parts();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Prediction: Benign"));
        assert!(out.contains("Confidence: 62.0%"));
        assert!(err.is_empty());
    }

    #[test]
    fn errors_and_progress_go_to_stderr() {
        let mut v = view();
        v.set_submit_enabled(false);
        v.show_error("bad image");
        v.set_submit_enabled(true);
        let (out, err) = v.into_parts();

        assert!(out.is_empty());
        assert_eq!(String::from_utf8(err).unwrap(), "Analyzing...\nError: bad image\n");
    }

    #[test]
    fn sections_are_listed() {
        let mut v = view();
        v.show_sections(false, true);
        let (_, err) = v.into_parts();
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Sections: image off, clinical on\n"
        );
    }
}
