//! Rendering of a `Diagnostics` collection: either source-quoted snippets
//! (via `annotate-snippets`) or the plain `Line L:C - message` format of
//! spec.md §6, used when no source/coloring is requested.

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use super::collection::Diagnostics;
use crate::span::LineIndex;

pub struct DiagnosticsPrinter<'d> {
    diagnostics: &'d Diagnostics,
    source: Option<&'d str>,
    path: Option<&'d str>,
    colored: bool,
}

impl<'d> DiagnosticsPrinter<'d> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            source: None,
            path: None,
            colored: false,
        }
    }

    pub fn source(mut self, source: &'d str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn path(mut self, path: &'d str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    /// Render with source-quoted snippets when a source was attached, else
    /// fall back to the plain `Line L:C - message` format.
    pub fn render(&self) -> String {
        match self.source {
            Some(source) => self.render_snippets(source),
            None => self.render_plain_no_source(),
        }
    }

    /// The literal `Line L:C - message` format of spec.md §6. Always
    /// available since it only needs a `LineIndex`, not full source
    /// quoting.
    pub fn render_plain(&self, source: &str) -> String {
        let index = LineIndex::new(source);
        let mut out = String::new();
        for diag in self.diagnostics.iter() {
            let lc = index.line_col(diag.span.start);
            out.push_str(&format!("Line {}:{} - {}\n", lc.line, lc.column, diag.message));
        }
        out
    }

    fn render_plain_no_source(&self) -> String {
        let mut out = String::new();
        for diag in self.diagnostics.iter() {
            out.push_str(&format!("{}: {}\n", diag.kind, diag.message));
        }
        out
    }

    fn render_snippets(&self, source: &str) -> String {
        if self.diagnostics.is_empty() {
            return String::new();
        }

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let mut out = String::new();
        for (i, diag) in self.diagnostics.iter().enumerate() {
            let range = adjust_range(diag.span.to_range(), source.len());
            let title = diag.kind.to_string();

            let mut snippet = Snippet::source(source).line_start(1).annotation(
                AnnotationKind::Primary.span(range).label(&diag.message),
            );
            if let Some(p) = self.path {
                snippet = snippet.path(p);
            }

            let group = Level::ERROR.primary_title(&title).element(snippet);
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&renderer.render(&[group]).to_string());
        }
        out
    }
}

fn adjust_range(range: std::ops::Range<usize>, limit: usize) -> std::ops::Range<usize> {
    if range.start == range.end {
        return range.start..(range.start + 1).min(limit);
    }
    range
}

impl Diagnostics {
    pub fn printer(&self) -> DiagnosticsPrinter<'_> {
        DiagnosticsPrinter::new(self)
    }
}
