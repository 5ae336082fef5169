//! Rendering match failures as labeled source diagnostics.
//!
//! The engine itself reports nothing richer than a furthest-failure offset;
//! turning that offset into a readable report is the caller's job, and this
//! module does it with `miette`. Wrap the input in a [`NamedInput`], hand it
//! a [`crate::result::ParseFailure`], and print the resulting
//! [`SyntaxError`] as a report.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::result::ParseFailure;

/// A named piece of source text, for error reporting.
#[derive(Debug, Clone)]
pub struct NamedInput {
    pub name: String,
    pub content: String,
}

impl NamedInput {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.clone())
    }
}

/// A parse failure attached to the source it occurred in.
///
/// The label points at the failure offset; when the failure sits at end of
/// input the span is zero-width at the last position.
#[derive(Debug, Error, Diagnostic)]
#[error("syntax error at offset {offset}")]
#[diagnostic(code(kireji::syntax_error))]
pub struct SyntaxError {
    // Not named `source`: thiserror reserves that name for the error chain.
    #[source_code]
    pub src: NamedSource<String>,

    #[label("parsing failed here")]
    pub span: SourceSpan,

    pub offset: usize,
}

/// Attaches a failure to its source for rendering.
pub fn syntax_error(
    name: impl Into<String>,
    content: impl Into<String>,
    failure: &ParseFailure,
) -> SyntaxError {
    let input = NamedInput::new(name, content);
    let offset = failure.offset.min(input.content.len());
    SyntaxError {
        src: input.to_named_source(),
        span: SourceSpan::from(offset..offset),
        offset: failure.offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_labels_failure_offset() {
        let failure = ParseFailure { offset: 4 };
        let error = syntax_error("calc.txt", "12+x", &failure);
        assert_eq!(error.offset, 4);
        assert_eq!(error.span.offset(), 4);
        assert_eq!(error.to_string(), "syntax error at offset 4");
    }

    #[test]
    fn test_offset_past_end_is_clamped_for_the_label() {
        let failure = ParseFailure { offset: 99 };
        let error = syntax_error("short.txt", "ab", &failure);
        // The report still names the raw offset; only the label is clamped
        // so miette can render it.
        assert_eq!(error.offset, 99);
        assert_eq!(error.span.offset(), 2);
    }

    #[test]
    fn test_named_source_is_not_an_error_cause() {
        // The source text feeds the report's snippet; it must not show up
        // as a cause in the error chain.
        let error = syntax_error("input", "ab", &ParseFailure { offset: 1 });
        assert!(std::error::Error::source(&error).is_none());
    }

    #[test]
    fn test_report_renders_without_panicking() {
        let failure = ParseFailure { offset: 3 };
        let error = syntax_error("input", "1+*2", &failure);
        let report = miette::Report::new(error);
        let rendered = format!("{report:?}");
        assert!(rendered.contains("syntax error"));
    }
}
