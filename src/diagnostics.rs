//! Unified, `miette`-based diagnostics for the expansion engine.
//!
//! Every failure mode of the pipeline is an [`ExpandError`]. The split
//! between recoverable and fatal conditions is not encoded here: resolution
//! misses never construct an error at all (the dispatcher returns
//! `Outcome::Skip`), so any `ExpandError` that reaches a caller is fatal for
//! the file being transformed.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::ast::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// Emitted source of the offending unit, when available.
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_span(span: Span) -> Self {
        Self { source: None, span: Some(span), help: None }
    }

    pub fn with_help(span: Span, help: impl Into<String>) -> Self {
        Self { source: None, span: Some(span), help: Some(help.into()) }
    }
}

/// Unified error type for all engine failure modes.
#[derive(Debug, Error)]
pub enum ExpandError {
    /// A resolved macro declaration's body does not match the shape its
    /// expander requires. Fatal: partial expansion could emit code that
    /// compiles but misbehaves.
    #[error("malformed macro body in `{macro_name}`: {message}")]
    MalformedMacroBody {
        macro_name: String,
        message: String,
        ctx: ErrorContext,
    },
    /// A call supplies more arguments than the macro body binds.
    #[error("argument count mismatch calling `{macro_name}`: macro binds {expected} argument(s), call supplies {found}")]
    ArgumentCountMismatch {
        macro_name: String,
        expected: usize,
        found: usize,
        ctx: ErrorContext,
    },
    #[error("macro expansion recursion limit ({limit}) exceeded at `{macro_name}`")]
    RecursionLimit {
        macro_name: String,
        limit: usize,
        ctx: ErrorContext,
    },
    /// A callee shape the resolver cannot name (diagnostic rendering only;
    /// unsupported call-site shapes are skipped, not failed).
    #[error("unsupported syntax shape: {message}")]
    UnsupportedShape { message: String, ctx: ErrorContext },
    #[error("parse error: {message}")]
    Parse { message: String, ctx: ErrorContext },
    #[error("io error: {message}")]
    Io { message: String, ctx: ErrorContext },
}

impl ExpandError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            ExpandError::MalformedMacroBody { ctx, .. } => ctx,
            ExpandError::ArgumentCountMismatch { ctx, .. } => ctx,
            ExpandError::RecursionLimit { ctx, .. } => ctx,
            ExpandError::UnsupportedShape { ctx, .. } => ctx,
            ExpandError::Parse { ctx, .. } => ctx,
            ExpandError::Io { ctx, .. } => ctx,
        }
    }

    pub fn span(&self) -> Option<Span> {
        self.get_ctx().span
    }

    pub fn io(err: std::io::Error) -> Self {
        ExpandError::Io { message: err.to_string(), ctx: ErrorContext::none() }
    }

    pub fn parse(err: impl std::fmt::Display) -> Self {
        ExpandError::Parse { message: err.to_string(), ctx: ErrorContext::none() }
    }
}

impl Diagnostic for ExpandError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        None
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx();
        let span = ctx.span?;
        let len = if span.end > span.start { span.end - span.start } else { 1 };
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(self.to_string()),
            span.start,
            len,
        ))))
    }
}

/// Wraps emitted source text for snippet rendering in error contexts.
pub fn to_error_source(name: &str, source: impl AsRef<str>) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}
