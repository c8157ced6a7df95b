//! mupp: a source-to-source macro expansion engine for Go-style syntax
//! trees.
//!
//! Declarations whose names carry the `_μ` marker suffix are macros; calls
//! to them are rewritten at the statement level before the host toolchain
//! ever runs. The engine ships four expansion families: generic body
//! inlining, fluent sequence pipelines, error wrapping, and diagnostic
//! logging.
//!
//! The typical flow mirrors the CLI: build a [`MacroRegistry`] (the bundled
//! library plus any user macro units), construct a per-run [`Context`], and
//! drive an [`Expander`] over each parsed [`ast::File`], then emit the
//! rewritten tree as source text with [`emit::emit_file`].

pub mod ast;
pub mod cli;
pub mod context;
pub mod diagnostics;
pub mod emit;
pub mod expand;
pub mod registry;
pub mod resolve;
pub mod stdlib;
pub mod typeinfo;

pub use context::Context;
pub use diagnostics::{ErrorContext, ExpandError};
pub use expand::{Expander, Outcome};
pub use registry::{build_default_registry, MacroRegistry};
pub use typeinfo::{NoTypes, SigTable, TypeLookup};
