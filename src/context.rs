//! Per-file transformation context.
//!
//! The engine keeps no process-wide state: one [`Context`] is created per
//! run configuration, re-initialized at the start of each file's traversal,
//! and passed by reference through every dispatch and expander call. A
//! concurrent driver gives each file its own instance; nothing here is
//! shared.

use regex::Regex;

use crate::ast::File;
use crate::registry::MACRO_LIB_PATH;

/// Expansion budget per file. Each splice consumes one unit; a macro
/// library that expands into itself runs out instead of spinning.
pub const DEFAULT_FUEL: usize = 4096;

#[derive(Debug)]
pub struct Context {
    /// Path of the file being transformed, relative to `src_root` when the
    /// front end recorded it that way.
    pub file_name: String,
    /// Source root stripped from logging-prefix paths.
    pub src_root: String,
    /// Name the macro library is imported under in the current file, if it
    /// is imported at all.
    pub lib_alias: Option<String>,
    /// Only logging call sites whose `file:line ` prefix matches are kept;
    /// the rest are rewritten to the inert stub.
    pub log_filter: Option<Regex>,
    /// A muted alias definition still names the library; its import must
    /// survive the post-expansion cleanup.
    pub keep_lib_import: bool,
    /// The logging expander saw at least one kept call site; the file needs
    /// the formatting import.
    pub needs_fmt_import: bool,
    /// At least one logging call was filtered out; the file needs the
    /// no-op stub declaration.
    pub needs_log_stub: bool,
    /// Remaining splice budget for the current file.
    pub fuel: usize,
}

impl Context {
    pub fn new(src_root: impl Into<String>, log_filter: Option<Regex>) -> Self {
        Context {
            file_name: String::new(),
            src_root: src_root.into(),
            lib_alias: None,
            log_filter,
            keep_lib_import: false,
            needs_fmt_import: false,
            needs_log_stub: false,
            fuel: DEFAULT_FUEL,
        }
    }

    /// Re-initializes per-file state at the start of a traversal.
    pub fn begin_file(&mut self, file: &File) {
        self.file_name = file.name.clone();
        self.lib_alias = file
            .imports
            .iter()
            .find(|im| im.path == MACRO_LIB_PATH)
            .map(|im| im.local_name().to_string());
        self.keep_lib_import = false;
        self.needs_fmt_import = false;
        self.needs_log_stub = false;
        self.fuel = DEFAULT_FUEL;
    }

    /// The `<path>:<line>` position rendered into logging output and
    /// diagnostics, relative to the source root.
    pub fn position(&self, line: u32) -> String {
        let path = self
            .file_name
            .strip_prefix(&self.src_root)
            .unwrap_or(&self.file_name)
            .trim_start_matches('/');
        format!("{}:{}", path, line)
    }
}
