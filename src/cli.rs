//! Command-line interface.
//!
//! The engine sits behind a front end that parses source into JSON-encoded
//! trees (see [`crate::ast`]); every subcommand ingests those tree files.
//! `expand` rewrites them and emits source text, `emit` pretty-prints them
//! unchanged, and `list-macros` shows what the registry would resolve.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use regex::Regex;
use walkdir::WalkDir;

use crate::ast::File;
use crate::context::Context;
use crate::diagnostics::ExpandError;
use crate::emit::emit_file;
use crate::expand::Expander;
use crate::registry::{build_default_registry, MacroRegistry};
use crate::typeinfo::{NoTypes, SigTable, TypeLookup};

#[derive(Debug, Parser)]
#[command(
    name = "mupp",
    version,
    about = "Source-to-source macro expansion for Go-style syntax trees"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Expand macro call sites in parsed units and emit source text
    Expand {
        /// Tree files (JSON), or directories to scan for them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Source root stripped from call-site positions in logging output
        #[arg(long, default_value = "")]
        source_root: String,
        /// Keep only logging call sites whose `path:line ` prefix matches
        /// this pattern; everything else is muted to a no-op stub
        #[arg(long)]
        log_filter: Option<String>,
        /// Additional macro-definition units (JSON trees) to register
        #[arg(long = "macros")]
        macro_units: Vec<PathBuf>,
        /// Function signature table (JSON) used to resolve pipeline
        /// callbacks and error-returning calls
        #[arg(long)]
        types: Option<PathBuf>,
        /// Write emitted files into this directory instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Emit source text for parsed units without expanding
    Emit {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List the macro names the registry would resolve
    ListMacros {
        /// Additional macro-definition units (JSON trees) to register
        #[arg(long = "macros")]
        macro_units: Vec<PathBuf>,
    },
}

pub fn run() -> Result<(), ExpandError> {
    run_with(Cli::parse())
}

pub fn run_with(cli: Cli) -> Result<(), ExpandError> {
    match cli.command {
        Command::Expand { paths, source_root, log_filter, macro_units, types, out } => {
            run_expand(&paths, source_root, log_filter, &macro_units, types, out)
        }
        Command::Emit { paths } => {
            for path in collect_tree_paths(&paths)? {
                let file: File = load_json(&path)?;
                print!("{}", emit_file(&file));
            }
            Ok(())
        }
        Command::ListMacros { macro_units } => {
            let registry = load_registry(&macro_units)?;
            let mut names: Vec<&String> = registry.names().collect();
            names.sort();
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn run_expand(
    paths: &[PathBuf],
    source_root: String,
    log_filter: Option<String>,
    macro_units: &[PathBuf],
    types: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<(), ExpandError> {
    let registry = load_registry(macro_units)?;
    let sig_table: Option<SigTable> = types.map(|p| load_json(&p)).transpose()?;
    let lookup: &dyn TypeLookup = match &sig_table {
        Some(table) => table,
        None => &NoTypes,
    };
    let filter = log_filter
        .map(|f| Regex::new(&f))
        .transpose()
        .map_err(ExpandError::parse)?;
    let mut ctx = Context::new(source_root, filter);

    // Expand everything before writing anything: a failure in any unit
    // leaves the output directory untouched.
    let mut outputs = Vec::new();
    for path in collect_tree_paths(paths)? {
        let mut file: File = load_json(&path)?;
        Expander::new(&registry, lookup, &mut ctx).expand_file(&mut file)?;
        outputs.push((path, emit_file(&file)));
    }

    match out {
        Some(dir) => {
            fs::create_dir_all(&dir).map_err(ExpandError::io)?;
            for (path, text) in &outputs {
                fs::write(dir.join(output_name(path)), text).map_err(ExpandError::io)?;
            }
        }
        None => {
            let many = outputs.len() > 1;
            for (path, text) in &outputs {
                if many {
                    println!("// {}", path.display());
                }
                print!("{text}");
            }
        }
    }
    Ok(())
}

/// The bundled library plus any user-supplied macro units, registered in
/// argument order so later units win name collisions.
fn load_registry(macro_units: &[PathBuf]) -> Result<MacroRegistry, ExpandError> {
    let mut registry = build_default_registry();
    for path in macro_units {
        let file: File = load_json(path)?;
        registry.register_file(&file);
    }
    Ok(registry)
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ExpandError> {
    let text = fs::read_to_string(path).map_err(ExpandError::io)?;
    serde_json::from_str(&text)
        .map_err(|e| ExpandError::parse(format!("{}: {e}", path.display())))
}

fn collect_tree_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ExpandError> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|e| ExpandError::Io {
                    message: e.to_string(),
                    ctx: Default::default(),
                })?;
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "json")
                {
                    found.push(entry.into_path());
                }
            }
        } else if path.is_file() {
            found.push(path.clone());
        } else {
            return Err(ExpandError::Io {
                message: format!("no such file or directory: {}", path.display()),
                ctx: Default::default(),
            });
        }
    }
    Ok(found)
}

/// `pkg/main.json` is written as `main.go`.
fn output_name(path: &Path) -> PathBuf {
    let mut name = PathBuf::from(path.file_name().unwrap_or_default());
    name.set_extension("go");
    name
}
