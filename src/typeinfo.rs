//! Cross-unit type information seam.
//!
//! The engine owns no type checker. Whenever an expander needs the
//! signature behind a named function (the arity and element types of a
//! pipeline callback, or whether a wrapped call's last result is `error`)
//! it asks a [`TypeLookup`]. The driver supplies one populated from
//! whatever front end parsed the project; tests build a [`SigTable`]
//! directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::{FuncType, TypeExpr};

/// Answers "what is the declared signature of this function name".
///
/// Names are dotted the same way the resolver renders call chains:
/// `ftoa`, `lib.FuncFromLib`, `strconv.ParseFloat`.
pub trait TypeLookup {
    fn signature_of(&self, name: &str) -> Option<&FuncType>;

    /// Whether the named function's last declared result is `error`.
    /// Unknown names answer `false`; only calls known to produce an error
    /// are rewritten by the error-wrapping expander.
    fn returns_error(&self, name: &str) -> bool {
        matches!(
            self.signature_of(name).and_then(FuncType::last_result),
            Some(TypeExpr::Named(id)) if id.name == "error"
        )
    }
}

/// Map-backed [`TypeLookup`], deserializable so the CLI can ingest a
/// signature dump next to the tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigTable {
    pub sigs: HashMap<String, FuncType>,
}

impl SigTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, sig: FuncType) {
        self.sigs.insert(name.into(), sig);
    }
}

impl TypeLookup for SigTable {
    fn signature_of(&self, name: &str) -> Option<&FuncType> {
        self.sigs.get(name)
    }
}

/// A lookup that knows nothing. Error-wrapping degrades to a no-op and
/// pipeline callbacks must be function literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTypes;

impl TypeLookup for NoTypes {
    fn signature_of(&self, _name: &str) -> Option<&FuncType> {
        None
    }
}
