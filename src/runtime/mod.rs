//! Read-only view of a host PHP runtime: which symbols are loaded, where they
//! came from, and how its autoloaders would resolve a class.

pub mod memory;

use std::path::{Path, PathBuf};

pub use memory::InMemoryRuntime;

/// Where a loaded symbol was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolOrigin {
    /// Declared in user code. The file is unknown for some runtime-defined constants.
    User { file: Option<PathBuf> },
    Internal { extension: Option<String> },
    Evaled,
}

/// Decision returned by an include hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeDecision {
    Allow,
    Refuse,
}

pub trait RuntimeSnapshot {
    /// `None` when no class of that name is loaded.
    fn class_origin(&self, name: &str) -> Option<SymbolOrigin>;

    fn function_origin(&self, name: &str) -> Option<SymbolOrigin>;

    fn constant_origin(&self, name: &str) -> Option<SymbolOrigin>;

    /// Files included so far, in load order.
    fn included_files(&self) -> Vec<PathBuf>;

    /// Runs the registered autoloaders for `class_name`. Every include they
    /// attempt is passed to `hook` first; a refused include is skipped.
    fn autoload_class(
        &self,
        class_name: &str,
        hook: &mut dyn FnMut(&Path) -> IncludeDecision,
    );
}
