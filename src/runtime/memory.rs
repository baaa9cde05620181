use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{IncludeDecision, RuntimeSnapshot, SymbolOrigin};

type Autoloader = Box<dyn Fn(&str) -> Option<PathBuf>>;

/// Table-backed runtime snapshot for tests and embedders that know their
/// loaded symbols up front.
///
/// # Example
/// ```
/// use php_reflect::runtime::{InMemoryRuntime, RuntimeSnapshot, SymbolOrigin};
///
/// let runtime = InMemoryRuntime::new().with_evaled_class("Generated");
/// assert_eq!(runtime.class_origin("generated"), Some(SymbolOrigin::Evaled));
/// ```
#[derive(Default)]
pub struct InMemoryRuntime {
    /// Class and function names are stored lower-cased.
    classes: HashMap<String, SymbolOrigin>,
    functions: HashMap<String, SymbolOrigin>,
    constants: HashMap<String, SymbolOrigin>,
    included_files: Vec<PathBuf>,
    autoloaders: Vec<Autoloader>,
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_class(mut self, name: &str, file: impl Into<PathBuf>) -> Self {
        self.classes.insert(
            normalize(name).to_ascii_lowercase(),
            SymbolOrigin::User {
                file: Some(file.into()),
            },
        );
        self
    }

    pub fn with_internal_class(mut self, name: &str, extension: Option<&str>) -> Self {
        self.classes.insert(
            normalize(name).to_ascii_lowercase(),
            SymbolOrigin::Internal {
                extension: extension.map(str::to_string),
            },
        );
        self
    }

    pub fn with_evaled_class(mut self, name: &str) -> Self {
        self.classes
            .insert(normalize(name).to_ascii_lowercase(), SymbolOrigin::Evaled);
        self
    }

    pub fn with_user_function(mut self, name: &str, file: impl Into<PathBuf>) -> Self {
        self.functions.insert(
            normalize(name).to_ascii_lowercase(),
            SymbolOrigin::User {
                file: Some(file.into()),
            },
        );
        self
    }

    pub fn with_user_constant(mut self, name: &str, file: Option<PathBuf>) -> Self {
        self.constants
            .insert(normalize(name).to_string(), SymbolOrigin::User { file });
        self
    }

    pub fn with_included_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.included_files.push(file.into());
        self
    }

    /// Registers an autoloader returning the file it would include for a class.
    pub fn with_autoloader(mut self, loader: impl Fn(&str) -> Option<PathBuf> + 'static) -> Self {
        self.autoloaders.push(Box::new(loader));
        self
    }
}

impl RuntimeSnapshot for InMemoryRuntime {
    fn class_origin(&self, name: &str) -> Option<SymbolOrigin> {
        self.classes
            .get(&normalize(name).to_ascii_lowercase())
            .cloned()
    }

    fn function_origin(&self, name: &str) -> Option<SymbolOrigin> {
        self.functions
            .get(&normalize(name).to_ascii_lowercase())
            .cloned()
    }

    fn constant_origin(&self, name: &str) -> Option<SymbolOrigin> {
        self.constants.get(normalize(name)).cloned()
    }

    fn included_files(&self) -> Vec<PathBuf> {
        self.included_files.clone()
    }

    fn autoload_class(
        &self,
        class_name: &str,
        hook: &mut dyn FnMut(&Path) -> IncludeDecision,
    ) {
        for loader in &self.autoloaders {
            if let Some(file) = loader(normalize(class_name))
                && hook(&file) == IncludeDecision::Allow
            {
                return;
            }
        }
    }
}

fn normalize(name: &str) -> &str {
    name.strip_prefix('\\').unwrap_or(name)
}
