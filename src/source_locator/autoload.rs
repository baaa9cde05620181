use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};

use super::{ReflectionScan, SourceLocator, find_in_source};
use crate::ast_locator::{AstLocator, NodeSelection};
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::located_source::LocatedSource;
use crate::reflection::Reflection;
use crate::reflector::Reflector;
use crate::runtime::{IncludeDecision, RuntimeSnapshot, SymbolOrigin};

/// Asks the host runtime where a symbol lives. Classes that are not loaded
/// yet are resolved by running the host's autoloaders with every include
/// refused, keeping the first file they try.
pub struct AutoloadSourceLocator {
    runtime: Rc<dyn RuntimeSnapshot>,
    ast_locator: Rc<AstLocator>,
}

impl AutoloadSourceLocator {
    pub fn new(runtime: Rc<dyn RuntimeSnapshot>, ast_locator: Rc<AstLocator>) -> Self {
        Self {
            runtime,
            ast_locator,
        }
    }

    fn class_file(&self, name: &str) -> Option<PathBuf> {
        match self.runtime.class_origin(name) {
            Some(SymbolOrigin::User { file }) => file,
            Some(_) => None,
            None => {
                let mut captured: Option<PathBuf> = None;
                self.runtime.autoload_class(name, &mut |path: &Path| {
                    if captured.is_none() {
                        captured = Some(path.to_path_buf());
                    }
                    IncludeDecision::Refuse
                });
                if let Some(path) = &captured {
                    debug!(class = name, path = %path.display(), "autoloader would include");
                }
                captured
            }
        }
    }

    fn function_file(&self, name: &str) -> Option<PathBuf> {
        match self.runtime.function_origin(name) {
            Some(SymbolOrigin::User { file }) => file,
            _ => None,
        }
    }

    /// Constants defined at runtime without a known file are looked for in the
    /// included files, newest first. Within one file a `define()` call wins
    /// over a `const` statement; the first file with either stops the scan.
    fn locate_constant(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        match self.runtime.constant_origin(identifier.name()) {
            Some(SymbolOrigin::User { file: Some(file) }) => {
                self.locate_in_file(reflector, &file, identifier)
            }
            Some(SymbolOrigin::User { file: None }) => {
                for file in self.runtime.included_files().into_iter().rev() {
                    if let Some(reflection) = self.constant_in_included_file(reflector, &file, identifier) {
                        return Ok(Some(reflection));
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Unreadable or unparsable files are skipped.
    fn constant_in_included_file(
        &self,
        reflector: &Reflector,
        file: &Path,
        identifier: &Identifier,
    ) -> Option<Reflection> {
        let source = match LocatedSource::from_file(file) {
            Ok(source) => Rc::new(source),
            Err(err) => {
                warn!(path = %file.display(), error = %err, "unreadable included file");
                return None;
            }
        };
        let program = match self.ast_locator.parse(&source) {
            Ok(program) => program,
            Err(err) => {
                warn!(location = %source.location(), error = %err, "skipping included file");
                return None;
            }
        };

        for selection in [NodeSelection::Defines, NodeSelection::ConstStatements] {
            match self.ast_locator.find_in_program(reflector, &source, &program, selection, Some(identifier)) {
                Ok(found) => {
                    if let Some(reflection) = found.into_iter().next() {
                        return Some(reflection);
                    }
                }
                Err(err) => {
                    warn!(location = %source.location(), error = %err, "skipping included file");
                    return None;
                }
            }
        }
        None
    }

    fn locate_in_file(
        &self,
        reflector: &Reflector,
        file: &Path,
        identifier: &Identifier,
    ) -> Result<Option<Reflection>> {
        if !file.is_file() {
            debug!(path = %file.display(), "runtime reported a missing file");
            return Ok(None);
        }
        let source = Rc::new(LocatedSource::from_file(file)?);
        find_in_source(&self.ast_locator, reflector, &source, identifier)
    }
}

impl SourceLocator for AutoloadSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        if identifier.is_wildcard() {
            return Ok(None);
        }
        let name = identifier.name();
        let name = name.strip_prefix('\\').unwrap_or(name);
        let file = match identifier.kind() {
            IdentifierType::Class => self.class_file(name),
            IdentifierType::Function => self.function_file(name),
            IdentifierType::Constant => return self.locate_constant(reflector, identifier),
        };
        match file {
            Some(file) => self.locate_in_file(reflector, &file, identifier),
            None => Ok(None),
        }
    }

    fn locate_all_of_kind(&self, _reflector: &Reflector, _kind: IdentifierType) -> Result<ReflectionScan> {
        Ok(ReflectionScan::default())
    }
}
