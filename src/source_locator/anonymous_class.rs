use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{ReflectionScan, SourceLocator};
use crate::ast_locator::{AstLocator, NodeSelection};
use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType};
use crate::located_source::{LocatedSource, validate_file};
use crate::reflection::Reflection;
use crate::reflector::Reflector;

/// The anonymous class whose declaration starts on a given line of a file.
pub struct AnonymousClassSourceLocator {
    file: PathBuf,
    line: usize,
    ast_locator: Rc<AstLocator>,
}

impl AnonymousClassSourceLocator {
    pub fn new(file: impl Into<PathBuf>, line: usize, ast_locator: Rc<AstLocator>) -> Result<Self> {
        let file = file.into();
        validate_file(&file)?;
        Ok(Self {
            file,
            line,
            ast_locator,
        })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

impl SourceLocator for AnonymousClassSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        if !identifier.is_class() {
            return Ok(None);
        }
        let source = Rc::new(LocatedSource::from_file(&self.file)?);
        let mut on_line = self
            .ast_locator
            .find_selected(reflector, &source, NodeSelection::AnonymousClasses, None)?
            .into_iter()
            .filter(|reflection| match reflection {
                Reflection::Class(class) => class.start_line() == self.line,
                _ => false,
            });

        let found = on_line.next();
        if found.is_some() && on_line.next().is_some() {
            return Err(ReflectionError::TwoAnonymousClassesOnSameLine {
                location: source.location(),
                line: self.line,
            });
        }
        Ok(found)
    }

    fn locate_all_of_kind(&self, _reflector: &Reflector, _kind: IdentifierType) -> Result<ReflectionScan> {
        Ok(ReflectionScan::default())
    }
}
