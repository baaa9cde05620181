use std::path::PathBuf;
use std::rc::Rc;

use super::directories::is_php_file;
use super::{AggregateSourceLocator, ReflectionScan, SingleFileSourceLocator, SourceLocator};
use crate::ast_locator::AstLocator;
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::reflection::Reflection;
use crate::reflector::Reflector;

/// The `.php` files among an explicit list of paths. Other entries are ignored.
pub struct FileIteratorSourceLocator {
    files: Vec<PathBuf>,
    ast_locator: Rc<AstLocator>,
}

impl FileIteratorSourceLocator {
    pub fn new(files: impl IntoIterator<Item = PathBuf>, ast_locator: Rc<AstLocator>) -> Self {
        let mut files: Vec<PathBuf> = files
            .into_iter()
            .filter(|file| file.is_file() && is_php_file(file))
            .collect();
        files.sort();
        files.dedup();
        Self {
            files,
            ast_locator,
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn aggregate(&self) -> Result<AggregateSourceLocator> {
        let locators = self
            .files
            .iter()
            .map(|file| {
                SingleFileSourceLocator::new(file.clone(), Rc::clone(&self.ast_locator))
                    .map(|locator| Rc::new(locator) as Rc<dyn SourceLocator>)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(AggregateSourceLocator::new(locators))
    }
}

impl SourceLocator for FileIteratorSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        self.aggregate()?.locate_one(reflector, identifier)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        self.aggregate()?.locate_all_of_kind(reflector, kind)
    }
}
