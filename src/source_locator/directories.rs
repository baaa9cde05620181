use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;
use walkdir::WalkDir;

use super::{AggregateSourceLocator, ReflectionScan, SingleFileSourceLocator, SourceLocator};
use crate::ast_locator::AstLocator;
use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType};
use crate::reflection::Reflection;
use crate::reflector::Reflector;

/// Every `.php` file below one or more directories. The directories are
/// walked again on each lookup, so files added later are seen.
pub struct DirectoriesSourceLocator {
    directories: Vec<PathBuf>,
    ast_locator: Rc<AstLocator>,
}

impl DirectoriesSourceLocator {
    pub fn new(directories: Vec<PathBuf>, ast_locator: Rc<AstLocator>) -> Result<Self> {
        for directory in &directories {
            if !directory.is_dir() {
                return Err(ReflectionError::InvalidDirectory {
                    path: directory.clone(),
                });
            }
        }
        Ok(Self {
            directories,
            ast_locator,
        })
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Files the locator reads, sorted by path.
    pub fn php_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for directory in &self.directories {
            for entry in WalkDir::new(directory).follow_links(true) {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.file_type().is_file() && is_php_file(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn aggregate(&self) -> Result<AggregateSourceLocator> {
        let files = self.php_files()?;
        debug!(
            directories = self.directories.len(),
            files = files.len(),
            "indexed directories"
        );
        let locators = files
            .into_iter()
            .map(|file| {
                SingleFileSourceLocator::new(file, Rc::clone(&self.ast_locator))
                    .map(|locator| Rc::new(locator) as Rc<dyn SourceLocator>)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AggregateSourceLocator::new(locators))
    }
}

pub(crate) fn is_php_file(path: &std::path::Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("php"))
}

impl SourceLocator for DirectoriesSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        self.aggregate()?.locate_one(reflector, identifier)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        self.aggregate()?.locate_all_of_kind(reflector, kind)
    }
}
