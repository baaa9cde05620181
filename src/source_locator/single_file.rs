use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{ProvidedSourceLocator, ReflectionScan, SourceLocator, SourceProvider};
use crate::ast_locator::AstLocator;
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::located_source::{LocatedSource, validate_file};
use crate::reflection::Reflection;
use crate::reflector::Reflector;

struct FileSource {
    path: PathBuf,
}

impl SourceProvider for FileSource {
    /// Read on every call; repeated lookups are cached by `MemoizingSourceLocator`.
    fn create_located_source(&self, _identifier: &Identifier) -> Result<Option<Rc<LocatedSource>>> {
        Ok(Some(Rc::new(LocatedSource::from_file(&self.path)?)))
    }
}

/// Everything declared in one file on disk.
pub struct SingleFileSourceLocator {
    inner: ProvidedSourceLocator<FileSource>,
}

impl SingleFileSourceLocator {
    pub fn new(path: impl Into<PathBuf>, ast_locator: Rc<AstLocator>) -> Result<Self> {
        let path = path.into();
        validate_file(&path)?;
        Ok(Self {
            inner: ProvidedSourceLocator::new(
                FileSource { path },
                ast_locator,
            ),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.provider().path
    }
}

impl SourceLocator for SingleFileSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        self.inner.locate_one(reflector, identifier)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        self.inner.locate_all_of_kind(reflector, kind)
    }
}
