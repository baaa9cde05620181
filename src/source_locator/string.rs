use std::rc::Rc;

use super::{ProvidedSourceLocator, ReflectionScan, SourceLocator, SourceProvider};
use crate::ast_locator::AstLocator;
use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType};
use crate::located_source::LocatedSource;
use crate::reflection::Reflection;
use crate::reflector::Reflector;

struct StringSource(Rc<LocatedSource>);

impl SourceProvider for StringSource {
    fn create_located_source(&self, _identifier: &Identifier) -> Result<Option<Rc<LocatedSource>>> {
        Ok(Some(Rc::clone(&self.0)))
    }
}

/// Everything declared in a piece of in-memory PHP code.
pub struct StringSourceLocator {
    inner: ProvidedSourceLocator<StringSource>,
}

impl StringSourceLocator {
    pub fn new(source: impl Into<String>, ast_locator: Rc<AstLocator>) -> Result<Self> {
        let source = source.into();
        if source.is_empty() {
            return Err(ReflectionError::EmptyPhpSourceCode);
        }
        Ok(Self {
            inner: ProvidedSourceLocator::new(
                StringSource(Rc::new(LocatedSource::new(source, None)?)),
                ast_locator,
            ),
        })
    }
}

impl SourceLocator for StringSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        self.inner.locate_one(reflector, identifier)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        self.inner.locate_all_of_kind(reflector, kind)
    }
}
