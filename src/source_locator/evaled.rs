use std::rc::Rc;

use tracing::debug;

use super::{ProvidedSourceLocator, ReflectionScan, SourceLocator, SourceProvider};
use crate::ast_locator::AstLocator;
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::located_source::LocatedSource;
use crate::reflection::Reflection;
use crate::reflector::Reflector;
use crate::runtime::{RuntimeSnapshot, SymbolOrigin};
use crate::source_stubber::SourceStubber;

struct EvaledSource {
    runtime: Rc<dyn RuntimeSnapshot>,
    stubber: Rc<dyn SourceStubber>,
}

impl SourceProvider for EvaledSource {
    fn create_located_source(&self, identifier: &Identifier) -> Result<Option<Rc<LocatedSource>>> {
        if !identifier.is_class() || identifier.is_wildcard() {
            return Ok(None);
        }
        if self.runtime.class_origin(identifier.name()) != Some(SymbolOrigin::Evaled) {
            return Ok(None);
        }
        let Some(stub) = self.stubber.generate_class_stub(identifier.name()) else {
            debug!(class = identifier.name(), "no stub for evaled class");
            return Ok(None);
        };
        Ok(Some(Rc::new(LocatedSource::evaled(stub.code))))
    }
}

/// Classes the host runtime declared through `eval()`, reflected from stubs.
pub struct EvaledCodeSourceLocator {
    inner: ProvidedSourceLocator<EvaledSource>,
}

impl EvaledCodeSourceLocator {
    pub fn new(
        runtime: Rc<dyn RuntimeSnapshot>,
        stubber: Rc<dyn SourceStubber>,
        ast_locator: Rc<AstLocator>,
    ) -> Self {
        Self {
            inner: ProvidedSourceLocator::new(EvaledSource { runtime, stubber }, ast_locator),
        }
    }
}

impl SourceLocator for EvaledCodeSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        self.inner.locate_one(reflector, identifier)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        self.inner.locate_all_of_kind(reflector, kind)
    }
}
