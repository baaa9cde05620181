use std::rc::Rc;

use super::{ProvidedSourceLocator, ReflectionScan, SourceLocator, SourceProvider};
use crate::ast_locator::AstLocator;
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::located_source::LocatedSource;
use crate::reflection::Reflection;
use crate::reflector::Reflector;
use crate::source_stubber::SourceStubber;

struct InternalSource {
    stubber: Rc<dyn SourceStubber>,
}

impl SourceProvider for InternalSource {
    fn create_located_source(&self, identifier: &Identifier) -> Result<Option<Rc<LocatedSource>>> {
        if identifier.is_wildcard() {
            return Ok(None);
        }
        let name = identifier.name();
        let stub = match identifier.kind() {
            IdentifierType::Class => self.stubber.generate_class_stub(name),
            IdentifierType::Function => self.stubber.generate_function_stub(name),
            IdentifierType::Constant => self.stubber.generate_constant_stub(name),
        };
        Ok(stub.map(|stub| Rc::new(LocatedSource::internal(stub.code, stub.extension))))
    }
}

/// Built-in symbols of the runtime, reflected from stubs. Cannot enumerate.
pub struct PhpInternalSourceLocator {
    inner: ProvidedSourceLocator<InternalSource>,
}

impl PhpInternalSourceLocator {
    pub fn new(stubber: Rc<dyn SourceStubber>, ast_locator: Rc<AstLocator>) -> Self {
        Self {
            inner: ProvidedSourceLocator::new(InternalSource { stubber }, ast_locator),
        }
    }
}

impl SourceLocator for PhpInternalSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        self.inner.locate_one(reflector, identifier)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        self.inner.locate_all_of_kind(reflector, kind)
    }
}
