use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use super::{ReflectionScan, SourceLocator};
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::reflection::Reflection;
use crate::reflector::Reflector;

type LookupKey = (usize, IdentifierType, String);

/// Caches the wrapped locator's answers per reflector, misses included.
/// Errors are not cached.
pub struct MemoizingSourceLocator {
    inner: Rc<dyn SourceLocator>,
    lookups: RefCell<HashMap<LookupKey, Option<Reflection>>>,
    scans: RefCell<HashMap<(usize, IdentifierType), ReflectionScan>>,
}

impl MemoizingSourceLocator {
    pub fn new(inner: Rc<dyn SourceLocator>) -> Self {
        Self {
            inner,
            lookups: RefCell::new(HashMap::new()),
            scans: RefCell::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &Rc<dyn SourceLocator> {
        &self.inner
    }

    /// Class and function names fold case; constant names do not.
    fn lookup_key(reflector: &Reflector, identifier: &Identifier) -> LookupKey {
        let name = identifier.name();
        let name = name.strip_prefix('\\').unwrap_or(name);
        let name = match identifier.kind() {
            IdentifierType::Constant => name.to_string(),
            _ => name.to_ascii_lowercase(),
        };
        (reflector.id(), identifier.kind(), name)
    }
}

impl SourceLocator for MemoizingSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        let key = Self::lookup_key(reflector, identifier);
        if let Some(cached) = self.lookups.borrow().get(&key) {
            trace!(identifier = %identifier, hit = cached.is_some(), "memoized lookup");
            return Ok(cached.clone());
        }

        // The wrapped locator may reenter through the reflector, so no borrow
        // is held while it runs.
        let found = self.inner.locate_one(reflector, identifier)?;
        self.lookups.borrow_mut().insert(key, found.clone());
        Ok(found)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        let key = (reflector.id(), kind);
        if let Some(cached) = self.scans.borrow().get(&key) {
            trace!(%kind, "memoized scan");
            return Ok(cached.clone());
        }

        let scan = self.inner.locate_all_of_kind(reflector, kind)?;
        self.scans.borrow_mut().insert(key, scan.clone());
        Ok(scan)
    }
}
