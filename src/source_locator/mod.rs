//! The chain of pluggable source locators. A locator finds the source that
//! declares a symbol and hands it to the AST locator to build reflections.

mod aggregate;
mod anonymous_class;
mod autoload;
mod closure;
mod directories;
mod evaled;
mod file_iterator;
mod memoizing;
mod php_internal;
mod psr;
mod single_file;
mod string;

use std::rc::Rc;

pub use aggregate::AggregateSourceLocator;
pub use anonymous_class::AnonymousClassSourceLocator;
pub use autoload::AutoloadSourceLocator;
pub use closure::ClosureSourceLocator;
pub use directories::DirectoriesSourceLocator;
pub use evaled::EvaledCodeSourceLocator;
pub use file_iterator::FileIteratorSourceLocator;
pub use memoizing::MemoizingSourceLocator;
pub use php_internal::PhpInternalSourceLocator;
pub use psr::{Psr0Mapping, Psr4Mapping, PsrAutoloaderLocator, PsrAutoloaderMapping};
pub use single_file::SingleFileSourceLocator;
pub use string::StringSourceLocator;

use crate::ast_locator::AstLocator;
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::located_source::LocatedSource;
use crate::reflection::Reflection;
use crate::reflector::Reflector;

/// A source that could not be reflected during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub location: String,
    pub message: String,
}

/// Result of enumerating every symbol of one kind.
#[derive(Debug, Clone, Default)]
pub struct ReflectionScan {
    pub reflections: Vec<Reflection>,
    pub failures: Vec<ScanFailure>,
}

impl ReflectionScan {
    pub fn from_reflections(reflections: Vec<Reflection>) -> Self {
        Self {
            reflections,
            failures: Vec::new(),
        }
    }

    pub fn extend(&mut self, other: ReflectionScan) {
        self.reflections.extend(other.reflections);
        self.failures.extend(other.failures);
    }
}

pub trait SourceLocator {
    /// `Ok(None)` when this locator does not know the symbol.
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>>;

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan>;
}

/// Locators that produce source text for an identifier and leave the
/// reflecting to the AST locator.
pub trait SourceProvider {
    /// `Ok(None)` when no source is known. A wildcard identifier asks for the
    /// source holding "everything", where the provider has one.
    fn create_located_source(&self, identifier: &Identifier) -> Result<Option<Rc<LocatedSource>>>;
}

/// Adapts a [`SourceProvider`] into a [`SourceLocator`].
pub struct ProvidedSourceLocator<P> {
    provider: P,
    ast_locator: Rc<AstLocator>,
}

impl<P: SourceProvider> ProvidedSourceLocator<P> {
    pub fn new(provider: P, ast_locator: Rc<AstLocator>) -> Self {
        Self {
            provider,
            ast_locator,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: SourceProvider> SourceLocator for ProvidedSourceLocator<P> {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        let Some(source) = self.provider.create_located_source(identifier)? else {
            return Ok(None);
        };
        find_in_source(&self.ast_locator, reflector, &source, identifier)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        match self.provider.create_located_source(&Identifier::wildcard(kind))? {
            Some(source) => Ok(ReflectionScan::from_reflections(
                self.ast_locator
                    .find_reflections_of_kind(reflector, &source, kind)?,
            )),
            None => Ok(ReflectionScan::default()),
        }
    }
}

/// Runs the AST locator over one source, mapping "not declared here" to `None`.
pub(crate) fn find_in_source(
    ast_locator: &AstLocator,
    reflector: &Reflector,
    source: &Rc<LocatedSource>,
    identifier: &Identifier,
) -> Result<Option<Reflection>> {
    match ast_locator.find_reflection(reflector, source, identifier) {
        Ok(reflection) => Ok(Some(reflection)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}
