//! Assembles a reflector from the sources an embedder knows about.

use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;

use crate::ast_locator::AstLocator;
use crate::error::Result;
use crate::reflector::{ClassReflector, ConstantReflector, FunctionReflector, Reflector};
use crate::runtime::RuntimeSnapshot;
use crate::source_locator::{
    AggregateSourceLocator, AutoloadSourceLocator, DirectoriesSourceLocator,
    EvaledCodeSourceLocator, MemoizingSourceLocator, PhpInternalSourceLocator, Psr0Mapping,
    Psr4Mapping, PsrAutoloaderLocator, SingleFileSourceLocator, SourceLocator,
    StringSourceLocator,
};
use crate::source_stubber::{CoreStubs, SourceStubber, StubData};

enum SourceEntry {
    File(PathBuf),
    String(String),
    Directories(Vec<PathBuf>),
    Psr4(Psr4Mapping),
    Psr0(Psr0Mapping),
    Locator(Rc<dyn SourceLocator>),
}

/// Builder for a [`ReflectionEnvironment`].
///
/// Sources are consulted in the order they were added, then classes the
/// host runtime declared through `eval()`, then stubs for built-in symbols,
/// then the host runtime's autoloaders.
///
/// # Example
/// ```
/// use php_reflect::ReflectionBuilder;
///
/// let env = ReflectionBuilder::new()
///     .with_string("<?php class Foo {}")
///     .build()?;
/// assert_eq!(env.classes().reflect("foo")?.name(), "Foo");
/// # Ok::<(), php_reflect::ReflectionError>(())
/// ```
pub struct ReflectionBuilder {
    sources: Vec<SourceEntry>,
    runtime: Option<Rc<dyn RuntimeSnapshot>>,
    stubbers: Vec<Rc<dyn SourceStubber>>,
    memoize: bool,
    ast_locator: Rc<AstLocator>,
}

impl ReflectionBuilder {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            runtime: None,
            stubbers: Vec::new(),
            memoize: true,
            ast_locator: Rc::new(AstLocator::new()),
        }
    }

    /// The AST locator the built locators share. Custom locators passed to
    /// [`with_locator`](Self::with_locator) should use it too.
    pub fn ast_locator(&self) -> Rc<AstLocator> {
        Rc::clone(&self.ast_locator)
    }

    pub fn with_ast_locator(mut self, ast_locator: AstLocator) -> Self {
        self.ast_locator = Rc::new(ast_locator);
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(SourceEntry::File(path.into()));
        self
    }

    pub fn with_string(mut self, source: impl Into<String>) -> Self {
        self.sources.push(SourceEntry::String(source.into()));
        self
    }

    pub fn with_directories<P: Into<PathBuf>>(mut self, directories: impl IntoIterator<Item = P>) -> Self {
        self.sources.push(SourceEntry::Directories(
            directories.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn with_psr4(mut self, mapping: Psr4Mapping) -> Self {
        self.sources.push(SourceEntry::Psr4(mapping));
        self
    }

    pub fn with_psr0(mut self, mapping: Psr0Mapping) -> Self {
        self.sources.push(SourceEntry::Psr0(mapping));
        self
    }

    pub fn with_locator(mut self, locator: Rc<dyn SourceLocator>) -> Self {
        self.sources.push(SourceEntry::Locator(locator));
        self
    }

    /// Enables lookups through the host runtime: autoloading and classes
    /// declared through `eval()`.
    pub fn with_runtime(mut self, runtime: Rc<dyn RuntimeSnapshot>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Adds a stubber for built-in symbols. Stubbers are asked in the order
    /// they were added.
    pub fn with_stubber(mut self, stubber: Rc<dyn SourceStubber>) -> Self {
        self.stubbers.push(stubber);
        self
    }

    /// Adds stubs for the core interfaces, classes, functions and constants.
    pub fn with_core_stubs(self) -> Self {
        self.with_stubber(Rc::new(CoreStubs))
    }

    /// Caching of lookups, on by default.
    pub fn with_memoization(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    pub fn build(self) -> Result<ReflectionEnvironment> {
        let ast_locator = self.ast_locator;
        let mut locators: Vec<Rc<dyn SourceLocator>> = Vec::with_capacity(self.sources.len() + 3);

        for entry in self.sources {
            let locator: Rc<dyn SourceLocator> = match entry {
                SourceEntry::File(path) => {
                    Rc::new(SingleFileSourceLocator::new(path, Rc::clone(&ast_locator))?)
                }
                SourceEntry::String(source) => {
                    Rc::new(StringSourceLocator::new(source, Rc::clone(&ast_locator))?)
                }
                SourceEntry::Directories(directories) => Rc::new(DirectoriesSourceLocator::new(
                    directories,
                    Rc::clone(&ast_locator),
                )?),
                SourceEntry::Psr4(mapping) => {
                    Rc::new(PsrAutoloaderLocator::new(mapping, Rc::clone(&ast_locator)))
                }
                SourceEntry::Psr0(mapping) => {
                    Rc::new(PsrAutoloaderLocator::new(mapping, Rc::clone(&ast_locator)))
                }
                SourceEntry::Locator(locator) => locator,
            };
            locators.push(locator);
        }

        let stubber: Option<Rc<dyn SourceStubber>> = match self.stubbers.len() {
            0 => None,
            1 => self.stubbers.into_iter().next(),
            _ => Some(Rc::new(StubberChain(self.stubbers))),
        };

        // Evaled classes are stubbed by the same stubbers as built-ins, so
        // they must be claimed before the internal locator sees them.
        if let (Some(runtime), Some(stubber)) = (&self.runtime, &stubber) {
            locators.push(Rc::new(EvaledCodeSourceLocator::new(
                Rc::clone(runtime),
                Rc::clone(stubber),
                Rc::clone(&ast_locator),
            )));
        }
        if let Some(stubber) = &stubber {
            locators.push(Rc::new(PhpInternalSourceLocator::new(
                Rc::clone(stubber),
                Rc::clone(&ast_locator),
            )));
        }
        if let Some(runtime) = &self.runtime {
            locators.push(Rc::new(AutoloadSourceLocator::new(
                Rc::clone(runtime),
                Rc::clone(&ast_locator),
            )));
        }

        debug!(locators = locators.len(), memoize = self.memoize, "building reflector");

        let aggregate: Rc<dyn SourceLocator> = Rc::new(AggregateSourceLocator::new(locators));
        let source_locator: Rc<dyn SourceLocator> = if self.memoize {
            Rc::new(MemoizingSourceLocator::new(aggregate))
        } else {
            aggregate
        };

        let reflector = Reflector::new(Rc::clone(&source_locator));
        let weak = reflector.downgrade();
        ast_locator.set_function_reflector_getter(move || {
            weak.upgrade().ok().map(FunctionReflector::new)
        });

        Ok(ReflectionEnvironment {
            reflector,
            ast_locator,
            source_locator,
        })
    }
}

impl Default for ReflectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Asks each stubber in turn.
struct StubberChain(Vec<Rc<dyn SourceStubber>>);

impl SourceStubber for StubberChain {
    fn generate_class_stub(&self, class_name: &str) -> Option<StubData> {
        self.0.iter().find_map(|s| s.generate_class_stub(class_name))
    }

    fn generate_function_stub(&self, function_name: &str) -> Option<StubData> {
        self.0.iter().find_map(|s| s.generate_function_stub(function_name))
    }

    fn generate_constant_stub(&self, constant_name: &str) -> Option<StubData> {
        self.0.iter().find_map(|s| s.generate_constant_stub(constant_name))
    }
}

/// A configured reflector together with the pieces it was built from.
pub struct ReflectionEnvironment {
    reflector: Reflector,
    ast_locator: Rc<AstLocator>,
    source_locator: Rc<dyn SourceLocator>,
}

impl ReflectionEnvironment {
    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    pub fn classes(&self) -> ClassReflector {
        ClassReflector::new(self.reflector.clone())
    }

    pub fn functions(&self) -> FunctionReflector {
        FunctionReflector::new(self.reflector.clone())
    }

    pub fn constants(&self) -> ConstantReflector {
        ConstantReflector::new(self.reflector.clone())
    }

    pub fn ast_locator(&self) -> &Rc<AstLocator> {
        &self.ast_locator
    }

    pub fn source_locator(&self) -> &Rc<dyn SourceLocator> {
        &self.source_locator
    }
}
