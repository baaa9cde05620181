//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use php_reflect::identifier::{Identifier, IdentifierType};
use php_reflect::reflection::Reflection;
use php_reflect::reflector::Reflector;
use php_reflect::source_locator::{ReflectionScan, SourceLocator};
use php_reflect::{ReflectionBuilder, ReflectionEnvironment, Result};

/// Environment over a single PHP string, with core stubs available.
pub fn env_for(code: &str) -> ReflectionEnvironment {
    ReflectionBuilder::new()
        .with_string(code)
        .with_core_stubs()
        .build()
        .expect("environment should build")
}

/// Writes `contents` to `dir/relative`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    fs::write(&path, contents).expect("write fixture");
    path
}

/// Wraps a locator and counts how often it is asked.
pub struct CountingLocator {
    inner: Rc<dyn SourceLocator>,
    pub locate_one_calls: Cell<usize>,
    pub locate_all_calls: Cell<usize>,
}

impl CountingLocator {
    pub fn new(inner: Rc<dyn SourceLocator>) -> Rc<Self> {
        Rc::new(Self {
            inner,
            locate_one_calls: Cell::new(0),
            locate_all_calls: Cell::new(0),
        })
    }
}

impl SourceLocator for CountingLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        self.locate_one_calls.set(self.locate_one_calls.get() + 1);
        self.inner.locate_one(reflector, identifier)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        self.locate_all_calls.set(self.locate_all_calls.get() + 1);
        self.inner.locate_all_of_kind(reflector, kind)
    }
}

/// A locator that never finds anything.
pub struct EmptyLocator;

impl SourceLocator for EmptyLocator {
    fn locate_one(&self, _reflector: &Reflector, _identifier: &Identifier) -> Result<Option<Reflection>> {
        Ok(None)
    }

    fn locate_all_of_kind(&self, _reflector: &Reflector, _kind: IdentifierType) -> Result<ReflectionScan> {
        Ok(ReflectionScan::default())
    }
}
