//! Entry point for reflecting symbols: a [`Reflector`] owns the source
//! locator chain and hands out reflections that refer back to it weakly.

mod facades;

use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

pub use facades::{ClassReflector, ConstantReflector, FunctionReflector};

use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType};
use crate::reflection::{Reflection, ReflectionClass, ReflectionConstant, ReflectionFunction};
use crate::source_locator::SourceLocator;

static NEXT_REFLECTOR_ID: AtomicUsize = AtomicUsize::new(1);

struct ReflectorCore {
    id: usize,
    source_locator: Rc<dyn SourceLocator>,
}

/// Cheap to clone; clones share one locator chain and one identity.
#[derive(Clone)]
pub struct Reflector(Rc<ReflectorCore>);

impl Reflector {
    pub fn new(source_locator: Rc<dyn SourceLocator>) -> Self {
        Self(Rc::new(ReflectorCore {
            id: NEXT_REFLECTOR_ID.fetch_add(1, Ordering::Relaxed),
            source_locator,
        }))
    }

    /// Unique for the lifetime of the process.
    pub fn id(&self) -> usize {
        self.0.id
    }

    pub fn source_locator(&self) -> Rc<dyn SourceLocator> {
        Rc::clone(&self.0.source_locator)
    }

    pub fn downgrade(&self) -> WeakReflector {
        WeakReflector(Rc::downgrade(&self.0))
    }

    pub fn reflect(&self, identifier: &Identifier) -> Result<Reflection> {
        match self.0.source_locator.locate_one(self, identifier)? {
            Some(reflection) if identifier.kind().matches(&reflection) => {
                debug!(identifier = %identifier, "reflected");
                Ok(reflection)
            }
            _ => {
                debug!(identifier = %identifier, "not found");
                Err(ReflectionError::not_found(
                    identifier.kind(),
                    identifier.name(),
                ))
            }
        }
    }

    /// Every symbol of `kind` the locator chain can enumerate. Files that fail
    /// to parse are skipped by the aggregate locators and reported in the log.
    pub fn reflect_all(&self, kind: IdentifierType) -> Result<Vec<Reflection>> {
        let scan = self.0.source_locator.locate_all_of_kind(self, kind)?;
        Ok(scan
            .reflections
            .into_iter()
            .filter(|reflection| kind.matches(reflection))
            .collect())
    }

    pub fn reflect_class(&self, name: &str) -> Result<Rc<ReflectionClass>> {
        match self.reflect(&Identifier::class(name)?)? {
            Reflection::Class(class) => Ok(class),
            _ => Err(ReflectionError::not_found(IdentifierType::Class, name)),
        }
    }

    pub fn reflect_function(&self, name: &str) -> Result<Rc<ReflectionFunction>> {
        match self.reflect(&Identifier::function(name)?)? {
            Reflection::Function(function) => Ok(function),
            _ => Err(ReflectionError::not_found(IdentifierType::Function, name)),
        }
    }

    pub fn reflect_constant(&self, name: &str) -> Result<Rc<ReflectionConstant>> {
        match self.reflect(&Identifier::constant(name)?)? {
            Reflection::Constant(constant) => Ok(constant),
            _ => Err(ReflectionError::not_found(IdentifierType::Constant, name)),
        }
    }

    /// `Ok(false)` only for a clean miss; other failures propagate.
    pub fn has_function(&self, name: &str) -> Result<bool> {
        match self.reflect_function(name) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl fmt::Debug for Reflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector").field("id", &self.0.id).finish()
    }
}

/// Back-reference held by reflections.
#[derive(Clone)]
pub struct WeakReflector(Weak<ReflectorCore>);

impl WeakReflector {
    /// A handle that never upgrades.
    pub(crate) fn dangling() -> Self {
        WeakReflector(Weak::new())
    }

    pub fn upgrade(&self) -> Result<Reflector> {
        self.0
            .upgrade()
            .map(Reflector)
            .ok_or(ReflectionError::ReflectorDropped)
    }
}

impl fmt::Debug for WeakReflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.upgrade() {
            Some(core) => write!(f, "WeakReflector({})", core.id),
            None => f.write_str("WeakReflector(dropped)"),
        }
    }
}
