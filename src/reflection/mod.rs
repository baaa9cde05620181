//! The reflection model. Objects are built from a shared syntax node and the
//! located source it came from; anything that needs another symbol is looked
//! up through the reflector on demand.

mod class;
mod class_constant;
mod constant;
mod enum_case;
mod function;
mod method;
mod parameter;
mod property;
mod types;

use std::fmt;
use std::path::Path;
use std::rc::Rc;

pub use class::ReflectionClass;
pub use class_constant::ReflectionClassConstant;
pub use constant::ReflectionConstant;
pub use enum_case::ReflectionEnumCase;
pub use function::{FunctionCore, FunctionLike, ReflectionFunction};
pub use method::ReflectionMethod;
pub use parameter::ReflectionParameter;
pub use property::ReflectionProperty;
pub use types::{ReflectionNamedType, ReflectionType};

use crate::error::{ReflectionError, Result};
use crate::identifier::IdentifierType;
use crate::located_source::LocatedSource;
use crate::names::NameContext;
use crate::parser::Span;
use crate::parser::ast::{AttributeGroup, Visibility};
use crate::reflector::{Reflector, WeakReflector};

/// Bound on parent/interface/trait walks; deeper chains are treated as cycles.
pub(crate) const MAX_INHERITANCE_DEPTH: usize = 64;

pub(crate) fn check_depth(depth: usize, class_name: &str) -> Result<()> {
    if depth > MAX_INHERITANCE_DEPTH {
        return Err(ReflectionError::CircularReference(class_name.to_string()));
    }
    Ok(())
}

/// A top-level reflection as produced by the locator chain.
#[derive(Debug, Clone)]
pub enum Reflection {
    Class(Rc<ReflectionClass>),
    Function(Rc<ReflectionFunction>),
    Constant(Rc<ReflectionConstant>),
}

impl Reflection {
    pub fn name(&self) -> &str {
        match self {
            Reflection::Class(class) => class.name(),
            Reflection::Function(function) => function.name(),
            Reflection::Constant(constant) => constant.name(),
        }
    }

    pub fn kind(&self) -> IdentifierType {
        match self {
            Reflection::Class(_) => IdentifierType::Class,
            Reflection::Function(_) => IdentifierType::Function,
            Reflection::Constant(_) => IdentifierType::Constant,
        }
    }

    pub fn located_source(&self) -> &Rc<LocatedSource> {
        match self {
            Reflection::Class(class) => class.located_source(),
            Reflection::Function(function) => function.located_source(),
            Reflection::Constant(constant) => constant.located_source(),
        }
    }
}

/// What every reflection built from one parse shares.
#[derive(Clone)]
pub struct SourceContext {
    reflector: WeakReflector,
    source: Rc<LocatedSource>,
    names: Rc<NameContext>,
}

impl SourceContext {
    pub fn new(reflector: &Reflector, source: Rc<LocatedSource>, names: Rc<NameContext>) -> Self {
        Self {
            reflector: reflector.downgrade(),
            source,
            names,
        }
    }

    pub fn reflector(&self) -> Result<Reflector> {
        self.reflector.upgrade()
    }

    pub fn source(&self) -> &Rc<LocatedSource> {
        &self.source
    }

    pub fn names(&self) -> &NameContext {
        &self.names
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.source.file_path()
    }

    pub(crate) fn weak_reflector(&self) -> &WeakReflector {
        &self.reflector
    }

    pub(crate) fn doc_comment(&self, span: Option<Span>) -> Option<&str> {
        span.map(|span| self.source.text(span))
    }

    pub(crate) fn lines(&self, span: Span) -> (usize, usize) {
        self.source.line_span(span)
    }

    pub(crate) fn attribute_names(&self, groups: &[AttributeGroup]) -> Vec<String> {
        groups
            .iter()
            .flat_map(|group| &group.attributes)
            .map(|attribute| self.names.resolve_class_name(&attribute.name))
            .collect()
    }
}

impl fmt::Debug for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceContext")
            .field("source", &self.source)
            .field("namespace", &self.names.namespace())
            .finish()
    }
}

pub(crate) fn is_deprecated_doc(doc_comment: Option<&str>) -> bool {
    doc_comment.is_some_and(|doc| {
        doc.lines().any(|line| {
            let line = line.trim_start().trim_start_matches(['/', '*']).trim_start();
            line.strip_prefix("@deprecated")
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        })
    })
}

pub(crate) fn visibility_name(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public",
        Visibility::Protected => "protected",
        Visibility::Private => "private",
    }
}
