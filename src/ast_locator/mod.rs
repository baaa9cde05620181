//! Parses located sources and turns the declarations found in them into
//! reflections.

mod collector;
mod constant_checker;
mod strategy;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

pub use collector::{DeclarationNode, LocatedNode, collect_declarations};
pub use constant_checker::ConstantNodeChecker;
pub use strategy::{ConversionStrategy, NodeToReflection};

use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType};
use crate::located_source::LocatedSource;
use crate::names::NameContext;
use crate::parser::ast::{Expr, NameKind, Program};
use crate::parser::parser::parse;
use crate::reflection::Reflection;
use crate::reflector::{FunctionReflector, Reflector};

type FunctionReflectorGetter = Rc<dyn Fn() -> Option<FunctionReflector>>;

/// Which declaration nodes a walk keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSelection {
    /// Named declarations of one kind. `define()` calls count as constants.
    Kind(IdentifierType),
    Closures,
    AnonymousClasses,
    /// Constants declared through `define()` only.
    Defines,
    /// Constants declared through `const` statements only.
    ConstStatements,
}

impl NodeSelection {
    fn accepts(&self, node: &DeclarationNode) -> bool {
        match (self, node) {
            (NodeSelection::Kind(IdentifierType::Class), DeclarationNode::Class(_))
            | (NodeSelection::Kind(IdentifierType::Function), DeclarationNode::Function(_))
            | (
                NodeSelection::Kind(IdentifierType::Constant),
                DeclarationNode::Const { .. } | DeclarationNode::Define(_),
            )
            | (NodeSelection::Closures, DeclarationNode::Closure(_))
            | (NodeSelection::AnonymousClasses, DeclarationNode::AnonymousClass(_))
            | (NodeSelection::Defines, DeclarationNode::Define(_))
            | (NodeSelection::ConstStatements, DeclarationNode::Const { .. }) => true,
            _ => false,
        }
    }
}

pub struct AstLocator {
    strategy: Box<dyn ConversionStrategy>,
    /// Set once the function reflector exists; consulted when deciding whether
    /// a `define()` call is shadowed by a namespaced function.
    function_reflector_getter: RefCell<Option<FunctionReflectorGetter>>,
}

impl AstLocator {
    pub fn new() -> Self {
        Self::with_strategy(NodeToReflection)
    }

    pub fn with_strategy(strategy: impl ConversionStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
            function_reflector_getter: RefCell::new(None),
        }
    }

    pub fn set_function_reflector_getter(
        &self,
        getter: impl Fn() -> Option<FunctionReflector> + 'static,
    ) {
        *self.function_reflector_getter.borrow_mut() = Some(Rc::new(getter));
    }

    /// Parses the source, failing on any syntax error.
    pub fn parse(&self, source: &LocatedSource) -> Result<Program> {
        let program = parse(source.source());
        debug!(
            location = %source.location(),
            statements = program.statements.len(),
            errors = program.errors.len(),
            "parsed source"
        );

        if program.errors.is_empty() {
            return Ok(program);
        }

        let path = source.file_path().map(|path| path.display().to_string());
        let message = program
            .errors
            .iter()
            .map(|error| error.to_human_readable_with_path(source.source(), path.as_deref()))
            .collect::<Vec<_>>()
            .join("\n");
        Err(ReflectionError::ParseToAstFailure {
            location: source.location(),
            message,
        })
    }

    /// The declaration matching `identifier`. Names compare case-insensitively
    /// (constants only in their namespace part).
    pub fn find_reflection(
        &self,
        reflector: &Reflector,
        source: &Rc<LocatedSource>,
        identifier: &Identifier,
    ) -> Result<Reflection> {
        self.find_selected(
            reflector,
            source,
            NodeSelection::Kind(identifier.kind()),
            Some(identifier),
        )?
        .into_iter()
        .next()
        .ok_or_else(|| ReflectionError::not_found(identifier.kind(), identifier.name()))
    }

    /// Every named declaration of `kind`. Closures and anonymous classes are not included.
    pub fn find_reflections_of_kind(
        &self,
        reflector: &Reflector,
        source: &Rc<LocatedSource>,
        kind: IdentifierType,
    ) -> Result<Vec<Reflection>> {
        self.find_selected(reflector, source, NodeSelection::Kind(kind), None)
    }

    /// Declarations picked by `selection`, optionally narrowed to one name.
    pub fn find_selected(
        &self,
        reflector: &Reflector,
        source: &Rc<LocatedSource>,
        selection: NodeSelection,
        identifier: Option<&Identifier>,
    ) -> Result<Vec<Reflection>> {
        let program = self.parse(source)?;
        self.find_in_program(reflector, source, &program, selection, identifier)
    }

    /// Like [`AstLocator::find_selected`] over an already parsed `program`
    /// of `source`.
    pub fn find_in_program(
        &self,
        reflector: &Reflector,
        source: &Rc<LocatedSource>,
        program: &Program,
        selection: NodeSelection,
        identifier: Option<&Identifier>,
    ) -> Result<Vec<Reflection>> {
        let mut reflections = Vec::new();

        for located in collect_declarations(program) {
            if !selection.accepts(&located.node) {
                continue;
            }
            let Some(reflection) = self.strategy.convert(reflector, &located, source)? else {
                continue;
            };
            if let Some(identifier) = identifier
                && !identifier.is_wildcard()
                && !identifier.matches_name(reflection.name())
            {
                continue;
            }
            if let DeclarationNode::Define(call) = &located.node
                && self.is_shadowed_define(reflector, &located.names, call, reflection.name())?
            {
                trace!(constant = reflection.name(), "define() call shadowed by a function");
                continue;
            }
            reflections.push(reflection);
        }

        Ok(reflections)
    }

    /// A `define()` call does not declare a constant when a namespaced
    /// `define` function would be called instead, or when a function with the
    /// constant's qualified name exists.
    ///
    /// Both checks are function lookups through the reflector. Without a
    /// memoizing locator each one can re-read and re-parse every source.
    fn is_shadowed_define(
        &self,
        reflector: &Reflector,
        names: &NameContext,
        call: &Expr,
        constant_name: &str,
    ) -> Result<bool> {
        let getter = self.function_reflector_getter.borrow().clone();
        let functions = getter
            .and_then(|getter| getter())
            .unwrap_or_else(|| FunctionReflector::new(reflector.clone()));

        if let Some(namespace) = names.namespace()
            && callee_is_unqualified(call)
            && functions.has(&format!("{namespace}\\define"))?
        {
            return Ok(true);
        }

        if constant_name.contains('\\') && functions.has(constant_name)? {
            return Ok(true);
        }
        Ok(false)
    }
}

impl Default for AstLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn callee_is_unqualified(call: &Expr) -> bool {
    matches!(
        call,
        Expr::Call { func, .. }
            if matches!(func.as_ref(), Expr::ConstFetch { name, .. } if name.kind == NameKind::Unqualified)
    )
}
