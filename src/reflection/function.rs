use std::fmt;
use std::path::Path;
use std::rc::Rc;

use super::types::TypeScope;
use super::{ReflectionClass, ReflectionParameter, ReflectionType, SourceContext};
use crate::identifier::split_namespace;
use crate::located_source::LocatedSource;
use crate::parser::ast::{FunctionDecl, FunctionKind};

/// State shared by functions, closures and methods.
#[derive(Clone)]
pub struct FunctionCore {
    ctx: SourceContext,
    node: Rc<FunctionDecl>,
    /// Class that `self` refers to inside the body; `None` for functions.
    self_class: Option<Rc<ReflectionClass>>,
}

impl FunctionCore {
    pub(crate) fn new(
        ctx: SourceContext,
        node: Rc<FunctionDecl>,
        self_class: Option<Rc<ReflectionClass>>,
    ) -> Self {
        Self {
            ctx,
            node,
            self_class,
        }
    }

    pub fn node(&self) -> &Rc<FunctionDecl> {
        &self.node
    }

    pub fn context(&self) -> &SourceContext {
        &self.ctx
    }

    pub fn self_class(&self) -> Option<&Rc<ReflectionClass>> {
        self.self_class.as_ref()
    }

    pub(crate) fn with_self_class(&self, self_class: Rc<ReflectionClass>) -> Self {
        Self {
            ctx: self.ctx.clone(),
            node: Rc::clone(&self.node),
            self_class: Some(self_class),
        }
    }

    pub(crate) fn type_scope(&self) -> TypeScope<'_> {
        TypeScope {
            names: self.ctx.names(),
            self_class: self.self_class.as_ref().map(|class| class.name()),
            parent_class: self
                .self_class
                .as_ref()
                .and_then(|class| class.parent_class_name()),
            reflector: self.ctx.weak_reflector(),
        }
    }
}

/// Accessors common to functions and methods.
pub trait FunctionLike {
    fn core(&self) -> &FunctionCore;

    fn name(&self) -> &str;

    fn short_name(&self) -> &str {
        split_namespace(self.name()).1
    }

    fn parameters(&self) -> Vec<ReflectionParameter> {
        let core = self.core();
        (0..core.node.params.len())
            .map(|position| ReflectionParameter::new(core.clone(), self.name(), position))
            .collect()
    }

    fn parameter(&self, name: &str) -> Option<ReflectionParameter> {
        let name = name.trim_start_matches('$');
        let core = self.core();
        core.node
            .params
            .iter()
            .position(|param| param.name.name == name)
            .map(|position| ReflectionParameter::new(core.clone(), self.name(), position))
    }

    fn number_of_parameters(&self) -> usize {
        self.core().node.params.len()
    }

    /// Parameters up to and including the last one without a default.
    fn number_of_required_parameters(&self) -> usize {
        self.core()
            .node
            .params
            .iter()
            .rposition(|param| param.default.is_none() && !param.variadic)
            .map_or(0, |last| last + 1)
    }

    fn has_return_type(&self) -> bool {
        self.core().node.return_type.is_some()
    }

    fn return_type(&self) -> Option<ReflectionType> {
        let core = self.core();
        core.node
            .return_type
            .as_ref()
            .map(|ty| ReflectionType::from_ast(ty, &core.type_scope()))
    }

    fn returns_reference(&self) -> bool {
        self.core().node.by_ref
    }

    fn is_generator(&self) -> bool {
        self.core()
            .node
            .body
            .as_ref()
            .is_some_and(|body| body.has_yield)
    }

    fn is_variadic(&self) -> bool {
        self.core().node.params.iter().any(|param| param.variadic)
    }

    fn is_closure(&self) -> bool {
        matches!(
            self.core().node.kind,
            FunctionKind::Closure | FunctionKind::ArrowFunction
        )
    }

    fn is_deprecated(&self) -> bool {
        super::is_deprecated_doc(self.doc_comment())
    }

    fn doc_comment(&self) -> Option<&str> {
        let core = self.core();
        core.ctx.doc_comment(core.node.doc_comment)
    }

    fn attribute_names(&self) -> Vec<String> {
        let core = self.core();
        core.ctx.attribute_names(&core.node.attributes)
    }

    fn start_line(&self) -> usize {
        let core = self.core();
        core.ctx.lines(core.node.span).0
    }

    fn end_line(&self) -> usize {
        let core = self.core();
        core.ctx.lines(core.node.span).1
    }

    fn file_name(&self) -> Option<&Path> {
        self.core().ctx.file_path()
    }

    fn located_source(&self) -> &Rc<LocatedSource> {
        self.core().ctx.source()
    }

    fn is_internal(&self) -> bool {
        self.core().ctx.source().is_internal()
    }

    fn is_user_defined(&self) -> bool {
        !self.is_internal()
    }

    fn extension_name(&self) -> Option<&str> {
        self.core().ctx.source().extension_name()
    }
}

/// A named function or a closure.
pub struct ReflectionFunction {
    core: FunctionCore,
    name: String,
}

impl ReflectionFunction {
    pub(crate) fn new(ctx: SourceContext, node: Rc<FunctionDecl>, name: String) -> Self {
        Self {
            core: FunctionCore::new(ctx, node, None),
            name,
        }
    }

    pub fn namespace_name(&self) -> Option<&str> {
        self.core.ctx.names().namespace()
    }

    pub fn in_namespace(&self) -> bool {
        self.namespace_name().is_some()
    }

    /// `static function () {}` and `static fn () => ...`.
    pub fn is_static(&self) -> bool {
        self.core.node.modifiers.is_static
    }

    pub fn is_arrow_function(&self) -> bool {
        self.core.node.kind == FunctionKind::ArrowFunction
    }

    /// Variables a closure imports with `use`.
    pub fn closure_used_variables(&self) -> Vec<&str> {
        self.core
            .node
            .uses
            .iter()
            .map(|used| used.name.name.as_str())
            .collect()
    }
}

impl FunctionLike for ReflectionFunction {
    fn core(&self) -> &FunctionCore {
        &self.core
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn short_name(&self) -> &str {
        if self.is_closure() {
            return &self.name;
        }
        split_namespace(&self.name).1
    }
}

impl fmt::Debug for ReflectionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionFunction")
            .field("name", &self.name)
            .field("source", self.core.ctx.source())
            .finish()
    }
}
