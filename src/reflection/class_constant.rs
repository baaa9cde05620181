use std::fmt;
use std::rc::Rc;

use super::{ReflectionClass, ReflectionType, SourceContext};
use crate::error::Result;
use crate::node_compiler::{CompilerContext, Value, compile_at};
use crate::parser::ast::{ConstEntry, ConstGroup, Visibility};

pub struct ReflectionClassConstant {
    ctx: SourceContext,
    class: Rc<ReflectionClass>,
    group: Rc<ConstGroup>,
    index: usize,
}

impl ReflectionClassConstant {
    pub(crate) fn new(
        ctx: SourceContext,
        class: Rc<ReflectionClass>,
        group: Rc<ConstGroup>,
        index: usize,
    ) -> Self {
        Self {
            ctx,
            class,
            group,
            index,
        }
    }

    fn entry(&self) -> &ConstEntry {
        &self.group.entries[self.index]
    }

    pub fn name(&self) -> &str {
        &self.entry().name.name
    }

    pub fn declaring_class(&self) -> &Rc<ReflectionClass> {
        &self.class
    }

    /// Compiled with `self` bound to the declaring class. The value is kept
    /// on the declaring class, so later lookups of the same constant reuse it.
    pub fn value(&self) -> Result<Value> {
        self.value_at(0)
    }

    pub(crate) fn value_at(&self, depth: usize) -> Result<Value> {
        if let Some(value) = self.class.cached_constant_value(self.name()) {
            return Ok(value);
        }
        let context = CompilerContext::for_source(&self.ctx, Some(Rc::clone(&self.class)))?;
        let value = compile_at(&self.entry().value, &context, depth)?;
        self.class.cache_constant_value(self.name(), value.clone());
        Ok(value)
    }

    pub fn visibility(&self) -> Visibility {
        self.group.modifiers.visibility.unwrap_or(Visibility::Public)
    }

    pub fn is_public(&self) -> bool {
        self.visibility() == Visibility::Public
    }

    pub fn is_private(&self) -> bool {
        self.visibility() == Visibility::Private
    }

    pub fn is_final(&self) -> bool {
        self.group.modifiers.is_final
    }

    pub fn has_type(&self) -> bool {
        self.group.ty.is_some()
    }

    pub fn constant_type(&self) -> Option<ReflectionType> {
        self.group
            .ty
            .as_ref()
            .map(|ty| ReflectionType::from_ast(ty, &self.class.type_scope()))
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.ctx.doc_comment(self.group.doc_comment)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.ctx.attribute_names(&self.group.attributes)
    }

    pub fn start_line(&self) -> usize {
        self.ctx.lines(self.entry().span).0
    }

    pub fn end_line(&self) -> usize {
        self.ctx.lines(self.entry().span).1
    }
}

impl fmt::Debug for ReflectionClassConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReflectionClassConstant({}::{})",
            self.class.name(),
            self.name()
        )
    }
}
