use std::fmt;
use std::path::Path;
use std::rc::Rc;

use super::SourceContext;
use crate::error::{ReflectionError, Result};
use crate::identifier::split_namespace;
use crate::located_source::LocatedSource;
use crate::node_compiler::{CompilerContext, Value, compile_at};
use crate::parser::Span;
use crate::parser::ast::{ConstGroup, Expr};

#[derive(Clone)]
enum ConstantNode {
    /// One entry of a `const A = 1, B = 2;` statement.
    Const { group: Rc<ConstGroup>, index: usize },
    /// A `define('NAME', value)` call.
    Define { call: Rc<Expr> },
}

/// A global constant.
pub struct ReflectionConstant {
    ctx: SourceContext,
    node: ConstantNode,
    name: String,
}

impl ReflectionConstant {
    pub(crate) fn from_const(ctx: SourceContext, group: Rc<ConstGroup>, index: usize) -> Self {
        let name = ctx.names().qualify(&group.entries[index].name.name);
        Self {
            ctx,
            node: ConstantNode::Const { group, index },
            name,
        }
    }

    /// `name` is the literal first argument of the call, leading separator removed.
    pub(crate) fn from_define(ctx: SourceContext, call: Rc<Expr>, name: String) -> Self {
        Self {
            ctx,
            node: ConstantNode::Define { call },
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        split_namespace(&self.name).1
    }

    pub fn namespace_name(&self) -> Option<&str> {
        match split_namespace(&self.name).0 {
            "" => None,
            namespace => Some(namespace),
        }
    }

    pub fn in_namespace(&self) -> bool {
        self.namespace_name().is_some()
    }

    pub fn is_defined_by_call(&self) -> bool {
        matches!(self.node, ConstantNode::Define { .. })
    }

    fn value_expr(&self) -> Result<&Expr> {
        match &self.node {
            ConstantNode::Const { group, index } => Ok(group.entries[*index].value.as_ref()),
            ConstantNode::Define { call } => match call.as_ref() {
                Expr::Call { args, .. } if args.len() >= 2 => Ok(&args[1].value),
                _ => Err(ReflectionError::InvalidConstantNode(format!(
                    "define() call for {} has no value argument",
                    self.name
                ))),
            },
        }
    }

    pub fn value(&self) -> Result<Value> {
        self.value_at(0)
    }

    pub(crate) fn value_at(&self, depth: usize) -> Result<Value> {
        let context = CompilerContext::for_source(&self.ctx, None)?;
        compile_at(self.value_expr()?, &context, depth)
    }

    fn span(&self) -> Span {
        match &self.node {
            ConstantNode::Const { group, index } => group.entries[*index].span,
            ConstantNode::Define { call } => call.span(),
        }
    }

    pub fn doc_comment(&self) -> Option<&str> {
        match &self.node {
            ConstantNode::Const { group, .. } => self.ctx.doc_comment(group.doc_comment),
            ConstantNode::Define { .. } => None,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        super::is_deprecated_doc(self.doc_comment())
    }

    pub fn start_line(&self) -> usize {
        self.ctx.lines(self.span()).0
    }

    pub fn end_line(&self) -> usize {
        self.ctx.lines(self.span()).1
    }

    pub fn located_source(&self) -> &Rc<LocatedSource> {
        self.ctx.source()
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.ctx.file_path()
    }

    pub fn is_internal(&self) -> bool {
        self.ctx.source().is_internal()
    }

    pub fn is_user_defined(&self) -> bool {
        !self.is_internal()
    }

    pub fn extension_name(&self) -> Option<&str> {
        self.ctx.source().extension_name()
    }
}

impl fmt::Debug for ReflectionConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionConstant")
            .field("name", &self.name)
            .field("source", self.ctx.source())
            .finish()
    }
}
