use std::fmt;
use std::rc::Rc;

use super::{ReflectionClass, ReflectionType, SourceContext};
use crate::error::Result;
use crate::node_compiler::{CompilerContext, Value, compile};
use crate::parser::Span;
use crate::parser::ast::{FunctionDecl, Modifiers, PropertyGroup, Type, Visibility};

#[derive(Clone)]
enum PropertyNode {
    Declared {
        group: Rc<PropertyGroup>,
        index: usize,
    },
    /// Promoted constructor parameter.
    Promoted {
        constructor: Rc<FunctionDecl>,
        index: usize,
    },
}

pub struct ReflectionProperty {
    ctx: SourceContext,
    class: Rc<ReflectionClass>,
    node: PropertyNode,
    trait_name: Option<String>,
}

impl ReflectionProperty {
    pub(crate) fn declared(
        class: &Rc<ReflectionClass>,
        group: Rc<PropertyGroup>,
        index: usize,
    ) -> Rc<Self> {
        Rc::new(Self {
            ctx: class.context().clone(),
            class: Rc::clone(class),
            node: PropertyNode::Declared { group, index },
            trait_name: None,
        })
    }

    pub(crate) fn promoted(
        class: &Rc<ReflectionClass>,
        constructor: Rc<FunctionDecl>,
        index: usize,
    ) -> Rc<Self> {
        Rc::new(Self {
            ctx: class.context().clone(),
            class: Rc::clone(class),
            node: PropertyNode::Promoted { constructor, index },
            trait_name: None,
        })
    }

    pub(crate) fn adopted_by(&self, class: &Rc<ReflectionClass>) -> Rc<Self> {
        Rc::new(Self {
            ctx: self.ctx.clone(),
            class: Rc::clone(class),
            node: self.node.clone(),
            trait_name: Some(
                self.trait_name
                    .clone()
                    .unwrap_or_else(|| self.class.name().to_string()),
            ),
        })
    }

    pub fn name(&self) -> &str {
        match &self.node {
            PropertyNode::Declared { group, index } => &group.entries[*index].name.name,
            PropertyNode::Promoted { constructor, index } => &constructor.params[*index].name.name,
        }
    }

    fn modifiers(&self) -> &Modifiers {
        match &self.node {
            PropertyNode::Declared { group, .. } => &group.modifiers,
            PropertyNode::Promoted { constructor, index } => &constructor.params[*index].modifiers,
        }
    }

    fn declared_type(&self) -> Option<&Type> {
        match &self.node {
            PropertyNode::Declared { group, .. } => group.ty.as_ref(),
            PropertyNode::Promoted { constructor, index } => constructor.params[*index].ty.as_ref(),
        }
    }

    fn span(&self) -> Span {
        match &self.node {
            PropertyNode::Declared { group, index } => group.entries[*index].span,
            PropertyNode::Promoted { constructor, index } => constructor.params[*index].span,
        }
    }

    pub fn declaring_class(&self) -> &Rc<ReflectionClass> {
        &self.class
    }

    pub fn trait_name(&self) -> Option<&str> {
        self.trait_name.as_deref()
    }

    pub fn visibility(&self) -> Visibility {
        self.modifiers().visibility.unwrap_or(Visibility::Public)
    }

    pub fn is_public(&self) -> bool {
        self.visibility() == Visibility::Public
    }

    pub fn is_protected(&self) -> bool {
        self.visibility() == Visibility::Protected
    }

    pub fn is_private(&self) -> bool {
        self.visibility() == Visibility::Private
    }

    pub fn is_static(&self) -> bool {
        self.modifiers().is_static
    }

    pub fn is_readonly(&self) -> bool {
        self.modifiers().is_readonly || self.class.is_readonly()
    }

    pub fn is_promoted(&self) -> bool {
        matches!(self.node, PropertyNode::Promoted { .. })
    }

    pub fn has_type(&self) -> bool {
        self.declared_type().is_some()
    }

    pub fn property_type(&self) -> Option<ReflectionType> {
        self.declared_type()
            .map(|ty| ReflectionType::from_ast(ty, &self.class.type_scope()))
    }

    /// Untyped properties default to `null`; typed ones without a default have none.
    pub fn has_default_value(&self) -> bool {
        match &self.node {
            PropertyNode::Declared { group, index } => {
                group.entries[*index].default.is_some() || group.ty.is_none()
            }
            PropertyNode::Promoted { .. } => false,
        }
    }

    pub fn default_value(&self) -> Result<Option<Value>> {
        let PropertyNode::Declared { group, index } = &self.node else {
            return Ok(None);
        };
        match &group.entries[*index].default {
            Some(default) => {
                let context = CompilerContext::for_source(&self.ctx, Some(Rc::clone(&self.class)))?;
                Ok(Some(compile(default, &context)?))
            }
            None if group.ty.is_none() => Ok(Some(Value::Null)),
            None => Ok(None),
        }
    }

    pub fn doc_comment(&self) -> Option<&str> {
        let span = match &self.node {
            PropertyNode::Declared { group, .. } => group.doc_comment,
            PropertyNode::Promoted { constructor, index } => constructor.params[*index].doc_comment,
        };
        self.ctx.doc_comment(span)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        match &self.node {
            PropertyNode::Declared { group, .. } => self.ctx.attribute_names(&group.attributes),
            PropertyNode::Promoted { constructor, index } => self
                .ctx
                .attribute_names(&constructor.params[*index].attributes),
        }
    }

    pub fn start_line(&self) -> usize {
        self.ctx.lines(self.span()).0
    }

    pub fn end_line(&self) -> usize {
        self.ctx.lines(self.span()).1
    }
}

impl fmt::Debug for ReflectionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReflectionProperty({} {}::${})",
            super::visibility_name(self.visibility()),
            self.class.name(),
            self.name()
        )
    }
}
