use std::fmt;
use std::rc::Rc;

use super::{ReflectionClass, SourceContext};
use crate::error::Result;
use crate::node_compiler::{CompilerContext, Value, compile};
use crate::parser::ast::EnumCaseDecl;

pub struct ReflectionEnumCase {
    ctx: SourceContext,
    class: Rc<ReflectionClass>,
    node: Rc<EnumCaseDecl>,
}

impl ReflectionEnumCase {
    pub(crate) fn new(ctx: SourceContext, class: Rc<ReflectionClass>, node: Rc<EnumCaseDecl>) -> Self {
        Self { ctx, class, node }
    }

    pub fn name(&self) -> &str {
        &self.node.name.name
    }

    pub fn enum_class(&self) -> &Rc<ReflectionClass> {
        &self.class
    }

    /// Backing value of a backed enum case; `None` for pure cases.
    pub fn backing_value(&self) -> Result<Option<Value>> {
        match &self.node.value {
            Some(value) => {
                let context = CompilerContext::for_source(&self.ctx, Some(Rc::clone(&self.class)))?;
                Ok(Some(compile(value, &context)?))
            }
            None => Ok(None),
        }
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.ctx.doc_comment(self.node.doc_comment)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.ctx.attribute_names(&self.node.attributes)
    }

    pub fn start_line(&self) -> usize {
        self.ctx.lines(self.node.span).0
    }
}

impl fmt::Debug for ReflectionEnumCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionEnumCase({}::{})", self.class.name(), self.name())
    }
}
