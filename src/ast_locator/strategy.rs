use std::rc::Rc;

use tracing::debug;

use super::constant_checker::ConstantNodeChecker;
use super::{DeclarationNode, LocatedNode};
use crate::error::{ReflectionError, Result};
use crate::identifier::{ANONYMOUS_CLASS_PREFIX, CLOSURE_NAME};
use crate::located_source::LocatedSource;
use crate::reflection::{
    Reflection, ReflectionClass, ReflectionConstant, ReflectionFunction, SourceContext,
};
use crate::reflector::Reflector;

/// Turns a declaration node into a reflection.
pub trait ConversionStrategy {
    /// `Ok(None)` when the node does not declare anything reflectable.
    fn convert(
        &self,
        reflector: &Reflector,
        located: &LocatedNode,
        source: &Rc<LocatedSource>,
    ) -> Result<Option<Reflection>>;
}

/// The default strategy, building the reflection model directly from the node.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeToReflection;

impl ConversionStrategy for NodeToReflection {
    fn convert(
        &self,
        reflector: &Reflector,
        located: &LocatedNode,
        source: &Rc<LocatedSource>,
    ) -> Result<Option<Reflection>> {
        let ctx = SourceContext::new(reflector, Rc::clone(source), Rc::clone(&located.names));

        let reflection = match &located.node {
            DeclarationNode::Class(decl) => {
                let Some(name) = &decl.name else {
                    return Ok(None);
                };
                let name = located.names.qualify(&name.name);
                Reflection::Class(Rc::new(ReflectionClass::new(ctx, Rc::clone(decl), name)))
            }
            DeclarationNode::AnonymousClass(decl) => {
                let line = source.line_number(decl.span.start);
                let file = source
                    .file_path()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                let name = format!("{ANONYMOUS_CLASS_PREFIX}{file}:{line}");
                Reflection::Class(Rc::new(ReflectionClass::new(ctx, Rc::clone(decl), name)))
            }
            DeclarationNode::Function(decl) => {
                let Some(name) = &decl.name else {
                    return Ok(None);
                };
                let name = located.names.qualify(&name.name);
                Reflection::Function(Rc::new(ReflectionFunction::new(ctx, Rc::clone(decl), name)))
            }
            DeclarationNode::Closure(decl) => Reflection::Function(Rc::new(
                ReflectionFunction::new(ctx, Rc::clone(decl), CLOSURE_NAME.to_string()),
            )),
            DeclarationNode::Const { group, index } => Reflection::Constant(Rc::new(
                ReflectionConstant::from_const(ctx, Rc::clone(group), *index),
            )),
            DeclarationNode::Define(call) => match ConstantNodeChecker::check(call) {
                Ok(name) => {
                    let name = name.strip_prefix('\\').unwrap_or(name).to_string();
                    Reflection::Constant(Rc::new(ReflectionConstant::from_define(
                        ctx,
                        Rc::clone(call),
                        name,
                    )))
                }
                Err(ReflectionError::InvalidConstantNode(reason)) => {
                    debug!(location = %source.location(), %reason, "skipping define() call");
                    return Ok(None);
                }
                Err(err) => return Err(err),
            },
        };
        Ok(Some(reflection))
    }
}
