use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use super::{FunctionCore, ReflectionClass, ReflectionType};
use crate::error::Result;
use crate::node_compiler::{CompilerContext, Value, compile};
use crate::parser::ast::{ClassRef, Expr, Param};

pub struct ReflectionParameter {
    function: FunctionCore,
    function_name: String,
    position: usize,
    default_value: OnceCell<Value>,
}

impl ReflectionParameter {
    pub(crate) fn new(function: FunctionCore, function_name: &str, position: usize) -> Self {
        Self {
            function,
            function_name: function_name.to_string(),
            position,
            default_value: OnceCell::new(),
        }
    }

    fn param(&self) -> &Param {
        &self.function.node().params[self.position]
    }

    pub fn name(&self) -> &str {
        &self.param().name.name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn declaring_class(&self) -> Option<&Rc<ReflectionClass>> {
        self.function.self_class()
    }

    pub fn has_type(&self) -> bool {
        self.param().ty.is_some()
    }

    /// A `null` default makes a plain declared type implicitly nullable.
    pub fn param_type(&self) -> Option<ReflectionType> {
        let ty = ReflectionType::from_ast(self.param().ty.as_ref()?, &self.function.type_scope());
        if self.has_null_default() {
            Some(ty.into_nullable())
        } else {
            Some(ty)
        }
    }

    pub fn allows_null(&self) -> bool {
        self.param_type().is_none_or(|ty| ty.allows_null())
    }

    fn has_null_default(&self) -> bool {
        matches!(
            self.param().default.as_deref(),
            Some(Expr::ConstFetch { name, .. })
                if name.parts.len() == 1 && name.last().eq_ignore_ascii_case("null")
        )
    }

    /// Optional when this and every following parameter has a default or is variadic.
    pub fn is_optional(&self) -> bool {
        self.function.node().params[self.position..]
            .iter()
            .all(|param| param.default.is_some() || param.variadic)
    }

    pub fn is_default_value_available(&self) -> bool {
        self.param().default.is_some()
    }

    pub fn is_variadic(&self) -> bool {
        self.param().variadic
    }

    pub fn is_passed_by_reference(&self) -> bool {
        self.param().by_ref
    }

    pub fn is_promoted(&self) -> bool {
        self.param().is_promoted()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.function
            .context()
            .attribute_names(&self.param().attributes)
    }

    /// Compiled default value; `None` when the parameter has no default.
    /// Compiled once and kept.
    pub fn default_value(&self) -> Result<Option<Value>> {
        let Some(default) = &self.param().default else {
            return Ok(None);
        };
        if let Some(value) = self.default_value.get() {
            return Ok(Some(value.clone()));
        }

        let context = CompilerContext::for_source(
            self.function.context(),
            self.function.self_class().cloned(),
        )?;
        let value = compile(default, &context)?;
        let _ = self.default_value.set(value.clone());
        Ok(Some(value))
    }

    /// Whether the default is a reference to a global or class constant.
    pub fn is_default_value_constant(&self) -> bool {
        match self.param().default.as_deref() {
            Some(Expr::ConstFetch { name, .. }) => {
                !(name.parts.len() == 1
                    && matches!(
                        name.last().to_ascii_lowercase().as_str(),
                        "true" | "false" | "null"
                    ))
            }
            Some(Expr::ClassConstFetch { constant, .. }) => {
                !constant.name.eq_ignore_ascii_case("class")
            }
            _ => false,
        }
    }

    /// Name of the constant the default refers to, `Class::NAME` for class
    /// constants. Unqualified global names resolve to the namespaced constant
    /// when it exists.
    pub fn default_value_constant_name(&self) -> Result<Option<String>> {
        if !self.is_default_value_constant() {
            return Ok(None);
        }
        let names = self.function.context().names();

        match self.param().default.as_deref() {
            Some(Expr::ConstFetch { name, .. }) => {
                let candidates = names.resolve_constant_candidates(name);
                if candidates.len() > 1 {
                    let reflector = self.function.context().reflector()?;
                    for candidate in &candidates[..candidates.len() - 1] {
                        match reflector.reflect_constant(candidate) {
                            Ok(_) => return Ok(Some(candidate.clone())),
                            Err(err) if err.is_not_found() => {}
                            Err(err) => return Err(err),
                        }
                    }
                }
                Ok(candidates.last().cloned())
            }
            Some(Expr::ClassConstFetch {
                class: ClassRef::Named(class),
                constant,
                ..
            }) => {
                let class_name = if class.is_special_class() {
                    let self_class = self.function.self_class();
                    let resolved = match class.last().to_ascii_lowercase().as_str() {
                        "parent" => self_class.and_then(|class| class.parent_class_name()),
                        _ => self_class.map(|class| class.name().to_string()),
                    };
                    resolved.unwrap_or_else(|| class.joined())
                } else {
                    names.resolve_class_name(class)
                };
                Ok(Some(format!("{class_name}::{}", constant.name)))
            }
            _ => Ok(None),
        }
    }
}

impl fmt::Debug for ReflectionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReflectionParameter(#{} ${} of {})",
            self.position,
            self.name(),
            self.function_name
        )
    }
}
