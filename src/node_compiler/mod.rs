//! Compile-time evaluation of constant expressions: literals, arrays,
//! constant references and class constant references.

mod value;

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

pub use value::{ArrayKey, Value};

use crate::error::{ReflectionError, Result};
use crate::parser::ast::{ArrayItem, ClassRef, Expr, MagicConstKind, UnaryOp};
use crate::reflection::{ReflectionClass, SourceContext};
use crate::reflector::Reflector;

/// Expressions nested deeper than this, counting constant indirections, are rejected.
pub const MAX_COMPILE_DEPTH: usize = 64;

/// Everything needed to evaluate one expression.
#[derive(Debug, Clone)]
pub struct CompilerContext {
    reflector: Reflector,
    self_class: Option<Rc<ReflectionClass>>,
    source: SourceContext,
}

impl CompilerContext {
    pub fn new(
        reflector: Reflector,
        source: &SourceContext,
        self_class: Option<Rc<ReflectionClass>>,
    ) -> Self {
        Self {
            reflector,
            self_class,
            source: source.clone(),
        }
    }

    pub fn for_source(source: &SourceContext, self_class: Option<Rc<ReflectionClass>>) -> Result<Self> {
        Ok(Self::new(source.reflector()?, source, self_class))
    }

    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    pub fn self_class(&self) -> Option<&Rc<ReflectionClass>> {
        self.self_class.as_ref()
    }
}

pub fn compile(expr: &Expr, context: &CompilerContext) -> Result<Value> {
    compile_at(expr, context, 0)
}

pub(crate) fn compile_at(expr: &Expr, context: &CompilerContext, depth: usize) -> Result<Value> {
    if depth > MAX_COMPILE_DEPTH {
        return Err(ReflectionError::UnableToCompileNode(
            "maximum expression depth exceeded".to_string(),
        ));
    }

    match expr {
        Expr::Int { value, .. } => Ok(Value::Int(*value)),
        Expr::Float { value, .. } => Ok(Value::Float(*value)),
        Expr::String { value, .. } => Ok(Value::String(value.clone())),
        Expr::Unary { op, expr: operand, .. } => compile_signed_literal(*op, operand),
        Expr::Array { items, .. } => compile_array(items, context, depth),
        Expr::ConstFetch { name, .. } => {
            if name.parts.len() == 1 {
                match name.last().to_ascii_lowercase().as_str() {
                    "true" => return Ok(Value::Bool(true)),
                    "false" => return Ok(Value::Bool(false)),
                    "null" => return Ok(Value::Null),
                    _ => {}
                }
            }
            compile_constant_reference(
                context.source.names().resolve_constant_candidates(name),
                context,
                depth,
            )
        }
        Expr::ClassConstFetch {
            class, constant, ..
        } => compile_class_constant(class, &constant.name, context, depth),
        Expr::MagicConst {
            kind: MagicConstKind::Dir,
            ..
        } => match context.source.file_path().and_then(source_directory) {
            Some(dir) => Ok(Value::String(dir.display().to_string())),
            None => Err(ReflectionError::UnableToCompileNode(
                "__DIR__ used in source without a file path".to_string(),
            )),
        },
        Expr::MagicConst {
            kind: MagicConstKind::Class,
            ..
        } => Ok(Value::String(
            context
                .self_class
                .as_ref()
                .map(|class| class.name().to_string())
                .unwrap_or_default(),
        )),
        other => Err(ReflectionError::UnableToCompileNode(format!(
            "unsupported expression {}",
            describe(other)
        ))),
    }
}

/// Absolute directory of a source file, with symlinks and `..` resolved when
/// the file still exists.
fn source_directory(path: &Path) -> Option<PathBuf> {
    let absolute = fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .ok()?;
    absolute.parent().map(Path::to_path_buf)
}

fn compile_signed_literal(op: UnaryOp, operand: &Expr) -> Result<Value> {
    match (op, operand) {
        (UnaryOp::Minus, Expr::Int { value, .. }) => Ok(value
            .checked_neg()
            .map(Value::Int)
            .unwrap_or(Value::Float(-(*value as f64)))),
        (UnaryOp::Minus, Expr::Float { value, .. }) => Ok(Value::Float(-value)),
        (UnaryOp::Plus, Expr::Int { value, .. }) => Ok(Value::Int(*value)),
        (UnaryOp::Plus, Expr::Float { value, .. }) => Ok(Value::Float(*value)),
        _ => Err(ReflectionError::UnableToCompileNode(
            "unary operator on a non-numeric operand".to_string(),
        )),
    }
}

fn compile_array(items: &[ArrayItem], context: &CompilerContext, depth: usize) -> Result<Value> {
    let mut array = IndexMap::new();
    let mut next_index: i64 = 0;

    for item in items {
        if item.by_ref {
            return Err(ReflectionError::UnableToCompileNode(
                "by-reference array item".to_string(),
            ));
        }
        let value = compile_at(&item.value, context, depth + 1)?;

        if item.unpack {
            let Value::Array(spread) = value else {
                return Err(ReflectionError::UnableToCompileNode(
                    "unpacking a non-array value".to_string(),
                ));
            };
            for (key, value) in spread {
                match key {
                    ArrayKey::Int(_) => {
                        array.insert(ArrayKey::Int(next_index), value);
                        next_index += 1;
                    }
                    key => {
                        array.insert(key, value);
                    }
                }
            }
            continue;
        }

        let key = match &item.key {
            Some(key) => array_key(compile_at(key, context, depth + 1)?)?,
            None => ArrayKey::Int(next_index),
        };
        if let ArrayKey::Int(index) = key
            && index >= next_index
        {
            next_index = index.saturating_add(1);
        }
        array.insert(key, value);
    }

    Ok(Value::Array(array))
}

fn array_key(value: Value) -> Result<ArrayKey> {
    match value {
        Value::Int(int) => Ok(ArrayKey::Int(int)),
        Value::String(string) => Ok(ArrayKey::from_string(string)),
        Value::Bool(flag) => Ok(ArrayKey::Int(flag as i64)),
        Value::Float(float) => Ok(ArrayKey::Int(float.trunc() as i64)),
        Value::Null => Ok(ArrayKey::Str(String::new())),
        Value::Array(_) => Err(ReflectionError::UnableToCompileNode(
            "array used as array key".to_string(),
        )),
    }
}

fn compile_constant_reference(
    candidates: Vec<String>,
    context: &CompilerContext,
    depth: usize,
) -> Result<Value> {
    let last = candidates.len().saturating_sub(1);
    for (i, candidate) in candidates.iter().enumerate() {
        match context.reflector.reflect_constant(candidate) {
            Ok(constant) => {
                trace!(constant = %candidate, "compiling constant reference");
                return constant.value_at(depth + 1);
            }
            Err(err) if err.is_not_found() && i < last => continue,
            Err(err) => return Err(err),
        }
    }
    Err(ReflectionError::UnableToCompileNode(
        "constant reference without a name".to_string(),
    ))
}

fn compile_class_constant(
    class: &ClassRef,
    constant_name: &str,
    context: &CompilerContext,
    depth: usize,
) -> Result<Value> {
    let target = resolve_class(class, context)?;

    if constant_name.eq_ignore_ascii_case("class") {
        return Ok(Value::String(match &target {
            ResolvedClass::Reflected(class) => class.name().to_string(),
            ResolvedClass::Named(name) => name.clone(),
        }));
    }

    let class = match target {
        ResolvedClass::Reflected(class) => class,
        ResolvedClass::Named(name) => context.reflector.reflect_class(&name)?,
    };

    if class.is_enum() && class.case(constant_name).is_some() {
        return Err(ReflectionError::UnableToCompileNode(format!(
            "enum case {}::{constant_name} is an object",
            class.name()
        )));
    }

    match class.constant(constant_name)? {
        Some(constant) => constant.value_at(depth + 1),
        None => Err(ReflectionError::UnableToCompileNode(format!(
            "class constant {}::{constant_name} does not exist",
            class.name()
        ))),
    }
}

enum ResolvedClass {
    Reflected(Rc<ReflectionClass>),
    Named(String),
}

fn resolve_class(class: &ClassRef, context: &CompilerContext) -> Result<ResolvedClass> {
    let ClassRef::Named(name) = class else {
        return Err(ReflectionError::UnableToCompileNode(
            "dynamic class reference".to_string(),
        ));
    };

    if !name.is_special_class() {
        return Ok(ResolvedClass::Named(
            context.source.names().resolve_class_name(name),
        ));
    }

    let Some(self_class) = &context.self_class else {
        return Err(ReflectionError::UnableToCompileNode(format!(
            "\"{}\" used outside of a class",
            name.last()
        )));
    };

    if name.last().eq_ignore_ascii_case("parent") {
        return match self_class.parent_class()? {
            Some(parent) => Ok(ResolvedClass::Reflected(parent)),
            None => Err(ReflectionError::UnableToCompileNode(format!(
                "\"parent\" used in class {} which has no parent",
                self_class.name()
            ))),
        };
    }

    Ok(ResolvedClass::Reflected(Rc::clone(self_class)))
}

fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Variable { .. } | Expr::DynamicVariable { .. } => "variable",
        Expr::InterpolatedString { .. } => "interpolated string",
        Expr::Call { .. } | Expr::MethodCall { .. } | Expr::StaticCall { .. } => "call",
        Expr::New { .. } => "object creation",
        Expr::Binary { .. } => "binary operation",
        Expr::Ternary { .. } => "ternary",
        Expr::Closure(_) => "closure",
        Expr::MagicConst { .. } => "magic constant",
        Expr::Match { .. } => "match",
        _ => "expression",
    }
}
