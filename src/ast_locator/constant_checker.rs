use crate::error::{ReflectionError, Result};
use crate::parser::ast::{Expr, NameKind};

/// Validates that a `define()` call declares a constant statically:
/// callee `define` or `\define`, two or three positional arguments, a literal
/// string name, and a value that is neither a call nor a variable.
pub struct ConstantNodeChecker;

impl ConstantNodeChecker {
    /// Returns the constant name from the first argument.
    pub fn check(expr: &Expr) -> Result<&str> {
        let Expr::Call { func, args, .. } = expr else {
            return Err(invalid("not a function call"));
        };

        let Expr::ConstFetch { name, .. } = func.as_ref() else {
            return Err(invalid("callee is not a name"));
        };
        if name.parts.len() != 1
            || !matches!(name.kind, NameKind::Unqualified | NameKind::FullyQualified)
            || !name.last().eq_ignore_ascii_case("define")
        {
            return Err(invalid("callee is not define()"));
        }

        if !(2..=3).contains(&args.len()) {
            return Err(invalid("define() takes two or three arguments"));
        }
        if args.iter().any(|arg| arg.name.is_some() || arg.unpack) {
            return Err(invalid("define() arguments must be positional"));
        }

        let Expr::String { value: constant_name, .. } = &args[0].value else {
            return Err(invalid("constant name is not a literal string"));
        };

        match &args[1].value {
            Expr::Call { .. }
            | Expr::MethodCall { .. }
            | Expr::StaticCall { .. }
            | Expr::Variable { .. }
            | Expr::DynamicVariable { .. } => Err(invalid("constant value is not static")),
            _ => Ok(constant_name),
        }
    }
}

fn invalid(reason: &str) -> ReflectionError {
    ReflectionError::InvalidConstantNode(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Stmt;
    use crate::parser::parser::parse;

    fn define_call(code: &str) -> Expr {
        let program = parse(code);
        match program.statements.into_iter().next() {
            Some(Stmt::Expression { expr, .. }) => expr.as_ref().clone(),
            other => panic!("expected expression, got {other:?}"),
        }
    }

    #[test]
    fn accepts_static_defines() {
        let call = define_call("<?php define('FOO', 1);");
        assert_eq!(ConstantNodeChecker::check(&call).unwrap(), "FOO");

        let call = define_call("<?php \\define('App\\\\BAR', [1, 2], true);");
        assert_eq!(ConstantNodeChecker::check(&call).unwrap(), "App\\BAR");
    }

    #[test]
    fn rejects_dynamic_defines() {
        for code in [
            "<?php define($name, 1);",
            "<?php define('FOO', $value);",
            "<?php define('FOO', compute());",
            "<?php define('FOO');",
            "<?php define('FOO', 1, true, 4);",
            "<?php define(\"FOO{$x}\", 1);",
        ] {
            let call = define_call(code);
            assert!(
                matches!(
                    ConstantNodeChecker::check(&call),
                    Err(ReflectionError::InvalidConstantNode(_))
                ),
                "{code} should be rejected"
            );
        }
    }
}
