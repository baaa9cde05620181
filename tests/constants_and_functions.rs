mod common;

use common::env_for;
use php_reflect::{FunctionLike, ReflectionError, Value};

#[test]
fn define_call_is_reflected_with_its_value() {
    let env = env_for("<?php\ndefine('Foo', 1);\n");
    let foo = env.constants().reflect("Foo").unwrap();
    assert_eq!(foo.name(), "Foo");
    assert!(foo.is_defined_by_call());
    assert_eq!(foo.value().unwrap(), Value::Int(1));
    assert_eq!(foo.start_line(), 2);
}

#[test]
fn define_is_excluded_when_a_function_has_the_same_name() {
    let env = env_for(
        r#"<?php
namespace App;

function Foo() {}
\define('App\Foo', 1);
\define('App\Bar', 2);
"#,
    );
    assert!(env.constants().reflect("App\\Foo").unwrap_err().is_not_found());
    assert_eq!(
        env.constants().reflect("App\\Bar").unwrap().value().unwrap(),
        Value::Int(2)
    );
    assert!(env.functions().has("App\\Foo").unwrap());
}

#[test]
fn define_is_excluded_when_define_is_shadowed_in_the_namespace() {
    let env = env_for(
        r#"<?php
namespace Lib;

function define($name, $value) {}
define('SHADOWED', 1);
\define('GLOBAL_ONE', 1);
"#,
    );
    assert!(env.constants().reflect("SHADOWED").unwrap_err().is_not_found());
    assert!(env.constants().reflect("GLOBAL_ONE").is_ok());
}

#[test]
fn invalid_define_calls_are_skipped() {
    let env = env_for("<?php\ndefine($dynamic, 1);\ndefine('ONLY_NAME');\ndefine('OK', 3);\n");
    let all = env.constants().reflect_all().unwrap();
    let names: Vec<&str> = all.iter().map(|constant| constant.name()).collect();
    assert_eq!(names, ["OK"]);
}

#[test]
fn const_statements_resolve_through_namespace_fallback() {
    let env = env_for(
        r#"<?php
namespace App;

/** @deprecated */
const A = 1, B = A;
const C = [PHP_INT_SIZE, \E_ALL, 'x' => B];
const D = UNKNOWN_THING;
"#,
    );
    let a = env.constants().reflect("App\\A").unwrap();
    assert_eq!(a.short_name(), "A");
    assert_eq!(a.namespace_name(), Some("App"));
    assert!(a.is_deprecated());
    assert!(!a.is_defined_by_call());

    assert_eq!(env.constants().reflect("app\\B").unwrap().value().unwrap(), Value::Int(1));

    let c = env.constants().reflect("App\\C").unwrap().value().unwrap();
    assert_eq!(c.to_string(), "array (\n  0 => 8,\n  1 => 32767,\n  'x' => 1,\n)");

    let d = env.constants().reflect("App\\D").unwrap();
    assert!(d.value().unwrap_err().is_not_found());
}

#[test]
fn internal_constants_come_from_stubs() {
    let env = env_for("<?php");
    let max = env.constants().reflect("PHP_INT_MAX").unwrap();
    assert!(max.is_internal());
    assert_eq!(max.extension_name(), Some("Core"));
    assert_eq!(max.value().unwrap(), Value::Int(i64::MAX));
    assert!(max.file_name().is_none());

    // Constant names are case-sensitive.
    assert!(env.constants().reflect("php_int_max").is_err());
}

#[test]
fn reflects_function_signatures() {
    let env = env_for(
        r#"<?php
namespace Util;

const LIMIT = 10;

/**
 * @deprecated use other()
 */
#[Pure]
function &collect(array &$into, int $limit = LIMIT, string ...$tags): ?array {
    yield 1;
}
"#,
    );
    let collect = env.functions().reflect("util\\COLLECT").unwrap();
    assert_eq!(collect.name(), "Util\\collect");
    assert_eq!(collect.short_name(), "collect");
    assert_eq!(collect.namespace_name(), Some("Util"));
    assert!(collect.is_deprecated());
    assert!(collect.returns_reference());
    assert!(collect.is_generator());
    assert!(collect.is_variadic());
    assert!(!collect.is_closure());
    assert_eq!(collect.attribute_names(), ["Util\\Pure"]);
    assert_eq!(collect.number_of_parameters(), 3);
    assert_eq!(collect.number_of_required_parameters(), 1);
    assert_eq!(collect.return_type().unwrap().to_string(), "?array");

    let into = collect.parameter("into").unwrap();
    assert!(into.is_passed_by_reference());
    assert!(!into.is_optional());
    assert_eq!(into.default_value().unwrap(), None);

    let limit = collect.parameter("limit").unwrap();
    assert_eq!(limit.position(), 1);
    assert!(limit.is_default_value_constant());
    assert_eq!(limit.default_value_constant_name().unwrap().as_deref(), Some("Util\\LIMIT"));
    assert_eq!(limit.default_value().unwrap(), Some(Value::Int(10)));

    let tags = collect.parameter("tags").unwrap();
    assert!(tags.is_variadic());
    assert!(tags.is_optional());
}

#[test]
fn stub_function_defaults_resolve_stub_constants() {
    let env = env_for("<?php");
    let count = env.functions().reflect("count").unwrap();
    assert!(count.is_internal());
    assert_eq!(count.extension_name(), Some("standard"));

    let mode = count.parameter("mode").unwrap();
    assert_eq!(mode.default_value_constant_name().unwrap().as_deref(), Some("COUNT_NORMAL"));
    assert_eq!(mode.default_value().unwrap(), Some(Value::Int(0)));

    let value = count.parameters()[0].param_type().unwrap();
    assert_eq!(value.to_string(), "Countable|array");
    let countable = value.members()[0].as_named().unwrap().class().unwrap().unwrap();
    assert!(countable.is_interface());
}

#[test]
fn unsupported_expressions_do_not_compile() {
    let env = env_for("<?php\nconst SUM = 1 + 2;\nconst NEG = -5;\nconst DIR = __DIR__;\n");
    assert!(matches!(
        env.constants().reflect("SUM").unwrap().value(),
        Err(ReflectionError::UnableToCompileNode(_))
    ));
    assert_eq!(env.constants().reflect("NEG").unwrap().value().unwrap(), Value::Int(-5));
    // No file to take the directory from.
    assert!(matches!(
        env.constants().reflect("DIR").unwrap().value(),
        Err(ReflectionError::UnableToCompileNode(_))
    ));
}

#[test]
fn invalid_identifiers_are_rejected() {
    let env = env_for("<?php");
    assert!(matches!(
        env.classes().reflect("1Invalid"),
        Err(ReflectionError::InvalidIdentifierName { .. })
    ));
}

#[test]
fn dir_constant_is_an_absolute_normalized_directory() {
    // Relative to the working directory the tests run in.
    let dir = tempfile::Builder::new().prefix("dir-const").tempdir_in(".").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("rel.php"), "<?php class R { const D = __DIR__; }").unwrap();
    let relative = dir.path().join("sub").join("..").join("rel.php");
    assert!(relative.is_relative());

    let env = php_reflect::ReflectionBuilder::new()
        .with_file(&relative)
        .build()
        .unwrap();
    let d = env.classes().reflect("R").unwrap().constant("D").unwrap().unwrap();
    let expected = std::fs::canonicalize(dir.path()).unwrap();
    assert_eq!(d.value().unwrap(), Value::String(expected.display().to_string()));
}
