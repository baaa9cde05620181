mod common;

use std::path::PathBuf;
use std::rc::Rc;

use common::write_file;
use php_reflect::runtime::InMemoryRuntime;
use php_reflect::source_stubber::{MapSourceStubber, StubData};
use php_reflect::{FunctionLike, ReflectionBuilder, Value};
use tempfile::TempDir;

#[test]
fn autoloads_classes_without_including_them() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "lib/Thing.php", "<?php namespace Lazy; class Thing {}");

    let target = file.clone();
    let runtime = InMemoryRuntime::new()
        .with_autoloader(|_| None)
        .with_autoloader(move |name| (name == "Lazy\\Thing").then(|| target.clone()));

    let env = ReflectionBuilder::new()
        .with_runtime(Rc::new(runtime))
        .build()
        .unwrap();

    let thing = env.classes().reflect("\\Lazy\\Thing").unwrap();
    assert_eq!(thing.name(), "Lazy\\Thing");
    assert_eq!(thing.file_name(), Some(file.as_path()));
    assert!(env.classes().reflect("Lazy\\Other").unwrap_err().is_not_found());
}

#[test]
fn uses_the_file_of_loaded_user_symbols() {
    let dir = TempDir::new().unwrap();
    let classes = write_file(dir.path(), "Loaded.php", "<?php class Loaded {}");
    let functions = write_file(dir.path(), "helpers.php", "<?php function helper(int $x) {}");

    let runtime = InMemoryRuntime::new()
        .with_user_class("Loaded", &classes)
        .with_user_function("helper", &functions)
        .with_user_function("vanished", dir.path().join("gone.php"));

    let env = ReflectionBuilder::new()
        .with_runtime(Rc::new(runtime))
        .build()
        .unwrap();

    assert_eq!(env.classes().reflect("loaded").unwrap().name(), "Loaded");
    assert_eq!(env.functions().reflect("HELPER").unwrap().number_of_parameters(), 1);
    assert!(!env.functions().has("vanished").unwrap());
}

#[test]
fn finds_runtime_constants_in_included_files() {
    let dir = TempDir::new().unwrap();
    let older = write_file(dir.path(), "older.php", "<?php define('VERSION', 1);");
    let newer = write_file(dir.path(), "newer.php", "<?php const VERSION = 2;");
    let broken = write_file(dir.path(), "broken.php", "<?php function {");
    let defined = write_file(dir.path(), "defined.php", "<?php const KNOWN = 'k';");

    let runtime = InMemoryRuntime::new()
        .with_included_file(&older)
        .with_included_file(&newer)
        .with_included_file(&broken)
        .with_user_constant("VERSION", None)
        .with_user_constant("KNOWN", Some(defined.clone()));

    let env = ReflectionBuilder::new()
        .with_runtime(Rc::new(runtime))
        .build()
        .unwrap();

    // The newest readable file is searched first.
    let version = env.constants().reflect("VERSION").unwrap();
    assert!(!version.is_defined_by_call());
    assert_eq!(version.value().unwrap(), Value::Int(2));
    assert_eq!(version.file_name(), Some(newer.as_path()));

    let known = env.constants().reflect("KNOWN").unwrap();
    assert_eq!(known.value().unwrap(), Value::String("k".into()));

    assert!(env.constants().reflect("UNDEFINED").unwrap_err().is_not_found());
}

#[test]
fn newest_const_statement_wins_without_define() {
    let dir = TempDir::new().unwrap();
    let first = write_file(dir.path(), "first.php", "<?php const LEVEL = 1;");
    let second = write_file(dir.path(), "second.php", "<?php const LEVEL = 2;");

    let runtime = InMemoryRuntime::new()
        .with_included_file(&first)
        .with_included_file(&second)
        .with_user_constant("LEVEL", None);

    let env = ReflectionBuilder::new()
        .with_runtime(Rc::new(runtime))
        .build()
        .unwrap();
    let level = env.constants().reflect("LEVEL").unwrap();
    assert_eq!(level.value().unwrap(), Value::Int(2));
    assert_eq!(level.file_name(), Some(second.as_path()));
}

#[test]
fn define_wins_over_const_within_one_included_file() {
    let dir = TempDir::new().unwrap();
    let older = write_file(dir.path(), "older.php", "<?php define('MODE', 'old');");
    let newer = write_file(
        dir.path(),
        "newer.php",
        "<?php\nconst MODE = 'const';\ndefine('MODE', 'define');\n",
    );

    let runtime = InMemoryRuntime::new()
        .with_included_file(&older)
        .with_included_file(&newer)
        .with_user_constant("MODE", None);

    let env = ReflectionBuilder::new()
        .with_runtime(Rc::new(runtime))
        .build()
        .unwrap();
    let mode = env.constants().reflect("MODE").unwrap();
    assert!(mode.is_defined_by_call());
    assert_eq!(mode.value().unwrap(), Value::String("define".into()));
    assert_eq!(mode.file_name(), Some(newer.as_path()));
    assert_eq!(mode.start_line(), 3);
}

#[test]
fn evaled_classes_come_from_stubs() {
    let stubber = MapSourceStubber::new()
        .with_class("Generated", StubData::new("<?php class Generated { const ID = 7; }", None))
        .with_class(
            "Builtin",
            StubData::new("<?php final class Builtin {}", Some("custom")),
        );
    let runtime = InMemoryRuntime::new()
        .with_evaled_class("Generated")
        .with_internal_class("Builtin", Some("custom"));

    let env = ReflectionBuilder::new()
        .with_runtime(Rc::new(runtime))
        .with_stubber(Rc::new(stubber))
        .build()
        .unwrap();

    let generated = env.classes().reflect("generated").unwrap();
    assert!(generated.located_source().is_evaled());
    assert!(!generated.is_internal());
    assert!(generated.file_name().is_none());
    assert_eq!(
        generated.constant("ID").unwrap().unwrap().value().unwrap(),
        Value::Int(7)
    );

    let builtin = env.classes().reflect("Builtin").unwrap();
    assert!(builtin.is_internal());
    assert_eq!(builtin.extension_name(), Some("custom"));
}

#[test]
fn user_sources_take_precedence_over_stubs() {
    let env = ReflectionBuilder::new()
        .with_string("<?php interface Countable { public function size(): int; }")
        .with_core_stubs()
        .build()
        .unwrap();

    let countable = env.classes().reflect("Countable").unwrap();
    assert!(countable.is_user_defined());
    assert!(countable.has_method("size").unwrap());

    let iterator = env.classes().reflect("Iterator").unwrap();
    assert!(iterator.is_internal());
    assert_eq!(iterator.interface_names().unwrap(), ["Traversable"]);
    assert_eq!(iterator.methods().unwrap().len(), 5);
}

#[test]
fn later_stubbers_fill_gaps() {
    let extra = MapSourceStubber::new().with_function(
        "mb_strlen",
        StubData::new("<?php function mb_strlen(string $string, ?string $encoding = null): int {}", Some("mbstring")),
    );
    let env = ReflectionBuilder::new()
        .with_core_stubs()
        .with_stubber(Rc::new(extra))
        .build()
        .unwrap();

    assert_eq!(env.functions().reflect("strlen").unwrap().extension_name(), Some("Core"));
    let mb = env.functions().reflect("mb_strlen").unwrap();
    assert_eq!(mb.extension_name(), Some("mbstring"));
    assert_eq!(mb.number_of_required_parameters(), 1);
}

#[test]
fn builder_reports_invalid_sources() {
    let missing = PathBuf::from("/no/such/file.php");
    assert!(ReflectionBuilder::new().with_file(missing).build().is_err());
    assert!(ReflectionBuilder::new().with_string("").build().is_err());
    assert!(
        ReflectionBuilder::new()
            .with_directories(["/no/such/dir"])
            .build()
            .is_err()
    );
}

#[test]
fn reflections_fail_cleanly_after_the_environment_is_dropped() {
    let env = ReflectionBuilder::new()
        .with_string("<?php class Child extends Base {} class Base {}")
        .build()
        .unwrap();
    let child = env.classes().reflect("Child").unwrap();
    drop(env);

    assert_eq!(child.name(), "Child");
    assert!(matches!(
        child.parent_class(),
        Err(php_reflect::ReflectionError::ReflectorDropped)
    ));
}
