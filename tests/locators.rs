mod common;

use std::path::PathBuf;
use std::rc::Rc;

use common::{CountingLocator, EmptyLocator, write_file};
use php_reflect::ast_locator::AstLocator;
use php_reflect::source_locator::{
    AggregateSourceLocator, AnonymousClassSourceLocator, ClosureSourceLocator,
    DirectoriesSourceLocator, FileIteratorSourceLocator, MemoizingSourceLocator, Psr0Mapping,
    Psr4Mapping, PsrAutoloaderLocator, SingleFileSourceLocator, SourceLocator,
    StringSourceLocator,
};
use php_reflect::{
    FunctionLike, Identifier, IdentifierType, Reflection, ReflectionBuilder, ReflectionError,
    Reflector,
};
use tempfile::TempDir;

fn string_locator(code: &str, ast: &Rc<AstLocator>) -> Rc<dyn SourceLocator> {
    Rc::new(StringSourceLocator::new(code, Rc::clone(ast)).unwrap())
}

#[test]
fn memoized_lookups_reach_the_wrapped_locator_once() {
    let ast = Rc::new(AstLocator::new());
    let counting = CountingLocator::new(string_locator("<?php class Foo {}", &ast));
    let reflector = Reflector::new(Rc::new(MemoizingSourceLocator::new(counting.clone())));

    let first = reflector.reflect_class("Foo").unwrap();
    let second = reflector.reflect_class("\\foo").unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(counting.locate_one_calls.get(), 1);

    assert!(reflector.reflect_class("Missing").unwrap_err().is_not_found());
    assert!(reflector.reflect_class("Missing").unwrap_err().is_not_found());
    assert_eq!(counting.locate_one_calls.get(), 2);

    // Same name, different kind.
    assert!(reflector.reflect_function("Foo").is_err());
    assert_eq!(counting.locate_one_calls.get(), 3);

    reflector.reflect_all(IdentifierType::Class).unwrap();
    reflector.reflect_all(IdentifierType::Class).unwrap();
    assert_eq!(counting.locate_all_calls.get(), 1);
}

#[test]
fn memoization_is_per_reflector() {
    let ast = Rc::new(AstLocator::new());
    let counting = CountingLocator::new(string_locator("<?php class Foo {}", &ast));
    let memo: Rc<dyn SourceLocator> = Rc::new(MemoizingSourceLocator::new(counting.clone()));

    let one = Reflector::new(Rc::clone(&memo));
    let two = Reflector::new(Rc::clone(&memo));
    assert_ne!(one.id(), two.id());

    one.reflect_class("Foo").unwrap();
    two.reflect_class("Foo").unwrap();
    assert_eq!(counting.locate_one_calls.get(), 2);
}

#[test]
fn aggregate_stops_at_first_match() {
    let ast = Rc::new(AstLocator::new());
    let first = CountingLocator::new(string_locator("<?php class Foo { const WHO = 1; }", &ast));
    let second = CountingLocator::new(string_locator("<?php class Foo { const WHO = 2; }", &ast));
    let children: Vec<Rc<dyn SourceLocator>> = vec![first.clone(), second.clone()];
    let aggregate = AggregateSourceLocator::new(children);
    let reflector = Reflector::new(Rc::new(aggregate));

    let foo = reflector.reflect_class("Foo").unwrap();
    assert_eq!(
        foo.constant("WHO").unwrap().unwrap().value().unwrap(),
        php_reflect::Value::Int(1)
    );
    assert_eq!(first.locate_one_calls.get(), 1);
    assert_eq!(second.locate_one_calls.get(), 0);

    assert!(reflector.reflect_class("Bar").is_err());
    assert_eq!(second.locate_one_calls.get(), 1);
}

#[test]
fn aggregate_concatenates_scans() {
    let ast = Rc::new(AstLocator::new());
    let children: Vec<Rc<dyn SourceLocator>> = vec![
        string_locator("<?php function a() {} function b() {}", &ast),
        Rc::new(EmptyLocator),
        string_locator("<?php function c() {}", &ast),
    ];
    let aggregate = AggregateSourceLocator::new(children);
    let reflector = Reflector::new(Rc::new(aggregate));
    let names: Vec<String> = reflector
        .reflect_all(IdentifierType::Function)
        .unwrap()
        .iter()
        .map(|reflection| reflection.name().to_string())
        .collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn directory_scan_isolates_parse_failures() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.php", "<?php class A {}");
    write_file(dir.path(), "nested/b.php", "<?php namespace Lib; class B {}");
    write_file(dir.path(), "nested/c.php", "<?php class {");
    write_file(dir.path(), "notes.txt", "<?php class Ignored {}");

    let ast = Rc::new(AstLocator::new());
    let locator = DirectoriesSourceLocator::new(vec![dir.path().to_path_buf()], Rc::clone(&ast)).unwrap();
    assert_eq!(locator.php_files().unwrap().len(), 3);

    let reflector = Reflector::new(Rc::new(locator));
    let scan = reflector
        .source_locator()
        .locate_all_of_kind(&reflector, IdentifierType::Class)
        .unwrap();
    let names: Vec<&str> = scan.reflections.iter().map(Reflection::name).collect();
    assert_eq!(names, ["A", "Lib\\B"]);
    assert_eq!(scan.failures.len(), 1);
    assert!(scan.failures[0].location.ends_with("c.php"));

    assert_eq!(reflector.reflect_all(IdentifierType::Class).unwrap().len(), 2);
    assert_eq!(reflector.reflect_class("lib\\b").unwrap().name(), "Lib\\B");
}

#[test]
fn directories_must_exist() {
    let ast = Rc::new(AstLocator::new());
    let missing = PathBuf::from("/definitely/not/here");
    assert!(matches!(
        DirectoriesSourceLocator::new(vec![missing], ast),
        Err(ReflectionError::InvalidDirectory { .. })
    ));
}

#[test]
fn file_iterator_keeps_php_files() {
    let dir = TempDir::new().unwrap();
    let php = write_file(dir.path(), "one.php", "<?php function one() {}");
    let txt = write_file(dir.path(), "two.txt", "<?php function two() {}");

    let ast = Rc::new(AstLocator::new());
    let locator = FileIteratorSourceLocator::new(vec![txt, php.clone()], ast);
    assert_eq!(locator.files(), [php]);

    let reflector = Reflector::new(Rc::new(locator));
    assert!(reflector.has_function("one").unwrap());
    assert!(!reflector.has_function("two").unwrap());
}

#[test]
fn single_file_requires_a_readable_file() {
    let dir = TempDir::new().unwrap();
    let ast = Rc::new(AstLocator::new());
    assert!(matches!(
        SingleFileSourceLocator::new(dir.path().join("missing.php"), Rc::clone(&ast)),
        Err(ReflectionError::InvalidFileLocation { .. })
    ));
    assert!(matches!(
        SingleFileSourceLocator::new(dir.path(), ast),
        Err(ReflectionError::InvalidFileLocation { .. })
    ));
}

#[test]
fn empty_string_source_is_rejected() {
    let ast = Rc::new(AstLocator::new());
    assert!(matches!(
        StringSourceLocator::new("", ast),
        Err(ReflectionError::EmptyPhpSourceCode)
    ));
}

#[test]
fn parse_errors_surface_on_direct_lookup() {
    let env = ReflectionBuilder::new()
        .with_string("<?php class Broken {")
        .build()
        .unwrap();
    assert!(matches!(
        env.classes().reflect("Broken"),
        Err(ReflectionError::ParseToAstFailure { .. })
    ));
}

#[test]
fn psr4_mapping_loads_the_mapped_file() {
    let dir = TempDir::new().unwrap();
    let file = write_file(
        dir.path(),
        "src/Foo/Bar.php",
        "<?php\nnamespace App\\Foo;\n\nclass Bar {}\n",
    );
    write_file(dir.path(), "src/Foo/Baz.php", "<?php namespace App\\Foo; class Other {}");

    let mapping = Psr4Mapping::new([("App\\", [dir.path().join("src")])]).unwrap();
    let env = ReflectionBuilder::new().with_psr4(mapping).build().unwrap();

    let bar = env.classes().reflect("App\\Foo\\Bar").unwrap();
    assert_eq!(bar.file_name(), Some(file.as_path()));
    assert_eq!(bar.start_line(), 4);

    // The file exists but declares something else.
    assert!(env.classes().reflect("App\\Foo\\Baz").unwrap_err().is_not_found());
    assert!(env.classes().reflect("Other\\Foo").unwrap_err().is_not_found());

    let mut all: Vec<String> = env
        .classes()
        .reflect_all()
        .unwrap()
        .iter()
        .map(|class| class.name().to_string())
        .collect();
    all.sort();
    assert_eq!(all, ["App\\Foo\\Bar", "App\\Foo\\Other"]);
}

#[test]
fn psr0_mapping_follows_underscores() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "Legacy/Http/Client.php", "<?php class Legacy_Http_Client {}");

    let mapping = Psr0Mapping::new([("Legacy_", [dir.path().to_path_buf()])]).unwrap();
    let ast = Rc::new(AstLocator::new());
    let reflector = Reflector::new(Rc::new(PsrAutoloaderLocator::new(mapping, ast)));
    assert_eq!(
        reflector.reflect_class("Legacy_Http_Client").unwrap().name(),
        "Legacy_Http_Client"
    );
}

#[test]
fn locates_closures_by_line() {
    let dir = TempDir::new().unwrap();
    let file = write_file(
        dir.path(),
        "closures.php",
        "<?php\n$a = function ($x) use ($y) { return $x; };\n$b = fn($x) => $x; $c = fn($y) => $y;\n",
    );
    let ast = Rc::new(AstLocator::new());
    let reflector = Reflector::new(Rc::new(EmptyLocator));
    let closure = Identifier::function("{closure}").unwrap();

    let on_two = ClosureSourceLocator::new(&file, 2, Rc::clone(&ast)).unwrap();
    let Some(Reflection::Function(found)) = on_two.locate_one(&reflector, &closure).unwrap() else {
        panic!("expected a closure on line 2");
    };
    assert!(found.is_closure());
    assert_eq!(found.name(), "{closure}");
    assert_eq!(found.closure_used_variables(), ["y"]);

    let on_three = ClosureSourceLocator::new(&file, 3, Rc::clone(&ast)).unwrap();
    assert!(matches!(
        on_three.locate_one(&reflector, &closure),
        Err(ReflectionError::TwoClosuresOnSameLine { line: 3, .. })
    ));

    let on_four = ClosureSourceLocator::new(&file, 4, ast).unwrap();
    assert!(on_four.locate_one(&reflector, &closure).unwrap().is_none());
}

#[test]
fn locates_anonymous_classes_by_line() {
    let dir = TempDir::new().unwrap();
    let file = write_file(
        dir.path(),
        "anon.php",
        "<?php\n$a = new class extends Base {};\n$b = new class {}; $c = new class {};\n",
    );
    let ast = Rc::new(AstLocator::new());
    let reflector = Reflector::new(Rc::new(EmptyLocator));
    let anonymous = Identifier::class("class@anonymous").unwrap();

    let on_two = AnonymousClassSourceLocator::new(&file, 2, Rc::clone(&ast)).unwrap();
    let Some(Reflection::Class(class)) = on_two.locate_one(&reflector, &anonymous).unwrap() else {
        panic!("expected an anonymous class on line 2");
    };
    assert!(class.is_anonymous());
    assert!(class.name().starts_with("class@anonymous"));
    assert!(class.name().ends_with(":2"));
    assert_eq!(class.parent_class_name().as_deref(), Some("Base"));

    let on_three = AnonymousClassSourceLocator::new(&file, 3, ast).unwrap();
    assert!(matches!(
        on_three.locate_one(&reflector, &anonymous),
        Err(ReflectionError::TwoAnonymousClassesOnSameLine { line: 3, .. })
    ));
}

#[test]
fn unmemoized_file_sources_see_later_edits() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "a.php", "<?php class Foo {}");
    let env = ReflectionBuilder::new()
        .with_file(&file)
        .with_memoization(false)
        .build()
        .unwrap();
    assert_eq!(env.classes().reflect("Foo").unwrap().name(), "Foo");

    write_file(dir.path(), "a.php", "<?php class Foo {} class Bar {}");
    assert_eq!(env.classes().reflect("Bar").unwrap().name(), "Bar");
}

#[test]
fn directory_lookups_walk_the_tree_again() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.php", "<?php class A {}");
    let ast = Rc::new(AstLocator::new());
    let locator = DirectoriesSourceLocator::new(vec![dir.path().to_path_buf()], ast).unwrap();
    let reflector = Reflector::new(Rc::new(locator));
    assert!(reflector.reflect_class("Late").unwrap_err().is_not_found());

    write_file(dir.path(), "late/Late.php", "<?php class Late {}");
    assert_eq!(reflector.reflect_class("Late").unwrap().name(), "Late");
}
