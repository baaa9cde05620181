mod common;

use common::env_for;
use php_reflect::{FunctionLike, ReflectionBuilder, ReflectionError, Value};

const HIERARCHY: &str = r#"<?php
namespace App;

interface Runs { public function run(): void; }
interface RunsFast extends Runs {}

abstract class Base implements RunsFast {
    const X = 1;
    protected const HIDDEN = 'base';
    private const SECRET = 'no';

    public function run(): void {}
    private function helper() {}
}

final class Child extends Base {
    const A = self::B;
    const B = parent::X;
    const LIST = [self::B, 'two' => parent::HIDDEN];

    public function run(): void {}
}
"#;

#[test]
fn resolves_self_and_parent_constants() {
    let env = env_for(HIERARCHY);
    let child = env.classes().reflect("App\\Child").unwrap();

    let a = child.constant("A").unwrap().expect("A is declared");
    assert_eq!(a.value().unwrap(), Value::Int(1));
    let b = child.constant("B").unwrap().expect("B is declared");
    assert_eq!(b.value().unwrap(), Value::Int(1));

    let list = child.constant("LIST").unwrap().unwrap().value().unwrap();
    assert_eq!(
        list.to_string(),
        "array (\n  0 => 1,\n  'two' => 'base',\n)"
    );
}

#[test]
fn inherits_visible_constants_only() {
    let env = env_for(HIERARCHY);
    let child = env.classes().reflect("App\\Child").unwrap();

    assert!(child.has_constant("X").unwrap());
    assert!(child.has_constant("HIDDEN").unwrap());
    assert!(!child.has_constant("SECRET").unwrap());
    // Constant names are case-sensitive.
    assert!(!child.has_constant("x").unwrap());

    let x = child.constant("X").unwrap().unwrap();
    assert_eq!(x.declaring_class().name(), "App\\Base");
}

#[test]
fn collects_inherited_interfaces() {
    let env = env_for(HIERARCHY);
    let child = env.classes().reflect("App\\Child").unwrap();

    assert_eq!(
        child.interface_names().unwrap(),
        vec!["App\\RunsFast".to_string(), "App\\Runs".to_string()]
    );
    assert!(child.implements_interface("\\App\\Runs").unwrap());
    assert!(child.is_subclass_of("App\\Base").unwrap());
    assert!(child.is_subclass_of("app\\runs").unwrap());
    assert_eq!(child.parent_class_names().unwrap(), vec!["App\\Base".to_string()]);
}

#[test]
fn finds_prototype_in_nearest_ancestor() {
    let env = env_for(HIERARCHY);
    let child = env.classes().reflect("App\\Child").unwrap();

    let run = child.method("RUN").unwrap().expect("run is declared");
    assert_eq!(run.declaring_class_name(), "App\\Child");
    let prototype = run.prototype().unwrap().expect("run overrides Base::run");
    assert_eq!(prototype.declaring_class_name(), "App\\Base");

    let base_run = prototype.prototype().unwrap().expect("Base::run implements Runs::run");
    assert_eq!(base_run.declaring_class_name(), "App\\Runs");
    assert!(base_run.is_abstract());
    assert!(base_run.prototype().unwrap().is_none());
}

#[test]
fn merges_inherited_methods() {
    let env = env_for(HIERARCHY);
    let child = env.classes().reflect("App\\Child").unwrap();

    let names: Vec<String> = child
        .methods()
        .unwrap()
        .iter()
        .map(|method| method.name().to_string())
        .collect();
    assert_eq!(names, vec!["run".to_string(), "helper".to_string()]);
    assert!(child.method("helper").unwrap().unwrap().is_private());
    assert_eq!(child.immediate_methods().unwrap().len(), 1);
}

#[test]
fn reports_class_flags() {
    let env = env_for(HIERARCHY);
    let base = env.classes().reflect("app\\base").unwrap();
    assert_eq!(base.name(), "App\\Base");
    assert_eq!(base.short_name(), "Base");
    assert_eq!(base.namespace_name(), Some("App"));
    assert!(base.is_abstract());
    assert!(!base.is_instantiable());
    assert!(base.is_user_defined());
    assert!(!base.is_internal());

    let child = env.classes().reflect("App\\Child").unwrap();
    assert!(child.is_final());
    assert!(child.is_instantiable());

    let runs = env.classes().reflect("App\\Runs").unwrap();
    assert!(runs.is_interface());
    assert!(runs.parent_class().unwrap().is_none());
}

#[test]
fn repeated_reflection_is_deterministic() {
    let env = ReflectionBuilder::new()
        .with_string(HIERARCHY)
        .with_memoization(false)
        .build()
        .unwrap();

    let first = env.classes().reflect("App\\Child").unwrap();
    let second = env.classes().reflect("App\\Child").unwrap();
    assert_eq!(first.name(), second.name());
    assert_eq!(first.start_line(), second.start_line());
    assert_eq!(first.end_line(), second.end_line());
    assert_eq!(
        first.constant("LIST").unwrap().unwrap().value().unwrap(),
        second.constant("LIST").unwrap().unwrap().value().unwrap()
    );
}

#[test]
fn detects_inheritance_cycles() {
    let env = env_for("<?php class A extends B {} class B extends A {}");
    let a = env.classes().reflect("A").unwrap();
    assert!(matches!(
        a.parent_class_names(),
        Err(ReflectionError::CircularReference(_))
    ));
}

#[test]
fn missing_class_is_not_found() {
    let env = env_for("<?php class A {}");
    let err = env.classes().reflect("Nope").unwrap_err();
    assert!(err.is_not_found());

    let a = env.classes().reflect("A").unwrap();
    assert!(a.parent_class().unwrap().is_none());
}

#[test]
fn imports_trait_members() {
    let env = env_for(
        r#"<?php
trait Greets {
    public $greeting = 'hi';
    public function hello() { return 1; }
    public function bye() {}
}
trait Waves {
    public function hello() { return 2; }
}
class Person {
    use Greets, Waves {
        Greets::hello insteadof Waves;
        Waves::hello as protected wave;
        bye as private;
    }
}
"#,
    );
    let person = env.classes().reflect("Person").unwrap();
    assert_eq!(person.trait_names(), vec!["Greets".to_string(), "Waves".to_string()]);

    let hello = person.method("hello").unwrap().unwrap();
    assert_eq!(hello.trait_name(), Some("Greets"));
    assert_eq!(hello.declaring_class_name(), "Person");

    let wave = person.method("wave").unwrap().unwrap();
    assert!(wave.is_protected());
    assert_eq!(wave.original_name(), "hello");
    assert_eq!(wave.trait_name(), Some("Waves"));

    assert!(person.method("bye").unwrap().unwrap().is_private());

    let greeting = person.property("greeting").unwrap().unwrap();
    assert_eq!(greeting.trait_name(), Some("Greets"));
    assert_eq!(greeting.default_value().unwrap(), Some(Value::String("hi".into())));
}

#[test]
fn reflects_backed_enums() {
    let env = env_for(
        r#"<?php
enum Suit: string implements JsonSerializable {
    case Hearts = 'H';
    case Spades = 'S';
    const Wild = self::Spades;
    public function jsonSerialize(): mixed { return 1; }
}
"#,
    );
    let suit = env.classes().reflect("Suit").unwrap();
    assert!(suit.is_enum());
    assert!(suit.is_final());
    assert!(suit.is_backed());
    assert_eq!(suit.backing_type().unwrap().to_string(), "string");

    let cases: Vec<String> = suit.cases().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(cases, vec!["Hearts".to_string(), "Spades".to_string()]);
    assert_eq!(
        suit.case("Hearts").unwrap().backing_value().unwrap(),
        Some(Value::String("H".into()))
    );

    assert!(suit.implements_interface("JsonSerializable").unwrap());
    let interface = &suit.interfaces().unwrap()[0];
    assert!(interface.is_internal());
    assert_eq!(interface.extension_name(), Some("json"));

    let wild = suit.constant("Wild").unwrap().unwrap();
    assert!(matches!(wild.value(), Err(ReflectionError::UnableToCompileNode(_))));
}

#[test]
fn reflects_promoted_and_declared_properties() {
    let env = env_for(
        r#"<?php
class Base { protected int $count = 0; private $hidden; }
readonly class Point extends Base {
    /** The x */
    public float $x;
    public static $instances = [];

    public function __construct(private int $id = 5, public ?string $label = null) {}
}
"#,
    );
    let point = env.classes().reflect("Point").unwrap();

    let id = point.property("id").unwrap().expect("promoted property");
    assert!(id.is_promoted());
    assert!(id.is_private());
    assert!(id.is_readonly());
    assert_eq!(id.property_type().unwrap().to_string(), "int");

    let label = point.property("label").unwrap().unwrap();
    assert!(label.property_type().unwrap().allows_null());

    let x = point.property("x").unwrap().unwrap();
    assert_eq!(x.doc_comment(), Some("/** The x */"));
    assert!(!x.has_default_value());

    let instances = point.property("instances").unwrap().unwrap();
    assert!(instances.is_static());
    assert!(!instances.has_type());

    assert!(point.has_property("count").unwrap());
    assert!(!point.has_property("hidden").unwrap());
    assert!(!point.has_property("ID").unwrap());

    let ctor = point.constructor().unwrap().unwrap();
    assert!(ctor.is_constructor());
    assert_eq!(ctor.number_of_parameters(), 2);
    assert_eq!(ctor.number_of_required_parameters(), 0);
}

#[test]
fn resolves_declared_types() {
    let env = env_for(
        r#"<?php
namespace Shop;

use Money\Amount as Price;

class Cart {
    public function total(?Price $discount, int|string $code, Item $item = null): static|false { return $this; }
    public function items(Countable&\Traversable $items): iterable { return []; }
}
"#,
    );
    let cart = env.classes().reflect("Shop\\Cart").unwrap();
    let total = cart.method("total").unwrap().unwrap();
    let params = total.parameters();

    let discount = params[0].param_type().unwrap();
    assert_eq!(discount.to_string(), "?Money\\Amount");
    assert_eq!(discount.as_named().unwrap().class_name(), Some("Money\\Amount"));

    let code = params[1].param_type().unwrap();
    assert_eq!(code.to_string(), "int|string");
    assert!(!code.allows_null());
    assert_eq!(code.members().len(), 2);

    let item = params[2].param_type().unwrap();
    assert_eq!(item.to_string(), "?Shop\\Item");
    assert!(params[2].allows_null());
    assert!(params[2].is_optional());
    assert_eq!(params[2].default_value().unwrap(), Some(Value::Null));

    let returns = total.return_type().unwrap();
    assert_eq!(returns.to_string(), "static|false");

    let items = cart.method("items").unwrap().unwrap();
    let ty = items.parameters()[0].param_type().unwrap();
    assert_eq!(ty.to_string(), "Shop\\Countable&Traversable");
    assert!(items.return_type().unwrap().is_builtin());
}

#[test]
fn reflect_all_skips_anonymous_classes() {
    let env = env_for("<?php\nclass Named {}\n$x = new class {};\n");
    let all: Vec<String> = env
        .classes()
        .reflect_all()
        .unwrap()
        .iter()
        .map(|class| class.name().to_string())
        .collect();
    assert_eq!(all, vec!["Named".to_string()]);
}

#[test]
fn constant_values_are_compiled_once_per_class() {
    // Each level reads the previous constant twice; the repeated key keeps the value small.
    let mut code = String::from("<?php\nclass Chain {\n    const C0 = 1;\n");
    for i in 1..=30 {
        code.push_str(&format!(
            "    const C{i} = [0 => self::C{prev}, 0 => self::C{prev}];\n",
            prev = i - 1
        ));
    }
    code.push_str("}\n");

    let env = env_for(&code);
    let chain = env.classes().reflect("Chain").unwrap();
    let first = chain.constant("C30").unwrap().unwrap().value().unwrap();
    let second = chain.constant("C30").unwrap().unwrap().value().unwrap();
    assert_eq!(first, second);

    let mut depth = 0;
    let mut current = &first;
    while let Value::Array(items) = current {
        assert_eq!(items.len(), 1);
        current = &items[0];
        depth += 1;
    }
    assert_eq!(depth, 30);
    assert_eq!(current, &Value::Int(1));
}
