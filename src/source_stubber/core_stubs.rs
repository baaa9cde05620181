use lazy_static::lazy_static;

use super::{MapSourceStubber, SourceStubber, StubData};

const CLASSES: &[(&str, &str, &str)] = &[
    ("Traversable", "Core", "interface Traversable {}"),
    (
        "Iterator",
        "Core",
        "interface Iterator extends Traversable {
    public function current(): mixed;
    public function next(): void;
    public function key(): mixed;
    public function valid(): bool;
    public function rewind(): void;
}",
    ),
    (
        "IteratorAggregate",
        "Core",
        "interface IteratorAggregate extends Traversable {
    public function getIterator(): Iterator;
}",
    ),
    (
        "ArrayAccess",
        "Core",
        "interface ArrayAccess {
    public function offsetExists(mixed $offset): bool;
    public function offsetGet(mixed $offset): mixed;
    public function offsetSet(mixed $offset, mixed $value): void;
    public function offsetUnset(mixed $offset): void;
}",
    ),
    (
        "Countable",
        "Core",
        "interface Countable {
    public function count(): int;
}",
    ),
    (
        "Stringable",
        "Core",
        "interface Stringable {
    public function __toString(): string;
}",
    ),
    (
        "UnitEnum",
        "Core",
        "interface UnitEnum {
    public static function cases(): array;
}",
    ),
    (
        "BackedEnum",
        "Core",
        "interface BackedEnum extends UnitEnum {
    public static function from(int|string $value): static;
    public static function tryFrom(int|string $value): ?static;
}",
    ),
    (
        "Throwable",
        "Core",
        "interface Throwable extends Stringable {
    public function getMessage(): string;
    public function getCode();
    public function getFile(): string;
    public function getLine(): int;
    public function getPrevious(): ?Throwable;
}",
    ),
    (
        "Exception",
        "Core",
        "class Exception implements Throwable {
    protected $message = '';
    protected $code = 0;
    protected string $file = '';
    protected int $line = 0;
    public function __construct(string $message = '', int $code = 0, ?Throwable $previous = null) {}
    final public function getMessage(): string {}
    final public function getCode() {}
    final public function getFile(): string {}
    final public function getLine(): int {}
    final public function getPrevious(): ?Throwable {}
    public function __toString(): string {}
}",
    ),
    (
        "Error",
        "Core",
        "class Error implements Throwable {
    protected $message = '';
    protected $code = 0;
    public function __construct(string $message = '', int $code = 0, ?Throwable $previous = null) {}
    final public function getMessage(): string {}
    final public function getCode() {}
    final public function getFile(): string {}
    final public function getLine(): int {}
    final public function getPrevious(): ?Throwable {}
    public function __toString(): string {}
}",
    ),
    (
        "stdClass",
        "Core",
        "class stdClass {}",
    ),
    (
        "JsonSerializable",
        "json",
        "interface JsonSerializable {
    public function jsonSerialize(): mixed;
}",
    ),
];

const FUNCTIONS: &[(&str, &str, &str)] = &[
    (
        "define",
        "Core",
        "function define(string $constant_name, mixed $value, bool $case_insensitive = false): bool {}",
    ),
    (
        "defined",
        "Core",
        "function defined(string $constant_name): bool {}",
    ),
    (
        "strlen",
        "Core",
        "function strlen(string $string): int {}",
    ),
    (
        "count",
        "standard",
        "function count(Countable|array $value, int $mode = COUNT_NORMAL): int {}",
    ),
    (
        "array_map",
        "standard",
        "function array_map(?callable $callback, array $array, array ...$arrays): array {}",
    ),
    (
        "sprintf",
        "standard",
        "function sprintf(string $format, mixed ...$values): string {}",
    ),
];

const CONSTANTS: &[(&str, &str, &str)] = &[
    ("PHP_EOL", "Core", "const PHP_EOL = \"\\n\";"),
    ("PHP_INT_MAX", "Core", "const PHP_INT_MAX = 9223372036854775807;"),
    ("PHP_INT_SIZE", "Core", "const PHP_INT_SIZE = 8;"),
    ("E_ALL", "Core", "const E_ALL = 32767;"),
    ("E_ERROR", "Core", "const E_ERROR = 1;"),
    ("E_WARNING", "Core", "const E_WARNING = 2;"),
    ("DIRECTORY_SEPARATOR", "standard", "const DIRECTORY_SEPARATOR = '/';"),
    ("COUNT_NORMAL", "standard", "const COUNT_NORMAL = 0;"),
    ("COUNT_RECURSIVE", "standard", "const COUNT_RECURSIVE = 1;"),
    ("M_PI", "standard", "const M_PI = 3.141592653589793;"),
];

lazy_static! {
    static ref CORE_STUBS: MapSourceStubber = build_core_stubs();
}

fn stub(extension: &str, body: &str) -> StubData {
    StubData::new(format!("<?php\n\n{body}\n"), Some(extension))
}

fn build_core_stubs() -> MapSourceStubber {
    let mut stubber = MapSourceStubber::new();
    for (name, extension, body) in CLASSES {
        stubber = stubber.with_class(name, stub(extension, body));
    }
    for (name, extension, body) in FUNCTIONS {
        stubber = stubber.with_function(name, stub(extension, body));
    }
    for (name, extension, body) in CONSTANTS {
        stubber = stubber.with_constant(name, stub(extension, body));
    }
    stubber
}

/// Stubs for the core interfaces, classes, functions and constants every PHP
/// runtime provides.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreStubs;

impl SourceStubber for CoreStubs {
    fn generate_class_stub(&self, class_name: &str) -> Option<StubData> {
        CORE_STUBS.generate_class_stub(class_name)
    }

    fn generate_function_stub(&self, function_name: &str) -> Option<StubData> {
        CORE_STUBS.generate_function_stub(function_name)
    }

    fn generate_constant_stub(&self, constant_name: &str) -> Option<StubData> {
        CORE_STUBS.generate_constant_stub(constant_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::parse;

    #[test]
    fn every_stub_parses() {
        for (name, _, body) in CLASSES.iter().chain(FUNCTIONS).chain(CONSTANTS) {
            let code = format!("<?php\n\n{body}\n");
            let program = parse(&code);
            assert!(program.errors.is_empty(), "stub for {name} failed to parse");
        }
    }

    #[test]
    fn stubs_carry_extension_names() {
        let stub = CoreStubs.generate_class_stub("jsonserializable").unwrap();
        assert_eq!(stub.extension.as_deref(), Some("json"));
        assert!(CoreStubs.generate_constant_stub("PHP_EOL").is_some());
        assert!(CoreStubs.generate_class_stub("NoSuchThing").is_none());
    }
}
