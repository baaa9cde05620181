use crate::parser::ast::{Ident, Name, NameKind, ParseError, Program};
use crate::parser::lexer::{
    Lexer,
    token::{Token, TokenKind},
};

use crate::parser::span::Span;

mod attributes;
mod definitions;
mod expr;
mod stmt;
mod types;

pub(crate) use stmt::ScanScope;

const MAX_NESTING: usize = 256;

/// Parses a whole file.
pub fn parse(source: &str) -> Program {
    Parser::new(source).parse_program()
}

pub struct Parser<'src> {
    pub(super) source: &'src str,
    pub(super) lexer: Lexer<'src>,
    pub(super) current_token: Token,
    pub(super) next_token: Token,
    /// Kind of the most recently consumed token.
    pub(super) prev_kind: TokenKind,
    /// End offset of the most recently consumed token.
    pub(super) last_end: usize,
    pub(super) errors: Vec<ParseError>,
    pub(super) current_doc_comment: Option<Span>,
    pub(super) next_doc_comment: Option<Span>,
    /// Set whenever a `yield` is consumed; saved and restored around function bodies.
    pub(super) saw_yield: bool,
    pub(super) nesting: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let eof = Token {
            kind: TokenKind::Eof,
            span: Span::new(source.len(), source.len()),
        };
        let mut parser = Self {
            source,
            lexer: Lexer::new(source),
            current_token: eof,
            next_token: eof,
            prev_kind: TokenKind::OpenTag,
            last_end: 0,
            errors: Vec::new(),
            current_doc_comment: None,
            next_doc_comment: None,
            saw_yield: false,
            nesting: 0,
        };
        parser.bump();
        parser.bump();
        parser.prev_kind = TokenKind::OpenTag;
        parser.last_end = 0;
        parser
    }

    pub(super) fn bump(&mut self) {
        self.prev_kind = self.current_token.kind;
        self.last_end = self.current_token.span.end;
        self.current_token = self.next_token;
        self.current_doc_comment = self.next_doc_comment;
        self.next_doc_comment = None;
        loop {
            let token = self.lexer.next().unwrap_or(Token {
                kind: TokenKind::Eof,
                span: Span::new(self.source.len(), self.source.len()),
            });
            if token.kind == TokenKind::DocComment {
                self.next_doc_comment = Some(token.span);
            } else if token.kind != TokenKind::Comment {
                self.next_token = token;
                break;
            }
        }
    }

    pub(super) fn text(&self, token: &Token) -> &'src str {
        token.span.as_str(self.source)
    }

    pub(super) fn current_text(&self) -> &'src str {
        self.current_token.span.as_str(self.source)
    }

    pub(super) fn current_is_word(&self, word: &str) -> bool {
        self.current_token.kind == TokenKind::Identifier
            && self.current_text().eq_ignore_ascii_case(word)
    }

    pub(super) fn error(&mut self, span: Span, message: &'static str) {
        self.errors.push(ParseError { span, message });
    }

    /// Records an error unless the current token has the expected kind. Does not consume.
    pub(super) fn expect(&mut self, kind: TokenKind, message: &'static str) -> bool {
        if self.current_token.kind == kind {
            true
        } else {
            self.error(self.current_token.span, message);
            false
        }
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current_token.kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(super) fn expect_semicolon(&mut self) {
        match self.current_token.kind {
            TokenKind::SemiColon => self.bump(),
            // Implicit semicolon at close tag or end of file.
            TokenKind::CloseTag | TokenKind::Eof => {}
            _ => {
                self.error(self.current_token.span, "Missing semicolon");
                self.sync_to_statement_end();
            }
        }
    }

    pub(super) fn sync_to_statement_end(&mut self) {
        while !matches!(
            self.current_token.kind,
            TokenKind::SemiColon | TokenKind::CloseBrace | TokenKind::CloseTag | TokenKind::Eof
        ) {
            self.bump();
        }
        if self.current_token.kind == TokenKind::SemiColon {
            self.bump();
        }
    }

    pub(super) fn parse_ident(&mut self, message: &'static str) -> Ident {
        if self.current_token.kind.is_identifier_like() {
            let ident = Ident {
                name: self.current_text().to_string(),
                span: self.current_token.span,
            };
            self.bump();
            ident
        } else {
            self.error(self.current_token.span, message);
            Ident {
                name: String::new(),
                span: Span::new(self.current_token.span.start, self.current_token.span.start),
            }
        }
    }

    /// Parses `Foo`, `Foo\Bar`, `\Foo\Bar` or `namespace\Foo`. A trailing `\`
    /// that is not followed by a name part is left unconsumed (group use).
    pub(super) fn parse_name(&mut self) -> Name {
        let start = self.current_token.span.start;
        let mut parts = Vec::new();
        let mut kind = NameKind::Unqualified;

        if self.current_token.kind == TokenKind::NsSeparator {
            kind = NameKind::FullyQualified;
            self.bump();
        } else if self.current_token.kind == TokenKind::Namespace
            && self.next_token.kind == TokenKind::NsSeparator
        {
            kind = NameKind::Relative;
            self.bump();
            self.bump();
        }

        while self.current_token.kind.is_identifier_like() {
            parts.push(self.current_text().to_string());
            self.bump();
            if self.current_token.kind == TokenKind::NsSeparator
                && self.next_token.kind.is_identifier_like()
            {
                self.bump();
            } else {
                break;
            }
        }

        if parts.is_empty() {
            self.error(self.current_token.span, "Expected name");
        } else if kind == NameKind::Unqualified && parts.len() > 1 {
            kind = NameKind::Qualified;
        }

        Name {
            parts,
            kind,
            span: Span::new(start, self.last_end.max(start)),
        }
    }

    pub(super) fn enter_nesting(&mut self) -> bool {
        if self.nesting >= MAX_NESTING {
            self.error(self.current_token.span, "Maximum nesting depth exceeded");
            return false;
        }
        self.nesting += 1;
        true
    }

    pub(super) fn leave_nesting(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    pub fn parse_program(&mut self) -> Program {
        let statements = self.scan_statements(ScanScope::File);

        let span = Span::new(0, self.source.len());

        Program {
            statements,
            errors: std::mem::take(&mut self.errors),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{
        ClassKind, ClassMember, ClassRef, Expr, FunctionKind, Stmt, Type, UseKind,
    };

    fn parse_ok(code: &str) -> Program {
        let program = parse(code);
        assert!(
            program.errors.is_empty(),
            "unexpected errors: {:?}",
            program
                .errors
                .iter()
                .map(|e| e.to_human_readable(code))
                .collect::<Vec<_>>()
        );
        program
    }

    #[test]
    fn parses_namespaces_and_imports() {
        let program = parse_ok(
            "<?php namespace App\\Model; use Foo\\Bar as Baz; use function Lib\\helper; use const Lib\\{A, B as C};",
        );
        let Stmt::Namespace { name, body, .. } = &program.statements[0] else {
            panic!("expected namespace");
        };
        assert_eq!(name.as_ref().map(|n| n.joined()).as_deref(), Some("App\\Model"));
        let uses: Vec<_> = body
            .iter()
            .filter_map(|s| match s {
                Stmt::Use { uses, .. } => Some(uses.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(uses.len(), 4);
        assert_eq!(uses[0].local_name(), "Baz");
        assert_eq!(uses[1].kind, UseKind::Function);
        assert_eq!(uses[3].name.joined(), "Lib\\B");
        assert_eq!(uses[3].local_name(), "C");
        assert_eq!(uses[3].kind, UseKind::Const);
    }

    #[test]
    fn parses_class_with_members() {
        let program = parse_ok(
            r#"<?php
/** Doc */
#[Entity]
final class User extends Base implements \JsonSerializable, Countable {
    use Greets { hello as protected hi; }
    public const int MAX = 10, MIN = -1;
    private ?string $name = null;
    public function __construct(private readonly int $id = self::MAX, string ...$tags) {}
    abstract protected static function &make(): static;
}
"#,
        );
        let Stmt::ClassLike(class) = &program.statements[0] else {
            panic!("expected class");
        };
        assert_eq!(class.kind, ClassKind::Class);
        assert_eq!(class.name.as_ref().map(|n| n.name.as_str()), Some("User"));
        assert!(class.modifiers.is_final);
        assert!(class.doc_comment.is_some());
        assert_eq!(class.attributes.len(), 1);
        assert_eq!(class.extends[0].joined(), "Base");
        assert_eq!(class.implements.len(), 2);
        assert_eq!(class.members.len(), 5);

        let ClassMember::Method(ctor) = &class.members[3] else {
            panic!("expected constructor");
        };
        assert!(ctor.params[0].is_promoted());
        assert!(ctor.params[1].variadic);
        assert!(matches!(
            ctor.params[0].default.as_deref(),
            Some(Expr::ClassConstFetch { .. })
        ));

        let ClassMember::Method(make) = &class.members[4] else {
            panic!("expected method");
        };
        assert!(make.by_ref);
        assert!(make.body.is_none());
        assert!(matches!(make.return_type, Some(Type::Named(_))));
    }

    #[test]
    fn finds_nested_declarations_in_function_bodies() {
        let program = parse_ok(
            r#"<?php
if (!function_exists('outer')) {
    function outer() {
        $f = function () use ($x) { yield 1; };
        $g = static fn($a) => $a * 2;
        $o = new class(1) extends Foo {};
        define('INNER', 1);
        return $f;
    }
}
"#,
        );
        let Stmt::Function(outer) = &program.statements[0] else {
            panic!("expected function, got {:?}", program.statements);
        };
        let body = outer.body.as_ref().expect("body");
        assert!(!body.has_yield);
        assert_eq!(body.statements.len(), 4);

        let Stmt::Expression { expr, .. } = &body.statements[0] else {
            panic!("expected closure");
        };
        let Expr::Closure(closure) = expr.as_ref() else {
            panic!("expected closure");
        };
        assert_eq!(closure.kind, FunctionKind::Closure);
        assert!(closure.body.as_ref().is_some_and(|b| b.has_yield));
        assert_eq!(closure.uses.len(), 1);

        let Stmt::Expression { expr, .. } = &body.statements[2] else {
            panic!("expected anonymous class");
        };
        assert!(matches!(
            expr.as_ref(),
            Expr::New {
                class: ClassRef::Anonymous(_),
                ..
            }
        ));
    }

    #[test]
    fn parses_enums() {
        let program = parse_ok(
            "<?php enum Suit: string implements HasLabel { case Hearts = 'H'; case Spades = 'S'; const Wild = self::Spades; }",
        );
        let Stmt::ClassLike(class) = &program.statements[0] else {
            panic!("expected enum");
        };
        assert_eq!(class.kind, ClassKind::Enum);
        assert!(class.backing_type.is_some());
        assert_eq!(class.members.len(), 3);
    }

    #[test]
    fn reports_syntax_errors() {
        let program = parse("<?php class { }");
        assert!(!program.errors.is_empty());

        let program = parse("<?php function foo() {");
        assert!(!program.errors.is_empty());
    }

    #[test]
    fn ignores_member_names_that_look_like_declarations() {
        let program = parse_ok("<?php $a = Foo::class; $b->function(); $c = $d::const;");
        assert!(program.statements.is_empty());
    }
}
