use super::Parser;
use crate::parser::ast::{Name, NameKind, Type};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;

impl<'src> Parser<'src> {
    fn parse_type_atomic(&mut self) -> Option<Type> {
        let start = self.current_token.span.start;
        match self.current_token.kind {
            TokenKind::Question => {
                self.bump();
                let inner = self.parse_type_atomic()?;
                Some(Type::Nullable {
                    inner: Box::new(inner),
                    span: Span::new(start, self.last_end),
                })
            }
            TokenKind::OpenParen => {
                // DNF group: `(A&B)|null`
                self.bump();
                let ty = self.parse_type()?;
                if self.expect(TokenKind::CloseParen, "Expected ')' in type") {
                    self.bump();
                }
                Some(ty)
            }
            TokenKind::Array | TokenKind::Static => {
                let name = Name {
                    parts: vec![self.current_text().to_string()],
                    kind: NameKind::Unqualified,
                    span: self.current_token.span,
                };
                self.bump();
                Some(Type::Named(name))
            }
            TokenKind::Identifier | TokenKind::NsSeparator => Some(Type::Named(self.parse_name())),
            TokenKind::Namespace if self.next_token.kind == TokenKind::NsSeparator => {
                Some(Type::Named(self.parse_name()))
            }
            _ => None,
        }
    }

    fn parse_type_intersection(&mut self) -> Option<Type> {
        let start = self.current_token.span.start;
        let first = self.parse_type_atomic()?;

        // `A &$x` is a by-reference parameter, not an intersection.
        let continues = |parser: &Self| {
            parser.current_token.kind == TokenKind::Ampersand
                && matches!(
                    parser.next_token.kind,
                    TokenKind::Identifier
                        | TokenKind::NsSeparator
                        | TokenKind::Question
                        | TokenKind::OpenParen
                )
        };
        if !continues(self) {
            return Some(first);
        }

        let mut types = vec![first];
        while continues(self) {
            self.bump();
            match self.parse_type_atomic() {
                Some(ty) => types.push(ty),
                None => break,
            }
        }
        Some(Type::Intersection {
            types,
            span: Span::new(start, self.last_end),
        })
    }

    pub(super) fn parse_type(&mut self) -> Option<Type> {
        let start = self.current_token.span.start;
        let first = self.parse_type_intersection()?;

        if self.current_token.kind != TokenKind::Pipe {
            return Some(first);
        }

        let mut types = vec![first];
        while self.eat(TokenKind::Pipe) {
            match self.parse_type_intersection() {
                Some(ty) => types.push(ty),
                None => {
                    self.error(self.current_token.span, "Expected type after '|'");
                    break;
                }
            }
        }
        Some(Type::Union {
            types,
            span: Span::new(start, self.last_end),
        })
    }
}
