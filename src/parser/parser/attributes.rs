use super::Parser;
use crate::parser::ast::{Attribute, AttributeGroup};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;

impl<'src> Parser<'src> {
    pub(super) fn parse_attributes(&mut self) -> Vec<AttributeGroup> {
        let mut groups = Vec::new();
        while self.current_token.kind == TokenKind::Attribute {
            let start = self.current_token.span.start;
            self.bump(); // #[

            let mut attributes = Vec::new();
            while self.current_token.kind != TokenKind::CloseBracket
                && self.current_token.kind != TokenKind::Eof
            {
                let name = self.parse_name();
                let args = if self.current_token.kind == TokenKind::OpenParen {
                    self.parse_call_arguments()
                } else {
                    Vec::new()
                };

                let span = Span::new(name.span.start, self.last_end);
                attributes.push(Attribute { name, args, span });

                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }

            if self.expect(TokenKind::CloseBracket, "Expected ']' to close attribute") {
                self.bump();
            } else {
                self.sync_to_statement_end();
            }

            groups.push(AttributeGroup {
                attributes,
                span: Span::new(start, self.last_end),
            });
        }
        groups
    }
}
