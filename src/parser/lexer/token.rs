use crate::parser::span::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.as_str(source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize)]
pub enum TokenKind {
    // Declaration keywords
    Function,
    Fn,
    Class,
    Interface,
    Trait,
    Extends,
    Implements,
    Namespace,
    Use,
    Const,
    Insteadof,
    As,

    // Modifiers
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Readonly,

    // Expression keywords
    New,
    Clone,
    InstanceOf,
    Array,
    List,
    Isset,
    Empty,
    Eval,
    Exit,
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
    Print,
    Yield,
    YieldFrom,
    Throw,
    Match,
    Default,
    Declare,
    Global,
    Return,
    Echo,
    HaltCompiler,
    LogicalAnd,
    LogicalOr,
    LogicalXor,

    // Magic constants
    Line,
    File,
    Dir,
    ClassC,
    TraitC,
    MethodC,
    FuncC,
    NsC,
    PropertyC,

    // Casts
    IntCast,
    FloatCast,
    StringCast,
    ArrayCast,
    ObjectCast,
    BoolCast,
    UnsetCast,

    // Identifiers & literals
    Identifier,
    Variable,
    LNumber,
    DNumber,
    /// Single-quoted string or nowdoc.
    ConstantString,
    /// Double-quoted string or heredoc; may contain interpolation.
    TemplateString,
    /// Backtick shell execution.
    ShellExec,
    InlineHtml,
    NsSeparator,
    Dollar,

    // Comments
    Comment,
    DocComment,

    // Symbols
    Attribute, // #[
    Arrow,
    NullSafeArrow,
    DoubleArrow,
    DoubleColon,
    Ellipsis,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Dot,
    Pow,
    Inc,
    Dec,
    Eq,
    PlusEq,
    MinusEq,
    MulEq,
    DivEq,
    ModEq,
    ConcatEq,
    PowEq,
    AndEq,
    OrEq,
    XorEq,
    SlEq,
    SrEq,
    CoalesceEq,
    EqEq,
    EqEqEq,
    Bang,
    BangEq,
    BangEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Spaceship,
    Ampersand,
    Pipe,
    Caret,
    BitNot,
    Sl,
    Sr,
    AmpersandAmpersand,
    PipePipe,
    Question,
    Coalesce,
    At,
    SemiColon,
    Colon,
    Comma,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,

    OpenTag,
    OpenTagEcho,
    CloseTag,

    Eof,
    Error,
}

impl TokenKind {
    /// Keywords that may still be used as member names (`function list()`,
    /// `const DEFAULT`, `$obj->class`).
    pub fn is_semi_reserved(self) -> bool {
        matches!(
            self,
            TokenKind::Function
                | TokenKind::Fn
                | TokenKind::Class
                | TokenKind::Interface
                | TokenKind::Trait
                | TokenKind::Extends
                | TokenKind::Implements
                | TokenKind::Namespace
                | TokenKind::Use
                | TokenKind::Const
                | TokenKind::Insteadof
                | TokenKind::As
                | TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Static
                | TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Readonly
                | TokenKind::New
                | TokenKind::Clone
                | TokenKind::InstanceOf
                | TokenKind::Array
                | TokenKind::List
                | TokenKind::Isset
                | TokenKind::Empty
                | TokenKind::Eval
                | TokenKind::Exit
                | TokenKind::Include
                | TokenKind::IncludeOnce
                | TokenKind::Require
                | TokenKind::RequireOnce
                | TokenKind::Print
                | TokenKind::Yield
                | TokenKind::Throw
                | TokenKind::Match
                | TokenKind::Default
                | TokenKind::Declare
                | TokenKind::Global
                | TokenKind::Return
                | TokenKind::Echo
                | TokenKind::HaltCompiler
                | TokenKind::LogicalAnd
                | TokenKind::LogicalOr
                | TokenKind::LogicalXor
                | TokenKind::Line
                | TokenKind::File
                | TokenKind::Dir
                | TokenKind::ClassC
                | TokenKind::TraitC
                | TokenKind::MethodC
                | TokenKind::FuncC
                | TokenKind::NsC
                | TokenKind::PropertyC
        )
    }

    /// Tokens usable as an identifier (plain identifiers and semi-reserved keywords).
    pub fn is_identifier_like(self) -> bool {
        self == TokenKind::Identifier || self.is_semi_reserved()
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Static
                | TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Readonly
        )
    }

    pub fn is_cast(self) -> bool {
        matches!(
            self,
            TokenKind::IntCast
                | TokenKind::FloatCast
                | TokenKind::StringCast
                | TokenKind::ArrayCast
                | TokenKind::ObjectCast
                | TokenKind::BoolCast
                | TokenKind::UnsetCast
        )
    }
}
