use crate::parser::span::{LineInfo, Span};
use serde::Serialize;
use std::rc::Rc;

pub mod visitor;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParseError {
    pub span: Span,
    pub message: &'static str,
}

impl ParseError {
    pub fn to_human_readable(&self, source: &str) -> String {
        self.to_human_readable_with_path(source, None)
    }

    pub fn to_human_readable_with_path(&self, source: &str, path: Option<&str>) -> String {
        let Some(LineInfo {
            line,
            column,
            line_text,
        }) = self.span.line_info(source)
        else {
            return format!("error: {}", self.message);
        };

        let gutter_width = line.to_string().len();
        let padding = std::cmp::min(line_text.len(), column.saturating_sub(1));
        let highlight_len = std::cmp::max(
            1,
            std::cmp::min(self.span.len(), line_text.len().saturating_sub(padding)),
        );

        let mut marker = String::new();
        marker.push_str(&" ".repeat(padding));
        marker.push_str(&"^".repeat(highlight_len));

        let location = match path {
            Some(path) => format!("{path}:{line}:{column}"),
            None => format!("line {line}, column {column}"),
        };

        format!(
            "error: {}\n --> {}\n{gutter}|\n{line_no:>width$} | {line_src}\n{gutter}| {marker}",
            self.message,
            location,
            gutter = " ".repeat(gutter_width + 1),
            line_no = line,
            width = gutter_width,
            line_src = line_text,
            marker = marker,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub errors: Vec<ParseError>,
    pub span: Span,
}

/// Declarations and the expressions of interest found while scanning a file.
/// Statements that declare nothing are not modelled.
#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    Namespace {
        name: Option<Name>,
        body: Vec<Stmt>,
        span: Span,
    },
    Use {
        uses: Vec<UseItem>,
        span: Span,
    },
    Const(Rc<ConstGroup>),
    Function(Rc<FunctionDecl>),
    ClassLike(Rc<ClassDecl>),
    /// Closures, anonymous classes and `define()` calls.
    Expression {
        expr: Rc<Expr>,
        span: Span,
    },
    HaltCompiler {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Namespace { span, .. }
            | Stmt::Use { span, .. }
            | Stmt::Expression { span, .. }
            | Stmt::HaltCompiler { span } => *span,
            Stmt::Const(group) => group.span,
            Stmt::Function(func) => func.span,
            Stmt::ClassLike(class) => class.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameKind {
    Unqualified,
    Qualified,
    FullyQualified,
    /// `namespace\Foo`
    Relative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Name {
    pub parts: Vec<String>,
    pub kind: NameKind,
    pub span: Span,
}

impl Name {
    /// Parts joined with `\`, without any leading separator.
    pub fn joined(&self) -> String {
        self.parts.join("\\")
    }

    pub fn last(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_special_class(&self) -> bool {
        self.kind == NameKind::Unqualified
            && matches!(
                self.last().to_ascii_lowercase().as_str(),
                "self" | "parent" | "static"
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UseKind {
    Normal,
    Function,
    Const,
}

#[derive(Debug, Clone, Serialize)]
pub struct UseItem {
    /// Imported name, always treated as fully qualified.
    pub name: Name,
    pub alias: Option<Ident>,
    pub kind: UseKind,
    pub span: Span,
}

impl UseItem {
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => &alias.name,
            None => self.name.last(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Modifiers {
    pub visibility: Option<Visibility>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_readonly: bool,
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        *self == Modifiers::default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: Name,
    pub args: Vec<Arg>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeGroup {
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum Type {
    /// Built-in or class name, including `self`, `static` and `parent`.
    Named(Name),
    Nullable { inner: Box<Type>, span: Span },
    Union { types: Vec<Type>, span: Span },
    Intersection { types: Vec<Type>, span: Span },
}

impl Type {
    pub fn span(&self) -> Span {
        match self {
            Type::Named(name) => name.span,
            Type::Nullable { span, .. }
            | Type::Union { span, .. }
            | Type::Intersection { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDecl {
    pub kind: ClassKind,
    /// `None` for anonymous classes.
    pub name: Option<Ident>,
    pub attributes: Vec<AttributeGroup>,
    pub modifiers: Modifiers,
    /// Parent class for classes, parent interfaces for interfaces.
    pub extends: Vec<Name>,
    pub implements: Vec<Name>,
    pub backing_type: Option<Type>,
    pub members: Vec<ClassMember>,
    /// Constructor arguments of an anonymous class.
    pub args: Vec<Arg>,
    pub doc_comment: Option<Span>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum ClassMember {
    Method(Rc<FunctionDecl>),
    Property(Rc<PropertyGroup>),
    Const(Rc<ConstGroup>),
    TraitUse(Rc<TraitUse>),
    Case(Rc<EnumCaseDecl>),
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyGroup {
    pub attributes: Vec<AttributeGroup>,
    pub modifiers: Modifiers,
    pub ty: Option<Type>,
    pub entries: Vec<PropertyEntry>,
    pub doc_comment: Option<Span>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyEntry {
    /// Name without the leading `$`.
    pub name: Ident,
    pub default: Option<Rc<Expr>>,
    pub span: Span,
}

/// `const` statement at namespace level or a class constant declaration.
#[derive(Debug, Clone, Serialize)]
pub struct ConstGroup {
    pub attributes: Vec<AttributeGroup>,
    pub modifiers: Modifiers,
    pub ty: Option<Type>,
    pub entries: Vec<ConstEntry>,
    pub doc_comment: Option<Span>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstEntry {
    pub name: Ident,
    pub value: Rc<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumCaseDecl {
    pub attributes: Vec<AttributeGroup>,
    pub name: Ident,
    pub value: Option<Rc<Expr>>,
    pub doc_comment: Option<Span>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraitUse {
    pub traits: Vec<Name>,
    pub adaptations: Vec<TraitAdaptation>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum TraitAdaptation {
    /// `A::foo insteadof B, C;`
    Precedence {
        trait_name: Name,
        method: Ident,
        insteadof: Vec<Name>,
        span: Span,
    },
    /// `A::foo as protected bar;` or `foo as bar;`
    Alias {
        trait_name: Option<Name>,
        method: Ident,
        alias: Option<Ident>,
        visibility: Option<Visibility>,
        span: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionKind {
    Function,
    Method,
    Closure,
    ArrowFunction,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub kind: FunctionKind,
    /// `None` for closures and arrow functions.
    pub name: Option<Ident>,
    pub attributes: Vec<AttributeGroup>,
    pub modifiers: Modifiers,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub uses: Vec<ClosureUse>,
    pub return_type: Option<Type>,
    /// `None` for abstract and interface methods.
    pub body: Option<Body>,
    pub doc_comment: Option<Span>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Body {
    /// Declarations and expressions of interest found in the body.
    pub statements: Vec<Stmt>,
    pub has_yield: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosureUse {
    pub name: Ident,
    pub by_ref: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub attributes: Vec<AttributeGroup>,
    /// Name without the leading `$`.
    pub name: Ident,
    pub ty: Option<Type>,
    pub default: Option<Rc<Expr>>,
    pub by_ref: bool,
    pub variadic: bool,
    /// Visibility or `readonly` present means constructor promotion.
    pub modifiers: Modifiers,
    pub doc_comment: Option<Span>,
    pub span: Span,
}

impl Param {
    pub fn is_promoted(&self) -> bool {
        self.modifiers.visibility.is_some() || self.modifiers.is_readonly
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Arg {
    pub name: Option<Ident>,
    pub value: Expr,
    pub unpack: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrayItem {
    pub key: Option<Expr>,
    pub value: Expr,
    pub by_ref: bool,
    pub unpack: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchArm {
    /// `None` for the `default` arm.
    pub conditions: Option<Vec<Expr>>,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum ClassRef {
    Named(Name),
    Dynamic(Box<Expr>),
    Anonymous(Rc<ClassDecl>),
}

#[derive(Debug, Clone, Serialize)]
pub enum MemberName {
    Ident(Ident),
    Dynamic(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MagicConstKind {
    Line,
    File,
    Dir,
    Class,
    Trait,
    Method,
    Function,
    Namespace,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    ErrorSuppress,
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Concat,
    Pow,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Spaceship,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CastKind {
    Int,
    Float,
    String,
    Array,
    Object,
    Bool,
    Unset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncludeKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    Int {
        value: i64,
        span: Span,
    },
    Float {
        value: f64,
        span: Span,
    },
    /// Single-quoted string, nowdoc, or double-quoted string without interpolation.
    String {
        value: String,
        span: Span,
    },
    /// Double-quoted string or heredoc containing interpolation.
    InterpolatedString {
        raw: String,
        span: Span,
    },
    ShellExec {
        span: Span,
    },
    Array {
        items: Vec<ArrayItem>,
        short: bool,
        span: Span,
    },
    List {
        items: Vec<ArrayItem>,
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
    },
    /// `$$name` or `${expr}`.
    DynamicVariable {
        expr: Box<Expr>,
        span: Span,
    },
    /// Bare constant reference, including `true`, `false` and `null`.
    ConstFetch {
        name: Name,
        span: Span,
    },
    ClassConstFetch {
        class: ClassRef,
        constant: Ident,
        span: Span,
    },
    StaticPropertyFetch {
        class: ClassRef,
        property: String,
        span: Span,
    },
    PropertyFetch {
        target: Box<Expr>,
        property: MemberName,
        nullsafe: bool,
        span: Span,
    },
    ArrayDimFetch {
        array: Box<Expr>,
        dim: Option<Box<Expr>>,
        span: Span,
    },
    MagicConst {
        kind: MagicConstKind,
        span: Span,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Arg>,
        span: Span,
    },
    MethodCall {
        target: Box<Expr>,
        method: MemberName,
        args: Vec<Arg>,
        nullsafe: bool,
        span: Span,
    },
    StaticCall {
        class: ClassRef,
        method: MemberName,
        args: Vec<Arg>,
        span: Span,
    },
    /// `...` in `foo(...)`.
    VariadicPlaceholder {
        span: Span,
    },
    New {
        class: ClassRef,
        args: Vec<Arg>,
        span: Span,
    },
    Clone {
        expr: Box<Expr>,
        span: Span,
    },
    Closure(Rc<FunctionDecl>),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    Assign {
        target: Box<Expr>,
        /// Compound operator for `+=`, `??=` and friends.
        op: Option<BinaryOp>,
        value: Box<Expr>,
        by_ref: bool,
        span: Span,
    },
    Ternary {
        condition: Box<Expr>,
        if_true: Option<Box<Expr>>,
        if_false: Box<Expr>,
        span: Span,
    },
    Cast {
        kind: CastKind,
        expr: Box<Expr>,
        span: Span,
    },
    Instanceof {
        expr: Box<Expr>,
        class: ClassRef,
        span: Span,
    },
    Isset {
        vars: Vec<Expr>,
        span: Span,
    },
    Empty {
        expr: Box<Expr>,
        span: Span,
    },
    Include {
        kind: IncludeKind,
        expr: Box<Expr>,
        span: Span,
    },
    Eval {
        expr: Box<Expr>,
        span: Span,
    },
    Exit {
        expr: Option<Box<Expr>>,
        span: Span,
    },
    Print {
        expr: Box<Expr>,
        span: Span,
    },
    Throw {
        expr: Box<Expr>,
        span: Span,
    },
    Yield {
        key: Option<Box<Expr>>,
        value: Option<Box<Expr>>,
        span: Span,
    },
    YieldFrom {
        expr: Box<Expr>,
        span: Span,
    },
    Match {
        condition: Box<Expr>,
        arms: Vec<MatchArm>,
        span: Span,
    },
    Error {
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Closure(func) => func.span,
            Expr::Int { span, .. }
            | Expr::Float { span, .. }
            | Expr::String { span, .. }
            | Expr::InterpolatedString { span, .. }
            | Expr::ShellExec { span }
            | Expr::Array { span, .. }
            | Expr::List { span, .. }
            | Expr::Variable { span, .. }
            | Expr::DynamicVariable { span, .. }
            | Expr::ConstFetch { span, .. }
            | Expr::ClassConstFetch { span, .. }
            | Expr::StaticPropertyFetch { span, .. }
            | Expr::PropertyFetch { span, .. }
            | Expr::ArrayDimFetch { span, .. }
            | Expr::MagicConst { span, .. }
            | Expr::Call { span, .. }
            | Expr::MethodCall { span, .. }
            | Expr::StaticCall { span, .. }
            | Expr::VariadicPlaceholder { span }
            | Expr::New { span, .. }
            | Expr::Clone { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Cast { span, .. }
            | Expr::Instanceof { span, .. }
            | Expr::Isset { span, .. }
            | Expr::Empty { span, .. }
            | Expr::Include { span, .. }
            | Expr::Eval { span, .. }
            | Expr::Exit { span, .. }
            | Expr::Print { span, .. }
            | Expr::Throw { span, .. }
            | Expr::Yield { span, .. }
            | Expr::YieldFrom { span, .. }
            | Expr::Match { span, .. }
            | Expr::Error { span } => *span,
        }
    }
}
