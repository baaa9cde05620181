use std::rc::Rc;

use crate::names::NameContext;
use crate::parser::ast::visitor::{Visitor, walk_class, walk_function, walk_stmt};
use crate::parser::ast::{ClassDecl, ConstGroup, Expr, FunctionDecl, FunctionKind, Program, Stmt};

/// A syntax node that can become a top-level reflection.
#[derive(Debug, Clone)]
pub enum DeclarationNode {
    Class(Rc<ClassDecl>),
    AnonymousClass(Rc<ClassDecl>),
    Function(Rc<FunctionDecl>),
    Closure(Rc<FunctionDecl>),
    /// One entry of a `const` statement.
    Const { group: Rc<ConstGroup>, index: usize },
    /// A call whose callee is `define` or `\define`, not yet validated.
    Define(Rc<Expr>),
}

#[derive(Debug, Clone)]
pub struct LocatedNode {
    pub node: DeclarationNode,
    pub names: Rc<NameContext>,
}

/// Every declaration in the file in source order, including ones nested in
/// blocks, function bodies and class methods.
pub fn collect_declarations(program: &Program) -> Vec<LocatedNode> {
    let mut file_names = NameContext::global();
    add_uses(&mut file_names, &program.statements);
    let file_names = Rc::new(file_names);

    let mut collector = DeclarationCollector {
        names: Rc::clone(&file_names),
        found: Vec::new(),
    };

    for stmt in &program.statements {
        match stmt {
            Stmt::Namespace { name, body, .. } => {
                let mut names = NameContext::in_namespace(name.as_ref().map(|name| name.joined()));
                add_uses(&mut names, body);
                collector.names = Rc::new(names);
                for stmt in body {
                    collector.visit_stmt(stmt);
                }
                collector.names = Rc::clone(&file_names);
            }
            stmt => collector.visit_stmt(stmt),
        }
    }

    collector.found
}

fn add_uses(names: &mut NameContext, statements: &[Stmt]) {
    for stmt in statements {
        if let Stmt::Use { uses, .. } = stmt {
            for item in uses {
                names.add_use(item);
            }
        }
    }
}

pub(crate) fn is_define_call(expr: &Expr) -> bool {
    match expr {
        Expr::Call { func, .. } => matches!(
            func.as_ref(),
            Expr::ConstFetch { name, .. }
                if name.parts.len() == 1 && name.last().eq_ignore_ascii_case("define")
        ),
        _ => false,
    }
}

struct DeclarationCollector {
    names: Rc<NameContext>,
    found: Vec<LocatedNode>,
}

impl DeclarationCollector {
    fn push(&mut self, node: DeclarationNode) {
        self.found.push(LocatedNode {
            node,
            names: Rc::clone(&self.names),
        });
    }
}

impl Visitor for DeclarationCollector {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Const(group) => {
                for index in 0..group.entries.len() {
                    self.push(DeclarationNode::Const {
                        group: Rc::clone(group),
                        index,
                    });
                }
            }
            Stmt::Expression { expr, .. } if is_define_call(expr) => {
                self.push(DeclarationNode::Define(Rc::clone(expr)));
                walk_stmt(self, stmt);
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_class(&mut self, class: &Rc<ClassDecl>) {
        if class.name.is_some() {
            self.push(DeclarationNode::Class(Rc::clone(class)));
        } else {
            self.push(DeclarationNode::AnonymousClass(Rc::clone(class)));
        }
        walk_class(self, class);
    }

    fn visit_function(&mut self, func: &Rc<FunctionDecl>) {
        match func.kind {
            FunctionKind::Function => self.push(DeclarationNode::Function(Rc::clone(func))),
            FunctionKind::Closure | FunctionKind::ArrowFunction => {
                self.push(DeclarationNode::Closure(Rc::clone(func)))
            }
            FunctionKind::Method => {}
        }
        walk_function(self, func);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::parse;

    fn kinds(code: &str) -> Vec<&'static str> {
        collect_declarations(&parse(code))
            .iter()
            .map(|located| match located.node {
                DeclarationNode::Class(_) => "class",
                DeclarationNode::AnonymousClass(_) => "anonymous",
                DeclarationNode::Function(_) => "function",
                DeclarationNode::Closure(_) => "closure",
                DeclarationNode::Const { .. } => "const",
                DeclarationNode::Define(_) => "define",
            })
            .collect()
    }

    #[test]
    fn collects_nested_declarations_in_order() {
        let found = kinds(
            r#"<?php
const A = 1, B = 2;
class Foo {
    public function bar() {
        return function () { return new class {}; };
    }
}
if (true) {
    function baz() { define('C', 3); }
}
"#,
        );
        assert_eq!(
            found,
            ["const", "const", "class", "closure", "anonymous", "function", "define"]
        );
    }

    #[test]
    fn attaches_namespace_context() {
        let nodes = collect_declarations(&parse(
            "<?php namespace A; use X\\Y; class One {} namespace B; class Two {}",
        ));
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].names.namespace(), Some("A"));
        assert_eq!(nodes[1].names.namespace(), Some("B"));
    }
}
