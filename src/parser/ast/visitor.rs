use super::*;

pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, func: &Rc<FunctionDecl>) {
        walk_function(self, func);
    }

    fn visit_class(&mut self, class: &Rc<ClassDecl>) {
        walk_class(self, class);
    }

    fn visit_class_member(&mut self, member: &ClassMember) {
        walk_class_member(self, member);
    }

    fn visit_const_group(&mut self, group: &Rc<ConstGroup>) {
        walk_const_group(self, group);
    }

    fn visit_param(&mut self, param: &Param) {
        walk_param(self, param);
    }

    fn visit_arg(&mut self, arg: &Arg) {
        walk_arg(self, arg);
    }

    fn visit_attribute_group(&mut self, group: &AttributeGroup) {
        walk_attribute_group(self, group);
    }

    fn visit_use_item(&mut self, _use_item: &UseItem) {}
}

pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) {
    for stmt in &program.statements {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Namespace { body, .. } => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
        }
        Stmt::Use { uses, .. } => {
            for use_item in uses {
                visitor.visit_use_item(use_item);
            }
        }
        Stmt::Const(group) => visitor.visit_const_group(group),
        Stmt::Function(func) => visitor.visit_function(func),
        Stmt::ClassLike(class) => visitor.visit_class(class),
        Stmt::Expression { expr, .. } => visitor.visit_expr(expr),
        Stmt::HaltCompiler { .. } => {}
    }
}

pub fn walk_function<V: Visitor + ?Sized>(visitor: &mut V, func: &Rc<FunctionDecl>) {
    for group in &func.attributes {
        visitor.visit_attribute_group(group);
    }
    for param in &func.params {
        visitor.visit_param(param);
    }
    if let Some(body) = &func.body {
        for stmt in &body.statements {
            visitor.visit_stmt(stmt);
        }
    }
}

pub fn walk_class<V: Visitor + ?Sized>(visitor: &mut V, class: &Rc<ClassDecl>) {
    for group in &class.attributes {
        visitor.visit_attribute_group(group);
    }
    for arg in &class.args {
        visitor.visit_arg(arg);
    }
    for member in &class.members {
        visitor.visit_class_member(member);
    }
}

pub fn walk_class_member<V: Visitor + ?Sized>(visitor: &mut V, member: &ClassMember) {
    match member {
        ClassMember::Method(method) => visitor.visit_function(method),
        ClassMember::Property(group) => {
            for group in &group.attributes {
                visitor.visit_attribute_group(group);
            }
            for entry in &group.entries {
                if let Some(default) = &entry.default {
                    visitor.visit_expr(default);
                }
            }
        }
        ClassMember::Const(group) => visitor.visit_const_group(group),
        ClassMember::Case(case) => {
            for group in &case.attributes {
                visitor.visit_attribute_group(group);
            }
            if let Some(value) = &case.value {
                visitor.visit_expr(value);
            }
        }
        ClassMember::TraitUse(_) => {}
    }
}

pub fn walk_const_group<V: Visitor + ?Sized>(visitor: &mut V, group: &Rc<ConstGroup>) {
    for group in &group.attributes {
        visitor.visit_attribute_group(group);
    }
    for entry in &group.entries {
        visitor.visit_expr(&entry.value);
    }
}

pub fn walk_param<V: Visitor + ?Sized>(visitor: &mut V, param: &Param) {
    for group in &param.attributes {
        visitor.visit_attribute_group(group);
    }
    if let Some(default) = &param.default {
        visitor.visit_expr(default);
    }
}

pub fn walk_arg<V: Visitor + ?Sized>(visitor: &mut V, arg: &Arg) {
    visitor.visit_expr(&arg.value);
}

pub fn walk_attribute_group<V: Visitor + ?Sized>(visitor: &mut V, group: &AttributeGroup) {
    for attribute in &group.attributes {
        for arg in &attribute.args {
            visitor.visit_arg(arg);
        }
    }
}

fn walk_class_ref<V: Visitor + ?Sized>(visitor: &mut V, class: &ClassRef) {
    match class {
        ClassRef::Named(_) => {}
        ClassRef::Dynamic(expr) => visitor.visit_expr(expr),
        ClassRef::Anonymous(decl) => visitor.visit_class(decl),
    }
}

fn walk_member_name<V: Visitor + ?Sized>(visitor: &mut V, member: &MemberName) {
    if let MemberName::Dynamic(expr) = member {
        visitor.visit_expr(expr);
    }
}

fn walk_array_items<V: Visitor + ?Sized>(visitor: &mut V, items: &[ArrayItem]) {
    for item in items {
        if let Some(key) = &item.key {
            visitor.visit_expr(key);
        }
        visitor.visit_expr(&item.value);
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Int { .. }
        | Expr::Float { .. }
        | Expr::String { .. }
        | Expr::InterpolatedString { .. }
        | Expr::ShellExec { .. }
        | Expr::Variable { .. }
        | Expr::ConstFetch { .. }
        | Expr::MagicConst { .. }
        | Expr::VariadicPlaceholder { .. }
        | Expr::Error { .. } => {}
        Expr::Array { items, .. } | Expr::List { items, .. } => walk_array_items(visitor, items),
        Expr::DynamicVariable { expr, .. }
        | Expr::Clone { expr, .. }
        | Expr::Unary { expr, .. }
        | Expr::Cast { expr, .. }
        | Expr::Empty { expr, .. }
        | Expr::Include { expr, .. }
        | Expr::Eval { expr, .. }
        | Expr::Print { expr, .. }
        | Expr::Throw { expr, .. }
        | Expr::YieldFrom { expr, .. } => visitor.visit_expr(expr),
        Expr::ClassConstFetch { class, .. } | Expr::StaticPropertyFetch { class, .. } => {
            walk_class_ref(visitor, class)
        }
        Expr::PropertyFetch {
            target, property, ..
        } => {
            visitor.visit_expr(target);
            walk_member_name(visitor, property);
        }
        Expr::ArrayDimFetch { array, dim, .. } => {
            visitor.visit_expr(array);
            if let Some(dim) = dim {
                visitor.visit_expr(dim);
            }
        }
        Expr::Call { func, args, .. } => {
            visitor.visit_expr(func);
            for arg in args {
                visitor.visit_arg(arg);
            }
        }
        Expr::MethodCall {
            target,
            method,
            args,
            ..
        } => {
            visitor.visit_expr(target);
            walk_member_name(visitor, method);
            for arg in args {
                visitor.visit_arg(arg);
            }
        }
        Expr::StaticCall {
            class,
            method,
            args,
            ..
        } => {
            walk_class_ref(visitor, class);
            walk_member_name(visitor, method);
            for arg in args {
                visitor.visit_arg(arg);
            }
        }
        Expr::New { class, args, .. } => {
            walk_class_ref(visitor, class);
            for arg in args {
                visitor.visit_arg(arg);
            }
        }
        Expr::Closure(func) => visitor.visit_function(func),
        Expr::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::Assign { target, value, .. } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        Expr::Ternary {
            condition,
            if_true,
            if_false,
            ..
        } => {
            visitor.visit_expr(condition);
            if let Some(if_true) = if_true {
                visitor.visit_expr(if_true);
            }
            visitor.visit_expr(if_false);
        }
        Expr::Instanceof { expr, class, .. } => {
            visitor.visit_expr(expr);
            walk_class_ref(visitor, class);
        }
        Expr::Isset { vars, .. } => {
            for var in vars {
                visitor.visit_expr(var);
            }
        }
        Expr::Exit { expr, .. } => {
            if let Some(expr) = expr {
                visitor.visit_expr(expr);
            }
        }
        Expr::Yield { key, value, .. } => {
            if let Some(key) = key {
                visitor.visit_expr(key);
            }
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        Expr::Match {
            condition, arms, ..
        } => {
            visitor.visit_expr(condition);
            for arm in arms {
                if let Some(conditions) = &arm.conditions {
                    for condition in conditions {
                        visitor.visit_expr(condition);
                    }
                }
                visitor.visit_expr(&arm.body);
            }
        }
    }
}
