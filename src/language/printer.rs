//! Text renderings used for debugging: a parenthesized prefix form for the
//! AST, and the number formatting shared with runtime values.

use crate::language::ast::{Expr, FunctionDecl, LiteralValue, Stmt};

/// Numbers print in plain decimal form. Integral values carry no `.0`.
pub fn format_number(value: f64) -> String {
    let text = value.to_string();
    match text.strip_suffix(".0") {
        Some(trimmed) => trimmed.to_string(),
        None => text,
    }
}

pub fn print_program(statements: &[Stmt]) -> String {
    statements
        .iter()
        .map(print_stmt)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn print_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expression(expr) => parenthesize("expr", [print_expr(expr)]),
        Stmt::Print { value, .. } => parenthesize("print", [print_expr(value)]),
        Stmt::Var { name, initializer } => {
            let mut parts = vec![name.lexeme.clone()];
            parts.extend(initializer.iter().map(print_expr));
            parenthesize("var", parts)
        }
        Stmt::Block(statements) => parenthesize("block", statements.iter().map(print_stmt)),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let mut parts = vec![print_expr(condition), print_stmt(then_branch)];
            parts.extend(else_branch.iter().map(|stmt| print_stmt(stmt)));
            parenthesize("if", parts)
        }
        Stmt::While { condition, body } => {
            parenthesize("while", [print_expr(condition), print_stmt(body)])
        }
        Stmt::Function(decl) => print_function(decl),
        Stmt::Return { value, .. } => parenthesize("return", value.iter().map(print_expr)),
    }
}

fn print_function(decl: &FunctionDecl) -> String {
    let params = decl
        .params
        .iter()
        .map(|param| param.lexeme.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let mut parts = vec![decl.name.lexeme.clone(), format!("({params})")];
    parts.extend(decl.body.iter().map(print_stmt));
    parenthesize("fun", parts)
}

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(value) => print_literal(value),
        Expr::Grouping(inner) => parenthesize("group", [print_expr(inner)]),
        Expr::Unary { op, expr } => parenthesize(&op.lexeme, [print_expr(expr)]),
        Expr::Binary { left, op, right } | Expr::Logical { left, op, right } => {
            parenthesize(&op.lexeme, [print_expr(left), print_expr(right)])
        }
        Expr::Variable(name) => name.lexeme.clone(),
        Expr::Assign { name, value } => {
            parenthesize("=", [name.lexeme.clone(), print_expr(value)])
        }
        Expr::Call { callee, args, .. } => {
            let mut parts = vec![print_expr(callee)];
            parts.extend(args.iter().map(print_expr));
            parenthesize("call", parts)
        }
    }
}

fn print_literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Nil => "nil".to_string(),
        LiteralValue::Bool(value) => value.to_string(),
        LiteralValue::Number(value) => format_number(*value),
        LiteralValue::String(value) => value.clone(),
    }
}

fn parenthesize(name: &str, parts: impl IntoIterator<Item = String>) -> String {
    let mut out = format!("({name}");
    for part in parts {
        out.push(' ');
        out.push_str(&part);
    }
    out.push(')');
    out
}
