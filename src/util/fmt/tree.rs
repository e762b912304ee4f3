use std::io::Write;

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, program).expect("writing to a Vec can't fail");
    into_string(buf)
}

pub fn print_node_string(node: &Node) -> String {
    let mut buf = Vec::with_capacity(256);
    print_node(&mut buf, 0, node).expect("writing to a Vec can't fail");
    into_string(buf)
}

pub fn print_expr_string(expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(256);
    print_expr(&mut buf, 0, expr).expect("writing to a Vec can't fail");
    into_string(buf)
}

pub fn print_program(w: &mut impl Write, program: &Program) -> std::io::Result<()> {
    print_body(w, 0, &program.body)
}

fn print_body(w: &mut impl Write, i: usize, body: &[Node]) -> std::io::Result<()> {
    for node in body {
        print_node(w, i, node)?;
    }
    Ok(())
}

fn print_node(w: &mut impl Write, i: usize, node: &Node) -> std::io::Result<()> {
    match node {
        Node::Stmt(stmt) => print_stmt(w, i, stmt),
        Node::Expr(expr) => print_expr(w, i, expr),
    }
}

fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> std::io::Result<()> {
    sp(w, i)?;
    match stmt {
        Stmt::VariableDeclaration(decl) => {
            write!(w, "var {}: {}", decl.name, decl.ty)?;
            if let Some(ref signature) = decl.signature {
                print_params(w, signature)?;
            }
            writeln!(w)?;
            print_expr(w, i + 1, &decl.initializer)?;
        }
        Stmt::If(stmt) => {
            writeln!(w, "if")?;
            print_expr(w, i + 1, &stmt.condition)?;
            sp(w, i)?;
            writeln!(w, "then")?;
            print_body(w, i + 1, &stmt.then_body)?;
            if !stmt.else_body.is_empty() {
                sp(w, i)?;
                writeln!(w, "else")?;
                print_body(w, i + 1, &stmt.else_body)?;
            }
        }
        Stmt::Return(stmt) => {
            writeln!(w, "return")?;
            if let Some(ref value) = stmt.value {
                print_expr(w, i + 1, value)?;
            }
        }
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    match expr {
        Expr::Integer(val) => writeln!(w, "int {val}")?,
        Expr::Float(val) => writeln!(w, "float {val:?}")?,
        Expr::String(val) => writeln!(w, "string {val:?}")?,
        Expr::Boolean(val) => writeln!(w, "bool {val}")?,
        Expr::List(list) => {
            writeln!(w, "list {}", list.element_type)?;
            for element in &list.elements {
                print_expr(w, i + 1, element)?;
            }
        }
        Expr::Access(access) => print_access(w, i, "", access)?,
        Expr::Capture(capture) => {
            print_access(w, i, "^", &capture.access)?;
        }
        Expr::Assignment(assignment) => {
            writeln!(w, "assign {}", assignment.name)?;
            print_expr(w, i + 1, &assignment.value)?;
        }
        Expr::Binary(binary) => {
            writeln!(w, "binary {}", binary.op.as_str())?;
            print_expr(w, i + 1, &binary.left)?;
            print_expr(w, i + 1, &binary.right)?;
        }
        Expr::Unary(unary) => {
            writeln!(w, "unary {}", unary.op.as_str())?;
            print_expr(w, i + 1, &unary.operand)?;
        }
        Expr::Function(function) => {
            write!(w, "function {}", function.return_type)?;
            print_params(w, &function.params)?;
            if let Some(ref name) = function.self_name {
                write!(w, " named {name}")?;
            }
            writeln!(w)?;
            if !function.captures.is_empty() {
                sp(w, i + 1)?;
                write!(w, "captures")?;
                for capture in &function.captures {
                    write!(w, " ^{}", capture.access.name)?;
                    if let Some(ref ty) = capture.resolved {
                        write!(w, ": {ty}")?;
                    }
                }
                writeln!(w)?;
            }
            print_body(w, i + 1, &function.body)?;
        }
    }
    Ok(())
}

fn print_access(
    w: &mut impl Write,
    i: usize,
    sigil: &str,
    access: &VariableAccess,
) -> std::io::Result<()> {
    if access.args.is_empty() {
        writeln!(w, "access {sigil}{}", access.name)?;
    } else {
        writeln!(w, "call {sigil}{}", access.name)?;
        for arg in &access.args {
            print_expr(w, i + 1, arg)?;
        }
    }
    Ok(())
}

fn print_params(w: &mut impl Write, params: &[Parameter]) -> std::io::Result<()> {
    write!(w, "<")?;
    for (idx, param) in params.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{} {}", param.ty, param.name)?;
    }
    write!(w, ">")
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

fn into_string(buf: Vec<u8>) -> String {
    String::from_utf8(buf).expect("the printer only writes UTF-8")
}
