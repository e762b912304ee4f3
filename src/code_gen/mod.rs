use std::{
    fmt::{self, Write},
    format_args as f,
};

use crate::{
    ast::{BinaryOperator, Expr, Function, Node, Program, Stmt, VariableAccess},
    builtins,
};

#[cfg(test)]
mod tests;

const DEFAULT_CODE_CAPACITY: usize = 4 * 1024; // 4 KiB
const INDENT: &str = "    ";

/// Lowers a checked program, prelude included.
pub fn lower_program(program: &Program) -> String {
    let code = CodeGen::with_capacity().gen(program);
    log::debug!("generated {} bytes", code.len());
    code
}

/// Lowers a single node, without the prelude and statement terminator.
pub fn lower_node(node: &Node) -> String {
    let mut gen = CodeGen::new();
    gen.gen_node(node);
    gen.code
}

pub fn lower_expr(expr: &Expr) -> String {
    let mut gen = CodeGen::new();
    gen.gen_expr(expr);
    gen.code
}

/// Every variable holds a function and every read is a call. Arguments are
/// passed as thunks, so parameters are read by calling them too.
struct CodeGen {
    code: String,
    depth: usize,
}

impl CodeGen {
    fn new() -> CodeGen {
        CodeGen {
            code: String::new(),
            depth: 0,
        }
    }

    fn with_capacity() -> CodeGen {
        CodeGen {
            code: String::with_capacity(DEFAULT_CODE_CAPACITY),
            depth: 0,
        }
    }

    fn gen(mut self, program: &Program) -> String {
        self.gen_prelude();
        self.gen_body(&program.body);
        self.code
    }

    fn gen_prelude(&mut self) {
        for line in builtins::PRELUDE_HEADER {
            self.emit(f!("{line}\n"));
        }
        for builtin in builtins::ALL {
            self.emit(f!("{}\n", builtin.prelude));
        }
    }

    fn gen_body(&mut self, body: &[Node]) {
        for node in body {
            self.emit_indent();
            self.gen_node(node);
            if !self.code.ends_with(';') {
                self.emit(f!(";"));
            }
            self.emit(f!("\n"));
        }
    }

    fn gen_node(&mut self, node: &Node) {
        match node {
            Node::Stmt(stmt) => self.gen_stmt(stmt),
            Node::Expr(expr) => self.gen_expr(expr),
        }
    }

    fn gen_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VariableDeclaration(decl) => {
                self.emit(f!("let {} = ", decl.name));
                self.gen_bound_value(&decl.initializer);
            }
            Stmt::If(stmt) => {
                self.emit(f!("if ("));
                self.gen_expr(&stmt.condition);
                self.emit(f!(") "));
                self.gen_block(&stmt.then_body);
                if !stmt.else_body.is_empty() {
                    self.emit(f!(" else "));
                    self.gen_block(&stmt.else_body);
                }
            }
            Stmt::Return(stmt) => {
                self.emit(f!("return"));
                if let Some(ref value) = stmt.value {
                    self.emit(f!(" "));
                    self.gen_expr(value);
                }
            }
        }
    }

    /// A value stored into a variable. Anything but a function literal is
    /// evaluated once and wrapped in a function returning it.
    fn gen_bound_value(&mut self, value: &Expr) {
        if let Expr::Function(function) = value {
            self.gen_function(function);
        } else {
            self.emit(f!("__value("));
            self.gen_expr(value);
            self.emit(f!(")"));
        }
    }

    fn gen_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Integer(val) => self.emit(f!("{val}")),
            Expr::Float(val) => self.emit(f!("{val:?}")),
            Expr::String(val) => self.emit(f!("\"{val}\"")),
            Expr::Boolean(val) => self.emit(f!("{val}")),
            Expr::List(list) => {
                self.emit(f!("["));
                self.gen_separated(&list.elements, |this, element| this.gen_expr(element));
                self.emit(f!("]"));
            }
            Expr::Access(access) => self.gen_access(access),
            Expr::Capture(capture) => self.gen_access(&capture.access),
            Expr::Assignment(assignment) => {
                self.emit(f!("{} = ", assignment.name));
                self.gen_bound_value(&assignment.value);
            }
            Expr::Binary(binary) => {
                let op = match binary.op {
                    BinaryOperator::And => "&&",
                    BinaryOperator::Or => "||",
                    op => op.as_str(),
                };
                let parens = !matches!(
                    binary.op,
                    BinaryOperator::Ne
                        | BinaryOperator::Lt
                        | BinaryOperator::Le
                        | BinaryOperator::Gt
                        | BinaryOperator::Ge
                );
                if parens {
                    self.emit(f!("("));
                }
                self.gen_expr(&binary.left);
                self.emit(f!(" {op} "));
                self.gen_expr(&binary.right);
                if parens {
                    self.emit(f!(")"));
                }
            }
            Expr::Unary(unary) => {
                self.emit(f!("({}", unary.op.as_str()));
                self.gen_expr(&unary.operand);
                self.emit(f!(")"));
            }
            Expr::Function(function) => self.gen_function(function),
        }
    }

    // name(() => arg, ...)
    fn gen_access(&mut self, access: &VariableAccess) {
        self.emit(f!("{}(", access.name));
        self.gen_separated(&access.args, |this, arg| {
            this.emit(f!("() => "));
            this.gen_expr(arg);
        });
        self.emit(f!(")"));
    }

    // (function name(params) { body })
    fn gen_function(&mut self, function: &Function) {
        let name = function.self_name.as_deref().unwrap_or("");
        self.emit(f!("(function {name}("));
        self.gen_separated(&function.params, |this, param| {
            this.emit(f!("{}", param.name));
        });
        self.emit(f!(") "));
        self.gen_block(&function.body);
        self.emit(f!(")"));
    }

    fn gen_block(&mut self, body: &[Node]) {
        self.emit(f!("{{\n"));
        self.indented(|this| this.gen_body(body));
        self.emit_indent();
        self.emit(f!("}}"));
    }
}

// Utility functions.
impl CodeGen {
    fn emit(&mut self, f: fmt::Arguments<'_>) {
        self.code
            .write_fmt(f)
            .expect("code emit should be infallible");
    }

    fn emit_indent(&mut self) {
        for _ in 0..self.depth {
            self.code.push_str(INDENT);
        }
    }

    fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        let res = f(self);
        self.depth -= 1;
        res
    }

    fn gen_separated<T>(&mut self, items: &[T], mut gen_item: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.emit(f!(", "));
            }
            gen_item(self, item);
        }
    }
}
