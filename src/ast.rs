// program ::= (stmt terminator | NEWLINE)* EOF
// terminator ::= NEWLINE | ';' | <before '}' or EOF>
// stmt ::= 'var' type [signature] ID '=' expr
//        | 'if' '(' expr ')' block [NEWLINE* 'else' ('if' ... | block)]
//        | 'ret' [expr]
//        | expr
// block ::= '{' (stmt terminator | NEWLINE)* '}'
// type ::= ('int' | 'float' | 'string' | 'bool' | 'void' | 'none' | 'list' | 'fn') ('[' ']')*
// signature ::= '<' [type ID (',' type ID)*] '>'
// expr ::= ID '=' expr
//        | ID ['with' '(' [expr (',' expr)*] ')']
//        | '^' ID ['with' '(' [expr (',' expr)*] ')']
//        | type signature block
//        | type '{' [expr (',' expr)*] '}'
//        | expr op expr
//        | '!' expr
//        | '-' expr
//        | '(' expr ')'
//        | INTEGER | FLOAT | STRING | BOOL

// Precedence
//
// * / %
// + -
// == != < <= > >=
// and
// or
// ! - (prefix)

use crate::{token::Position, types::DataType, util::fmt::tree};

pub type Ident = Box<str>;

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Node>,
}

impl Program {
    /// Returns the indented debug tree of the whole program.
    pub fn describe(&self) -> String {
        tree::print_program_string(self)
    }

    /// Returns the target source for the whole program, prelude included.
    pub fn lower(&self) -> String {
        crate::code_gen::lower_program(self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Stmt(Stmt),
    Expr(Expr),
}

impl Node {
    pub fn describe(&self) -> String {
        tree::print_node_string(self)
    }

    pub fn lower(&self) -> String {
        crate::code_gen::lower_node(self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    VariableDeclaration(VariableDeclaration),
    If(IfStatement),
    Return(ReturnStatement),
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDeclaration {
    pub name: Ident,
    /// For function initializers, this is the function's return type.
    pub ty: DataType,
    /// The optional `<type name, ...>` written after the declared type.
    pub signature: Option<Vec<Parameter>>,
    pub initializer: Expr,
    pub pos: Position,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfStatement {
    pub condition: Expr,
    pub then_body: Vec<Node>,
    /// Empty when there is no `else` branch.
    pub else_body: Vec<Node>,
    pub pos: Position,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expr>,
    pub pos: Position,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Integer(i64),
    Float(f64),
    /// Quotes already stripped.
    String(Box<str>),
    Boolean(bool),
    List(ListLiteral),
    Access(VariableAccess),
    Capture(VariableCaptureAccess),
    Assignment(VariableAssignment),
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    Function(Function),
}

impl Expr {
    pub fn describe(&self) -> String {
        tree::print_expr_string(self)
    }

    pub fn lower(&self) -> String {
        crate::code_gen::lower_expr(self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListLiteral {
    /// Authoritative for the list's static type.
    pub element_type: DataType,
    pub elements: Vec<Expr>,
    pub pos: Position,
}

/// A read of `name`. With arguments, a call.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableAccess {
    pub name: Ident,
    pub args: Vec<Expr>,
    pub pos: Position,
}

/// `^name`, a read that reaches into an enclosing scope.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableCaptureAccess {
    pub access: VariableAccess,
    /// Filled in by the type checker.
    pub resolved: Option<DataType>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableAssignment {
    pub name: Ident,
    pub value: Box<Expr>,
    pub pos: Position,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryExpression {
    pub left: Box<Expr>,
    pub op: BinaryOperator,
    pub right: Box<Expr>,
    pub pos: Position,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOperator {
    /// The source spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Rem => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnaryExpression {
    pub op: UnaryOperator,
    pub operand: Box<Expr>,
    pub pos: Position,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Neg,
}

impl UnaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Neg => "-",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub params: Vec<Parameter>,
    pub return_type: DataType,
    pub body: Vec<Node>,
    /// The declared name, when this function initializes a declaration.
    pub self_name: Option<Ident>,
    /// Copies of every `^capture` written directly in this function's body.
    pub captures: Vec<VariableCaptureAccess>,
    pub pos: Position,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: Ident,
    pub ty: DataType,
}
