use crate::{
    ast::{
        BinaryExpression, BinaryOperator, Expr, Function, Ident, IfStatement, ListLiteral, Node,
        Parameter, Program, ReturnStatement, Stmt, UnaryExpression, UnaryOperator,
        VariableAccess, VariableAssignment, VariableCaptureAccess, VariableDeclaration,
    },
    token::{KindSet, Position, Spanned, Token, TokenKind},
    types::DataType,
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Parses a whole program. Stops at the first error.
///
/// `tokens` must end with [`TokenKind::EndOfFile`], as produced by the lexer.
pub fn parse(tokens: &[Token]) -> Result<Program> {
    let mut p = Parser::new(tokens)?;
    let program = p.parse_program()?;
    log::debug!("parsed {} top-level nodes", program.body.len());
    Ok(program)
}

/// Parses a single expression, which must span the whole input.
pub fn parse_expr(tokens: &[Token]) -> Result<Expr> {
    let mut p = Parser::new(tokens)?;
    let expr = p.parse_expr()?;
    p.skip_newlines();
    p.consume(TokenKind::EndOfFile)?;
    Ok(expr)
}

/// Unary `!` binds looser than every binary operator.
const NOT_PRECEDENCE: u8 = 1;
/// Unary `-` binds tighter than every binary operator.
const NEG_PRECEDENCE: u8 = 21;

/// Returns the binary operator and its precedence. Higher binds tighter.
fn binary_operator(kind: TokenKind) -> Option<(BinaryOperator, u8)> {
    use BinaryOperator as Op;
    let entry = match kind {
        TokenKind::Star => (Op::Mul, 20),
        TokenKind::Slash => (Op::Div, 20),
        TokenKind::Percent => (Op::Rem, 20),
        TokenKind::Plus => (Op::Add, 10),
        TokenKind::Minus => (Op::Sub, 10),
        TokenKind::EqualEqual => (Op::Eq, 5),
        TokenKind::BangEqual => (Op::Ne, 5),
        TokenKind::Less => (Op::Lt, 5),
        TokenKind::LessEqual => (Op::Le, 5),
        TokenKind::Greater => (Op::Gt, 5),
        TokenKind::GreaterEqual => (Op::Ge, 5),
        TokenKind::And => (Op::And, 3),
        TokenKind::Or => (Op::Or, 2),
        _ => return None,
    };
    Some(entry)
}

fn data_type(kind: TokenKind) -> Option<DataType> {
    let ty = match kind {
        TokenKind::IntType => DataType::Integer,
        TokenKind::FloatType => DataType::Float,
        TokenKind::StringType => DataType::String,
        TokenKind::BoolType => DataType::Bool,
        TokenKind::VoidType => DataType::Void,
        TokenKind::NoneType => DataType::None,
        TokenKind::ListType => DataType::list_of(DataType::Any),
        TokenKind::FnType => DataType::Function,
        _ => return None,
    };
    Some(ty)
}

struct Parser<'tok> {
    tokens: &'tok [Token],
    cursor: usize,
    /// One accumulator per function literal being parsed, innermost last.
    captures: Vec<Vec<VariableCaptureAccess>>,
}

impl<'tok> Parser<'tok> {
    fn parse_program(&mut self) -> Result<Program> {
        let body = self.parse_statements(TokenKind::EndOfFile)?;
        self.consume(TokenKind::EndOfFile)?;
        Ok(Program { body })
    }

    /// Parses statements until `end` (or end of file), without consuming it.
    fn parse_statements(&mut self, end: TokenKind) -> Result<Vec<Node>> {
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            if self.is(end) || self.is(TokenKind::EndOfFile) {
                break Ok(body);
            }
            body.push(self.parse_statement()?);
            self.parse_terminator()?;
        }
    }

    fn parse_statement(&mut self) -> Result<Node> {
        let stmt = match self.peek().kind {
            TokenKind::Var => Stmt::VariableDeclaration(self.parse_declaration()?),
            TokenKind::If => Stmt::If(self.parse_if()?),
            TokenKind::Ret => Stmt::Return(self.parse_return()?),
            kind if starts_expression(kind) => return Ok(Node::Expr(self.parse_expr()?)),
            _ => {
                let keywords = &[TokenKind::Var, TokenKind::If, TokenKind::Ret][..];
                let expected = [keywords, TokenKind::ATOMS].concat();
                return Err(self.unexpected(&expected));
            }
        };
        Ok(Node::Stmt(stmt))
    }

    /// A statement ends at a newline or `;`, or right before a closing brace.
    fn parse_terminator(&mut self) -> Result<()> {
        match self.peek().kind {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::EndOfFile => Ok(()),
            _ => Err(self.unexpected(&[
                TokenKind::Newline,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::EndOfFile,
            ])),
        }
    }

    // var TYPE [<params>] ID = expr
    fn parse_declaration(&mut self) -> Result<VariableDeclaration> {
        let var = self.consume(TokenKind::Var)?;
        let ty = self.parse_type()?;
        let signature = if self.is(TokenKind::Less) {
            Some(self.parse_params()?)
        } else {
            None
        };
        let name = self.parse_ident()?;
        self.consume(TokenKind::Equal)?;
        let mut initializer = self.parse_expr()?;
        if let Expr::Function(ref mut function) = initializer {
            function.self_name = Some(name.clone());
        }
        Ok(VariableDeclaration {
            name,
            ty,
            signature,
            initializer,
            pos: var.pos,
        })
    }

    // if ( expr ) block [else (if ... | block)]
    fn parse_if(&mut self) -> Result<IfStatement> {
        let token = self.consume(TokenKind::If)?;
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.skip_newlines();
        self.consume(TokenKind::RParen)?;
        self.skip_newlines();
        let then_body = self.parse_block()?;

        // `else` may sit on a later line; if it doesn't, the newlines belong
        // to the statement terminator.
        let before_else = self.cursor;
        self.skip_newlines();
        let else_body = if self.take(TokenKind::Else) {
            self.skip_newlines();
            if self.is(TokenKind::If) {
                vec![Node::Stmt(Stmt::If(self.parse_if()?))]
            } else {
                self.parse_block()?
            }
        } else {
            self.cursor = before_else;
            Vec::new()
        };

        Ok(IfStatement {
            condition,
            then_body,
            else_body,
            pos: token.pos,
        })
    }

    // ret [expr]
    fn parse_return(&mut self) -> Result<ReturnStatement> {
        let token = self.consume(TokenKind::Ret)?;
        let value = match self.peek().kind {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::EndOfFile => {
                None
            }
            _ => Some(self.parse_expr()?),
        };
        Ok(ReturnStatement {
            value,
            pos: token.pos,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Node>> {
        self.consume(TokenKind::LBrace)?;
        let body = self.parse_statements(TokenKind::RBrace)?;
        self.consume(TokenKind::RBrace)?;
        Ok(body)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expression(NOT_PRECEDENCE)
    }

    /// Precedence climbing. Operators at `min_precedence` or above are folded
    /// in; the right operand only takes strictly tighter ones, which makes
    /// every binary operator left-associative.
    fn parse_expression(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.parse_atom()?;
        while let Some((op, precedence)) = binary_operator(self.peek().kind) {
            if precedence < min_precedence {
                break;
            }
            let token = self.advance();
            let right = self.parse_expression(precedence + 1)?;
            left = Expr::Binary(BinaryExpression {
                left: Box::new(left),
                op,
                right: Box::new(right),
                pos: token.pos,
            });
        }
        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        // An operator ending a line continues the expression on the next one.
        self.skip_newlines();
        let token = self.peek();
        let expr = match token.kind {
            TokenKind::Integer => {
                self.advance();
                let value = token
                    .lexeme
                    .parse()
                    .map_err(|_| token.pos.wrap(Error::IntegerOutOfRange(token.lexeme.clone())))?;
                Expr::Integer(value)
            }
            TokenKind::Float => {
                self.advance();
                let value = token
                    .lexeme
                    .parse()
                    .map_err(|_| token.pos.wrap(Error::InvalidFloat(token.lexeme.clone())))?;
                Expr::Float(value)
            }
            TokenKind::String => {
                self.advance();
                let lexeme = &*token.lexeme;
                let text = lexeme
                    .strip_prefix('"')
                    .and_then(|rest| rest.strip_suffix('"'))
                    .unwrap_or(lexeme);
                Expr::String(text.into())
            }
            TokenKind::Boolean => {
                self.advance();
                Expr::Boolean(&*token.lexeme == "true")
            }
            TokenKind::Caret => self.parse_capture()?,
            TokenKind::Identifier if self.peek_nth(1).kind == TokenKind::Equal => {
                Expr::Assignment(self.parse_assignment()?)
            }
            TokenKind::Identifier => Expr::Access(self.parse_access()?),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.skip_newlines();
                self.consume(TokenKind::RParen)?;
                expr
            }
            TokenKind::Bang => self.parse_unary(UnaryOperator::Not, NOT_PRECEDENCE)?,
            TokenKind::Minus => self.parse_unary(UnaryOperator::Neg, NEG_PRECEDENCE)?,
            kind if kind.is_data_type() => self.parse_typed_literal()?,
            _ => return Err(self.unexpected(TokenKind::ATOMS)),
        };
        Ok(expr)
    }

    fn parse_unary(&mut self, op: UnaryOperator, precedence: u8) -> Result<Expr> {
        let token = self.advance();
        let operand = self.parse_expression(precedence)?;
        Ok(Expr::Unary(UnaryExpression {
            op,
            operand: Box::new(operand),
            pos: token.pos,
        }))
    }

    // ID = expr
    fn parse_assignment(&mut self) -> Result<VariableAssignment> {
        let pos = self.peek().pos;
        let name = self.parse_ident()?;
        self.consume(TokenKind::Equal)?;
        let value = self.parse_expr()?;
        Ok(VariableAssignment {
            name,
            value: Box::new(value),
            pos,
        })
    }

    // ID [with ( args )]
    fn parse_access(&mut self) -> Result<VariableAccess> {
        let pos = self.peek().pos;
        let name = self.parse_ident()?;
        let args = if self.take(TokenKind::With) {
            self.consume(TokenKind::LParen)?;
            let args = self.parse_list(TokenKind::RParen, Parser::parse_expr)?;
            self.consume(TokenKind::RParen)?;
            args
        } else {
            Vec::new()
        };
        Ok(VariableAccess { name, args, pos })
    }

    // ^ ID [with ( args )]
    fn parse_capture(&mut self) -> Result<Expr> {
        let caret = self.consume(TokenKind::Caret)?;
        let access = self.parse_access()?;
        let capture = VariableCaptureAccess {
            access,
            resolved: None,
        };
        let Some(innermost) = self.captures.last_mut() else {
            let error = Error::CaptureOutsideFunction(capture.access.name);
            return Err(caret.pos.wrap(error));
        };
        innermost.push(capture.clone());
        Ok(Expr::Capture(capture))
    }

    /// A type opens either a list literal (`int { ... }`) or a function
    /// literal (`int<...> { ... }`). Looks past the type to pick one, then
    /// parses again from the type.
    fn parse_typed_literal(&mut self) -> Result<Expr> {
        let start = self.cursor;
        self.parse_type()?;
        let is_list = self.is(TokenKind::LBrace);
        self.cursor = start;

        if is_list {
            Ok(Expr::List(self.parse_list_literal()?))
        } else {
            Ok(Expr::Function(self.parse_function()?))
        }
    }

    // TYPE { [expr (, expr)*] }
    fn parse_list_literal(&mut self) -> Result<ListLiteral> {
        let pos = self.peek().pos;
        let element_type = self.parse_type()?;
        self.consume(TokenKind::LBrace)?;
        let elements = self.parse_list(TokenKind::RBrace, Parser::parse_expr)?;
        self.consume(TokenKind::RBrace)?;
        Ok(ListLiteral {
            element_type,
            elements,
            pos,
        })
    }

    // TYPE < params > block
    fn parse_function(&mut self) -> Result<Function> {
        let pos = self.peek().pos;
        let return_type = self.parse_type()?;
        let params = self.parse_params()?;

        self.captures.push(Vec::new());
        let body = self.parse_block();
        let captures = self.captures.pop().unwrap_or_default();

        Ok(Function {
            params,
            return_type,
            body: body?,
            self_name: None,
            captures,
            pos,
        })
    }

    // < [TYPE ID (, TYPE ID)*] >
    fn parse_params(&mut self) -> Result<Vec<Parameter>> {
        self.consume(TokenKind::Less)?;
        let params = self.parse_list(TokenKind::Greater, |p| {
            let ty = p.parse_type()?;
            let name = p.parse_ident()?;
            Ok(Parameter { name, ty })
        })?;
        self.consume(TokenKind::Greater)?;
        Ok(params)
    }

    // TYPE ([ ])*
    fn parse_type(&mut self) -> Result<DataType> {
        let Some(mut ty) = data_type(self.peek().kind) else {
            return Err(self.unexpected(TokenKind::DATA_TYPES));
        };
        self.advance();
        while self.take(TokenKind::LBracket) {
            self.consume(TokenKind::RBracket)?;
            ty = DataType::list_of(ty);
        }
        Ok(ty)
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(token.lexeme.clone())
    }

    /// Parses `item (, item)*` until `end` is found, tolerating newlines and
    /// a trailing comma. Does **NOT** consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end: TokenKind,
        mut parse_item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        self.skip_newlines();
        while !self.is(end) {
            items.push(parse_item(self)?);
            self.skip_newlines();
            if !self.take(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        if !self.is(end) {
            return Err(self.unexpected(&[TokenKind::Comma, end]));
        }
        Ok(items)
    }
}

// Utility functions.
impl<'tok> Parser<'tok> {
    fn new(tokens: &'tok [Token]) -> Result<Parser<'tok>> {
        match tokens.last() {
            Some(last) if last.is_eof() => Ok(Parser {
                tokens,
                cursor: 0,
                captures: Vec::new(),
            }),
            last => {
                let pos = last.map_or(Position::new(1, 1), |t| t.pos);
                Err(pos.wrap(Error::MissingEndOfFile))
            }
        }
    }

    /// Returns the current token. Sticks at the end of file.
    fn peek(&self) -> &'tok Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &'tok Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.cursor + n).min(last)]
    }

    /// Returns the current token and advances, unless at the end of file.
    fn advance(&mut self) -> &'tok Token {
        let c = self.peek();
        if !c.is_eof() {
            self.cursor += 1;
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not, fails.
    fn consume(&mut self, expect: TokenKind) -> Result<&'tok Token> {
        if self.is(expect) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[expect]))
        }
    }

    fn skip_newlines(&mut self) {
        while self.take(TokenKind::Newline) {}
    }

    fn unexpected(&self, expected: &[TokenKind]) -> Spanned<Error> {
        let c = self.peek();
        c.pos.wrap(Error::Unexpected {
            actual: c.kind,
            lexeme: c.lexeme.clone(),
            expected: Box::from(expected),
        })
    }
}

fn starts_expression(kind: TokenKind) -> bool {
    TokenKind::ATOMS.contains(&kind)
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unexpected {actual} {lexeme:?}, expected one of {}", KindSet(.expected))]
    Unexpected {
        actual: TokenKind,
        lexeme: Box<str>,
        expected: Box<[TokenKind]>,
    },
    #[error("integer literal {0} is out of range")]
    IntegerOutOfRange(Box<str>),
    #[error("invalid float literal {0}")]
    InvalidFloat(Box<str>),
    #[error("captured variable ^{0} is outside of any function")]
    CaptureOutsideFunction(Ident),
    #[error("token stream doesn't end with END_OF_FILE")]
    MissingEndOfFile,
}
