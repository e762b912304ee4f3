use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Box<str>,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<Box<str>>, pos: Position) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
            pos,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EndOfFile
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({}, {:?}, {})", self.kind, self.lexeme, self.pos)
    }
}

/// A 1-based source position.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Position {
        Position { line, column }
    }

    /// Wraps the provided value with this position.
    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { pos: self, inner }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({self})")
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub pos: Position,
    pub inner: T,
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.inner)
    }
}

impl<T> std::error::Error for Spanned<T> where T: std::error::Error {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Newline,
    Whitespace,
    Comment,
    EndOfFile,
    Identifier,

    Integer,
    Float,
    String,
    Boolean,

    IntType,
    FloatType,
    StringType,
    BoolType,
    VoidType,
    NoneType,
    ListType,
    FnType,

    If,
    Else,
    Var,
    Ret,
    With,
    And,
    Or,
    /// Reserved. Never produced by the lexer's pattern table.
    Captured,

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    EqualEqual,
    BangEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    Equal,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    /// `^`, marks a captured variable.
    Caret,
}

impl TokenKind {
    /// Kinds that lead a declared type.
    pub const DATA_TYPES: &'static [TokenKind] = &[
        TokenKind::IntType,
        TokenKind::FloatType,
        TokenKind::StringType,
        TokenKind::BoolType,
        TokenKind::VoidType,
        TokenKind::NoneType,
        TokenKind::ListType,
        TokenKind::FnType,
    ];

    /// Kinds that may start an expression.
    pub const ATOMS: &'static [TokenKind] = &[
        TokenKind::Identifier,
        TokenKind::Integer,
        TokenKind::Float,
        TokenKind::String,
        TokenKind::Boolean,
        TokenKind::LParen,
        TokenKind::Caret,
        TokenKind::Bang,
        TokenKind::Minus,
        TokenKind::IntType,
        TokenKind::FloatType,
        TokenKind::StringType,
        TokenKind::BoolType,
        TokenKind::VoidType,
        TokenKind::NoneType,
        TokenKind::ListType,
        TokenKind::FnType,
    ];

    pub fn is_data_type(self) -> bool {
        Self::DATA_TYPES.contains(&self)
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }

    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(self, If | Else | Var | Ret | With | And | Or | Captured)
    }

    /// Whether a match of this kind is rejected when immediately followed by
    /// an identifier character.
    pub fn is_word(self) -> bool {
        self.is_keyword() || self.is_data_type() || self == TokenKind::Boolean
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let name = match self {
            Newline => "NEWLINE",
            Whitespace => "WHITESPACE",
            Comment => "COMMENT",
            EndOfFile => "END_OF_FILE",
            Identifier => "IDENTIFIER",
            Integer => "INTEGER",
            Float => "FLOAT",
            String => "STRING",
            Boolean => "BOOL",
            IntType => "INTEGER_TYPE",
            FloatType => "FLOAT_TYPE",
            StringType => "STRING_TYPE",
            BoolType => "BOOL_TYPE",
            VoidType => "VOID_TYPE",
            NoneType => "NONE_TYPE",
            ListType => "LIST_TYPE",
            FnType => "FUNCTION_TYPE",
            If => "IF_KEYWORD",
            Else => "ELSE_KEYWORD",
            Var => "VAR_KEYWORD",
            Ret => "RETURN_KEYWORD",
            With => "WITH_KEYWORD",
            And => "AND_KEYWORD",
            Or => "OR_KEYWORD",
            Captured => "CAPTURED_KEYWORD",
            LBrace => "LBRACE",
            RBrace => "RBRACE",
            LParen => "LPAREN",
            RParen => "RPAREN",
            LBracket => "LBRACKET",
            RBracket => "RBRACKET",
            Semicolon => "SEMICOLON",
            Comma => "COMMA",
            EqualEqual => "EQUAL_EQUAL",
            BangEqual => "BANG_EQUAL",
            LessEqual => "LESS_EQUAL",
            GreaterEqual => "GREATER_EQUAL",
            Less => "LESS",
            Greater => "GREATER",
            Equal => "EQUAL",
            Plus => "PLUS",
            Minus => "MINUS",
            Star => "STAR",
            Slash => "SLASH",
            Percent => "PERCENT",
            Bang => "BANG",
            Caret => "CARET",
        };
        f.write_str(name)
    }
}

/// Formats a list of token kinds as `{A, B, C}`, used by diagnostics.
pub struct KindSet<'a>(pub &'a [TokenKind]);

impl fmt::Display for KindSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}")?;
        }
        f.write_str("}")
    }
}
