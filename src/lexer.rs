use crate::{
    diagnostic::{Diagnostic, Reporter},
    token::{Position, Token, TokenKind},
};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// Never fails: characters no pattern accepts are reported and skipped. The
/// buffer always ends with a [`TokenKind::EndOfFile`] token.
pub fn lex(src: &str, tokens: &mut Vec<Token>, reporter: &mut impl Reporter) {
    Lexer::new(src, tokens, reporter).lex();
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn tokenize(src: &str, reporter: &mut impl Reporter) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens, reporter);
    tokens
}

#[derive(Copy, Clone, Debug)]
enum Pattern {
    /// `[ \t\r]+`
    Whitespace,
    /// `\n`
    Newline,
    /// `//` up to (excluding) the line break.
    Comment,
    /// An exact word. Rejected when an identifier character follows.
    Word(&'static str),
    /// `[0-9]+\.[0-9]+`
    Float,
    /// `[0-9]+`
    Integer,
    /// `"[^"\n]*"`
    String,
    /// An exact punctuation sequence.
    Symbol(&'static str),
    /// `[a-zA-Z_][a-zA-Z0-9_]*`
    Identifier,
}

/// Every kind the lexer may produce, in priority order. At each position the
/// first entry whose pattern matches wins, so the more specific patterns must
/// come first (`<=` before `<`, keywords before identifiers).
static PATTERNS: &[(TokenKind, Pattern)] = {
    use Pattern::*;
    use TokenKind as K;
    &[
        (K::Whitespace, Whitespace),
        (K::Newline, Newline),
        (K::Comment, Comment),
        // Keywords
        (K::If, Word("if")),
        (K::Else, Word("else")),
        (K::With, Word("with")),
        (K::And, Word("and")),
        (K::Or, Word("or")),
        (K::Var, Word("var")),
        (K::Ret, Word("ret")),
        // Types
        (K::FloatType, Word("float")),
        (K::StringType, Word("string")),
        (K::IntType, Word("int")),
        (K::BoolType, Word("bool")),
        (K::VoidType, Word("void")),
        (K::NoneType, Word("none")),
        (K::ListType, Word("list")),
        (K::FnType, Word("fn")),
        // Literals
        (K::Boolean, Word("true")),
        (K::Boolean, Word("false")),
        (K::Float, Float),
        (K::Integer, Integer),
        (K::String, String),
        // Symbols
        (K::LBrace, Symbol("{")),
        (K::RBrace, Symbol("}")),
        (K::LParen, Symbol("(")),
        (K::RParen, Symbol(")")),
        (K::LBracket, Symbol("[")),
        (K::RBracket, Symbol("]")),
        (K::Semicolon, Symbol(";")),
        (K::Comma, Symbol(",")),
        (K::EqualEqual, Symbol("==")),
        (K::BangEqual, Symbol("!=")),
        (K::LessEqual, Symbol("<=")),
        (K::GreaterEqual, Symbol(">=")),
        (K::Less, Symbol("<")),
        (K::Greater, Symbol(">")),
        (K::Equal, Symbol("=")),
        (K::Plus, Symbol("+")),
        (K::Minus, Symbol("-")),
        (K::Star, Symbol("*")),
        (K::Slash, Symbol("/")),
        (K::Percent, Symbol("%")),
        (K::Bang, Symbol("!")),
        (K::Caret, Symbol("^")),
        (K::Identifier, Identifier),
    ]
};

impl Pattern {
    /// Returns the byte length of the match anchored at the start of `rest`.
    fn match_len(self, rest: &str) -> Option<usize> {
        let bytes = rest.as_bytes();
        match self {
            Pattern::Whitespace => {
                non_empty(count_while(bytes, 0, |b| matches!(b, b' ' | b'\t' | b'\r')))
            }
            Pattern::Newline => rest.starts_with('\n').then_some(1),
            Pattern::Comment => rest
                .starts_with("//")
                .then(|| rest.find('\n').unwrap_or(rest.len())),
            Pattern::Word(text) | Pattern::Symbol(text) => {
                rest.starts_with(text).then_some(text.len())
            }
            Pattern::Float => {
                let whole = count_while(bytes, 0, |b| b.is_ascii_digit());
                if whole == 0 || bytes.get(whole) != Some(&b'.') {
                    return None;
                }
                let fraction = count_while(bytes, whole + 1, |b| b.is_ascii_digit());
                (fraction > 0).then_some(whole + 1 + fraction)
            }
            Pattern::Integer => non_empty(count_while(bytes, 0, |b| b.is_ascii_digit())),
            Pattern::String => {
                if bytes.first() != Some(&b'"') {
                    return None;
                }
                let end = 1 + count_while(bytes, 1, |b| b != b'"' && b != b'\n');
                (bytes.get(end) == Some(&b'"')).then_some(end + 1)
            }
            Pattern::Identifier => {
                let first = *bytes.first()?;
                if !(first.is_ascii_alphabetic() || first == b'_') {
                    return None;
                }
                Some(1 + count_while(bytes, 1, is_identifier_byte))
            }
        }
    }
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Counts how many bytes, starting at `start`, hold the predicate.
fn count_while(bytes: &[u8], start: usize, predicate: impl Fn(u8) -> bool) -> usize {
    bytes
        .get(start..)
        .map_or(0, |tail| tail.iter().take_while(|&&b| predicate(b)).count())
}

fn non_empty(len: usize) -> Option<usize> {
    (len > 0).then_some(len)
}

/// The language lexer.
struct Lexer<'src, 'tok, R> {
    src: &'src str,
    cursor: usize,
    pos: Position,
    tokens: &'tok mut Vec<Token>,
    reporter: &'tok mut R,
}

impl<R: Reporter> Lexer<'_, '_, R> {
    /// Scans the source string until the input is exhausted.
    ///
    /// Tokens are written into the provided tokens buffer.
    fn lex(mut self) {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        while self.cursor < self.src.len() {
            let rest = &self.src[self.cursor..];
            match Self::scan(rest) {
                Some((kind, len)) => self.accept(kind, len),
                None => self.skip_unexpected(rest),
            }
        }
        self.tokens
            .push(Token::new(TokenKind::EndOfFile, "", self.pos));
        log::debug!("lexed {} tokens", self.tokens.len());
    }

    /// Tries every pattern in priority order at the start of `rest`.
    fn scan(rest: &str) -> Option<(TokenKind, usize)> {
        PATTERNS.iter().find_map(|&(kind, pattern)| {
            let len = pattern.match_len(rest)?;
            // `ifx` is an identifier, not `if` followed by `x`.
            let glued = rest.as_bytes().get(len).is_some_and(|&b| is_identifier_byte(b));
            if kind.is_word() && glued {
                return None;
            }
            Some((kind, len))
        })
    }

    fn accept(&mut self, kind: TokenKind, len: usize) {
        let lexeme = &self.src[self.cursor..self.cursor + len];
        if !kind.is_trivia() {
            log::trace!("{kind} {lexeme:?} at {}", self.pos);
            self.tokens.push(Token::new(kind, lexeme, self.pos));
        }
        self.cursor += len;
        if kind == TokenKind::Newline {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.advance_column(lexeme.chars().count());
        }
    }

    fn skip_unexpected(&mut self, rest: &str) {
        let Some(c) = rest.chars().next() else {
            return;
        };
        log::warn!("skipping unexpected character {c:?} at {}", self.pos);
        let message = format!("unexpected character {c:?}");
        self.reporter.report(&Diagnostic::new(message, self.pos));
        self.cursor += c.len_utf8();
        self.advance_column(1);
    }

    fn advance_column(&mut self, by: usize) {
        let by = u32::try_from(by).unwrap_or(u32::MAX);
        self.pos.column = self.pos.column.saturating_add(by);
    }
}

impl<R> Lexer<'_, '_, R> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(
        src: &'src str,
        tokens: &'tok mut Vec<Token>,
        reporter: &'tok mut R,
    ) -> Lexer<'src, 'tok, R> {
        Lexer {
            src,
            cursor: 0,
            pos: Position::new(1, 1),
            tokens,
            reporter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lexed(src: &str) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let tokens = tokenize(src, &mut diagnostics);
        (tokens, diagnostics)
    }

    #[test]
    fn test_declaration() {
        use TokenKind::*;
        let (tokens, diagnostics) = lexed("var int x = 1");
        assert!(diagnostics.is_empty());
        assert_eq!(
            tokens,
            cases![
                (Var, "var", 1, 1),
                (IntType, "int", 1, 5),
                (Identifier, "x", 1, 9),
                (Equal, "=", 1, 11),
                (Integer, "1", 1, 13),
                (EndOfFile, "", 1, 14),
            ]
        );
    }

    #[test]
    fn test_keyword_prefixed_identifiers() {
        use TokenKind::*;
        let (tokens, _) = lexed("ifable varx returned intx fnord truely with_ captured");
        assert_eq!(
            tokens,
            cases![
                (Identifier, "ifable", 1, 1),
                (Identifier, "varx", 1, 8),
                (Identifier, "returned", 1, 13),
                (Identifier, "intx", 1, 22),
                (Identifier, "fnord", 1, 27),
                (Identifier, "truely", 1, 33),
                (Identifier, "with_", 1, 40),
                (Identifier, "captured", 1, 46),
                (EndOfFile, "", 1, 54),
            ]
        );
    }

    #[test]
    fn test_keywords_and_types() {
        use TokenKind::*;
        let (tokens, _) = lexed("if else with and or ret int float string bool void none list fn");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                If, Else, With, And, Or, Ret, IntType, FloatType, StringType, BoolType,
                VoidType, NoneType, ListType, FnType, EndOfFile,
            ]
        );
    }

    #[test]
    fn test_symbols_prefer_longer_forms() {
        use TokenKind::*;
        let (tokens, _) = lexed("<= < == = != ! >= >(<<=)");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                LessEqual, Less, EqualEqual, Equal, BangEqual, Bang, GreaterEqual, Greater,
                LParen, Less, LessEqual, RParen, EndOfFile,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        use TokenKind::*;
        let (tokens, diagnostics) = lexed("1.5 2 3.");
        assert_eq!(
            tokens,
            cases![
                (Float, "1.5", 1, 1),
                (Integer, "2", 1, 5),
                (Integer, "3", 1, 7),
                (EndOfFile, "", 1, 9),
            ]
        );
        assert_eq!(
            diagnostics,
            [Diagnostic::new("unexpected character '.'", Position::new(1, 8))]
        );
    }

    #[test]
    fn test_lines_and_comments() {
        use TokenKind::*;
        let (tokens, _) = lexed("a\n  b // c\nc");
        assert_eq!(
            tokens,
            cases![
                (Identifier, "a", 1, 1),
                (Newline, "\n", 1, 2),
                (Identifier, "b", 2, 3),
                (Newline, "\n", 2, 9),
                (Identifier, "c", 3, 1),
                (EndOfFile, "", 3, 2),
            ]
        );
    }

    #[test]
    fn test_strings() {
        use TokenKind::*;
        let (tokens, diagnostics) = lexed(r#""hi there" "open"#);
        assert_eq!(
            tokens,
            cases![
                (String, "\"hi there\"", 1, 1),
                (Identifier, "open", 1, 13),
                (EndOfFile, "", 1, 17),
            ]
        );
        assert_eq!(
            diagnostics,
            [Diagnostic::new("unexpected character '\"'", Position::new(1, 12))]
        );
    }

    #[test]
    fn test_unexpected_character_is_skipped() {
        use TokenKind::*;
        let (tokens, diagnostics) = lexed("a $ b");
        assert_eq!(
            tokens,
            cases![
                (Identifier, "a", 1, 1),
                (Identifier, "b", 1, 5),
                (EndOfFile, "", 1, 6),
            ]
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line(), 1);
        assert_eq!(diagnostics[0].column(), 3);
    }

    #[test]
    fn test_capture_and_list_type() {
        use TokenKind::*;
        let (tokens, _) = lexed("int[] ^x");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [IntType, LBracket, RBracket, Caret, Identifier, EndOfFile]
        );
    }

    #[test]
    fn test_empty_input() {
        let (tokens, diagnostics) = lexed("");
        assert!(diagnostics.is_empty());
        assert_eq!(
            tokens,
            cases![(TokenKind::EndOfFile, "", 1, 1)]
        );
    }

    macro_rules! cases {
        ($(($kind:expr, $lexeme:expr, $line:expr, $column:expr)),* $(,)?) => {
            vec![$(Token::new($kind, $lexeme, Position::new($line, $column))),*]
        };
    }
    use cases;
}
