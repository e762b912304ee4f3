use std::fmt;

use crate::token::Position;

/// A message addressed to the diagnostics collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, position: Position) -> Diagnostic {
        Diagnostic {
            message: message.into(),
            position: Some(position),
        }
    }

    pub fn positionless(message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            message: message.into(),
            position: None,
        }
    }

    /// The 1-based line, or `-1` if the diagnostic has no position.
    pub fn line(&self) -> i64 {
        self.position.map_or(-1, |p| i64::from(p.line))
    }

    /// The 1-based column, or `-1` if the diagnostic has no position.
    pub fn column(&self) -> i64 {
        self.position.map_or(-1, |p| i64::from(p.column))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{pos}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// The error channel. Implementors own rendering (source echo, caret) and
/// deciding what happens to the process.
pub trait Reporter {
    fn report(&mut self, diagnostic: &Diagnostic);
}

impl Reporter for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, diagnostic: &Diagnostic) {
        (**self).report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positioned() {
        let diagnostic = Diagnostic::new("unexpected character '$'", Position::new(3, 7));
        assert_eq!((diagnostic.line(), diagnostic.column()), (3, 7));
        assert_eq!(diagnostic.to_string(), "3:7: unexpected character '$'");
    }

    #[test]
    fn test_positionless() {
        let diagnostic = Diagnostic::positionless("failed to read input");
        assert_eq!((diagnostic.line(), diagnostic.column()), (-1, -1));
        assert_eq!(diagnostic.to_string(), "failed to read input");
    }

    #[test]
    fn test_reporter_through_reference() {
        fn report_twice(mut reporter: impl Reporter) {
            reporter.report(&Diagnostic::positionless("a"));
            reporter.report(&Diagnostic::positionless("b"));
        }
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        report_twice(&mut diagnostics);
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["a", "b"]);
    }
}
