//! Parse diagnostics and their aggregation.
//!
//! The parser never stops at the first defect; it accumulates every
//! error it finds into a [`Diagnostics`] collection. Rendering is
//! deterministic: entries are sorted by source position before
//! display, because detection order is not source order (the
//! unresolved-identifier sweep iterates a table keyed by name).

use std::fmt;

use super::token::{Position, Token};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Diagnostic {
    /// A token was found where a different token class was required.
    Syntax {
        pos: Position,
        found: Token,
        literal: String,
        expected: Vec<Token>,
    },
    /// An integer literal does not fit 32 signed bits.
    IntegerRange { pos: Position, literal: String },
    /// A displacement literal does not fit the 13-bit immediate field.
    Simm13Range { pos: Position, literal: String },
    /// A label name was declared a second time.
    DuplicateLabel {
        pos: Position,
        name: String,
        previous: Position,
    },
    /// An identifier was used but never declared in this unit.
    UnresolvedIdentifier { pos: Position, name: String },
    /// A `call` target resolved to a value label, not a statement.
    ImpossibleCall { pos: Position, name: String },
}

impl Diagnostic {
    pub fn pos(&self) -> &Position {
        use Diagnostic::*;
        match self {
            Syntax { pos, .. }
            | IntegerRange { pos, .. }
            | Simm13Range { pos, .. }
            | DuplicateLabel { pos, .. }
            | UnresolvedIdentifier { pos, .. }
            | ImpossibleCall { pos, .. } => pos,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Diagnostic::*;
        match self {
            Syntax {
                pos,
                found,
                literal,
                expected,
            } => {
                let expected = expected
                    .iter()
                    .map(|tok| tok.describe_expected())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "{}: found {}, expected {}",
                    pos,
                    found.describe(literal),
                    expected
                )
            }
            IntegerRange { pos, literal } => {
                write!(f, "{}: INTEGER \"{}\" out of 32 bit range", pos, literal)
            }
            Simm13Range { pos, literal } => {
                write!(f, "{}: INTEGER \"{}\" is not a valid SIMM13", pos, literal)
            }
            DuplicateLabel {
                pos,
                name,
                previous,
            } => write!(
                f,
                "{}: label \"{}\" already declared: previous declaration at {}",
                pos, name, previous
            ),
            UnresolvedIdentifier { pos, name } => {
                write!(f, "{}: unresolved IDENTIFIER \"{}\"", pos, name)
            }
            ImpossibleCall { pos, name } => write!(
                f,
                "{}: impossible subroutine call: label \"{}\" does not reference a statement",
                pos, name
            ),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// An append-only multi-error collector.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<Diagnostic> {
        self.errors.iter()
    }

    /// Orders entries by source position. Insertion order is kept
    /// for entries at the same position (stable sort).
    pub fn sort(&mut self) {
        self.errors.sort_by(|a, b| a.pos().cmp(b.pos()));
    }

    /// The API boundary: an empty collection is no error at all.
    pub fn into_option(self) -> Option<Diagnostics> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for err in &self.errors {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_rendering() {
        let err = Diagnostic::Syntax {
            pos: Position::new(2, 4),
            found: Token::Register,
            literal: "%r2".to_owned(),
            expected: vec![Token::Comma, Token::Newline],
        };
        assert_eq!(
            err.to_string(),
            "2:4: found REGISTER \"%r2\", expected \",\", NEWLINE"
        );
    }

    #[test]
    fn test_fixed_message_rendering() {
        let err = Diagnostic::IntegerRange {
            pos: Position::new(1, 5),
            literal: "90000000000000".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "1:5: INTEGER \"90000000000000\" out of 32 bit range"
        );

        let err = Diagnostic::Simm13Range {
            pos: Position::new(1, 9),
            literal: "8192".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "1:9: INTEGER \"8192\" is not a valid SIMM13"
        );

        let err = Diagnostic::DuplicateLabel {
            pos: Position::new(4, 1),
            name: "x".to_owned(),
            previous: Position::new(2, 1),
        };
        assert_eq!(
            err.to_string(),
            "4:1: label \"x\" already declared: previous declaration at 2:1"
        );

        let err = Diagnostic::UnresolvedIdentifier {
            pos: Position::new(3, 5),
            name: "y".to_owned(),
        };
        assert_eq!(err.to_string(), "3:5: unresolved IDENTIFIER \"y\"");
    }

    #[test]
    fn test_sort_is_by_position_not_insertion() {
        let mut errs = Diagnostics::new();
        errs.push(Diagnostic::UnresolvedIdentifier {
            pos: Position::new(7, 4),
            name: "b".to_owned(),
        });
        errs.push(Diagnostic::UnresolvedIdentifier {
            pos: Position::new(2, 8),
            name: "a".to_owned(),
        });
        errs.push(Diagnostic::UnresolvedIdentifier {
            pos: Position::new(2, 1),
            name: "c".to_owned(),
        });
        errs.sort();
        assert_eq!(
            errs.to_string(),
            "2:1: unresolved IDENTIFIER \"c\"\n\
             2:8: unresolved IDENTIFIER \"a\"\n\
             7:4: unresolved IDENTIFIER \"b\""
        );
    }

    #[test]
    fn test_empty_collection_is_no_error() {
        assert_eq!(Diagnostics::new().into_option(), None);

        let mut errs = Diagnostics::new();
        errs.push(Diagnostic::UnresolvedIdentifier {
            pos: Position::new(1, 1),
            name: "x".to_owned(),
        });
        assert!(errs.into_option().is_some());
    }
}
