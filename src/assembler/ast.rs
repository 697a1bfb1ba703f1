//! The AST describes a parsed ARC source file.
//!
//! A [`Program`] is the ordered list of statements exactly as they
//! appear in the source; no reordering ever happens here. Every node
//! records the position it originated from, and statements also
//! expose their originating token so downstream passes can dispatch
//! without re-inspecting the syntax.
//!
//! All statement forms:
//!
//! ```asm
//! ! a comment runs to the end of the line
//! .begin                 ! directives frame the program
//! .org 2048
//! x: 25                  ! label bound to a value
//! loop: addcc %r1, -1, %r1   ! label bound to a statement
//! ld [x], %r2            ! memory load, direct
//! ld %r3, %r2            ! memory load, indirect
//! st %r2, [x+4]          ! memory store
//! add %r1, %r2, %r3      ! arithmetic/logic: add sub and or orn xor
//! subcc %r1, 10, %r3     ! ...each with a cc-setting variant
//! sll %r1, 2, %r3        ! shifts: sll sra
//! be done                ! branches: be bne bneg bpos ba
//! call subroutine
//! jmpl %r15+4, %r0
//! .end
//! ```
//!
//! Integer literals keep their spelling, so re-serializing a program
//! preserves decimal, octal and hex forms as written.

use std::fmt;

use super::token::{Position, Token};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Identifier {
    pub name: String,
    pub pos: Position,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Register {
    pub name: String,
    pub pos: Position,
}

/// An integer literal. `value` is derived from `literal` at parse
/// time and is guaranteed to fit 32 signed bits.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Integer {
    pub literal: String,
    pub value: i32,
    pub pos: Position,
}

/// The base of a bracketed memory expression: a label or a register.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Base {
    Identifier(Identifier),
    Register(Register),
}

/// `base`, `base+offset`, or `base-offset`. The offset is a SIMM13
/// displacement; its sign lives in `operator`, never in the field.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Expression {
    pub base: Base,
    pub operator: Option<Token>,
    pub offset: Option<Integer>,
    pub pos: Position,
}

/// The memory operand of `ld`/`st`: a bare register (indirect) or a
/// bracketed expression (direct, optionally offset).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MemoryLocation {
    Indirect(Register),
    Direct(Expression),
}

/// The second operand of the arithmetic/logic family.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Value(Integer),
    Register(Register),
}

/// What a label points at: a bare value or an executable statement.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Reference {
    Value(Integer),
    Code(Box<Statement>),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Statement {
    Comment {
        text: String,
        pos: Position,
    },
    Begin {
        pos: Position,
    },
    End {
        pos: Position,
    },
    Org {
        value: Integer,
        pos: Position,
    },
    Label {
        ident: Identifier,
        reference: Reference,
        pos: Position,
    },
    Load {
        location: MemoryLocation,
        destination: Register,
        pos: Position,
    },
    Store {
        source: Register,
        location: MemoryLocation,
        pos: Position,
    },
    /// The whole arithmetic/logic/shift family. `token` is one of
    /// add/addcc/sub/subcc/and/andcc/or/orcc/orn/orncc/xor/xorcc/
    /// sll/sra; the `cc` variants differ only in tag, not in shape.
    Alu {
        token: Token,
        source: Register,
        operand: Operand,
        destination: Register,
        pos: Position,
    },
    /// `token` is one of be/bne/bneg/bpos/ba.
    Branch {
        token: Token,
        target: Identifier,
        pos: Position,
    },
    Call {
        target: Identifier,
        pos: Position,
    },
    JumpLink {
        address: Expression,
        link: Register,
        pos: Position,
    },
}

impl Statement {
    /// The token this statement originated from.
    pub fn token(&self) -> Token {
        use Statement::*;
        match self {
            Comment { .. } => Token::Comment,
            Begin { .. } => Token::Begin,
            End { .. } => Token::End,
            Org { .. } => Token::Org,
            Label { .. } => Token::Identifier,
            Load { .. } => Token::Load,
            Store { .. } => Token::Store,
            Alu { token, .. } => *token,
            Branch { token, .. } => *token,
            Call { .. } => Token::Call,
            JumpLink { .. } => Token::JumpLink,
        }
    }

    pub fn pos(&self) -> &Position {
        use Statement::*;
        match self {
            Comment { pos, .. }
            | Begin { pos }
            | End { pos }
            | Org { pos, .. }
            | Label { pos, .. }
            | Load { pos, .. }
            | Store { pos, .. }
            | Alu { pos, .. }
            | Branch { pos, .. }
            | Call { pos, .. }
            | JumpLink { pos, .. } => pos,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.literal)
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Base::Identifier(ident) => write!(f, "{}", ident),
            Base::Register(reg) => write!(f, "{}", reg),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let (Some(op), Some(offset)) = (self.operator, &self.offset) {
            write!(f, "{}{}", op, offset)?;
        }
        Ok(())
    }
}

impl fmt::Display for MemoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MemoryLocation::Indirect(reg) => write!(f, "{}", reg),
            MemoryLocation::Direct(expr) => write!(f, "[{}]", expr),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Value(value) => write!(f, "{}", value),
            Operand::Register(reg) => write!(f, "{}", reg),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Reference::Value(value) => write!(f, "{}", value),
            Reference::Code(stmt) => write!(f, "{}", stmt),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Statement::*;
        match self {
            Comment { text, .. } => write!(f, "{}", text),
            Begin { .. } => write!(f, ".begin"),
            End { .. } => write!(f, ".end"),
            Org { value, .. } => write!(f, ".org {}", value),
            Label {
                ident, reference, ..
            } => write!(f, "{}: {}", ident, reference),
            Load {
                location,
                destination,
                ..
            } => write!(f, "ld {}, {}", location, destination),
            Store {
                source, location, ..
            } => write!(f, "st {}, {}", source, location),
            Alu {
                token,
                source,
                operand,
                destination,
                ..
            } => write!(f, "{} {}, {}, {}", token, source, operand, destination),
            Branch { token, target, .. } => write!(f, "{} {}", token, target),
            Call { target, .. } => write!(f, "call {}", target),
            JumpLink { address, link, .. } => write!(f, "jmpl {}, {}", address, link),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Position {
        Position::new(1, 1)
    }

    fn reg(name: &str) -> Register {
        Register {
            name: name.to_owned(),
            pos: pos(),
        }
    }

    fn int(literal: &str, value: i32) -> Integer {
        Integer {
            literal: literal.to_owned(),
            value,
            pos: pos(),
        }
    }

    fn ident(name: &str) -> Identifier {
        Identifier {
            name: name.to_owned(),
            pos: pos(),
        }
    }

    #[test]
    fn test_display_load_store() {
        let load = Statement::Load {
            location: MemoryLocation::Direct(Expression {
                base: Base::Identifier(ident("x")),
                operator: Some(Token::Plus),
                offset: Some(int("4", 4)),
                pos: pos(),
            }),
            destination: reg("%r1"),
            pos: pos(),
        };
        assert_eq!(load.to_string(), "ld [x+4], %r1");

        let store = Statement::Store {
            source: reg("%r2"),
            location: MemoryLocation::Indirect(reg("%r3")),
            pos: pos(),
        };
        assert_eq!(store.to_string(), "st %r2, %r3");
    }

    #[test]
    fn test_display_alu_preserves_literal_spelling() {
        let stmt = Statement::Alu {
            token: Token::AddCc,
            source: reg("%r1"),
            operand: Operand::Value(int("0x1F", 31)),
            destination: reg("%r2"),
            pos: pos(),
        };
        assert_eq!(stmt.to_string(), "addcc %r1, 0x1F, %r2");
    }

    #[test]
    fn test_display_label_and_directives() {
        let label = Statement::Label {
            ident: ident("x"),
            reference: Reference::Value(int("25", 25)),
            pos: pos(),
        };
        assert_eq!(label.to_string(), "x: 25");

        let nested = Statement::Label {
            ident: ident("loop"),
            reference: Reference::Code(Box::new(Statement::Branch {
                token: Token::BranchAlways,
                target: ident("loop"),
                pos: pos(),
            })),
            pos: pos(),
        };
        assert_eq!(nested.to_string(), "loop: ba loop");

        assert_eq!(Statement::Begin { pos: pos() }.to_string(), ".begin");
        assert_eq!(
            Statement::Org {
                value: int("2048", 2048),
                pos: pos()
            }
            .to_string(),
            ".org 2048"
        );
    }

    #[test]
    fn test_display_jumplink() {
        let stmt = Statement::JumpLink {
            address: Expression {
                base: Base::Register(reg("%r15")),
                operator: Some(Token::Plus),
                offset: Some(int("4", 4)),
                pos: pos(),
            },
            link: reg("%r0"),
            pos: pos(),
        };
        assert_eq!(stmt.to_string(), "jmpl %r15+4, %r0");
    }

    #[test]
    fn test_statement_token() {
        let stmt = Statement::Alu {
            token: Token::XorCc,
            source: reg("%r1"),
            operand: Operand::Register(reg("%r2")),
            destination: reg("%r3"),
            pos: pos(),
        };
        assert_eq!(stmt.token(), Token::XorCc);
        assert_eq!(Statement::End { pos: pos() }.token(), Token::End);
        assert_eq!(
            Statement::Call {
                target: ident("subr"),
                pos: pos()
            }
            .token(),
            Token::Call
        );
    }

    #[test]
    fn test_program_display_joins_statements() {
        let program = Program {
            statements: vec![
                Statement::Begin { pos: pos() },
                Statement::End { pos: pos() },
            ],
        };
        assert_eq!(program.to_string(), ".begin\n.end\n");
    }
}
