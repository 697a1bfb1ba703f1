//! The parser drives the lexer and builds the AST.
//!
//! It is a recursive descent parser with a one-token pushback
//! buffer. A single malformed statement never aborts the whole
//! parse: the error is recorded, input is skipped to the next
//! newline, and parsing resumes, so one invocation reports every
//! defect in a file. Label declarations and identifier references
//! are tracked across the whole pass; unresolved identifiers and
//! impossible subroutine calls are reported once the token stream is
//! exhausted, and the collected diagnostics are sorted by source
//! position before being returned.
//!
//! A parser instance can be reused: [`Parser::feed`] swaps in new
//! source text while keeping the label and unresolved tables, so an
//! interactive caller can resolve identifiers across feeds (and will
//! be told about label names redeclared across feeds).

use std::collections::HashMap;

use super::ast::*;
use super::error::{Diagnostic, Diagnostics};
use super::lexer::Lexer;
use super::token::{Position, Token};

/// The arithmetic/logic/shift mnemonics, all sharing the
/// `source, operand, destination` shape.
const ALU_TOKENS: &[Token] = &[
    Token::Add,
    Token::AddCc,
    Token::Sub,
    Token::SubCc,
    Token::And,
    Token::AndCc,
    Token::Or,
    Token::OrCc,
    Token::Orn,
    Token::OrnCc,
    Token::Xor,
    Token::XorCc,
    Token::ShiftLeft,
    Token::ShiftRight,
];

const BRANCH_TOKENS: &[Token] = &[
    Token::BranchEqual,
    Token::BranchNotEqual,
    Token::BranchNegative,
    Token::BranchPositive,
    Token::BranchAlways,
];

struct LabelInfo {
    pos: Position,
    is_code: bool,
}

pub struct Parser {
    lexer: Lexer,
    tok: Token,
    lit: String,
    pos: Position,
    // One-slot pushback: when set, the next scan re-delivers the
    // current triple instead of pulling from the lexer.
    buffered: bool,
    labels: HashMap<String, LabelInfo>,
    unresolved: HashMap<String, Identifier>,
    calls: Vec<Identifier>,
}

impl Parser {
    pub fn new(src: &str) -> Self {
        Parser::with_lexer(Lexer::new(src))
    }

    pub fn with_filename(src: &str, filename: &str) -> Self {
        Parser::with_lexer(Lexer::with_filename(src, filename))
    }

    fn with_lexer(lexer: Lexer) -> Self {
        Parser {
            lexer,
            tok: Token::Eof,
            lit: String::new(),
            pos: Position::default(),
            buffered: false,
            labels: HashMap::new(),
            unresolved: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// Swaps in new source text, keeping the label and unresolved
    /// tables. A later feed can resolve identifiers left unresolved
    /// by an earlier feed; redeclaring an earlier label is an error.
    pub fn feed(&mut self, src: &str) {
        self.lexer.feed(src);
        self.buffered = false;
    }

    /// Parses the current input to exhaustion. Returns the
    /// best-effort program together with every diagnostic collected,
    /// sorted by position; `None` means a clean parse.
    pub fn parse(&mut self) -> (Program, Option<Diagnostics>) {
        let mut program = Program::default();
        let mut errs = Diagnostics::new();

        loop {
            self.scan_skip_whitespace();
            match self.tok {
                Token::Eof => break,
                Token::Newline => continue,
                _ => {
                    self.unscan();
                    match self.statement(true) {
                        Ok(stmt) => program.statements.push(stmt),
                        Err(err) => {
                            errs.push(err);
                            self.recover();
                        }
                    }
                }
            }
        }

        // Cross-statement checks need the whole pass' table state.
        for ident in self.unresolved.values() {
            errs.push(Diagnostic::UnresolvedIdentifier {
                pos: ident.pos.clone(),
                name: ident.name.clone(),
            });
        }
        for target in &self.calls {
            if let Some(info) = self.labels.get(&target.name) {
                if !info.is_code {
                    errs.push(Diagnostic::ImpossibleCall {
                        pos: target.pos.clone(),
                        name: target.name.clone(),
                    });
                }
            }
        }

        errs.sort();
        debug!(
            "parsed {} statement(s), {} diagnostic(s)",
            program.statements.len(),
            errs.len()
        );
        (program, errs.into_option())
    }

    /// Parses one statement, dispatching on its leading token. The
    /// statement consumes its own terminator. `allow_label` is false
    /// when parsing a label's right-hand side, where another label
    /// cannot appear.
    fn statement(&mut self, allow_label: bool) -> Result<Statement, Diagnostic> {
        self.scan_skip_whitespace();
        let pos = self.pos.clone();
        let tok = self.tok;
        match tok {
            Token::Comment => {
                let text = self.lit.clone();
                self.end_of_statement()?;
                Ok(Statement::Comment { text, pos })
            }
            Token::Begin => {
                self.end_of_statement()?;
                Ok(Statement::Begin { pos })
            }
            Token::End => {
                self.end_of_statement()?;
                Ok(Statement::End { pos })
            }
            Token::Org => {
                let value = self.integer()?;
                self.end_of_statement()?;
                Ok(Statement::Org { value, pos })
            }
            Token::Identifier if allow_label => self.label(pos),
            Token::Load => self.load(pos),
            Token::Store => self.store(pos),
            _ if ALU_TOKENS.contains(&tok) => self.alu(tok, pos),
            _ if BRANCH_TOKENS.contains(&tok) => self.branch(tok, pos),
            Token::Call => self.call(pos),
            Token::JumpLink => self.jump_link(pos),
            _ => {
                let mut expected = vec![Token::Comment, Token::Begin, Token::End, Token::Org];
                if allow_label {
                    expected.push(Token::Identifier);
                }
                expected.extend_from_slice(&[Token::Load, Token::Store]);
                expected.extend_from_slice(ALU_TOKENS);
                expected.extend_from_slice(BRANCH_TOKENS);
                expected.extend_from_slice(&[Token::Call, Token::JumpLink]);
                Err(self.syntax_error(&expected))
            }
        }
    }

    /// `identifier ':' (integer | statement)`. The right-hand
    /// statement reuses the statement grammar with labels disabled
    /// and consumes the terminator itself.
    fn label(&mut self, pos: Position) -> Result<Statement, Diagnostic> {
        let ident = Identifier {
            name: self.lit.clone(),
            pos: self.pos.clone(),
        };
        self.expect(Token::Colon)?;

        self.scan_skip_whitespace();
        self.unscan();
        let reference = match self.tok {
            Token::Integer | Token::Minus => {
                let value = self.integer()?;
                self.end_of_statement()?;
                Reference::Value(value)
            }
            _ => Reference::Code(Box::new(self.statement(false)?)),
        };

        let is_code = matches!(reference, Reference::Code(_));
        self.declare(&ident, is_code)?;
        Ok(Statement::Label {
            ident,
            reference,
            pos,
        })
    }

    /// `ld memory-location ',' register`
    fn load(&mut self, pos: Position) -> Result<Statement, Diagnostic> {
        let location = self.memory_location()?;
        self.expect(Token::Comma)?;
        let destination = self.register()?;
        self.end_of_statement()?;
        Ok(Statement::Load {
            location,
            destination,
            pos,
        })
    }

    /// `st register ',' memory-location`
    fn store(&mut self, pos: Position) -> Result<Statement, Diagnostic> {
        let source = self.register()?;
        self.expect(Token::Comma)?;
        let location = self.memory_location()?;
        self.end_of_statement()?;
        Ok(Statement::Store {
            source,
            location,
            pos,
        })
    }

    /// `register ',' operand ',' register` — one grammar for the
    /// whole family; the mnemonic token is the only difference
    /// between the plain and `cc` variants.
    fn alu(&mut self, token: Token, pos: Position) -> Result<Statement, Diagnostic> {
        let source = self.register()?;
        self.expect(Token::Comma)?;
        let operand = self.operand()?;
        self.expect(Token::Comma)?;
        let destination = self.register()?;
        self.end_of_statement()?;
        Ok(Statement::Alu {
            token,
            source,
            operand,
            destination,
            pos,
        })
    }

    fn branch(&mut self, token: Token, pos: Position) -> Result<Statement, Diagnostic> {
        let target = self.identifier()?;
        self.resolve(&target);
        self.end_of_statement()?;
        Ok(Statement::Branch { token, target, pos })
    }

    /// `call identifier`. The target is also recorded for the
    /// end-of-pass subroutine check, which needs the full label
    /// table.
    fn call(&mut self, pos: Position) -> Result<Statement, Diagnostic> {
        let target = self.identifier()?;
        self.resolve(&target);
        self.calls.push(target.clone());
        self.end_of_statement()?;
        Ok(Statement::Call { target, pos })
    }

    /// `jmpl expression ',' register`
    fn jump_link(&mut self, pos: Position) -> Result<Statement, Diagnostic> {
        let address = self.expression()?;
        self.expect(Token::Comma)?;
        let link = self.register()?;
        self.end_of_statement()?;
        Ok(Statement::JumpLink { address, link, pos })
    }

    /// `'[' expression ']'` or a bare register.
    fn memory_location(&mut self) -> Result<MemoryLocation, Diagnostic> {
        self.scan_skip_whitespace();
        match self.tok {
            Token::Register => Ok(MemoryLocation::Indirect(Register {
                name: self.lit.clone(),
                pos: self.pos.clone(),
            })),
            Token::LeftBracket => {
                let expr = self.expression()?;
                self.expect(Token::RightBracket)?;
                Ok(MemoryLocation::Direct(expr))
            }
            _ => Err(self.syntax_error(&[Token::Register, Token::LeftBracket])),
        }
    }

    /// `(identifier | register) [('+'|'-') simm13]`
    fn expression(&mut self) -> Result<Expression, Diagnostic> {
        self.scan_skip_whitespace();
        let pos = self.pos.clone();
        let base = match self.tok {
            Token::Identifier => {
                let ident = Identifier {
                    name: self.lit.clone(),
                    pos: self.pos.clone(),
                };
                self.resolve(&ident);
                Base::Identifier(ident)
            }
            Token::Register => Base::Register(Register {
                name: self.lit.clone(),
                pos: self.pos.clone(),
            }),
            _ => return Err(self.syntax_error(&[Token::Identifier, Token::Register])),
        };

        self.scan_skip_whitespace();
        match self.tok {
            Token::Plus | Token::Minus => {
                let operator = self.tok;
                let offset = self.simm13()?;
                Ok(Expression {
                    base,
                    operator: Some(operator),
                    offset: Some(offset),
                    pos,
                })
            }
            _ => {
                self.unscan();
                Ok(Expression {
                    base,
                    operator: None,
                    offset: None,
                    pos,
                })
            }
        }
    }

    /// `integer | register`
    fn operand(&mut self) -> Result<Operand, Diagnostic> {
        self.scan_skip_whitespace();
        match self.tok {
            Token::Register => Ok(Operand::Register(Register {
                name: self.lit.clone(),
                pos: self.pos.clone(),
            })),
            Token::Integer | Token::Minus => {
                self.unscan();
                Ok(Operand::Value(self.integer()?))
            }
            _ => Err(self.syntax_error(&[Token::Integer, Token::Register])),
        }
    }

    fn register(&mut self) -> Result<Register, Diagnostic> {
        self.scan_skip_whitespace();
        if self.tok != Token::Register {
            return Err(self.syntax_error(&[Token::Register]));
        }
        Ok(Register {
            name: self.lit.clone(),
            pos: self.pos.clone(),
        })
    }

    fn identifier(&mut self) -> Result<Identifier, Diagnostic> {
        self.scan_skip_whitespace();
        if self.tok != Token::Identifier {
            return Err(self.syntax_error(&[Token::Identifier]));
        }
        Ok(Identifier {
            name: self.lit.clone(),
            pos: self.pos.clone(),
        })
    }

    /// A signed 32-bit literal: optional `-`, then an integer token.
    /// The value is derived here; the spelling is kept verbatim.
    fn integer(&mut self) -> Result<Integer, Diagnostic> {
        self.scan_skip_whitespace();
        let pos = self.pos.clone();
        let negative = self.tok == Token::Minus;
        if negative {
            self.scan_skip_whitespace();
        }
        if self.tok != Token::Integer {
            return Err(self.syntax_error(&[Token::Integer]));
        }
        let literal = if negative {
            format!("-{}", self.lit)
        } else {
            self.lit.clone()
        };

        let magnitude = match parse_magnitude(&self.lit) {
            Some(m) => m as i128,
            None => return Err(Diagnostic::IntegerRange { pos, literal }),
        };
        let value = if negative { -magnitude } else { magnitude };
        if value < i32::MIN as i128 || value > i32::MAX as i128 {
            return Err(Diagnostic::IntegerRange { pos, literal });
        }
        Ok(Integer {
            literal,
            value: value as i32,
            pos,
        })
    }

    /// A 13-bit displacement, `0..=8191`. The field is unsigned; a
    /// negative displacement is spelled with the expression's `-`
    /// operator, never with a negative field value.
    fn simm13(&mut self) -> Result<Integer, Diagnostic> {
        self.scan_skip_whitespace();
        if self.tok != Token::Integer {
            return Err(self.syntax_error(&[Token::Integer]));
        }
        let literal = self.lit.clone();
        let pos = self.pos.clone();
        match parse_magnitude(&literal) {
            Some(m) if m <= 8191 => Ok(Integer {
                value: m as i32,
                literal,
                pos,
            }),
            _ => Err(Diagnostic::Simm13Range { pos, literal }),
        }
    }

    /// A statement ends at a newline, at end of input, or at a
    /// trailing comment. The comment is pushed back so the main loop
    /// picks it up as a statement of its own.
    fn end_of_statement(&mut self) -> Result<(), Diagnostic> {
        self.scan_skip_whitespace();
        match self.tok {
            Token::Newline | Token::Eof => Ok(()),
            Token::Comment => {
                self.unscan();
                Ok(())
            }
            _ => Err(self.syntax_error(&[Token::Newline, Token::Eof, Token::Comment])),
        }
    }

    /// Records a label declaration. Redeclaration is an error, not a
    /// silent overwrite; a successful declaration resolves any
    /// pending identifier uses of the same name.
    fn declare(&mut self, ident: &Identifier, is_code: bool) -> Result<(), Diagnostic> {
        if let Some(prev) = self.labels.get(&ident.name) {
            return Err(Diagnostic::DuplicateLabel {
                pos: ident.pos.clone(),
                name: ident.name.clone(),
                previous: prev.pos.clone(),
            });
        }
        self.labels.insert(
            ident.name.clone(),
            LabelInfo {
                pos: ident.pos.clone(),
                is_code,
            },
        );
        self.unresolved.remove(&ident.name);
        Ok(())
    }

    /// Notes an identifier use. Already-declared names resolve
    /// immediately; otherwise the first-seen use is recorded and
    /// waits for a later declaration.
    fn resolve(&mut self, ident: &Identifier) {
        if !self.labels.contains_key(&ident.name) {
            self.unresolved
                .entry(ident.name.clone())
                .or_insert_with(|| ident.clone());
        }
    }

    /// Skips forward to the next newline or EOF after a statement
    /// error, guaranteeing forward progress on malformed input.
    fn recover(&mut self) {
        while !matches!(self.tok, Token::Newline | Token::Eof) {
            self.scan();
        }
    }

    fn expect(&mut self, tok: Token) -> Result<(), Diagnostic> {
        self.scan_skip_whitespace();
        if self.tok == tok {
            Ok(())
        } else {
            Err(self.syntax_error(&[tok]))
        }
    }

    fn syntax_error(&self, expected: &[Token]) -> Diagnostic {
        Diagnostic::Syntax {
            pos: self.pos.clone(),
            found: self.tok,
            literal: self.lit.clone(),
            expected: expected.to_vec(),
        }
    }

    fn scan(&mut self) {
        if self.buffered {
            self.buffered = false;
            return;
        }
        let (tok, lit, pos) = self.lexer.scan();
        self.tok = tok;
        self.lit = lit;
        self.pos = pos;
    }

    fn scan_skip_whitespace(&mut self) {
        self.scan();
        while self.tok == Token::Whitespace {
            self.scan();
        }
    }

    /// Pushes back the most recently scanned token; the next scan
    /// re-delivers it. Only one token deep, by design of the grammar.
    fn unscan(&mut self) {
        self.buffered = true;
    }
}

/// Converts an integer literal to its magnitude, honoring the
/// dialect's radix rules: `0x`/`0X` hex, leading-zero octal,
/// decimal otherwise.
fn parse_magnitude(lit: &str) -> Option<u64> {
    if let Some(hex) = lit.strip_prefix("0x").or_else(|| lit.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if lit.len() > 1 && lit.starts_with('0') {
        u64::from_str_radix(&lit[1..], 8).ok()
    } else {
        lit.parse().ok()
    }
}
