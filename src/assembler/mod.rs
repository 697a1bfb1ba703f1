//! The assembler module turns ARC source text into a
//! validated, position-annotated AST, or into a sorted
//! list of diagnostics when the input is malformed.
//!
//! It does this with a pull-based tokenizer and a
//! one-token-pushback recursive descent parser that keeps
//! parsing past errors, so a single run reports every
//! defect in a file.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;
