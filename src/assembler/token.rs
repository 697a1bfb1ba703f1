//! Lexical categories and source positions for the ARC dialect.
//!
//! Every token the lexer can produce falls into one of six classes:
//! special (end-of-file, illegal, whitespace, newline, comment),
//! literal (identifier, register, integer), operator, punctuation,
//! keyword (the instruction mnemonics), or directive. Keyword and
//! directive lookup is case-insensitive; anything wordlike that does
//! not match a reserved word is a plain identifier.

use std::cmp::Ordering;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Token {
    // Special tokens.
    Eof,
    Illegal,
    Whitespace,
    Newline,
    Comment,

    // Literals.
    Identifier,
    Register,
    Integer,

    // Operators.
    Plus,
    Minus,

    // Punctuation.
    LeftBracket,
    RightBracket,
    Comma,
    Colon,

    // Keywords.
    Load,
    Store,
    Add,
    AddCc,
    Sub,
    SubCc,
    And,
    AndCc,
    Or,
    OrCc,
    Orn,
    OrnCc,
    Xor,
    XorCc,
    ShiftLeft,
    ShiftRight,
    BranchEqual,
    BranchNotEqual,
    BranchNegative,
    BranchPositive,
    BranchAlways,
    Call,
    JumpLink,

    // Directives.
    Begin,
    End,
    Org,
}

impl Token {
    pub fn is_special(self) -> bool {
        use Token::*;
        matches!(self, Eof | Illegal | Whitespace | Newline | Comment)
    }

    pub fn is_literal(self) -> bool {
        use Token::*;
        matches!(self, Identifier | Register | Integer)
    }

    pub fn is_operator(self) -> bool {
        use Token::*;
        matches!(self, Plus | Minus)
    }

    pub fn is_punctuation(self) -> bool {
        use Token::*;
        matches!(self, LeftBracket | RightBracket | Comma | Colon)
    }

    pub fn is_keyword(self) -> bool {
        use Token::*;
        matches!(
            self,
            Load | Store
                | Add | AddCc | Sub | SubCc
                | And | AndCc | Or | OrCc
                | Orn | OrnCc | Xor | XorCc
                | ShiftLeft | ShiftRight
                | BranchEqual | BranchNotEqual
                | BranchNegative | BranchPositive | BranchAlways
                | Call | JumpLink
        )
    }

    pub fn is_directive(self) -> bool {
        use Token::*;
        matches!(self, Begin | End | Org)
    }

    /// Resolves a word to its keyword token. Lookup is
    /// case-insensitive; `None` means the word is a plain identifier.
    pub fn lookup(word: &str) -> Option<Token> {
        use Token::*;
        match word.to_ascii_lowercase().as_str() {
            "ld" => Some(Load),
            "st" => Some(Store),
            "add" => Some(Add),
            "addcc" => Some(AddCc),
            "sub" => Some(Sub),
            "subcc" => Some(SubCc),
            "and" => Some(And),
            "andcc" => Some(AndCc),
            "or" => Some(Or),
            "orcc" => Some(OrCc),
            "orn" => Some(Orn),
            "orncc" => Some(OrnCc),
            "xor" => Some(Xor),
            "xorcc" => Some(XorCc),
            "sll" => Some(ShiftLeft),
            "sra" => Some(ShiftRight),
            "be" => Some(BranchEqual),
            "bne" => Some(BranchNotEqual),
            "bneg" => Some(BranchNegative),
            "bpos" => Some(BranchPositive),
            "ba" => Some(BranchAlways),
            "call" => Some(Call),
            "jmpl" => Some(JumpLink),
            _ => None,
        }
    }

    /// Resolves a dotted word to its directive token,
    /// case-insensitively.
    pub fn lookup_directive(word: &str) -> Option<Token> {
        use Token::*;
        match word.to_ascii_lowercase().as_str() {
            ".begin" => Some(Begin),
            ".end" => Some(End),
            ".org" => Some(Org),
            _ => None,
        }
    }

    /// Returns true if `word` names one of the 32 general-purpose
    /// registers, `%r0` through `%r31`. Case-insensitive.
    pub fn is_register_name(word: &str) -> bool {
        let lower = word.to_ascii_lowercase();
        let digits = match lower.strip_prefix("%r") {
            Some(d) => d,
            None => return false,
        };
        if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
            return false;
        }
        match digits.parse::<u8>() {
            Ok(n) => n < 32,
            Err(_) => false,
        }
    }

    /// The canonical spelling of the token: the lowercase mnemonic
    /// for keywords and directives, the character itself for
    /// operators and punctuation, and the class name in capitals for
    /// special and literal tokens.
    pub fn text(self) -> &'static str {
        use Token::*;
        match self {
            Eof => "EOF",
            Illegal => "ILLEGAL",
            Whitespace => "WHITESPACE",
            Newline => "NEWLINE",
            Comment => "COMMENT",
            Identifier => "IDENTIFIER",
            Register => "REGISTER",
            Integer => "INTEGER",
            Plus => "+",
            Minus => "-",
            LeftBracket => "[",
            RightBracket => "]",
            Comma => ",",
            Colon => ":",
            Load => "ld",
            Store => "st",
            Add => "add",
            AddCc => "addcc",
            Sub => "sub",
            SubCc => "subcc",
            And => "and",
            AndCc => "andcc",
            Or => "or",
            OrCc => "orcc",
            Orn => "orn",
            OrnCc => "orncc",
            Xor => "xor",
            XorCc => "xorcc",
            ShiftLeft => "sll",
            ShiftRight => "sra",
            BranchEqual => "be",
            BranchNotEqual => "bne",
            BranchNegative => "bneg",
            BranchPositive => "bpos",
            BranchAlways => "ba",
            Call => "call",
            JumpLink => "jmpl",
            Begin => ".begin",
            End => ".end",
            Org => ".org",
        }
    }

    /// Renders a token found in the input, with class-aware
    /// formatting: special tokens render bare, literals render as
    /// their class plus the quoted text, illegal tokens render the
    /// offending text quoted, and everything else renders its
    /// spelling quoted.
    pub fn describe(self, literal: &str) -> String {
        use Token::*;
        match self {
            Illegal => format!("\"{}\"", literal),
            Eof | Whitespace | Newline | Comment => self.text().to_owned(),
            Identifier | Register | Integer => format!("{} \"{}\"", self.text(), literal),
            _ if literal.is_empty() => format!("\"{}\"", self.text()),
            _ => format!("\"{}\"", literal),
        }
    }

    /// Renders a token named in an expected-set: special and literal
    /// tokens render as bare class names, everything else as its
    /// quoted spelling.
    pub fn describe_expected(self) -> String {
        if self.is_special() || self.is_literal() {
            self.text().to_owned()
        } else {
            format!("\"{}\"", self.text())
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// A location in the source text. `line == 0` marks a position that
/// was never set; it renders as a sentinel and sorts before every
/// real position.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Position {
    pub filename: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position {
            filename: None,
            line,
            column,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
            .then_with(|| self.filename.cmp(&other.filename))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "INVALID POSITION");
        }
        match &self.filename {
            Some(name) => write!(f, "{}:{}:{}", name, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Token::lookup("ld"), Some(Token::Load));
        assert_eq!(Token::lookup("LD"), Some(Token::Load));
        assert_eq!(Token::lookup("Ld"), Some(Token::Load));
        assert_eq!(Token::lookup("addcc"), Some(Token::AddCc));
        assert_eq!(Token::lookup("AddCC"), Some(Token::AddCc));
        assert_eq!(Token::lookup("jmpl"), Some(Token::JumpLink));
        assert_eq!(Token::lookup("sra"), Some(Token::ShiftRight));

        assert_eq!(Token::lookup("loop"), None);
        assert_eq!(Token::lookup("addc"), None);
        assert_eq!(Token::lookup(""), None);
    }

    #[test]
    fn test_lookup_directive() {
        assert_eq!(Token::lookup_directive(".begin"), Some(Token::Begin));
        assert_eq!(Token::lookup_directive(".BEGIN"), Some(Token::Begin));
        assert_eq!(Token::lookup_directive(".end"), Some(Token::End));
        assert_eq!(Token::lookup_directive(".org"), Some(Token::Org));
        assert_eq!(Token::lookup_directive(".data"), None);
        assert_eq!(Token::lookup_directive("begin"), None);
    }

    #[test]
    fn test_register_names() {
        for i in 0..32 {
            assert!(Token::is_register_name(&format!("%r{}", i)));
            assert!(Token::is_register_name(&format!("%R{}", i)));
        }
        assert!(!Token::is_register_name("%r32"));
        assert!(!Token::is_register_name("%r00"));
        assert!(!Token::is_register_name("%r"));
        assert!(!Token::is_register_name("r1"));
        assert!(!Token::is_register_name("%x1"));
        assert!(!Token::is_register_name("%r1a"));
    }

    #[test]
    fn test_classification_predicates() {
        assert!(Token::Eof.is_special());
        assert!(Token::Comment.is_special());
        assert!(Token::Identifier.is_literal());
        assert!(Token::Integer.is_literal());
        assert!(Token::Plus.is_operator());
        assert!(Token::Comma.is_punctuation());
        assert!(Token::Load.is_keyword());
        assert!(Token::JumpLink.is_keyword());
        assert!(Token::Org.is_directive());

        assert!(!Token::Load.is_special());
        assert!(!Token::Begin.is_keyword());
        assert!(!Token::Identifier.is_keyword());
        assert!(!Token::Eof.is_literal());
    }

    #[test]
    fn test_describe() {
        assert_eq!(Token::Eof.describe(""), "EOF");
        assert_eq!(Token::Newline.describe("\n"), "NEWLINE");
        assert_eq!(Token::Identifier.describe("x"), "IDENTIFIER \"x\"");
        assert_eq!(Token::Integer.describe("0x10"), "INTEGER \"0x10\"");
        assert_eq!(Token::Illegal.describe("$"), "\"$\"");
        assert_eq!(Token::Load.describe("LD"), "\"LD\"");
        assert_eq!(Token::Comma.describe(","), "\",\"");

        assert_eq!(Token::Comma.describe_expected(), "\",\"");
        assert_eq!(Token::Integer.describe_expected(), "INTEGER");
        assert_eq!(Token::Newline.describe_expected(), "NEWLINE");
        assert_eq!(Token::Load.describe_expected(), "\"ld\"");
    }

    #[test]
    fn test_position_ordering() {
        let a = Position::new(1, 4);
        let b = Position::new(1, 9);
        let c = Position::new(3, 1);
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
        assert_eq!(a.cmp(&a), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(3, 7).to_string(), "3:7");
        assert_eq!(Position::default().to_string(), "INVALID POSITION");

        let mut pos = Position::new(2, 1);
        pos.filename = Some("prog.asm".to_owned());
        assert_eq!(pos.to_string(), "prog.asm:2:1");
    }
}
