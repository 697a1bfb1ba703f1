//! The lexer tokenizes ARC source text.
//!
//! It is a pull-based scanner: each call to [`Lexer::scan`] consumes
//! just enough characters to produce one `(token, literal, position)`
//! triple. Once the input is exhausted `scan` returns [`Token::Eof`]
//! forever. The literal text of every token is kept verbatim so a
//! re-serialized program preserves the original integer spelling.

use super::token::{Position, Token};

pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: u32,
    column: u32,
    filename: Option<String>,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Lexer {
            chars: src.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
            filename: None,
        }
    }

    pub fn with_filename(src: &str, filename: &str) -> Self {
        let mut lexer = Lexer::new(src);
        lexer.filename = Some(filename.to_owned());
        lexer
    }

    /// Replaces the input with new source text, restarting position
    /// tracking at 1:1. Used by the parser's incremental feed mode.
    pub fn feed(&mut self, src: &str) {
        self.chars = src.chars().collect();
        self.index = 0;
        self.line = 1;
        self.column = 1;
    }

    fn pos(&self) -> Position {
        Position {
            filename: self.filename.clone(),
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// Consumes one character, keeping the line and column counters
    /// current. A `\r\n` pair advances the line once, on the `\n`.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                if self.peek() != Some('\n') {
                    self.line += 1;
                    self.column = 1;
                }
            }
            _ => self.column += 1,
        }
        Some(c)
    }

    /// Scans the next token. Never panics on exhaustion: at end of
    /// input it returns `Eof` with an empty literal, every time.
    pub fn scan(&mut self) -> (Token, String, Position) {
        let pos = self.pos();
        let c = match self.peek() {
            Some(c) => c,
            None => return (Token::Eof, String::new(), pos),
        };

        match c {
            ' ' | '\t' => {
                let lit = self.scan_while(|c| c == ' ' || c == '\t');
                (Token::Whitespace, lit, pos)
            }
            '\n' | '\r' => {
                let lit = self.scan_while(|c| c == '\n' || c == '\r');
                (Token::Newline, lit, pos)
            }
            '!' => {
                let lit = self.scan_while(|c| c != '\n' && c != '\r');
                (Token::Comment, lit, pos)
            }
            '.' => {
                let mut lit = String::new();
                lit.push(self.advance().unwrap());
                lit.push_str(&self.scan_while(|c| c.is_ascii_alphabetic()));
                match Token::lookup_directive(&lit) {
                    Some(tok) => (tok, lit, pos),
                    None => (Token::Illegal, lit, pos),
                }
            }
            '%' => {
                let mut lit = String::new();
                lit.push(self.advance().unwrap());
                lit.push_str(&self.scan_while(|c| c.is_ascii_alphanumeric()));
                if Token::is_register_name(&lit) {
                    (Token::Register, lit, pos)
                } else {
                    (Token::Illegal, lit, pos)
                }
            }
            c if c.is_ascii_alphabetic() => {
                let lit = self.scan_while(|c| c.is_ascii_alphanumeric());
                match Token::lookup(&lit) {
                    Some(tok) => (tok, lit, pos),
                    None => (Token::Identifier, lit, pos),
                }
            }
            c if c.is_ascii_digit() => (Token::Integer, self.scan_integer(), pos),
            '+' => self.scan_single(Token::Plus, pos),
            '-' => self.scan_single(Token::Minus, pos),
            '[' => self.scan_single(Token::LeftBracket, pos),
            ']' => self.scan_single(Token::RightBracket, pos),
            ',' => self.scan_single(Token::Comma, pos),
            ':' => self.scan_single(Token::Colon, pos),
            other => {
                self.advance();
                (Token::Illegal, other.to_string(), pos)
            }
        }
    }

    fn scan_single(&mut self, tok: Token, pos: Position) -> (Token, String, Position) {
        let c = self.advance().unwrap();
        (tok, c.to_string(), pos)
    }

    fn scan_while<F: Fn(char) -> bool>(&mut self, keep: F) -> String {
        let mut lit = String::new();
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            lit.push(c);
            self.advance();
        }
        lit
    }

    /// Scans a decimal, octal (leading `0`), or hex (`0x`/`0X`)
    /// literal. The text is returned verbatim; conversion to a value
    /// and range checking happen in the parser.
    fn scan_integer(&mut self) -> String {
        let mut lit = self.scan_while(|c| c.is_ascii_digit());
        if lit == "0" && matches!(self.peek(), Some('x') | Some('X')) {
            lit.push(self.advance().unwrap());
            lit.push_str(&self.scan_while(|c| c.is_ascii_hexdigit()));
        }
        lit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(src: &str) -> Vec<(Token, String, u32, u32)> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let (tok, lit, pos) = lexer.scan();
            let done = tok == Token::Eof;
            out.push((tok, lit, pos.line, pos.column));
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_scan_instruction_line() {
        let toks = scan_all("ld [x+4], %r1");
        assert_eq!(
            toks,
            vec![
                (Token::Load, "ld".to_owned(), 1, 1),
                (Token::Whitespace, " ".to_owned(), 1, 3),
                (Token::LeftBracket, "[".to_owned(), 1, 4),
                (Token::Identifier, "x".to_owned(), 1, 5),
                (Token::Plus, "+".to_owned(), 1, 6),
                (Token::Integer, "4".to_owned(), 1, 7),
                (Token::RightBracket, "]".to_owned(), 1, 8),
                (Token::Comma, ",".to_owned(), 1, 9),
                (Token::Whitespace, " ".to_owned(), 1, 10),
                (Token::Register, "%r1".to_owned(), 1, 11),
                (Token::Eof, String::new(), 1, 14),
            ]
        );
    }

    #[test]
    fn test_scan_keywords_case_insensitive() {
        let toks = scan_all("ADDcc CALL .BEGIN %R15");
        assert_eq!(toks[0].0, Token::AddCc);
        assert_eq!(toks[0].1, "ADDcc");
        assert_eq!(toks[2].0, Token::Call);
        assert_eq!(toks[4].0, Token::Begin);
        assert_eq!(toks[4].1, ".BEGIN");
        assert_eq!(toks[6].0, Token::Register);
        assert_eq!(toks[6].1, "%R15");
    }

    #[test]
    fn test_scan_comment_runs_to_end_of_line() {
        let toks = scan_all("! a comment, with [tokens]\nadd");
        assert_eq!(toks[0].0, Token::Comment);
        assert_eq!(toks[0].1, "! a comment, with [tokens]");
        assert_eq!(toks[1].0, Token::Newline);
        assert_eq!(toks[2], (Token::Add, "add".to_owned(), 2, 1));
    }

    #[test]
    fn test_scan_newlines_coalesce_and_count() {
        let toks = scan_all("a\n\nb\r\nc\rd");
        assert_eq!(toks[0], (Token::Identifier, "a".to_owned(), 1, 1));
        assert_eq!(toks[1], (Token::Newline, "\n\n".to_owned(), 1, 2));
        assert_eq!(toks[2], (Token::Identifier, "b".to_owned(), 3, 1));
        assert_eq!(toks[3], (Token::Newline, "\r\n".to_owned(), 3, 2));
        assert_eq!(toks[4], (Token::Identifier, "c".to_owned(), 4, 1));
        assert_eq!(toks[5], (Token::Newline, "\r".to_owned(), 4, 2));
        assert_eq!(toks[6], (Token::Identifier, "d".to_owned(), 5, 1));
    }

    #[test]
    fn test_scan_integer_radices_verbatim() {
        let toks = scan_all("25 071 0x1F 0X1f 0");
        let lits: Vec<&str> = toks
            .iter()
            .filter(|(tok, ..)| *tok == Token::Integer)
            .map(|(_, lit, ..)| lit.as_str())
            .collect();
        assert_eq!(lits, vec!["25", "071", "0x1F", "0X1f", "0"]);
    }

    #[test]
    fn test_scan_illegal() {
        let toks = scan_all("$ %r99 .data");
        assert_eq!(toks[0], (Token::Illegal, "$".to_owned(), 1, 1));
        assert_eq!(toks[2], (Token::Illegal, "%r99".to_owned(), 1, 3));
        assert_eq!(toks[4], (Token::Illegal, ".data".to_owned(), 1, 8));
    }

    #[test]
    fn test_scan_eof_forever() {
        let mut lexer = Lexer::new("");
        for _ in 0..3 {
            let (tok, lit, pos) = lexer.scan();
            assert_eq!(tok, Token::Eof);
            assert!(lit.is_empty());
            assert_eq!((pos.line, pos.column), (1, 1));
        }
    }

    #[test]
    fn test_feed_resets_position() {
        let mut lexer = Lexer::new("a\nb");
        while lexer.scan().0 != Token::Eof {}
        lexer.feed("c");
        let (tok, lit, pos) = lexer.scan();
        assert_eq!((tok, lit.as_str()), (Token::Identifier, "c"));
        assert_eq!((pos.line, pos.column), (1, 1));
    }

    #[test]
    fn test_filename_carried_in_positions() {
        let mut lexer = Lexer::with_filename("add", "prog.asm");
        let (_, _, pos) = lexer.scan();
        assert_eq!(pos.to_string(), "prog.asm:1:1");
    }
}
