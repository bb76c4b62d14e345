//! Total lexer: any byte sequence that is valid UTF-8 tokenizes without
//! error, and concatenating the token texts reproduces the input exactly.
//!
//! Unrecognized constructs become [`TokenKind::Other`] runs instead of
//! failing. Comments and string literals are lexed as single tokens so that
//! braces inside them cannot disturb the scope model downstream.

use crate::token::{Token, TokenKind};

/// Tokenize source text into an ordered token sequence.
///
/// Never fails: every byte of the input lands in exactly one token, in order,
/// so positions are dense and the original text is recoverable.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a str,
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            src: source,
            input: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while self.pos < self.input.len() {
            let start = self.pos;
            let line = self.line;
            let column = self.col;

            let kind = self.next_kind();
            debug_assert!(self.pos > start, "lexer must always make progress");

            tokens.push(Token {
                kind,
                text: self.src[start..self.pos].to_string(),
                start,
                end: self.pos,
                line,
                column,
            });
        }

        tokens
    }

    /// Consume exactly one token's worth of bytes and classify it.
    fn next_kind(&mut self) -> TokenKind {
        match self.input[self.pos] {
            b'{' => {
                self.advance();
                TokenKind::OpenBrace
            }
            b'}' => {
                self.advance();
                TokenKind::CloseBrace
            }
            b'(' => {
                self.advance();
                TokenKind::OpenParen
            }
            b')' => {
                self.advance();
                TokenKind::CloseParen
            }
            b';' => {
                self.advance();
                TokenKind::Semicolon
            }
            b'\\' => {
                self.advance();
                TokenKind::NsSeparator
            }
            b':' if self.peek_at(1) == Some(b':') => {
                self.advance();
                self.advance();
                TokenKind::DoubleColon
            }
            b'$' if self.peek_at(1).is_some_and(is_ident_start) => {
                self.advance();
                self.read_ident_run();
                TokenKind::Variable
            }
            b'\'' => self.read_string(b'\''),
            b'"' => self.read_string(b'"'),
            b'/' if self.peek_at(1) == Some(b'/') => self.read_line_comment(),
            b'#' => self.read_line_comment(),
            b'/' if self.peek_at(1) == Some(b'*') => self.read_block_comment(),
            b if is_whitespace(b) => {
                while self.peek().is_some_and(is_whitespace) {
                    self.advance();
                }
                TokenKind::Whitespace
            }
            b if is_ident_start(b) => {
                let start = self.pos;
                self.read_ident_run();
                classify_word(&self.src[start..self.pos])
            }
            _ => self.read_other_run(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn read_ident_run(&mut self) {
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
    }

    /// Quoted string. A backslash escapes the next byte; EOF terminates the
    /// token instead of failing.
    fn read_string(&mut self, quote: u8) -> TokenKind {
        self.advance();
        loop {
            match self.peek() {
                None => break,
                Some(b'\\') => {
                    self.advance();
                    self.advance();
                }
                Some(b) => {
                    self.advance();
                    if b == quote {
                        break;
                    }
                }
            }
        }
        TokenKind::StringLiteral
    }

    /// `// …` or `# …` up to (not including) the newline.
    fn read_line_comment(&mut self) -> TokenKind {
        while self.peek().is_some_and(|b| b != b'\n') {
            self.advance();
        }
        TokenKind::Comment
    }

    /// `/* … */`; EOF terminates an unclosed comment.
    fn read_block_comment(&mut self) -> TokenKind {
        self.advance();
        self.advance();
        while self.pos < self.input.len() {
            if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                self.advance();
                self.advance();
                return TokenKind::Comment;
            }
            self.advance();
        }
        TokenKind::Comment
    }

    /// Run of bytes that cannot start any recognized token.
    fn read_other_run(&mut self) -> TokenKind {
        self.advance();
        while self.pos < self.input.len() && !self.at_token_start() {
            self.advance();
        }
        TokenKind::Other
    }

    /// True when the current byte starts a recognized (non-Other) token.
    fn at_token_start(&self) -> bool {
        match self.input[self.pos] {
            b'{' | b'}' | b'(' | b')' | b';' | b'\\' | b'\'' | b'"' | b'#' => true,
            b':' => self.peek_at(1) == Some(b':'),
            b'$' => self.peek_at(1).is_some_and(is_ident_start),
            b'/' => matches!(self.peek_at(1), Some(b'/') | Some(b'*')),
            b => is_whitespace(b) || is_ident_start(b),
        }
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic() || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// Keywords are matched case-insensitively; the token text stays verbatim.
fn classify_word(word: &str) -> TokenKind {
    match word.to_ascii_lowercase().as_str() {
        "class" => TokenKind::Class,
        "interface" => TokenKind::Interface,
        "trait" => TokenKind::Trait,
        "function" => TokenKind::Function,
        "namespace" => TokenKind::Namespace,
        "self" => TokenKind::SelfKw,
        "do" => TokenKind::Do,
        "else" => TokenKind::Else,
        "elseif" => TokenKind::ElseIf,
        "for" => TokenKind::For,
        "foreach" => TokenKind::Foreach,
        "if" => TokenKind::If,
        "switch" => TokenKind::Switch,
        "while" => TokenKind::While,
        _ => TokenKind::Identifier,
    }
}
