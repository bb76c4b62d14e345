//! Token types produced by the lexer.
//!
//! Tokens are immutable once produced. The position of a token inside the
//! lexed sequence (0-based) is its identity; every other component refers to
//! tokens by position, never by pointer.

/// Token kinds recognized by the engine.
///
/// The vocabulary is deliberately small: enough to classify scopes and drive
/// the bundled rules. Anything else lexes as [`TokenKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or any keyword outside the recognized set.
    Identifier,
    /// Variable (`$name`).
    Variable,
    /// `class` keyword.
    Class,
    /// `interface` keyword.
    Interface,
    /// `trait` keyword.
    Trait,
    /// `function` keyword.
    Function,
    /// `namespace` keyword.
    Namespace,
    /// `self` keyword (any letter case; the text is preserved verbatim).
    SelfKw,
    /// `do` keyword.
    Do,
    /// `else` keyword.
    Else,
    /// `elseif` keyword.
    ElseIf,
    /// `for` keyword.
    For,
    /// `foreach` keyword.
    Foreach,
    /// `if` keyword.
    If,
    /// `switch` keyword.
    Switch,
    /// `while` keyword.
    While,
    /// Double colon `::`.
    DoubleColon,
    /// Namespace separator `\`.
    NsSeparator,
    /// Statement terminator `;`.
    Semicolon,
    /// Opening brace `{`.
    OpenBrace,
    /// Closing brace `}`.
    CloseBrace,
    /// Opening parenthesis `(`.
    OpenParen,
    /// Closing parenthesis `)`.
    CloseParen,
    /// Run of whitespace (spaces, tabs, newlines).
    Whitespace,
    /// Line comment (`// …`, `# …`) or block comment (`/* … */`).
    Comment,
    /// Single- or double-quoted string literal.
    StringLiteral,
    /// Anonymous function scope kind. Never produced by the lexer; the scope
    /// tracker attributes it to `function` keywords that open an anonymous
    /// function body.
    Closure,
    /// Catch-all for unrecognized text runs.
    Other,
}

impl TokenKind {
    /// Whitespace and comments carry no program content.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// Kinds that classify the scope opened by a following `{`.
    pub(crate) fn is_scope_classifier(self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Interface
                | TokenKind::Trait
                | TokenKind::Function
                | TokenKind::Namespace
                | TokenKind::Do
                | TokenKind::Else
                | TokenKind::ElseIf
                | TokenKind::For
                | TokenKind::Foreach
                | TokenKind::If
                | TokenKind::Switch
                | TokenKind::While
        )
    }
}

/// A single token with its kind, verbatim text, and source position.
///
/// `start`/`end` are byte offsets into the source (`end` exclusive). `line`
/// and `column` are 1-based; the column counts bytes within the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// Whitespace and comments carry no program content.
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }
}
