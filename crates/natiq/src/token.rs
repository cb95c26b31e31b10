//! The lexer: turns a UTF-8 source string into a vector of [`Token`]s.

use crate::error::LexError;
use std::fmt;

/// A 1-based line/column location in the input script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    pub const START: Self = Self { line: 1, column: 1 };

    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
    #[must_use]
    pub const fn line(self) -> Option<u32> {
        if self.line == 0 {
            None
        } else {
            Some(self.line)
        }
    }
    #[must_use]
    pub const fn column(self) -> Option<u32> {
        if self.column == 0 {
            None
        } else {
            Some(self.column)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The closed set of token kinds the lexer ever emits.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Text(String),
    Identifier(String),

    // Used keywords
    Print,
    PrintLine,
    Var,
    Const,
    If,
    Else,
    While,
    For,
    In,
    Function,
    Return,
    Break,
    Continue,
    True,
    False,
    Or,
    And,
    Not,
    Null,

    // Reserved-but-unused keywords (lexed, parser-rejected as identifiers)
    KwString,
    KwNumber,
    KwBoolean,
    KwObject,
    KwList,
    Try,
    Catch,
    Finally,
    Import,
    Class,
    New,
    This,
    Extends,
    Interface,
    Website,
    Page,
    Route,
    Request,
    Response,
    Body,
    Header,
    Database,
    Table,
    Record,
    Save,
    Delete,
    Update,
    Fetch,

    // Operators
    EqEq,
    NotEq,
    GreaterEq,
    LessEq,
    AndAnd,
    OrOr,
    FatArrow,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    StarStar,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Greater,
    Less,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,

    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "integer {n}"),
            Self::Float(n) => write!(f, "float {n}"),
            Self::Text(s) => write!(f, "text {s:?}"),
            Self::Identifier(name) => write!(f, "identifier {name:?}"),
            Self::Eof => write!(f, "end of input"),
            Self::Newline => write!(f, "newline"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

/// Reserved-word table: lexeme -> kind. Arabic keywords for vocabulary the
/// evaluator actually implements, plus reserved-but-unused keywords named
/// in SPEC_FULL §6 that the parser accepts as keywords but never builds
/// grammar productions for.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("اطبع", TokenKind::Print),
    ("اطبع_سطر", TokenKind::PrintLine),
    ("متغير", TokenKind::Var),
    ("ثابت", TokenKind::Const),
    ("إذا", TokenKind::If),
    ("وإلا", TokenKind::Else),
    ("طالما", TokenKind::While),
    ("لكل", TokenKind::For),
    ("في", TokenKind::In),
    ("دالة", TokenKind::Function),
    ("ارجع", TokenKind::Return),
    ("توقف", TokenKind::Break),
    ("استمر", TokenKind::Continue),
    ("صحيح", TokenKind::True),
    ("خطأ", TokenKind::False),
    ("او", TokenKind::Or),
    ("و", TokenKind::And),
    ("ليس", TokenKind::Not),
    ("عدم", TokenKind::Null),
    ("نص", TokenKind::KwString),
    ("رقم", TokenKind::KwNumber),
    ("منطقي", TokenKind::KwBoolean),
    ("كائن", TokenKind::KwObject),
    ("قائمة", TokenKind::KwList),
    ("حاول", TokenKind::Try),
    ("امسك", TokenKind::Catch),
    ("اخيرا", TokenKind::Finally),
    ("استورد", TokenKind::Import),
    ("صنف", TokenKind::Class),
    ("جديد", TokenKind::New),
    ("هذا", TokenKind::This),
    ("يمتد", TokenKind::Extends),
    ("واجهة", TokenKind::Interface),
    ("موقع", TokenKind::Website),
    ("صفحة", TokenKind::Page),
    ("مسار", TokenKind::Route),
    ("طلب", TokenKind::Request),
    ("استجابة", TokenKind::Response),
    ("محتوى", TokenKind::Body),
    ("راس", TokenKind::Header),
    ("قاعدة_بيانات", TokenKind::Database),
    ("جدول", TokenKind::Table),
    ("سجل", TokenKind::Record),
    ("احفظ", TokenKind::Save),
    ("احذف", TokenKind::Delete),
    ("حدث", TokenKind::Update),
    ("اجلب", TokenKind::Fetch),
];

fn lookup_keyword(word: &str) -> Option<TokenKind> {
    KEYWORDS.iter().find(|(lexeme, _)| *lexeme == word).map(|(_, kind)| kind.clone())
}

/// `true` for every reserved word - used or reserved-but-unused - so the
/// parser can reject `متغير اذا = 1` style shadowing of the grammar itself.
#[must_use]
pub fn is_reserved(word: &str) -> bool {
    KEYWORDS.iter().any(|(lexeme, _)| *lexeme == word)
}

/// Reverse lookup: the Arabic lexeme for a keyword token kind, used to
/// build a readable `ParseError::ReservedKeyword` message. `None` for any
/// kind that isn't a fixed keyword (literals, operators, punctuation).
#[must_use]
pub fn keyword_lexeme(kind: &TokenKind) -> Option<&'static str> {
    KEYWORDS.iter().find(|(_, k)| k == kind).map(|(lexeme, _)| *lexeme)
}

/// Driver loop: classify one character at a time, tracking line/column,
/// and push tokens until EOF. Grounded on the single-pass `TokenIterator`
/// design of the teacher's `token.rs`, simplified to a batch `Vec<Token>`
/// since scripts here are read whole into memory up front (SPEC_FULL §4.A).
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self { chars: source.chars().peekable(), line: 1, column: 1 }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn skip_inline_whitespace_and_comments(&mut self) -> Result<(), (LexError, Position)> {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let start = self.position();
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(ch) = self.peek() {
                        if ch == '*' && self.peek_second() == Some('/') {
                            self.bump();
                            self.bump();
                            closed = true;
                            break;
                        }
                        self.bump();
                    }
                    if !closed {
                        return Err((LexError::UnterminatedBlockComment, start));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<String, (LexError, Position)> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err((LexError::UnterminatedString, start)),
                Some(ch) if ch == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err((LexError::UnterminatedString, start)),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some(c) if c == quote => out.push(quote),
                    Some(other) => out.push(other),
                },
                Some(ch) => out.push(ch),
            }
        }
    }

    fn read_number(&mut self, first: char) -> TokenKind {
        let mut text = String::new();
        text.push(first);
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            text.push(self.bump().unwrap());
        }
        if self.peek() == Some('.') {
            if let Some(next) = self.peek_second() {
                if next.is_ascii_digit() {
                    text.push(self.bump().unwrap()); // '.'
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                        text.push(self.bump().unwrap());
                    }
                    return TokenKind::Float(text.parse().unwrap_or(0.0));
                }
            }
        }
        TokenKind::Int(text.parse().unwrap_or(0))
    }

    fn read_identifier(&mut self, first: char) -> String {
        let mut text = String::new();
        text.push(first);
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            text.push(self.bump().unwrap());
        }
        text
    }

    /// Lex the entire input, producing a token vector terminated by `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, (LexError, Position)> {
        let mut tokens = Vec::new();
        loop {
            self.skip_inline_whitespace_and_comments()?;

            let position = self.position();
            let Some(ch) = self.bump() else {
                tokens.push(Token { kind: TokenKind::Eof, position });
                break;
            };

            let kind = match ch {
                '\n' => TokenKind::Newline,
                '"' | '\'' => TokenKind::Text(self.read_string(ch, position)?),
                c if c.is_ascii_digit() => self.read_number(c),
                c if c.is_alphabetic() || c == '_' => {
                    let word = self.read_identifier(c);
                    lookup_keyword(&word).unwrap_or(TokenKind::Identifier(word))
                }
                '=' if self.peek() == Some('=') => {
                    self.bump();
                    TokenKind::EqEq
                }
                '!' if self.peek() == Some('=') => {
                    self.bump();
                    TokenKind::NotEq
                }
                '>' if self.peek() == Some('=') => {
                    self.bump();
                    TokenKind::GreaterEq
                }
                '<' if self.peek() == Some('=') => {
                    self.bump();
                    TokenKind::LessEq
                }
                '&' if self.peek() == Some('&') => {
                    self.bump();
                    TokenKind::AndAnd
                }
                '|' if self.peek() == Some('|') => {
                    self.bump();
                    TokenKind::OrOr
                }
                '=' if self.peek() == Some('>') => {
                    self.bump();
                    TokenKind::FatArrow
                }
                '+' if self.peek() == Some('=') => {
                    self.bump();
                    TokenKind::PlusEq
                }
                '-' if self.peek() == Some('=') => {
                    self.bump();
                    TokenKind::MinusEq
                }
                '*' if self.peek() == Some('=') => {
                    self.bump();
                    TokenKind::StarEq
                }
                '/' if self.peek() == Some('=') => {
                    self.bump();
                    TokenKind::SlashEq
                }
                '*' if self.peek() == Some('*') => {
                    self.bump();
                    TokenKind::StarStar
                }
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '%' => TokenKind::Percent,
                '=' => TokenKind::Assign,
                '>' => TokenKind::Greater,
                '<' => TokenKind::Less,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                ',' => TokenKind::Comma,
                ':' => TokenKind::Colon,
                ';' => TokenKind::Semicolon,
                '.' => TokenKind::Dot,
                other => return Err((LexError::UnknownSymbol(other), position)),
            };

            tokens.push(Token { kind, position });
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_var_decl() {
        let k = kinds("متغير س = 10");
        assert_eq!(
            k,
            vec![
                TokenKind::Var,
                TokenKind::Identifier("س".into()),
                TokenKind::Assign,
                TokenKind::Int(10),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_before_one_char() {
        let k = kinds("== != >= <= && || => += -= *= /= **");
        assert_eq!(
            k,
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::GreaterEq,
                TokenKind::LessEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::FatArrow,
                TokenKind::PlusEq,
                TokenKind::MinusEq,
                TokenKind::StarEq,
                TokenKind::SlashEq,
                TokenKind::StarStar,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let k = kinds(r#""a\nb\t\"c\\""#);
        assert_eq!(k, vec![TokenKind::Text("a\nb\t\"c\\".into()), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        assert_eq!(err.0, LexError::UnterminatedString);
    }

    #[test]
    fn unterminated_block_comment_errors() {
        let err = Lexer::new("/* never closed").tokenize().unwrap_err();
        assert_eq!(err.0, LexError::UnterminatedBlockComment);
    }

    #[test]
    fn line_comment_runs_to_newline() {
        let k = kinds("1 // ignored\n2");
        assert_eq!(
            k,
            vec![TokenKind::Int(1), TokenKind::Newline, TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn unknown_symbol_reports_position() {
        let err = Lexer::new("1 @ 2").tokenize().unwrap_err();
        assert_eq!(err.0, LexError::UnknownSymbol('@'));
        assert_eq!(err.1.line(), Some(1));
    }

    #[test]
    fn integer_vs_float() {
        let k = kinds("10 10. 10.5 .5");
        assert_eq!(
            k,
            vec![
                TokenKind::Int(10),
                TokenKind::Int(10),
                TokenKind::Dot,
                TokenKind::Float(10.5),
                TokenKind::Dot,
                TokenKind::Int(5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn reserved_words_are_reserved() {
        assert!(is_reserved("موقع"));
        assert!(is_reserved("قاعدة_بيانات"));
        assert!(!is_reserved("س"));
    }
}
