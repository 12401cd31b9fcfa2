use std::iter::Peekable;
use std::str::Chars;

use crate::span::{FileId, Pos, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    /// Numeric literal, kept as written.
    Num(String),
    Heredoc {
        strip_indent: bool,
        lines: Vec<String>,
    },
    DocComment(String),

    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Colon,    // :
    Eq,       // =
    Question, // ?
    At,       // @
    Dollar,   // $
    Dot,      // .
    Newline,

    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier \"{s}\""),
            Token::Str(_) => "string literal".into(),
            Token::Num(n) => format!("number {n}"),
            Token::Heredoc { .. } => "heredoc".into(),
            Token::DocComment(_) => "doc comment".into(),
            Token::LBrace => "'{'".into(),
            Token::RBrace => "'}'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::Comma => "','".into(),
            Token::Colon => "':'".into(),
            Token::Eq => "'='".into(),
            Token::Question => "'?'".into(),
            Token::At => "'@'".into(),
            Token::Dollar => "'$'".into(),
            Token::Dot => "'.'".into(),
            Token::Newline => "new line".into(),
            Token::Eof => "end of file".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character: {0:?}")]
    UnexpectedChar(char),
    #[error("Unterminated string")]
    UnterminatedString,
    #[error("Heredoc is missing its closing marker {0:?}")]
    UnterminatedHeredoc(String),
    #[error("Heredoc marker must be an identifier")]
    InvalidHeredocMarker,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    file: FileId,
    pos: Pos,
    errors: Vec<(LexError, Span)>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, file: FileId) -> Self {
        Self {
            chars: input.chars().peekable(),
            file,
            pos: Pos::default(),
            errors: Vec::new(),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos.byte += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn span_from(&self, start: Pos) -> Span {
        Span::new(self.file, start, self.pos)
    }

    fn error(&mut self, err: LexError, start: Pos) {
        let span = self.span_from(start);
        self.errors.push((err, span));
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some('\n') => break,
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => self.skip_line(),
                Some('/') if self.peek_second() == Some('/') => {
                    // `///` is a doc comment and becomes a token
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    ahead.next();
                    if ahead.next() == Some('/') {
                        break;
                    }
                    self.skip_line();
                }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '-'
    }

    fn read_ident(&mut self, mut s: String) -> String {
        while let Some(c) = self.peek() {
            if Self::is_ident_char(c) {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn read_string(&mut self, start: Pos) -> String {
        let mut s = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    return s;
                }
                Some('\\') => {
                    self.bump();
                    if let Some(c) = self.bump() {
                        match c {
                            'n' => s.push('\n'),
                            't' => s.push('\t'),
                            'r' => s.push('\r'),
                            _ => s.push(c),
                        }
                    }
                }
                Some('\n') | None => {
                    self.error(LexError::UnterminatedString, start);
                    return s;
                }
                Some(c) => {
                    s.push(c);
                    self.bump();
                }
            }
        }
    }

    fn read_digits(&mut self, s: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Reads a number. A digit run directly followed by letters is an identifier.
    fn read_number(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        self.read_digits(&mut s);

        let mut plain = true;
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            plain = false;
            s.push('.');
            self.bump();
            self.read_digits(&mut s);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = self.peek_second();
            let mut ahead = self.chars.clone();
            ahead.next();
            let exponent_follows = match sign {
                Some('+' | '-') => {
                    ahead.next();
                    ahead.next().is_some_and(|c| c.is_ascii_digit())
                }
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_follows {
                plain = false;
                s.push(self.bump().unwrap_or('e'));
                if matches!(self.peek(), Some('+' | '-')) {
                    s.push(self.bump().unwrap_or('+'));
                }
                self.read_digits(&mut s);
            }
        }

        if plain && first != '-' && self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            return Token::Ident(self.read_ident(s));
        }
        Token::Num(s)
    }

    fn read_heredoc(&mut self, start: Pos) -> Token {
        let strip_indent = if self.peek() == Some('-') {
            self.bump();
            true
        } else {
            false
        };

        let marker = match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {
                self.bump();
                self.read_ident(String::from(c))
            }
            _ => {
                self.error(LexError::InvalidHeredocMarker, start);
                return Token::Heredoc {
                    strip_indent,
                    lines: Vec::new(),
                };
            }
        };

        // rest of the opening line is ignored
        self.skip_line();
        self.bump();

        let mut lines = Vec::new();
        loop {
            if self.peek().is_none() {
                self.error(LexError::UnterminatedHeredoc(marker), start);
                break;
            }
            let mut line = String::new();
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                line.push(c);
                self.bump();
            }
            let line = line.trim_end_matches('\r').to_string();
            if line.trim() == marker {
                break;
            }
            lines.push(line);
            self.bump();
        }

        Token::Heredoc {
            strip_indent,
            lines,
        }
    }

    pub fn next_token(&mut self) -> Spanned {
        loop {
            self.skip_whitespace_and_comments();
            let start = self.pos;

            let Some(c) = self.bump() else {
                return Spanned {
                    token: Token::Eof,
                    span: self.span_from(start),
                };
            };

            let token = match c {
                '\n' => Token::Newline,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                ',' => Token::Comma,
                ':' => Token::Colon,
                '=' => Token::Eq,
                '?' => Token::Question,
                '@' => Token::At,
                '$' => Token::Dollar,
                '.' => Token::Dot,
                '/' if self.peek() == Some('/') => {
                    // plain `//` comments were skipped above
                    self.bump();
                    self.bump();
                    let mut text = String::new();
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        text.push(c);
                        self.bump();
                    }
                    let text = text.strip_prefix(' ').unwrap_or(&text).trim_end().to_string();
                    Token::DocComment(text)
                }
                '<' if self.peek() == Some('<') => {
                    self.bump();
                    self.read_heredoc(start)
                }
                '"' => Token::Str(self.read_string(start)),
                '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number('-'),
                '-' if self.peek().is_some_and(|c| c.is_alphabetic()) => {
                    Token::Ident(self.read_ident(String::from(c)))
                }
                c if c.is_ascii_digit() => self.read_number(c),
                c if c.is_alphabetic() || c == '_' => Token::Ident(self.read_ident(String::from(c))),
                _ => {
                    self.error(LexError::UnexpectedChar(c), start);
                    continue;
                }
            };

            return Spanned {
                token,
                span: self.span_from(start),
            };
        }
    }

    pub fn tokenize(mut self) -> (Vec<Spanned>, Vec<(LexError, Span)>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = tok.token == Token::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        (tokens, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let (tokens, errors) = Lexer::new(input, FileId(0)).tokenize();
        assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
        tokens.into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            tokens("model User { }"),
            vec![
                Token::Ident("model".into()),
                Token::Ident("User".into()),
                Token::LBrace,
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_field_tokens() {
        assert_eq!(
            tokens("tags string[]? @db.VarChar(32)\n"),
            vec![
                Token::Ident("tags".into()),
                Token::Ident("string".into()),
                Token::LBracket,
                Token::RBracket,
                Token::Question,
                Token::At,
                Token::Ident("db".into()),
                Token::Dot,
                Token::Ident("VarChar".into()),
                Token::LParen,
                Token::Num("32".into()),
                Token::RParen,
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        let input = "# comment\n// another\n/// Documented\nmodel";
        assert_eq!(
            tokens(input),
            vec![
                Token::Newline,
                Token::Newline,
                Token::DocComment("Documented".into()),
                Token::Newline,
                Token::Ident("model".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("1 -2.5 3e10 12345678901234567890.5"),
            vec![
                Token::Num("1".into()),
                Token::Num("-2.5".into()),
                Token::Num("3e10".into()),
                Token::Num("12345678901234567890.5".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_digit_prefixed_ident() {
        assert_eq!(
            tokens("2fa my-name"),
            vec![
                Token::Ident("2fa".into()),
                Token::Ident("my-name".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_heredoc() {
        let input = "<<-EOT\n    hello\n      world\n    EOT\n";
        assert_eq!(
            tokens(input),
            vec![
                Token::Heredoc {
                    strip_indent: true,
                    lines: vec!["    hello".into(), "      world".into()],
                },
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""a\"b\n""#),
            vec![Token::Str("a\"b\n".into()), Token::Eof]
        );
    }

    #[test]
    fn test_errors_are_collected() {
        let (tokens, errors) = Lexer::new("a ~ \"open", FileId(0)).tokenize();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].0, LexError::UnexpectedChar('~'));
        assert_eq!(errors[1].0, LexError::UnterminatedString);
        assert_eq!(tokens.last().map(|t| &t.token), Some(&Token::Eof));
    }

    #[test]
    fn test_spans() {
        let (tokens, _) = Lexer::new("model\n  User", FileId(0)).tokenize();
        let user = &tokens[2];
        assert_eq!(user.token, Token::Ident("User".into()));
        assert_eq!(user.span.start.line, 2);
        assert_eq!(user.span.start.column, 3);
        assert_eq!(user.span.end.column, 7);
    }
}
