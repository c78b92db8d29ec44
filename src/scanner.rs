use peekmore::{PeekMore, PeekMoreIterator};
use substring::Substring;

use crate::error::Diagnostic;
use crate::error::ScanError;
use crate::literal::Literal;
use crate::token::{Token, Type};

/// Converts Lox source text into a flat token stream.
///
/// The scanner is a single left-to-right pass over the characters. It never
/// backs up further than one character of lookahead (two for `match_next`)
/// and reports lexical errors as it goes rather than stopping at the first
/// one, so a source file with several typos gets all of them reported in a
/// single run.
pub struct Scanner<'a> {
    source: &'a str,
    chars: PeekMoreIterator<std::str::Chars<'a>>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source,
            chars: source.chars().peekmore(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scans the whole source and returns its tokens, terminated by `EOF`.
    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(Token::eof(self.line));
        self.tokens
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn advance(&mut self) -> char {
        let c = self.chars.next().expect("advance called past end of source");
        self.current += c.len_utf8();
        c
    }

    fn peek(&mut self) -> char {
        self.chars.peek().copied().unwrap_or('\0')
    }

    fn peek_next(&mut self) -> char {
        self.chars.peek_next().copied().unwrap_or('\0')
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    fn lexeme(&self) -> String {
        self.source.substring(self.start, self.current).to_string()
    }

    fn add_token(&mut self, r#type: Type) {
        self.add_token_with_literal(r#type, None);
    }

    fn add_token_with_literal(&mut self, r#type: Type, literal: Option<Literal>) {
        self.tokens.push(Token::new(r#type, self.lexeme(), literal, self.line));
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(Type::LeftParen),
            ')' => self.add_token(Type::RightParen),
            '{' => self.add_token(Type::LeftBrace),
            '}' => self.add_token(Type::RightBrace),
            ',' => self.add_token(Type::Comma),
            '.' => self.add_token(Type::Dot),
            '-' => self.add_token(Type::Minus),
            '+' => self.add_token(Type::Plus),
            ';' => self.add_token(Type::Semicolon),
            '*' => self.add_token(Type::Star),

            '!' => {
                let kind = if self.matches('=') { Type::BangEqual } else { Type::Bang };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.matches('=') { Type::EqualEqual } else { Type::Equal };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.matches('=') { Type::LessEqual } else { Type::Less };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.matches('=') { Type::GreaterEqual } else { Type::Greater };
                self.add_token(kind);
            }
            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(Type::Slash);
                }
            }

            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,

            '"' => self.string(),

            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),

            other => {
                ScanError {
                    line: self.line,
                    message: format!("Unexpected character '{other}'."),
                }
                .throw();
            }
        }
    }

    fn string(&mut self) {
        let start_line = self.line;

        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            ScanError {
                line: start_line,
                message: "Unterminated string.".to_string(),
            }
            .throw();
            return;
        }

        // The closing quote.
        self.advance();

        // Trim the surrounding quotes; the literal has no escape sequences.
        let value = self.source.substring(self.start + 1, self.current - 1).to_string();
        self.add_token_with_literal(Type::String, Some(Literal::String(value)));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // Consume the '.'.
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let value: f64 = self.lexeme().parse().expect("scanned number literal to parse as f64");
        self.add_token_with_literal(Type::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        let kind = match text.as_str() {
            "and" => Type::And,
            "class" => Type::Class,
            "else" => Type::Else,
            "false" => Type::False,
            "for" => Type::For,
            "fun" => Type::Fun,
            "if" => Type::If,
            "nil" => Type::Nil,
            "or" => Type::Or,
            "print" => Type::Print,
            "return" => Type::Return,
            "super" => Type::Super,
            "this" => Type::This,
            "true" => Type::True,
            "var" => Type::Var,
            "while" => Type::While,
            "break" => Type::Break,
            "continue" => Type::Continue,
            _ => Type::Identifier,
        };

        self.add_token(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Type> {
        Scanner::new(source).scan_tokens().into_iter().map(|t| t.r#type).collect()
    }

    #[test]
    fn scans_punctuation_and_operators() {
        assert_eq!(
            kinds("(){};,+-*!===<=>=!=<>/."),
            vec![
                Type::LeftParen, Type::RightParen, Type::LeftBrace, Type::RightBrace,
                Type::Semicolon, Type::Comma, Type::Plus, Type::Minus, Type::Star,
                Type::BangEqual, Type::EqualEqual, Type::LessEqual, Type::GreaterEqual,
                Type::BangEqual, Type::Less, Type::Greater, Type::Slash, Type::Dot,
                Type::EOF,
            ]
        );
    }

    #[test]
    fn scans_string_literal_without_quotes() {
        let tokens = Scanner::new("\"hello\"").scan_tokens();
        assert_eq!(tokens[0].literal, Some(Literal::String("hello".to_string())));
    }

    #[test]
    fn multiline_string_advances_line_counter() {
        let tokens = Scanner::new("\"a\nb\";\nprint 1;").scan_tokens();
        // The semicolon after the string sits on line 2, then `print` on line 3.
        let print_token = tokens.iter().find(|t| t.r#type == Type::Print).unwrap();
        assert_eq!(print_token.line, 3);
    }

    #[test]
    fn scans_number_with_fraction() {
        let tokens = Scanner::new("123.456").scan_tokens();
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.456)));
    }

    #[test]
    fn trailing_dot_without_digit_is_not_consumed() {
        // `1.` is the number `1` followed by a `.` token, not a malformed number.
        assert_eq!(kinds("1."), vec![Type::Number, Type::Dot, Type::EOF]);
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            kinds("orchid or nil_check nil"),
            vec![Type::Identifier, Type::Or, Type::Identifier, Type::Nil, Type::EOF]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(kinds("// a comment\n1"), vec![Type::Number, Type::EOF]);
    }
}
