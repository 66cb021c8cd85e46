use crate::{
    source::{SourceOffset, SourceSpan},
    source_reference::SourceReference,
};
use miette::Diagnostic;
use std::{iter::Peekable, str::CharIndices};
use strum::EnumDiscriminants;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ScannerError {
    #[error("Unexpected character: {character:?}")]
    UnexpectedCharacter {
        character: char,
        #[label("Character found here")]
        at: SourceSpan,
        #[source_code]
        source_code: SourceReference,
    },
    #[error("Invalid number {text:?}")]
    InvalidNumber {
        text: String,
        #[label("Not a 32-bit decimal or 0x-prefixed hex number")]
        at: SourceSpan,
        #[source_code]
        source_code: SourceReference,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub span: SourceSpan,
    pub token_type: TokenType,
}

#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(TokenTypeName))]
pub enum TokenType {
    Word(String),
    Number(u32),
    Newline,
    Eof,
}

/// Splits a table script into words, numbers and line breaks. Blank space
/// and `#` comments are dropped.
pub struct Scanner<'a> {
    source: &'a str,
    source_reference: SourceReference,
    chars: Peekable<CharIndices<'a>>,
    at_end: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, source_reference: SourceReference) -> Self {
        Self {
            source,
            source_reference,
            chars: source.char_indices().peekable(),
            at_end: false,
        }
    }

    fn advance_while<F: Fn(char) -> bool>(&mut self, check: F) -> usize {
        while let Some(&(_, ch)) = self.chars.peek() {
            if !check(ch) {
                break;
            }
            self.chars.next();
        }
        self.current_offset()
    }

    fn current_offset(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    fn skip_blank_and_comments(&mut self) {
        loop {
            self.advance_while(|ch| ch.is_whitespace() && ch != '\n');
            match self.chars.peek() {
                Some((_, '#')) => {
                    self.advance_while(|ch| ch != '\n');
                }
                _ => return,
            }
        }
    }

    fn number(&mut self, start: usize) -> Result<Token, ScannerError> {
        let end = self.advance_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        let text = &self.source[start..end];
        let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => text.parse::<u32>(),
        };
        match parsed {
            Ok(number) => Ok(Token {
                span: (start..end).into(),
                token_type: TokenType::Number(number),
            }),
            Err(_) => Err(ScannerError::InvalidNumber {
                text: text.to_string(),
                at: (start..end).into(),
                source_code: self.source_reference.clone(),
            }),
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token, ScannerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at_end {
            return None;
        }

        self.skip_blank_and_comments();

        let (start, ch) = match self.chars.next() {
            Some(next) => next,
            None => {
                self.at_end = true;
                let end = self.source.len();
                return Some(Ok(Token {
                    span: SourceSpan::new(SourceOffset::from(end), 0),
                    token_type: TokenType::Eof,
                }));
            }
        };
        let span = |end: usize| -> SourceSpan { (start..end).into() };
        Some(match ch {
            '\n' => Ok(Token {
                span: span(start + 1),
                token_type: TokenType::Newline,
            }),
            '0'..='9' => self.number(start),
            'a'..='z' | 'A'..='Z' | '_' => {
                let end = self.advance_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
                Ok(Token {
                    span: span(end),
                    token_type: TokenType::Word(self.source[start..end].to_string()),
                })
            }
            ch => Err(ScannerError::UnexpectedCharacter {
                character: ch,
                at: span(start + ch.len_utf8()),
                source_code: self.source_reference.clone(),
            }),
        })
    }
}
