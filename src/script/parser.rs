use super::{
    command::{Command, CommandKind, CommandName, Script},
    scanner::{Token, TokenType, TokenTypeName},
};
use crate::{
    id::{Namespace, ObjectId},
    source::SourceSpan,
    source_reference::SourceReference,
};
use itertools::Itertools;
use miette::Diagnostic;
use std::{iter::Peekable, str::FromStr};
use strum::VariantNames;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ParserError {
    #[error("Unknown command {name:?}")]
    UnknownCommand {
        name: String,
        expected: String,
        #[label("expected one of {expected}")]
        found_at: SourceSpan,
        #[source_code]
        source_code: SourceReference,
    },
    #[error("Unexpected token")]
    UnexpectedToken {
        actual: TokenTypeName,
        expected: &'static str,
        #[label("Found {actual:?} instead of {expected}")]
        found_at: SourceSpan,
        #[source_code]
        source_code: SourceReference,
    },
    #[error("Invalid {what} {text:?}")]
    InvalidArgument {
        what: &'static str,
        text: String,
        expected: &'static str,
        #[label("expected {expected}")]
        found_at: SourceSpan,
        #[source_code]
        source_code: SourceReference,
    },
}

/// Parses one command per line. Blank lines are skipped; a line with an
/// error is dropped and parsing carries on with the next one.
pub struct Parser<Stream: Iterator<Item = Token>> {
    token_stream: Peekable<Stream>,
    source_reference: SourceReference,
    recovered_errors: Vec<ParserError>,
}

impl<Stream: Iterator<Item = Token>> Parser<Stream> {
    pub fn parse(
        token_stream: Stream,
        source_reference: SourceReference,
    ) -> (Script, Vec<ParserError>) {
        let mut parser = Parser {
            token_stream: token_stream.peekable(),
            source_reference,
            recovered_errors: Vec::new(),
        };
        let script = parser.parse_script();
        (script, parser.recovered_errors)
    }

    fn parse_script(&mut self) -> Script {
        let mut commands = Vec::new();
        loop {
            match self.token_stream.peek().map(|token| &token.token_type) {
                None | Some(TokenType::Eof) => break,
                Some(TokenType::Newline) => {
                    self.token_stream.next();
                }
                Some(_) => match self.parse_command() {
                    Ok(command) => commands.push(command),
                    Err(err) => {
                        self.synchronize();
                        self.recovered_errors.push(err);
                    }
                },
            }
        }
        Script { commands }
    }

    fn synchronize(&mut self) {
        while let Some(token) = self.token_stream.peek() {
            match token.token_type {
                TokenType::Eof => return,
                TokenType::Newline => {
                    self.token_stream.next();
                    return;
                }
                _ => {
                    self.token_stream.next();
                }
            }
        }
    }

    fn parse_command(&mut self) -> Result<Command, ParserError> {
        let (name, name_span) = self.expect_word("a command")?;
        let command_name =
            CommandName::from_str(&name).map_err(|_| ParserError::UnknownCommand {
                expected: CommandName::VARIANTS.iter().join(", "),
                name,
                found_at: name_span,
                source_code: self.source_reference.clone(),
            })?;

        let kind = match command_name {
            CommandName::New => CommandKind::New {
                side: self.parse_keyword("side", "client or server")?,
                limit: self.parse_optional_number()?,
            },
            CommandName::InsertNew => CommandKind::InsertNew {
                flag: self.parse_flag()?,
                name: self.expect_word("an object name")?.0,
            },
            CommandName::InsertAt => CommandKind::InsertAt {
                flag: self.parse_flag()?,
                id: self.parse_id()?,
                name: self.expect_word("an object name")?.0,
            },
            CommandName::ReserveNew => CommandKind::ReserveNew {
                id: self.parse_id()?,
            },
            CommandName::Remove => CommandKind::Remove {
                id: self.parse_id()?,
            },
            CommandName::Vacate => CommandKind::Vacate {
                id: self.parse_id()?,
            },
            CommandName::Lookup => CommandKind::Lookup {
                id: self.parse_id()?,
            },
            CommandName::LookupFlags => CommandKind::LookupFlags {
                id: self.parse_id()?,
            },
            CommandName::ForEach => CommandKind::ForEach {
                stop_at: self.parse_stop_at()?,
            },
            CommandName::Len => CommandKind::Len {
                namespace: self.parse_keyword::<Namespace>("namespace", "low or high")?,
            },
            CommandName::Clear => CommandKind::Clear,
        };

        let end_span = self.expect_line_end()?;
        Ok(Command {
            kind,
            span: name_span.to(end_span),
        })
    }

    fn parse_id(&mut self) -> Result<ObjectId, ParserError> {
        self.expect_number("an object id")
            .map(|(raw, _)| ObjectId::new(raw))
    }

    fn parse_flag(&mut self) -> Result<bool, ParserError> {
        let token = self.advance("a flag")?;
        match &token.token_type {
            TokenType::Number(0) => Ok(false),
            TokenType::Number(1) => Ok(true),
            TokenType::Word(word) if word == "false" => Ok(false),
            TokenType::Word(word) if word == "true" => Ok(true),
            TokenType::Number(number) => Err(self.invalid("flag", number.to_string(), token.span)),
            TokenType::Word(word) => Err(self.invalid("flag", word.clone(), token.span)),
            _ => Err(self.unexpected(&token, "a flag")),
        }
    }

    fn parse_keyword<T: FromStr>(
        &mut self,
        what: &'static str,
        expected: &'static str,
    ) -> Result<T, ParserError> {
        let (word, span) = self.expect_word(expected)?;
        T::from_str(&word).map_err(|_| ParserError::InvalidArgument {
            what,
            text: word,
            expected,
            found_at: span,
            source_code: self.source_reference.clone(),
        })
    }

    fn parse_optional_number(&mut self) -> Result<Option<u32>, ParserError> {
        if self.at_line_end() {
            return Ok(None);
        }
        self.expect_number("a slot limit")
            .map(|(number, _)| Some(number))
    }

    fn parse_stop_at(&mut self) -> Result<Option<String>, ParserError> {
        if self.at_line_end() {
            return Ok(None);
        }
        let (word, span) = self.expect_word("stop_at")?;
        if word != "stop_at" {
            return Err(ParserError::InvalidArgument {
                what: "for_each option",
                text: word,
                expected: "stop_at",
                found_at: span,
                source_code: self.source_reference.clone(),
            });
        }
        Ok(Some(self.expect_word("an object name")?.0))
    }

    fn at_line_end(&mut self) -> bool {
        matches!(
            self.token_stream.peek().map(|token| &token.token_type),
            None | Some(TokenType::Newline | TokenType::Eof)
        )
    }

    fn expect_line_end(&mut self) -> Result<SourceSpan, ParserError> {
        match self.token_stream.peek() {
            Some(Token {
                token_type: TokenType::Eof,
                span,
            }) => Ok(*span),
            Some(Token {
                token_type: TokenType::Newline,
                span,
            }) => {
                let span = *span;
                self.token_stream.next();
                Ok(span)
            }
            _ => {
                let token = self.advance("end of line")?;
                Err(self.unexpected(&token, "end of line"))
            }
        }
    }

    fn expect_word(&mut self, expected: &'static str) -> Result<(String, SourceSpan), ParserError> {
        let token = self.advance(expected)?;
        match token.token_type {
            TokenType::Word(word) => Ok((word, token.span)),
            _ => Err(self.unexpected(&token, expected)),
        }
    }

    fn expect_number(&mut self, expected: &'static str) -> Result<(u32, SourceSpan), ParserError> {
        let token = self.advance(expected)?;
        match token.token_type {
            TokenType::Number(number) => Ok((number, token.span)),
            _ => Err(self.unexpected(&token, expected)),
        }
    }

    /// Takes the next token unless the line has ended.
    fn advance(&mut self, expected: &'static str) -> Result<Token, ParserError> {
        if self.at_line_end() {
            return Err(match self.token_stream.peek().cloned() {
                Some(token) => self.unexpected(&token, expected),
                None => self.missing(expected),
            });
        }
        self.token_stream
            .next()
            .ok_or_else(|| self.missing(expected))
    }

    fn missing(&self, expected: &'static str) -> ParserError {
        ParserError::UnexpectedToken {
            actual: TokenTypeName::Eof,
            expected,
            found_at: SourceSpan::new(0.into(), 0),
            source_code: self.source_reference.clone(),
        }
    }

    fn unexpected(&self, token: &Token, expected: &'static str) -> ParserError {
        ParserError::UnexpectedToken {
            actual: TokenTypeName::from(&token.token_type),
            expected,
            found_at: token.span,
            source_code: self.source_reference.clone(),
        }
    }

    fn invalid(&self, what: &'static str, text: String, found_at: SourceSpan) -> ParserError {
        ParserError::InvalidArgument {
            what,
            text,
            expected: "true, false, 0 or 1",
            found_at,
            source_code: self.source_reference.clone(),
        }
    }
}
