//! A small line-based language for driving an [`ObjectTable`] by hand, used
//! by the `objmap` binary and the fixture tests.
//!
//! ```text
//! new client            # fresh table for the client side
//! insert_new false wl_display
//! reserve_new 0xff000000
//! for_each stop_at wl_display
//! ```
//!
//! [`ObjectTable`]: crate::ObjectTable

mod command;
mod interpreter;
mod parser;
mod scanner;

pub use command::{Command, CommandKind, CommandName, Script};
pub use interpreter::{Interpreter, InterpreterError};
pub use parser::{Parser, ParserError};
pub use scanner::{Scanner, ScannerError, Token, TokenType, TokenTypeName};

use crate::source_reference::SourceReference;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ScriptError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Scanner(#[from] ScannerError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),
}

/// Scans and parses `source`, collecting every error instead of stopping at
/// the first one.
pub fn compile(name: &str, source: &str) -> Result<Script, Vec<ScriptError>> {
    let source_reference = SourceReference::new(name.to_string(), source.to_string());
    let mut errors = Vec::new();
    let token_stream =
        Scanner::new(source, source_reference.clone()).filter_map(|token_or_err| {
            match token_or_err {
                Ok(token) => Some(token),
                Err(error) => {
                    errors.push(ScriptError::from(error));
                    None
                }
            }
        });

    let (script, parser_errors) = Parser::parse(token_stream, source_reference);
    errors.extend(parser_errors.into_iter().map(ScriptError::from));

    if errors.is_empty() {
        Ok(script)
    } else {
        Err(errors)
    }
}
