//! Error types shared by every stage of the pipeline.
//!
//! The scanner, parser, resolver and evaluator each fail through their own
//! variant of [`LoxError`], and the driver feeds every one of them to the
//! same reporter callback.  Nothing in this module writes diagnostics
//! anywhere itself; where an error ends up is the driver's decision.  The
//! crate-wide [`Result`] alias keeps signatures short, and the `Io` variant
//! lets `?` lift I/O failures from the output sink.

use std::io;
use thiserror::Error;

use log::info;

/// One error type for the whole pipeline, tagged by phase.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// The scanner hit a malformed lexeme.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// What went wrong.
        message: String,

        /// The offending slice of source text.
        lexeme: String,

        /// 1-based source line.
        line: usize,
    },

    /// The parser rejected the token stream.
    #[error("[line {line}] Error: {message}")]
    Parse {
        message: String,
        lexeme: String,
        line: usize,
    },

    /// The resolver found a static rule violation.
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Evaluation failed.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// An I/O failure, e.g. from the print sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Build a scanner error.
    pub fn lex<S: Into<String>>(line: usize, lexeme: S, msg: S) -> Self {
        let message: String = msg.into();

        info!("scan error [line {}]: {}", line, message);

        LoxError::Lex {
            message,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// Build a parser error.
    pub fn parse<S: Into<String>>(line: usize, lexeme: S, msg: S) -> Self {
        let message: String = msg.into();

        info!("parse error [line {}]: {}", line, message);

        LoxError::Parse {
            message,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// Build a resolver error.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("resolve error [line {}]: {}", line, message);

        LoxError::Resolve { message, line }
    }

    /// Build an evaluator error.
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        LoxError::Runtime(msg.into())
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
