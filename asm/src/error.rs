use crate::token::Pos;
use strum::IntoStaticStr;
use thiserror::Error;

// Tokenizer errors
#[derive(Debug, Error, IntoStaticStr)]
pub enum LexError {
    #[error("read failed: {source}")]
    ReaderError {
        pos: Pos,
        #[source]
        source: std::io::Error,
    },

    #[error("{msg}")]
    InvalidIdentifier { pos: Pos, msg: String },

    #[error("{msg}")]
    InvalidString { pos: Pos, msg: String },

    #[error("{msg}")]
    InvalidNumber { pos: Pos, msg: String },

    #[error("{msg}")]
    InvalidSymbol { pos: Pos, msg: String },

    #[error("{msg}")]
    InvalidMultilineComment { pos: Pos, msg: String },

    #[error("{msg}")]
    InternalError { msg: String },
}

impl LexError {
    pub fn pos(&self) -> Option<Pos> {
        match self {
            LexError::ReaderError { pos, .. }
            | LexError::InvalidIdentifier { pos, .. }
            | LexError::InvalidString { pos, .. }
            | LexError::InvalidNumber { pos, .. }
            | LexError::InvalidSymbol { pos, .. }
            | LexError::InvalidMultilineComment { pos, .. } => Some(*pos),
            LexError::InternalError { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

// Generator errors
#[derive(Debug, Error, IntoStaticStr)]
pub enum GenError {
    #[error("{msg}")]
    InternalException { msg: String },

    #[error("{msg}")]
    RegisterNotSupportedInBitMode { pos: Pos, msg: String },

    #[error("{msg}")]
    InvalidParsingPass { msg: String },
}

impl GenError {
    pub fn pos(&self) -> Option<Pos> {
        match self {
            GenError::RegisterNotSupportedInBitMode { pos, .. } => Some(*pos),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

// Parser errors. Tokenizer and generator failures pass through so the
// first error of either stage aborts the run.
#[derive(Debug, Error, IntoStaticStr)]
pub enum ParseError {
    #[error("{msg}")]
    UnexpectedToken { pos: Pos, msg: String },

    #[error("{msg}")]
    UnsupportedRegister { pos: Pos, msg: String },

    #[error("{msg}")]
    InvalidNumber { pos: Pos, msg: String },

    #[error("{msg}")]
    InvalidDirective { pos: Pos, msg: String },

    #[error("{msg}")]
    Unimplemented { pos: Pos, msg: String },

    #[error("{msg}")]
    InternalException { msg: String },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    GeneratorError(#[from] GenError),
}

impl ParseError {
    pub fn pos(&self) -> Option<Pos> {
        match self {
            ParseError::UnexpectedToken { pos, .. }
            | ParseError::UnsupportedRegister { pos, .. }
            | ParseError::InvalidNumber { pos, .. }
            | ParseError::InvalidDirective { pos, .. }
            | ParseError::Unimplemented { pos, .. } => Some(*pos),
            ParseError::InternalException { .. } => None,
            ParseError::Lex(e) => e.pos(),
            ParseError::GeneratorError(e) => e.pos(),
        }
    }

    /// Diagnostic kind, the variant name of the failing stage.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::Lex(e) => e.kind(),
            ParseError::GeneratorError(e) => e.kind(),
            _ => self.into(),
        }
    }
}

// Top-level error for library consumers
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
