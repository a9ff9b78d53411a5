pub mod encode;
pub mod error;
pub mod generator;
pub mod label;
pub mod parser;
pub mod source;
pub mod token;
pub mod tokenizer;
pub mod value;

pub use error::{Error, GenError, LexError, ParseError};
pub use generator::{Generator, Pass, PendingJump};
pub use label::{Labels, Symbol, SymbolMap};
pub use parser::Parser;
pub use source::Source;
pub use token::{Pos, Token, TokenKind};
pub use tokenizer::{TokenStream, Tokenizer};
pub use value::{Access, Operand, Value};

use std::io::{Read, Seek, Write};

/// Assemble a source stream into a byte sink, running both passes.
/// Returns the generator so callers can inspect labels and the final
/// counter, and recover the sink with [`Generator::finish`].
pub fn assemble<R: Read + Seek, W: Write>(
    input: R,
    output: W,
) -> Result<Generator<W>, ParseError> {
    let tokenizer = Tokenizer::new(input);
    let gen = Generator::new(Some(output));
    Parser::new(tokenizer, gen).run()
}
