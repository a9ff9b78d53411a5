use crate::error::LexError;
use crate::source::Source;
use crate::token::{mnemonic, reserved, Pos, Token, TokenKind};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// The seam between scanning and parsing. `next_token` yields `Eof`
/// repeatedly once the source is exhausted; `reinit` rewinds for the
/// second pass.
pub trait TokenStream {
    fn next_token(&mut self) -> Result<Token, LexError>;
    fn reinit(&mut self) -> Result<(), LexError>;
}

/// Deterministic scanner over a byte source, dispatching on the first
/// non-blank byte.
pub struct Tokenizer<R: Read + Seek> {
    source: Source<R>,
}

impl Tokenizer<File> {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Tokenizer::new(File::open(path)?))
    }
}

impl<R: Read + Seek> Tokenizer<R> {
    pub fn new(inner: R) -> Self {
        Tokenizer {
            source: Source::new(inner),
        }
    }

    /// Skip spaces, carriage returns and tabs. Newlines are tokens.
    fn skip_blank(&mut self) -> Result<(), LexError> {
        while let Some(b) = self.source.peek_byte()? {
            match b {
                b' ' | b'\r' | b'\t' => {
                    self.source.read_byte()?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Discard bytes up to (not including) the next newline.
    fn skip_line_comment(&mut self) -> Result<(), LexError> {
        while let Some(b) = self.source.peek_byte()? {
            if b == b'\n' {
                break;
            }
            self.source.read_byte()?;
        }
        Ok(())
    }

    /// `/` already consumed: line comment, flat multi-line comment, or a
    /// division symbol. Returns `None` when a comment was discarded.
    fn scan_slash(&mut self, pos: Pos) -> Result<Option<Token>, LexError> {
        match self.source.peek_byte()? {
            Some(b'/') => {
                self.skip_line_comment()?;
                Ok(None)
            }
            Some(b'*') => {
                self.source.read_byte()?;
                let mut star = false;
                loop {
                    match self.source.read_byte()? {
                        None => {
                            return Err(LexError::InvalidMultilineComment {
                                pos,
                                msg: "multi-line comment is missing its closing `*/`".into(),
                            })
                        }
                        Some(b'/') if star => break,
                        Some(b) => star = b == b'*',
                    }
                }
                Ok(None)
            }
            _ => Ok(Some(Token::new(TokenKind::SymbolForwardSlash, "/", pos))),
        }
    }

    fn scan_string(&mut self, pos: Pos) -> Result<Token, LexError> {
        self.source.read_byte()?; // opening quote
        if self.source.peek_byte()? == Some(b'"') {
            self.source.read_byte()?;
            if self.source.peek_byte()? == Some(b'"') {
                self.source.read_byte()?;
                return self.scan_multiline_string(pos);
            }
            // empty single-line literal
            return Ok(Token::new(TokenKind::Literal, "", pos));
        }

        let mut lexeme = Vec::new();
        let mut escape = false;
        loop {
            match self.source.read_byte()? {
                None => {
                    return Err(LexError::InvalidString {
                        pos,
                        msg: "string literal is missing its closing quote".into(),
                    })
                }
                Some(b'\n') => {
                    return Err(LexError::InvalidString {
                        pos,
                        msg: "string literal crosses the end of the line".into(),
                    })
                }
                Some(b'"') if !escape => break,
                Some(b) => {
                    escape = b == b'\\' && !escape;
                    lexeme.push(b);
                }
            }
        }
        Ok(Token::new(
            TokenKind::Literal,
            String::from_utf8_lossy(&lexeme).into_owned(),
            pos,
        ))
    }

    /// Triple-quoted literal, terminated by three consecutive quotes.
    fn scan_multiline_string(&mut self, pos: Pos) -> Result<Token, LexError> {
        let mut lexeme: Vec<u8> = Vec::new();
        loop {
            match self.source.read_byte()? {
                None => {
                    return Err(LexError::InvalidString {
                        pos,
                        msg: "multi-line string literal is missing its closing `\"\"\"`".into(),
                    })
                }
                Some(b) => {
                    lexeme.push(b);
                    if lexeme.ends_with(b"\"\"\"") {
                        lexeme.truncate(lexeme.len() - 3);
                        break;
                    }
                }
            }
        }
        Ok(Token::new(
            TokenKind::Literal,
            String::from_utf8_lossy(&lexeme).into_owned(),
            pos,
        ))
    }

    /// `0x…`, `0b…` or decimal. The lexeme keeps the written form, prefix
    /// included, so later sizing can see the base.
    fn scan_number(&mut self, pos: Pos) -> Result<Token, LexError> {
        let mut lexeme = Vec::new();
        let first = self
            .source
            .read_byte()?
            .ok_or_else(|| LexError::InternalError {
                msg: "number scan started at end of input".into(),
            })?;
        lexeme.push(first);

        let marker = if first == b'0' {
            match self.source.peek_byte()? {
                Some(m @ (b'x' | b'b')) => {
                    self.source.read_byte()?;
                    lexeme.push(m);
                    Some(m)
                }
                _ => None,
            }
        } else {
            None
        };

        let accepts = |b: u8| match marker {
            Some(b'x') => b.is_ascii_hexdigit(),
            Some(b'b') => b == b'0' || b == b'1',
            _ => b.is_ascii_digit(),
        };
        let mut digits = usize::from(marker.is_none());
        while let Some(b) = self.source.peek_byte()? {
            if !accepts(b) {
                break;
            }
            self.source.read_byte()?;
            lexeme.push(b);
            digits += 1;
        }
        if digits == 0 {
            return Err(LexError::InvalidNumber {
                pos,
                msg: format!(
                    "`{}` has no digits after its base prefix",
                    String::from_utf8_lossy(&lexeme)
                ),
            });
        }
        Ok(Token::new(
            TokenKind::Number,
            String::from_utf8_lossy(&lexeme).into_owned(),
            pos,
        ))
    }

    /// `[A-Za-z][A-Za-z0-9]*`, then classified against the reserved
    /// directive table (case-sensitive) and the mnemonic table
    /// (case-insensitive).
    fn scan_identifier(&mut self, pos: Pos) -> Result<Token, LexError> {
        let mut lexeme = Vec::new();
        while let Some(b) = self.source.peek_byte()? {
            if !b.is_ascii_alphanumeric() {
                break;
            }
            self.source.read_byte()?;
            lexeme.push(b);
        }
        let lexeme = String::from_utf8_lossy(&lexeme).into_owned();
        let kind = reserved(&lexeme)
            .or_else(|| mnemonic(&lexeme))
            .unwrap_or(TokenKind::Identifier);
        Ok(Token::new(kind, lexeme, pos))
    }

    fn scan_symbol(&mut self, pos: Pos) -> Result<Token, LexError> {
        let byte = self
            .source
            .read_byte()?
            .ok_or_else(|| LexError::InternalError {
                msg: "symbol scan started at end of input".into(),
            })?;
        let kind = match byte {
            b'=' => TokenKind::SymbolEquals,
            b'*' => TokenKind::SymbolAsterisk,
            b'@' => TokenKind::SymbolAt,
            b'+' => TokenKind::SymbolPlus,
            b'-' => TokenKind::SymbolMinus,
            b',' => TokenKind::SymbolComma,
            b':' => TokenKind::SymbolColon,
            b'(' => TokenKind::SymbolLeftParanthesis,
            b')' => TokenKind::SymbolRightParanthesis,
            _ => {
                return Err(LexError::InvalidSymbol {
                    pos,
                    msg: format!("unrecognized byte `{}`", byte.escape_ascii()),
                })
            }
        };
        Ok(Token::new(kind, (byte as char).to_string(), pos))
    }
}

impl<R: Read + Seek> TokenStream for Tokenizer<R> {
    fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_blank()?;
            let pos = self.source.pos();
            let byte = match self.source.peek_byte()? {
                Some(b) => b,
                None => return Ok(Token::eof(pos)),
            };
            match byte {
                b'\n' => {
                    self.source.read_byte()?;
                    return Ok(Token::new(TokenKind::NewLine, "\n", pos));
                }
                b';' => self.skip_line_comment()?,
                b'/' => {
                    self.source.read_byte()?;
                    if let Some(token) = self.scan_slash(pos)? {
                        return Ok(token);
                    }
                }
                b'"' => return self.scan_string(pos),
                b'0'..=b'9' => return self.scan_number(pos),
                b'A'..=b'Z' | b'a'..=b'z' => return self.scan_identifier(pos),
                _ => return self.scan_symbol(pos),
            }
        }
    }

    fn reinit(&mut self) -> Result<(), LexError> {
        self.source.reinit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tokens(code: &str) -> Vec<Token> {
        let mut lexer = Tokenizer::new(Cursor::new(code.to_string()));
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            let done = token.kind == TokenKind::Eof;
            out.push(token);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn classifies_reserved_and_mnemonics() {
        let toks = tokens("SetOrigin Origin JMP jmp label1");
        let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::ReservedSetOrigin,
                TokenKind::ReservedStart,
                TokenKind::InstructionJmp,
                TokenKind::InstructionJmp,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        // reserved words are case-sensitive
        assert_eq!(tokens("setorigin")[0].kind, TokenKind::Identifier);
    }

    #[test]
    fn number_prefixes_stay_in_lexeme() {
        let toks = tokens("0x7C00 0b1010 510");
        assert_eq!(toks[0].lexeme, "0x7C00");
        assert_eq!(toks[1].lexeme, "0b1010");
        assert_eq!(toks[2].lexeme, "510");
        assert!(toks[..3].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn bare_prefix_is_invalid() {
        let mut lexer = Tokenizer::new(Cursor::new("0x".to_string()));
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn comments_are_discarded() {
        let kinds: Vec<TokenKind> = tokens("ax ; trailing\n// full line\n/* multi\nline */ bx")
            .iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::NewLine,
                TokenKind::NewLine,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn division_is_not_a_comment() {
        let kinds: Vec<TokenKind> = tokens("4 / 2").iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Number,
                TokenKind::SymbolForwardSlash,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strings() {
        assert_eq!(tokens("\"hello\"")[0].lexeme, "hello");
        // escaped quote does not terminate
        assert_eq!(tokens(r#""a\"b""#)[0].lexeme, r#"a\"b"#);
        assert_eq!(tokens("\"\"")[0].lexeme, "");
        assert_eq!(tokens("\"\"\"two\nlines\"\"\"")[0].lexeme, "two\nlines");

        let mut lexer = Tokenizer::new(Cursor::new("\"open".to_string()));
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::InvalidString { .. })
        ));
        let mut lexer = Tokenizer::new(Cursor::new("\"line\nbreak\"".to_string()));
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::InvalidString { .. })
        ));
        let mut lexer = Tokenizer::new(Cursor::new("\"\"\"open".to_string()));
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::InvalidString { .. })
        ));
    }

    #[test]
    fn unterminated_comment() {
        let mut lexer = Tokenizer::new(Cursor::new("/* open".to_string()));
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::InvalidMultilineComment { .. })
        ));
    }

    #[test]
    fn eof_repeats_and_reinit_rewinds() {
        let mut lexer = Tokenizer::new(Cursor::new("ax".to_string()));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        lexer.reinit().unwrap();
        let again = lexer.next_token().unwrap();
        assert_eq!(again.kind, TokenKind::Identifier);
        assert_eq!(again.pos.col, 1);
    }

    #[test]
    fn positions_are_one_based() {
        let toks = tokens("ax = 1\n  jmp x");
        assert_eq!((toks[0].pos.line, toks[0].pos.col), (1, 1));
        assert_eq!((toks[1].pos.line, toks[1].pos.col), (1, 4));
        assert_eq!((toks[4].pos.line, toks[4].pos.col), (2, 3));
    }
}
