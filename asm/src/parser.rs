use crate::error::ParseError;
use crate::generator::Generator;
use crate::token::{Pos, Token, TokenKind};
use crate::tokenizer::TokenStream;
use crate::value::{floor_div, parse_number, Access, Operand, Value};
use std::io::Write;
use x86_arch::{resolve_register, BitMode};

/// Recursive-descent driver with one token of lookahead. Pulls tokens on
/// demand, dispatches to directive/label/expression/jump handlers, and
/// feeds the generator. `run` scans the stream twice around
/// `reinit`/`next_pass` for the two-pass encoding.
pub struct Parser<T: TokenStream, W: Write> {
    tokens: T,
    gen: Generator<W>,
    peeked: Option<Token>,
}

// ----------------------------------------------------------------------------
// Core helpers
// ----------------------------------------------------------------------------

impl<T: TokenStream, W: Write> Parser<T, W> {
    pub fn new(tokens: T, gen: Generator<W>) -> Self {
        Parser {
            tokens,
            gen,
            peeked: None,
        }
    }

    /// Buffered next token without consuming it.
    fn peek(&mut self) -> Result<&Token, ParseError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.tokens.next_token()?);
        }
        match &self.peeked {
            Some(token) => Ok(token),
            None => Err(ParseError::InternalException {
                msg: "lookahead vanished".into(),
            }),
        }
    }

    fn peek_kind(&mut self) -> Result<TokenKind, ParseError> {
        Ok(self.peek()?.kind)
    }

    /// Consume the next token and return it.
    fn read(&mut self) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => Ok(self.tokens.next_token()?),
        }
    }

    /// Next token must be of `kind`.
    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.read()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(ParseError::UnexpectedToken {
                pos: token.pos,
                msg: format!("expected {kind}, found {} `{}`", token.kind, token.lexeme),
            })
        }
    }

    fn skip_newlines(&mut self) -> Result<(), ParseError> {
        while self.peek_kind()? == TokenKind::NewLine {
            self.read()?;
        }
        Ok(())
    }

    fn unexpected(&mut self, wanted: &str) -> ParseError {
        match self.read() {
            Ok(token) => ParseError::UnexpectedToken {
                pos: token.pos,
                msg: format!("expected {wanted}, found {} `{}`", token.kind, token.lexeme),
            },
            Err(e) => e,
        }
    }
}

// ----------------------------------------------------------------------------
// Top level
// ----------------------------------------------------------------------------

impl<T: TokenStream, W: Write> Parser<T, W> {
    /// Run both passes over the token stream and return the generator.
    pub fn run(mut self) -> Result<Generator<W>, ParseError> {
        self.parse_pass()?;
        self.tokens.reinit()?;
        self.peeked = None;
        self.gen.next_pass()?;
        self.parse_pass()?;
        Ok(self.gen)
    }

    fn parse_pass(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_newlines()?;
            match self.peek_kind()? {
                TokenKind::Eof => return Ok(()),
                TokenKind::SymbolAt => self.parse_directive()?,
                TokenKind::InstructionJmp => self.parse_jump()?,
                _ => self.parse_statement()?,
            }
        }
    }

    /// label = ident ":" ; the rest of the line re-enters the top loop
    /// expr head = ident | "*" number
    fn parse_statement(&mut self) -> Result<(), ParseError> {
        match self.peek_kind()? {
            TokenKind::Identifier => {
                let ident = self.read()?;
                if self.peek_kind()? == TokenKind::SymbolColon {
                    self.read()?;
                    self.gen.process_label(&ident.lexeme);
                    return Ok(());
                }
                self.parse_assignment_with_register(ident)
            }
            TokenKind::SymbolAsterisk => {
                self.read()?;
                let addr = self.expect(TokenKind::Number)?;
                let lhs = Operand::indirect(Value::Const(addr.lexeme.clone()), Some(addr));
                self.parse_assignment(lhs)
            }
            _ => Err(self.unexpected("a label, directive or expression")),
        }
    }
}

// ----------------------------------------------------------------------------
// Directives
// ----------------------------------------------------------------------------

impl<T: TokenStream, W: Write> Parser<T, W> {
    /// directive = "@" name "(" args ")"
    fn parse_directive(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::SymbolAt)?;
        let name = self.read()?;
        match name.kind {
            TokenKind::ReservedSetBitMode => {
                self.expect(TokenKind::SymbolLeftParanthesis)?;
                let number = self.expect(TokenKind::Number)?;
                let width = self.number_value(&number)?;
                let mode = BitMode::from_width(width).ok_or_else(|| ParseError::InvalidNumber {
                    pos: number.pos,
                    msg: format!("bit mode must be 16, 32 or 64, found `{}`", number.lexeme),
                })?;
                self.expect(TokenKind::SymbolRightParanthesis)?;
                self.gen.process_set_bit_mode(mode);
                Ok(())
            }
            TokenKind::ReservedSetOrigin => {
                self.expect(TokenKind::SymbolLeftParanthesis)?;
                let number = self.expect(TokenKind::Number)?;
                let origin = self.number_value(&number)?;
                self.expect(TokenKind::SymbolRightParanthesis)?;
                self.gen.process_set_origin(origin);
                Ok(())
            }
            TokenKind::ReservedPadBytes => {
                self.expect(TokenKind::SymbolLeftParanthesis)?;
                let count = self.parse_const_expr()?;
                let byte = if self.peek_kind()? == TokenKind::SymbolComma {
                    self.read()?;
                    let number = self.expect(TokenKind::Number)?;
                    let value = self.number_value(&number)?;
                    u8::try_from(value).map_err(|_| ParseError::InvalidNumber {
                        pos: number.pos,
                        msg: format!("fill byte must be 0..=255, found `{}`", number.lexeme),
                    })?
                } else {
                    0x00
                };
                self.expect(TokenKind::SymbolRightParanthesis)?;
                self.gen.process_pad_bytes(count, byte)?;
                Ok(())
            }
            TokenKind::ReservedDoubleWords => {
                self.expect(TokenKind::SymbolLeftParanthesis)?;
                if self.peek_kind()? == TokenKind::Number {
                    loop {
                        let number = self.expect(TokenKind::Number)?;
                        let value = self.number_value(&number)?;
                        self.gen.emit_double_word(value)?;
                        if self.peek_kind()? == TokenKind::SymbolComma {
                            self.read()?;
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::SymbolRightParanthesis)?;
                Ok(())
            }
            // Reserved for future widening; accepted, nothing emitted.
            TokenKind::ReservedBytes | TokenKind::ReservedWords | TokenKind::ReservedQuadWords => {
                self.expect(TokenKind::SymbolLeftParanthesis)?;
                self.expect(TokenKind::SymbolRightParanthesis)?;
                Ok(())
            }
            TokenKind::ReservedCurrent | TokenKind::ReservedStart => {
                Err(ParseError::InvalidDirective {
                    pos: name.pos,
                    msg: format!("`@{}()` is only valid inside expressions", name.lexeme),
                })
            }
            _ => Err(ParseError::InvalidDirective {
                pos: name.pos,
                msg: format!("unknown directive `{}`", name.lexeme),
            }),
        }
    }

    fn number_value(&self, token: &Token) -> Result<u64, ParseError> {
        parse_number(&token.lexeme).map_err(|msg| ParseError::InvalidNumber {
            pos: token.pos,
            msg,
        })
    }

    /// constExpr = primary (("+" | "-" | "*" | "/") constExpr)?
    ///
    /// Right recursion, no precedence, floor division.
    fn parse_const_expr(&mut self) -> Result<i64, ParseError> {
        let lhs = self.parse_const_primary()?;
        let op = match self.peek_kind()? {
            TokenKind::SymbolPlus
            | TokenKind::SymbolMinus
            | TokenKind::SymbolAsterisk
            | TokenKind::SymbolForwardSlash => self.read()?,
            _ => return Ok(lhs),
        };
        let rhs = self.parse_const_expr()?;
        match op.kind {
            TokenKind::SymbolPlus => Ok(lhs.wrapping_add(rhs)),
            TokenKind::SymbolMinus => Ok(lhs.wrapping_sub(rhs)),
            TokenKind::SymbolAsterisk => Ok(lhs.wrapping_mul(rhs)),
            TokenKind::SymbolForwardSlash => {
                if rhs == 0 {
                    return Err(ParseError::InvalidNumber {
                        pos: op.pos,
                        msg: "division by zero in constant expression".into(),
                    });
                }
                Ok(floor_div(lhs, rhs))
            }
            _ => Err(ParseError::InternalException {
                msg: format!("operator dispatch on {}", op.kind),
            }),
        }
    }

    /// primary = "(" constExpr ")" | number
    ///         | "@" ("Current" | "Origin") "(" ")"
    fn parse_const_primary(&mut self) -> Result<i64, ParseError> {
        match self.peek_kind()? {
            TokenKind::SymbolLeftParanthesis => {
                self.read()?;
                let value = self.parse_const_expr()?;
                self.expect(TokenKind::SymbolRightParanthesis)?;
                Ok(value)
            }
            TokenKind::Number => {
                let number = self.read()?;
                Ok(self.number_value(&number)? as i64)
            }
            TokenKind::SymbolAt => Ok(self.parse_address_function()? as i64),
            _ => Err(self.unexpected("a constant expression")),
        }
    }

    /// "@" ("Current" | "Origin") "(" ")"
    fn parse_address_function(&mut self) -> Result<u64, ParseError> {
        self.expect(TokenKind::SymbolAt)?;
        let name = self.read()?;
        let value = match name.kind {
            TokenKind::ReservedCurrent => self.gen.current_address(),
            TokenKind::ReservedStart => self.gen.origin(),
            _ => {
                return Err(ParseError::InvalidDirective {
                    pos: name.pos,
                    msg: format!("expected `Current` or `Origin`, found `{}`", name.lexeme),
                })
            }
        };
        self.expect(TokenKind::SymbolLeftParanthesis)?;
        self.expect(TokenKind::SymbolRightParanthesis)?;
        Ok(value)
    }
}

// ----------------------------------------------------------------------------
// Expressions & jumps
// ----------------------------------------------------------------------------

impl<T: TokenStream, W: Write> Parser<T, W> {
    /// expr = register op rhs, with the register name already read.
    fn parse_assignment_with_register(&mut self, ident: Token) -> Result<(), ParseError> {
        if resolve_register(&ident.lexeme).is_none() {
            return Err(ParseError::UnsupportedRegister {
                pos: ident.pos,
                msg: format!("unknown register `{}`", ident.lexeme),
            });
        }
        let name = ident.lexeme.to_ascii_lowercase();
        let lhs = Operand::direct(Value::Ident(name), Some(ident));
        self.parse_assignment(lhs)
    }

    /// op = "=" | "+=" | "-=" ; only plain assignment is encoded.
    fn parse_assignment(&mut self, lhs: Operand) -> Result<(), ParseError> {
        match self.peek_kind()? {
            TokenKind::SymbolEquals => {
                self.read()?;
            }
            TokenKind::SymbolPlus | TokenKind::SymbolMinus => {
                let op = self.read()?;
                self.expect(TokenKind::SymbolEquals)?;
                return Err(ParseError::Unimplemented {
                    pos: op.pos,
                    msg: format!("compound assignment `{}=` is not implemented", op.lexeme),
                });
            }
            _ => return Err(self.unexpected("`=`, `+=` or `-=`")),
        }
        let rhs = self.parse_rhs()?;

        let pos = lhs.token.as_ref().map(|t| t.pos).unwrap_or_else(Pos::start);
        if lhs.access == Access::Indirect {
            return Err(ParseError::Unimplemented {
                pos,
                msg: "memory stores are not implemented".into(),
            });
        }
        self.gen.emit_assignment(&lhs, &rhs, pos)?;
        Ok(())
    }

    /// rhs = number | "*" (ident | number) | register
    ///     | "@" ("Current" | "Origin") "(" ")"
    fn parse_rhs(&mut self) -> Result<Operand, ParseError> {
        match self.peek_kind()? {
            TokenKind::Number => {
                let number = self.read()?;
                Ok(Operand::direct(
                    Value::Const(number.lexeme.clone()),
                    Some(number),
                ))
            }
            TokenKind::SymbolAsterisk => {
                self.read()?;
                let token = self.read()?;
                match token.kind {
                    TokenKind::Identifier => Ok(Operand::indirect(
                        Value::Ident(token.lexeme.clone()),
                        Some(token),
                    )),
                    TokenKind::Number => Ok(Operand::indirect(
                        Value::Const(token.lexeme.clone()),
                        Some(token),
                    )),
                    _ => Err(ParseError::UnexpectedToken {
                        pos: token.pos,
                        msg: format!(
                            "expected an address or register after `*`, found `{}`",
                            token.lexeme
                        ),
                    }),
                }
            }
            TokenKind::Identifier => {
                let ident = self.read()?;
                if resolve_register(&ident.lexeme).is_none() {
                    return Err(ParseError::UnsupportedRegister {
                        pos: ident.pos,
                        msg: format!("unknown register `{}`", ident.lexeme),
                    });
                }
                let name = ident.lexeme.to_ascii_lowercase();
                Ok(Operand::direct(Value::Ident(name), Some(ident)))
            }
            TokenKind::SymbolAt => {
                let value = self.parse_address_function()?;
                Ok(Operand::direct(Value::Computed(value.to_string()), None))
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    /// jump = "jmp" (number | ident)
    fn parse_jump(&mut self) -> Result<(), ParseError> {
        let jmp = self.expect(TokenKind::InstructionJmp)?;
        let operand = match self.peek_kind()? {
            TokenKind::Number => {
                let number = self.read()?;
                Operand::direct(Value::Const(number.lexeme.clone()), Some(number))
            }
            TokenKind::Identifier => {
                let ident = self.read()?;
                Operand::direct(Value::Ident(ident.lexeme.clone()), Some(ident))
            }
            _ => return Err(self.unexpected("a jump target")),
        };
        self.gen.emit_jump(&operand, jmp.pos)?;
        Ok(())
    }
}
