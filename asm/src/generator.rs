use crate::encode;
use crate::error::GenError;
use crate::label::Labels;
use crate::token::Pos;
use crate::value::{self, Access, Operand, Value};
use std::io::Write;
use x86_arch::{resolve_register, BitMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    First,
    Second,
}

/// A jump whose target address was unknown when it was emitted. Recorded
/// in pass one at worst-case size, tightened before pass two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingJump {
    /// Address of the opcode byte.
    pub emit_address: u64,
    /// Displacement width in bytes.
    pub size: u32,
    /// Key into the label table.
    pub target: String,
}

/// Two-pass emitter. Pass one only advances the address counter and
/// collects labels and pending jumps; pass two replays the exact same
/// emissions and writes bytes to the sink.
#[derive(Debug)]
pub struct Generator<W: Write> {
    origin: u64,
    counter: u64,
    bit_mode: BitMode,
    pass: Pass,
    labels: Labels,
    pending: Vec<PendingJump>,
    pending_cursor: usize,
    writer: Option<W>,
}

impl<W: Write> Generator<W> {
    pub fn new(writer: Option<W>) -> Self {
        Generator {
            origin: 0,
            counter: 0,
            bit_mode: BitMode::default(),
            pass: Pass::First,
            labels: Labels::new(),
            pending: Vec::new(),
            pending_cursor: 0,
            writer,
        }
    }

    pub fn current_address(&self) -> u64 {
        self.origin + self.counter
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    /// Bytes emitted so far; after pass two this is the artifact length.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn bit_mode(&self) -> BitMode {
        self.bit_mode
    }

    pub fn pass(&self) -> Pass {
        self.pass
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn pending_jumps(&self) -> &[PendingJump] {
        &self.pending
    }

    /// Hand back the byte sink, e.g. to inspect an in-memory artifact.
    pub fn finish(self) -> Option<W> {
        self.writer
    }

    pub fn process_set_bit_mode(&mut self, mode: BitMode) {
        self.bit_mode = mode;
    }

    pub fn process_set_origin(&mut self, addr: u64) {
        self.origin = addr;
    }

    pub fn process_label(&mut self, name: &str) {
        let addr = self.current_address();
        self.labels.define(name, addr);
    }

    /// Advance the counter, and write on pass two only.
    pub fn emit_bytes(&mut self, bytes: &[u8]) -> Result<(), GenError> {
        self.counter += bytes.len() as u64;
        if self.pass == Pass::Second {
            if let Some(writer) = &mut self.writer {
                writer
                    .write_all(bytes)
                    .map_err(|e| GenError::InternalException {
                        msg: format!("write to output failed: {e}"),
                    })?;
            }
        }
        Ok(())
    }

    pub fn process_pad_bytes(&mut self, count: i64, byte: u8) -> Result<(), GenError> {
        if count < 0 {
            return Err(GenError::InternalException {
                msg: format!("pad count is negative: {count}"),
            });
        }
        self.emit_bytes(&vec![byte; count as usize])
    }

    pub fn emit_double_word(&mut self, value: u64) -> Result<(), GenError> {
        self.emit_bytes(&[(value & 0xFF) as u8, ((value >> 8) & 0xFF) as u8])
    }

    /// Move encoding. Fully implemented for `register = constant`;
    /// register and address-function sources pass through unencoded.
    pub fn emit_assignment(
        &mut self,
        lhs: &Operand,
        rhs: &Operand,
        pos: Pos,
    ) -> Result<(), GenError> {
        let dst = match (&lhs.access, &lhs.value) {
            (Access::Direct, Value::Ident(name)) => {
                resolve_register(name).ok_or_else(|| GenError::InternalException {
                    msg: format!("unknown register `{name}`"),
                })?
            }
            _ => return Ok(()),
        };
        match (&rhs.access, &rhs.value) {
            (Access::Direct, Value::Const(text)) => {
                let bytes = encode::mov_reg_imm(dst, text, self.bit_mode, pos)?;
                self.emit_bytes(&bytes)
            }
            _ => Ok(()),
        }
    }

    pub fn emit_jump(&mut self, operand: &Operand, pos: Pos) -> Result<(), GenError> {
        let width = self.bit_mode.operand_bytes();
        match &operand.value {
            Value::Const(text) => {
                let needed = value::count_bytes(text).map_err(|msg| GenError::InternalException {
                    msg,
                })?;
                if needed > width {
                    return Err(GenError::InternalException {
                        msg: format!(
                            "`{text}` at {pos} exceeds the {width}-byte displacement, far jumps are reserved"
                        ),
                    });
                }
                let target =
                    value::parse_number(text).map_err(|msg| GenError::InternalException { msg })?
                        as i64;
                let disp = target - (self.current_address() as i64 + 1 + width as i64);
                self.emit_bytes(&encode::jmp_rel(disp, width))
            }
            Value::Ident(name) => match self.pass {
                Pass::First => {
                    self.labels.declare(name);
                    let emit_address = self.current_address();
                    self.pending.push(PendingJump {
                        emit_address,
                        size: width,
                        target: name.clone(),
                    });
                    self.emit_bytes(&vec![0u8; 1 + width as usize])
                }
                Pass::Second => {
                    let record = self
                        .pending
                        .get(self.pending_cursor)
                        .cloned()
                        .ok_or_else(|| GenError::InternalException {
                            msg: format!("jump to `{name}` at {pos} has no pass-one record"),
                        })?;
                    self.pending_cursor += 1;
                    let target = self.labels.address_of(&record.target).ok_or_else(|| {
                        GenError::InternalException {
                            msg: format!("undefined label `{}`", record.target),
                        }
                    })?;
                    let disp =
                        target as i64 - (self.current_address() as i64 + 1 + record.size as i64);
                    self.emit_bytes(&encode::jmp_rel(disp, record.size))
                }
            },
            Value::Computed(_) => Err(GenError::InternalException {
                msg: format!("computed jump targets are not supported, at {pos}"),
            }),
        }
    }

    /// Branch tightening. Walks the pending jumps in emission order,
    /// shrinks each reservation to the width the resolved distance
    /// needs, and shifts every symbol and later jump site behind the
    /// shrunk reservation.
    fn finalize_first_pass(&mut self) -> Result<(), GenError> {
        for i in 0..self.pending.len() {
            let emit_address = self.pending[i].emit_address;
            let reserved = self.pending[i].size;
            let target = self.pending[i].target.clone();
            let target_addr = self.labels.address_of(&target).ok_or_else(|| {
                GenError::InternalException {
                    msg: format!("undefined label `{target}`"),
                }
            })?;
            let needed =
                value::required_bytes_for_signed_integer(target_addr as i64 - emit_address as i64);
            if needed > reserved {
                return Err(GenError::InternalException {
                    msg: format!("jump to `{target}` exceeds its reserved encoding"),
                });
            }
            if needed < reserved {
                let delta = (reserved - needed) as u64;
                let reservation_end = emit_address + 1 + reserved as u64;
                self.labels.shift_down(reservation_end, delta);
                for later in self.pending[i + 1..].iter_mut() {
                    if later.emit_address >= reservation_end {
                        later.emit_address -= delta;
                    }
                }
                self.pending[i].size = needed;
            }
        }
        Ok(())
    }

    /// First-to-second transition around the parser's re-scan.
    pub fn next_pass(&mut self) -> Result<(), GenError> {
        if self.pass == Pass::Second {
            return Err(GenError::InvalidParsingPass {
                msg: "the generator is already in its second pass".into(),
            });
        }
        self.finalize_first_pass()?;
        self.origin = 0;
        self.counter = 0;
        self.bit_mode = BitMode::default();
        self.pending_cursor = 0;
        self.pass = Pass::Second;
        Ok(())
    }
}
