use crate::error::GenError;
use crate::token::Pos;
use crate::value;
use x86_arch::{BitMode, Register, Size};

/// `register = constant` move: opcode-plus-index with a little-endian
/// immediate at the register width.
pub fn mov_reg_imm(
    reg: &Register,
    text: &str,
    mode: BitMode,
    pos: Pos,
) -> Result<Vec<u8>, GenError> {
    if !reg.supported_by(mode) {
        return Err(GenError::RegisterNotSupportedInBitMode {
            pos,
            msg: format!("register `{}` is not usable in {mode}-bit mode", reg.id),
        });
    }
    if let Some(ext) = reg.extensions.first() {
        return Err(GenError::InternalException {
            msg: format!("register `{}` requires the {ext} extension", reg.id),
        });
    }
    let needed = value::count_bytes(text).map_err(|msg| GenError::InternalException { msg })?;
    let width = reg.size.bytes();
    if needed > width {
        return Err(GenError::InternalException {
            msg: format!("`{text}` does not fit in register `{}`", reg.id),
        });
    }
    let index = reg.index.ok_or_else(|| GenError::InternalException {
        msg: format!("register `{}` has no opcode index", reg.id),
    })?;
    let imm = value::bytes_from_value(text, width).map_err(|msg| GenError::InternalException { msg })?;

    let mut out = Vec::with_capacity(2 + imm.len());
    match reg.size {
        Size::Bits8 => out.push(0xB0 + index),
        Size::Bits16 => out.push(0xB8 + index),
        Size::Bits32 => {
            // operand-size prefix when the mode default is 16-bit
            if mode == BitMode::Bit16 {
                out.push(0x66);
            }
            out.push(0xB8 + index);
        }
        Size::Bits64 => {
            return Err(GenError::InternalException {
                msg: format!("64-bit immediate moves are reserved for `{}`", reg.id),
            })
        }
    }
    out.extend_from_slice(&imm);
    Ok(out)
}

/// Relative jump: `EB` followed by the displacement serialized to
/// `width` little-endian bytes.
pub fn jmp_rel(displacement: i64, width: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + width as usize);
    out.push(0xEB);
    out.extend_from_slice(&displacement.to_le_bytes()[..width as usize]);
    out
}
