use crate::mode::BitMode;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Operand width of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Size {
    Bits8,
    Bits16,
    Bits32,
    Bits64,
}

impl Size {
    pub fn bytes(self) -> u32 {
        match self {
            Size::Bits8 => 1,
            Size::Bits16 => 2,
            Size::Bits32 => 4,
            Size::Bits64 => 8,
        }
    }
}

/// CPU extensions a register may require beyond the base instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Extension {
    /// Advanced Performance Extensions, doubles the GPR file to r31.
    Apx,
}

/// Closed identifier set for every supported general purpose register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Reg {
    // 8-bit
    Al,
    Cl,
    Dl,
    Bl,
    Ah,
    Ch,
    Dh,
    Bh,
    Spl,
    Bpl,
    Sil,
    Dil,
    R8b,
    R9b,
    R10b,
    R11b,
    R12b,
    R13b,
    R14b,
    R15b,
    R16b,
    R17b,
    R18b,
    R19b,
    R20b,
    R21b,
    R22b,
    R23b,
    R24b,
    R25b,
    R26b,
    R27b,
    R28b,
    R29b,
    R30b,
    R31b,
    // 16-bit
    Ax,
    Cx,
    Dx,
    Bx,
    R8w,
    R9w,
    R10w,
    R11w,
    R12w,
    R13w,
    R14w,
    R15w,
    R16w,
    R17w,
    R18w,
    R19w,
    R20w,
    R21w,
    R22w,
    R23w,
    R24w,
    R25w,
    R26w,
    R27w,
    R28w,
    R29w,
    R30w,
    R31w,
    // 32-bit
    Eax,
    Ecx,
    Edx,
    Ebx,
    Esp,
    Ebp,
    Esi,
    Edi,
    R8d,
    R9d,
    R10d,
    R11d,
    R12d,
    R13d,
    R14d,
    R15d,
    R16d,
    R17d,
    R18d,
    R19d,
    R20d,
    R21d,
    R22d,
    R23d,
    R24d,
    R25d,
    R26d,
    R27d,
    R28d,
    R29d,
    R30d,
    R31d,
    // 64-bit
    Rax,
    Rcx,
    Rdx,
    Rbx,
    Rsp,
    Rbp,
    Rsi,
    Rdi,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    R16,
    R17,
    R18,
    R19,
    R20,
    R21,
    R22,
    R23,
    R24,
    R25,
    R26,
    R27,
    R28,
    R29,
    R30,
    R31,
}

/// One entry of the register file: identity plus everything the encoder
/// needs to know about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub id: Reg,
    /// Index used in opcode-plus-register encodings. `None` for registers
    /// that never participate in them.
    pub index: Option<u8>,
    pub size: Size,
    pub supports_16bit: bool,
    pub supports_32bit: bool,
    pub supports_64bit: bool,
    pub extensions: &'static [Extension],
}

impl Register {
    pub fn supported_by(&self, mode: BitMode) -> bool {
        match mode {
            BitMode::Bit16 => self.supports_16bit,
            BitMode::Bit32 => self.supports_32bit,
            BitMode::Bit64 => self.supports_64bit,
        }
    }

    pub fn requires(&self, ext: Extension) -> bool {
        self.extensions.contains(&ext)
    }
}

// Mode legality: (16-bit, 32-bit, 64-bit).
const ALL_MODES: (bool, bool, bool) = (true, true, true);
const LONG_ONLY: (bool, bool, bool) = (false, false, true);

static REGISTERS: Lazy<IndexMap<String, Register>> = Lazy::new(build_table);

fn build_table() -> IndexMap<String, Register> {
    let mut map = IndexMap::new();
    let mut put = |name: &str,
                   index: Option<u8>,
                   size: Size,
                   modes: (bool, bool, bool),
                   extensions: &'static [Extension]| {
        let id = name.parse::<Reg>().expect("register table name");
        map.insert(
            name.to_string(),
            Register {
                id,
                index,
                size,
                supports_16bit: modes.0,
                supports_32bit: modes.1,
                supports_64bit: modes.2,
                extensions,
            },
        );
    };

    for (i, name) in ["al", "cl", "dl", "bl", "ah", "ch", "dh", "bh"]
        .iter()
        .enumerate()
    {
        put(name, Some(i as u8), Size::Bits8, ALL_MODES, &[]);
    }
    // Low-byte forms of the pointer and index registers need a REX prefix,
    // so they only exist in long mode.
    for (name, i) in [("spl", 4), ("bpl", 5), ("sil", 6), ("dil", 7)] {
        put(name, Some(i), Size::Bits8, LONG_ONLY, &[]);
    }
    for (i, name) in ["ax", "cx", "dx", "bx"].iter().enumerate() {
        put(name, Some(i as u8), Size::Bits16, ALL_MODES, &[]);
    }
    for (i, name) in ["eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi"]
        .iter()
        .enumerate()
    {
        put(name, Some(i as u8), Size::Bits32, ALL_MODES, &[]);
    }
    for (i, name) in ["rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi"]
        .iter()
        .enumerate()
    {
        put(name, Some(i as u8), Size::Bits64, LONG_ONLY, &[]);
    }
    for n in 8u8..=31 {
        // r8..r15 reuse encoding slots 0..7 behind an extension bit; the
        // APX file r16..r31 has no slot in the legacy encodings.
        let index = if n <= 15 { Some(n - 8) } else { None };
        let extensions: &'static [Extension] = if n >= 16 { &[Extension::Apx] } else { &[] };
        put(&format!("r{n}b"), index, Size::Bits8, LONG_ONLY, extensions);
        put(&format!("r{n}w"), index, Size::Bits16, LONG_ONLY, extensions);
        put(&format!("r{n}d"), index, Size::Bits32, LONG_ONLY, extensions);
        put(&format!("r{n}"), index, Size::Bits64, LONG_ONLY, extensions);
    }
    map
}

/// Look up a register by name, case-insensitively.
pub fn resolve_register(name: &str) -> Option<&'static Register> {
    REGISTERS.get(name.to_ascii_lowercase().as_str())
}

pub fn supports_register(name: &str) -> bool {
    resolve_register(name).is_some()
}

#[test]
fn test() {
    assert_eq!(REGISTERS.len(), 128);

    let ax = resolve_register("ax").unwrap();
    assert_eq!(ax.id, Reg::Ax);
    assert_eq!(ax.index, Some(0));
    assert_eq!(ax.size, Size::Bits16);
    assert!(ax.supported_by(BitMode::Bit16));

    // Lookup ignores case, the table itself is lowercase.
    assert_eq!(resolve_register("EAX").unwrap().id, Reg::Eax);

    let r8 = resolve_register("r8").unwrap();
    assert_eq!(r8.index, Some(0));
    assert!(!r8.supported_by(BitMode::Bit16));
    assert!(!r8.supported_by(BitMode::Bit32));
    assert!(r8.supported_by(BitMode::Bit64));
    assert!(r8.extensions.is_empty());

    let r20w = resolve_register("r20w").unwrap();
    assert_eq!(r20w.index, None);
    assert_eq!(r20w.size, Size::Bits16);
    assert!(r20w.requires(Extension::Apx));

    assert!(supports_register("bpl"));
    assert!(!supports_register("xmm0"));
    assert!(!supports_register("r32"));
}
