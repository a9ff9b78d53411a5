use serde::{Deserialize, Serialize};
use std::fmt;

/// Processor operating width. Governs the default operand size and which
/// registers are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitMode {
    #[default]
    Bit16,
    Bit32,
    Bit64,
}

impl BitMode {
    pub fn from_width(width: u64) -> Option<Self> {
        match width {
            16 => Some(BitMode::Bit16),
            32 => Some(BitMode::Bit32),
            64 => Some(BitMode::Bit64),
            _ => None,
        }
    }

    pub fn width(self) -> u32 {
        match self {
            BitMode::Bit16 => 16,
            BitMode::Bit32 => 32,
            BitMode::Bit64 => 64,
        }
    }

    /// Width in bytes of a mode-sized operand, e.g. a jump displacement.
    pub fn operand_bytes(self) -> u32 {
        self.width() / 8
    }
}

impl fmt::Display for BitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.width())
    }
}

#[test]
fn test() {
    assert_eq!(BitMode::from_width(16), Some(BitMode::Bit16));
    assert_eq!(BitMode::from_width(64), Some(BitMode::Bit64));
    assert_eq!(BitMode::from_width(8), None);
    assert_eq!(BitMode::Bit32.operand_bytes(), 4);
    assert_eq!(BitMode::default(), BitMode::Bit16);
    assert_eq!(format!("{}", BitMode::Bit16), "16");
}
