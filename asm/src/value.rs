use crate::token::Token;

/// How an operand reaches its value: directly, or through a memory
/// dereference of a constant address or register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Direct,
    Indirect,
}

/// Operand payload. Constants keep their written form (`"0x1337"`,
/// `"42"`, `"0b1010"`) and are parsed on demand so the base is still
/// known when the encoder sizes them. Address-function results
/// (`@Current()`, `@Origin()`) are tagged `Computed` so the encoders can
/// tell them from source literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Ident(String),
    Const(String),
    Computed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub access: Access,
    pub value: Value,
    pub token: Option<Token>,
}

impl Operand {
    pub fn direct(value: Value, token: Option<Token>) -> Self {
        Operand {
            access: Access::Direct,
            value,
            token,
        }
    }

    pub fn indirect(value: Value, token: Option<Token>) -> Self {
        Operand {
            access: Access::Indirect,
            value,
            token,
        }
    }
}

/// Parse a textual constant in any of the three bases.
pub fn parse_number(text: &str) -> Result<u64, String> {
    let parsed = if let Some(digits) = text.strip_prefix("0x") {
        u64::from_str_radix(digits, 16)
    } else if let Some(digits) = text.strip_prefix("0b") {
        u64::from_str_radix(digits, 2)
    } else {
        text.parse::<u64>()
    };
    parsed.map_err(|e| format!("cannot parse `{text}` as a number: {e}"))
}

/// Minimum bytes needed to hold the magnitude of a textual constant.
/// Hex and binary are sized from the written digit count, decimal from
/// the parsed value.
pub fn count_bytes(text: &str) -> Result<u32, String> {
    if let Some(digits) = text.strip_prefix("0x") {
        if digits.is_empty() {
            return Err(format!("`{text}` has no digits"));
        }
        Ok((digits.len() as u32 + 1) / 2)
    } else if let Some(digits) = text.strip_prefix("0b") {
        if digits.is_empty() {
            return Err(format!("`{text}` has no digits"));
        }
        Ok((digits.len() as u32 + 7) / 8)
    } else {
        let value = parse_number(text)?;
        let bits = 64 - value.leading_zeros();
        Ok(((bits + 7) / 8).max(1))
    }
}

/// Little-endian serialization into exactly `count` bytes, zero-padded.
pub fn bytes_from_value(text: &str, count: u32) -> Result<Vec<u8>, String> {
    let value = parse_number(text)?;
    let count = count as usize;
    let mut bytes = value.to_le_bytes().to_vec();
    if count < bytes.len() {
        if bytes[count..].iter().any(|&b| b != 0) {
            return Err(format!("`{text}` does not fit in {count} bytes"));
        }
        bytes.truncate(count);
    } else {
        bytes.resize(count, 0);
    }
    Ok(bytes)
}

/// Smallest n with `-2^(8n-1) <= v < 2^(8n-1)`.
pub fn required_bytes_for_signed_integer(v: i64) -> u32 {
    for n in 1..8 {
        let half = 1i64 << (8 * n - 1);
        if v >= -half && v < half {
            return n;
        }
    }
    8
}

/// Floor division, rounding toward negative infinity.
pub fn floor_div(lhs: i64, rhs: i64) -> i64 {
    let q = lhs / rhs;
    let r = lhs % rhs;
    if r != 0 && (r < 0) != (rhs < 0) {
        q - 1
    } else {
        q
    }
}
