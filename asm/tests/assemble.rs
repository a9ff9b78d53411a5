use basm::assemble;
use std::io::Cursor;

fn case(code: &str, expect: &[u8]) {
    let gen = assemble(Cursor::new(code.to_string()), Vec::new()).unwrap();
    let counter = gen.counter();
    let bytes = gen.finish().unwrap();
    println!("{code}");
    println!("  -> {bytes:02X?}");
    assert_eq!(bytes.len() as u64, counter, "counter matches artifact size");
    assert_eq!(bytes, expect);
}

#[test]
fn mov_imm16() {
    case("@SetBitMode(16)\nax = 0x1234", &[0xB8, 0x34, 0x12]);
}

#[test]
fn mov_imm8() {
    case("@SetBitMode(16)\nal = 0x7F", &[0xB0, 0x7F]);
}

#[test]
fn mov_imm32_in_16_bit_mode() {
    case(
        "@SetBitMode(16)\neax = 0x11223344",
        &[0x66, 0xB8, 0x44, 0x33, 0x22, 0x11],
    );
}

#[test]
fn mov_imm32_in_32_bit_mode() {
    case(
        "@SetBitMode(32)\neax = 0x11223344",
        &[0xB8, 0x44, 0x33, 0x22, 0x11],
    );
}

#[test]
fn mov_boundary_values() {
    case("@SetBitMode(16)\nal = 0x0", &[0xB0, 0x00]);
    case("@SetBitMode(16)\nax = 0xFFFF", &[0xB8, 0xFF, 0xFF]);
    case(
        "@SetBitMode(32)\neax = 0xFFFFFFFF",
        &[0xB8, 0xFF, 0xFF, 0xFF, 0xFF],
    );
}

#[test]
fn self_jump_tightens() {
    // displacement -2, one byte after tightening
    case("@SetOrigin(0x7C00)\nL: jmp L", &[0xEB, 0xFE]);
}

#[test]
fn forward_jump() {
    // jump site shrinks from 3 to 2 bytes, the target shifts with it
    case("jmp end\nax = 1\nend:", &[0xEB, 0x03, 0xB8, 0x01, 0x00]);
}

#[test]
fn jump_pair() {
    case("a:\njmp b\njmp a\nb:", &[0xEB, 0x02, 0xEB, 0xFC]);
}

#[test]
fn constant_jump() {
    case(
        "@SetBitMode(16)\n@SetOrigin(0x7C00)\njmp 0x7C00",
        &[0xEB, 0xFD, 0xFF],
    );
}

#[test]
fn pad_bytes() {
    case("@SetBitMode(16)\n@PadBytes(4, 0x90)", &[0x90; 4]);
    case("@PadBytes(2)", &[0x00, 0x00]);
}

#[test]
fn pad_with_address_functions() {
    case(
        "@SetOrigin(0x100)\n@PadBytes((@Current() - @Origin()) + 2)",
        &[0x00, 0x00],
    );
}

#[test]
fn const_expr_recurses_right() {
    // no precedence: 10 - 2 + 3 groups as 10 - (2 + 3)
    case("@PadBytes(10 - 2 + 3)", &[0x00; 5]);
    // floor division
    case("@PadBytes(7 / 2)", &[0x00; 3]);
}

#[test]
fn double_words() {
    case("@DoubleWords(0xAA55)", &[0x55, 0xAA]);
    case("@DoubleWords(0x1122, 0x3344)", &[0x22, 0x11, 0x44, 0x33]);
    case("@DoubleWords()", &[]);
}

#[test]
fn empty_and_comment_only_sources() {
    case("", &[]);
    case("; just a comment\n/* and\nanother */\n", &[]);
}

#[test]
fn boot_sector_image() {
    let code = "@SetBitMode(16)\n@SetOrigin(0)\nstart:\n  ax = 0x1234\n  jmp start\n@PadBytes(510 - (@Current() - @Origin()))\n@DoubleWords(0xAA55)";
    let gen = assemble(Cursor::new(code.to_string()), Vec::new()).unwrap();
    assert_eq!(gen.labels().address_of("start"), Some(0));
    let bytes = gen.finish().unwrap();
    assert_eq!(bytes.len(), 512);
    assert_eq!(&bytes[..5], &[0xB8, 0x34, 0x12, 0xEB, 0xFB]);
    assert!(bytes[5..510].iter().all(|&b| b == 0));
    assert_eq!(&bytes[510..], &[0x55, 0xAA]);
}

#[test]
fn label_addresses_match_pass_two() {
    let code = "@SetOrigin(0x7C00)\nstart:\nax = 1\nloop:\njmp loop\ntail: cl = 2";
    let gen = assemble(Cursor::new(code.to_string()), Vec::new()).unwrap();
    // start 0x7C00, mov ax is 3 bytes, tightened jmp is 2 bytes
    assert_eq!(gen.labels().address_of("start"), Some(0x7C00));
    assert_eq!(gen.labels().address_of("loop"), Some(0x7C03));
    assert_eq!(gen.labels().address_of("tail"), Some(0x7C05));
    let bytes = gen.finish().unwrap();
    assert_eq!(bytes, vec![0xB8, 0x01, 0x00, 0xEB, 0xFE, 0xB1, 0x02]);
}

#[test]
fn wide_mode_jump_reservation() {
    // 32-bit mode reserves a 4-byte displacement, then tightens to 1
    case("@SetBitMode(32)\nL: jmp L", &[0xEB, 0xFE]);
}
