use basm::{assemble, GenError, Generator, ParseError};
use std::io::Cursor;

fn run(code: &str) -> Result<Generator<Vec<u8>>, ParseError> {
    assemble(Cursor::new(code.to_string()), Vec::new())
}

fn bytes(code: &str) -> Vec<u8> {
    run(code).unwrap().finish().unwrap_or_default()
}

#[test]
fn labels_resolve_to_addresses() {
    let gen = run("@SetOrigin(0x7C00)\nstart:\nax = 0x1234\nmid: bx = 1\nend:").unwrap();
    assert_eq!(gen.labels().address_of("start"), Some(0x7C00));
    assert_eq!(gen.labels().address_of("mid"), Some(0x7C03));
    assert_eq!(gen.labels().address_of("end"), Some(0x7C06));
}

#[test]
fn unknown_registers_are_rejected() {
    assert!(matches!(
        run("foo = 1"),
        Err(ParseError::UnsupportedRegister { .. })
    ));
    assert!(matches!(
        run("ax = foo"),
        Err(ParseError::UnsupportedRegister { .. })
    ));
}

#[test]
fn unknown_directive() {
    let err = run("@Foo(1)").unwrap_err();
    assert!(matches!(err, ParseError::InvalidDirective { .. }));
    assert_eq!(err.kind(), "InvalidDirective");
}

#[test]
fn address_functions_need_expression_context() {
    assert!(matches!(
        run("@Current()"),
        Err(ParseError::InvalidDirective { .. })
    ));
}

#[test]
fn bit_mode_must_be_supported() {
    assert!(matches!(
        run("@SetBitMode(15)"),
        Err(ParseError::InvalidNumber { .. })
    ));
}

#[test]
fn directive_parens_are_mandatory() {
    assert!(matches!(
        run("@SetOrigin 5"),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

#[test]
fn reserved_operators_are_unimplemented() {
    assert!(matches!(
        run("ax += 1"),
        Err(ParseError::Unimplemented { .. })
    ));
    assert!(matches!(
        run("ax -= 1"),
        Err(ParseError::Unimplemented { .. })
    ));
    assert!(matches!(
        run("*0x1000 = 5"),
        Err(ParseError::Unimplemented { .. })
    ));
}

#[test]
fn stub_assignments_emit_nothing() {
    assert_eq!(bytes("ax = bx"), Vec::<u8>::new());
    assert_eq!(bytes("ax = @Origin()"), Vec::<u8>::new());
    assert_eq!(bytes("ax = *0x1000"), Vec::<u8>::new());
    assert_eq!(bytes("ax = *bx"), Vec::<u8>::new());
}

#[test]
fn reserved_directives_accept_empty_args() {
    assert_eq!(bytes("@Bytes()\n@Words()\n@QuadWords()"), Vec::<u8>::new());
}

#[test]
fn division_by_zero_in_const_expr() {
    assert!(matches!(
        run("@PadBytes(1 / 0)"),
        Err(ParseError::InvalidNumber { .. })
    ));
}

#[test]
fn negative_pad_count() {
    let err = run("@PadBytes(1 - 2)").unwrap_err();
    assert!(matches!(
        err,
        ParseError::GeneratorError(GenError::InternalException { .. })
    ));
    assert_eq!(err.kind(), "InternalException");
}

#[test]
fn fill_byte_range() {
    assert!(matches!(
        run("@PadBytes(1, 0x100)"),
        Err(ParseError::InvalidNumber { .. })
    ));
}

#[test]
fn undefined_jump_target() {
    let err = run("jmp nowhere").unwrap_err();
    assert!(matches!(
        err,
        ParseError::GeneratorError(GenError::InternalException { .. })
    ));
}

#[test]
fn mode_gates_registers() {
    // r8..r15 only exist in long mode
    let err = run("r8 = 1").unwrap_err();
    assert!(matches!(
        err,
        ParseError::GeneratorError(GenError::RegisterNotSupportedInBitMode { .. })
    ));
    assert_eq!(err.kind(), "RegisterNotSupportedInBitMode");
    assert!(matches!(
        run("@SetBitMode(32)\nr8d = 1"),
        Err(ParseError::GeneratorError(
            GenError::RegisterNotSupportedInBitMode { .. }
        ))
    ));
    assert!(matches!(
        run("@SetBitMode(16)\nrax = 1"),
        Err(ParseError::GeneratorError(
            GenError::RegisterNotSupportedInBitMode { .. }
        ))
    ));
}

#[test]
fn apx_registers_are_gated() {
    assert!(matches!(
        run("@SetBitMode(64)\nr20d = 1"),
        Err(ParseError::GeneratorError(GenError::InternalException { .. }))
    ));
}

#[test]
fn constant_too_wide_for_register() {
    assert!(matches!(
        run("ax = 0x11223344"),
        Err(ParseError::GeneratorError(GenError::InternalException { .. }))
    ));
}

#[test]
fn errors_carry_locations() {
    let err = run("ax = 1\nbogus = 2").unwrap_err();
    let pos = err.pos().unwrap();
    assert_eq!((pos.line, pos.col), (2, 1));
}

#[test]
fn register_names_ignore_case() {
    assert_eq!(bytes("@SetBitMode(16)\nAX = 0x1234"), vec![0xB8, 0x34, 0x12]);
}
