use crate::encoding::*;

#[test]
fn decode_ascii() {
    assert_eq!(decode_utf8(b"a"), Ok(('a' as i32, 1)));
    assert_eq!(decode_utf8(b"abc"), Ok(('a' as i32, 1)));
}

#[test]
fn decode_multibyte() {
    // © U+00A9, ☃ U+2603, 😀 U+1F600
    assert_eq!(decode_utf8("©".as_bytes()), Ok((0xA9, 2)));
    assert_eq!(decode_utf8("☃".as_bytes()), Ok((0x2603, 3)));
    assert_eq!(decode_utf8("😀".as_bytes()), Ok((0x1F600, 4)));
}

#[test]
fn decode_rejects_malformed() {
    assert_eq!(decode_utf8(&[0xC2, 0x20]), Err(CharError::InvalidUtf8));
    assert_eq!(decode_utf8(&[0x80]), Err(CharError::InvalidUtf8));
    assert_eq!(decode_utf8(&[0xE2, 0x98]), Err(CharError::InvalidUtf8));
    assert_eq!(decode_utf8(&[]), Err(CharError::InvalidUtf8));
}

#[test]
fn decode_escapes() {
    assert_eq!(decode_utf8_or_escaped(b"\\n", &[]), Ok(('\n' as i32, 2)));
    assert_eq!(decode_utf8_or_escaped(b"\\t", &[]), Ok(('\t' as i32, 2)));
    assert_eq!(decode_utf8_or_escaped(b"\\\\", &[]), Ok(('\\' as i32, 2)));
    assert_eq!(decode_utf8_or_escaped(b"\\\"", &[]), Ok(('"' as i32, 2)));
    assert_eq!(decode_utf8_or_escaped(b"\\/", &[]), Ok(('/' as i32, 2)));
    assert_eq!(decode_utf8_or_escaped(b"\\x41", &[]), Ok((0x41, 4)));
    assert_eq!(decode_utf8_or_escaped(b"\\u00a9", &[]), Ok((0xA9, 6)));
    assert_eq!(decode_utf8_or_escaped(b"\\U0001f600", &[]), Ok((0x1F600, 10)));
}

#[test]
fn decode_custom_escapes() {
    let extra = [(b'-', '-' as i32), (b']', ']' as i32)];
    assert_eq!(decode_utf8_or_escaped(b"\\-", &extra), Ok(('-' as i32, 2)));
    assert_eq!(decode_utf8_or_escaped(b"\\]", &extra), Ok((']' as i32, 2)));
    // Without the extras the same input is an error.
    assert_eq!(
        decode_utf8_or_escaped(b"\\-", &[]),
        Err(CharError::InvalidEscape)
    );
}

#[test]
fn decode_rejects_bad_escapes() {
    assert_eq!(
        decode_utf8_or_escaped(b"\\z", &[]),
        Err(CharError::InvalidEscape)
    );
    assert_eq!(
        decode_utf8_or_escaped(b"\\x4", &[]),
        Err(CharError::InvalidEscape)
    );
    assert_eq!(
        decode_utf8_or_escaped(b"\\u00g9", &[]),
        Err(CharError::InvalidEscape)
    );
    assert_eq!(
        decode_utf8_or_escaped(b"\\", &[]),
        Err(CharError::InvalidEscape)
    );
}

#[test]
fn encode_round_trips() {
    for cp in [0x41, 0xA9, 0x7FF, 0x800, 0x2603, 0xFFFF, 0x10000, 0x1F600] {
        let bytes = encode_utf8(cp);
        assert_eq!(decode_utf8(&bytes), Ok((cp, bytes.len())));
    }
}

#[test]
fn escape_printing() {
    assert_eq!(escape_codepoint('a' as i32, &[]), "a");
    assert_eq!(escape_codepoint('\n' as i32, &[]), "\\n");
    assert_eq!(escape_codepoint('"' as i32, &[]), "\\\"");
    assert_eq!(escape_codepoint(0x01, &[]), "\\x01");
    assert_eq!(escape_codepoint(0x2603, &[]), "\\u2603");
    assert_eq!(escape_codepoint(0x1F600, &[]), "\\U0001f600");
    assert_eq!(escape_codepoint('-' as i32, &[('-' as i32, "\\-")]), "\\-");
}

#[test]
fn escape_bytes_mixes_utf8_and_raw() {
    assert_eq!(escape_bytes(b"ab"), "ab");
    assert_eq!(escape_bytes("©".as_bytes()), "\\xa9");
    assert_eq!(escape_bytes(&[0xFF]), "\\xff");
}
