use textguard_charset::{check, Charset, Compliance, ValidationMode, Violation};

const SPECIAL: &str = "àâäéèêëiìîïoòôöuùûü";

fn common_charsets() -> Vec<Charset> {
    vec![
        Charset::UTF_8,
        Charset::ISO_8859_1,
        Charset::UTF_16,
        Charset::for_label("windows-1252").expect("windows-1252"),
    ]
}

#[test]
fn special_text_is_rejected_by_a_different_charset() {
    for charset in common_charsets() {
        let other = if charset != Charset::UTF_8 {
            Charset::UTF_8
        } else {
            Charset::UTF_16
        };
        let bytes = charset.encode(SPECIAL).expect("encode special text");

        for mode in [ValidationMode::Lenient, ValidationMode::Strict] {
            let compliance = check(&bytes, other, mode);
            assert!(
                matches!(
                    compliance,
                    Compliance::NotCompliant(Violation::Malformed { .. })
                ),
                "{charset} bytes checked as {other} ({mode}) gave {compliance:?}"
            );
        }
    }
}

#[test]
fn special_text_is_accepted_by_its_own_charset() {
    for charset in common_charsets() {
        let bytes = charset.encode(SPECIAL).expect("encode special text");
        for mode in [ValidationMode::Lenient, ValidationMode::Strict] {
            assert_eq!(
                check(&bytes, charset, mode),
                Compliance::Compliant,
                "{charset} ({mode})"
            );
        }
    }
}

#[test]
fn latin1_bytes_are_not_utf8() {
    let bytes = Charset::ISO_8859_1.encode(SPECIAL).expect("encode latin1");
    assert_eq!(bytes[0], 0xE0);
    assert_eq!(
        check(&bytes, Charset::UTF_8, ValidationMode::Lenient),
        Compliance::NotCompliant(Violation::Malformed { offset: 0 })
    );
    assert_eq!(
        check(&bytes, Charset::UTF_8, ValidationMode::Strict),
        Compliance::NotCompliant(Violation::Malformed { offset: 0 })
    );
}

#[test]
fn replacement_characters_are_never_accepted() {
    let replacement = Charset::UTF_8.replacement();
    let text = [
        "line1 is ok".to_owned(),
        format!("line2 is nok{replacement}"),
        "line3 is ok".to_owned(),
        format!("line4 is nok{replacement}"),
    ]
    .join("\n");
    let bytes = Charset::UTF_8.encode(&text).expect("encode utf-8");

    let expected = Compliance::NotCompliant(Violation::ReplacementCharacter {
        offset: "line1 is ok\nline2 is nok".len(),
    });
    assert_eq!(check(&bytes, Charset::UTF_8, ValidationMode::Lenient), expected);
    assert_eq!(check(&bytes, Charset::UTF_8, ValidationMode::Strict), expected);
}

#[test]
fn utf16_without_bom_decodes_as_big_endian() {
    let bytes = Charset::UTF_16BE.encode(SPECIAL).expect("encode utf-16be");
    assert!(check(&bytes, Charset::UTF_16, ValidationMode::Strict).is_compliant());

    // Without a BOM, little-endian input is read with the wrong byte order.
    let bytes = Charset::UTF_16LE.encode("ab").expect("encode utf-16le");
    let decoded = Charset::UTF_16.decode(&bytes).expect("decode");
    assert_eq!(decoded.text, "\u{6100}\u{6200}");
}
