use proptest::prelude::*;
use textguard_charset::{check, Charset, ValidationMode, REPLACEMENT_CHARACTER};

fn arb_charset() -> impl Strategy<Value = Charset> {
    prop::sample::select(vec![
        Charset::UTF_8,
        Charset::UTF_16,
        Charset::UTF_16BE,
        Charset::UTF_16LE,
        Charset::ISO_8859_1,
        Charset::US_ASCII,
        Charset::for_label("windows-1252").expect("windows-1252"),
        Charset::for_label("shift_jis").expect("shift_jis"),
    ])
}

proptest! {
    #[test]
    fn strict_compliance_implies_lenient_compliance(
        bytes in prop::collection::vec(any::<u8>(), 0..64),
        charset in arb_charset(),
    ) {
        if check(&bytes, charset, ValidationMode::Strict).is_compliant() {
            prop_assert!(check(&bytes, charset, ValidationMode::Lenient).is_compliant());
        }
    }

    #[test]
    fn check_is_deterministic(
        bytes in prop::collection::vec(any::<u8>(), 0..64),
        charset in arb_charset(),
    ) {
        for mode in [ValidationMode::Lenient, ValidationMode::Strict] {
            prop_assert_eq!(check(&bytes, charset, mode), check(&bytes, charset, mode));
        }
    }

    #[test]
    fn unicode_text_is_leniently_compliant_unless_it_carries_a_replacement(
        text in any::<String>(),
        charset in prop::sample::select(vec![
            Charset::UTF_8,
            Charset::UTF_16,
            Charset::UTF_16BE,
            Charset::UTF_16LE,
        ]),
    ) {
        let bytes = charset.encode(&text).expect("unicode charsets encode every string");
        let compliant = check(&bytes, charset, ValidationMode::Lenient).is_compliant();
        prop_assert_eq!(compliant, !text.contains(REPLACEMENT_CHARACTER));
    }

    #[test]
    fn latin1_text_without_controls_is_strictly_compliant(
        text in "[ -~\u{A0}-\u{FF}]{0,32}",
    ) {
        let bytes = Charset::ISO_8859_1.encode(&text).expect("latin1 text");
        prop_assert!(check(&bytes, Charset::ISO_8859_1, ValidationMode::Strict).is_compliant());
    }
}
