use std::fmt;

use encoding_rs::Encoding;

use crate::charset::{Charset, REPLACEMENT_CHARACTER};
use crate::CharsetError;

/// How much evidence of mis-decoding is tolerated.
///
/// Both modes reject substitution characters. `Strict` also rejects text that decodes but looks
/// like it was produced from a different encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationMode {
    Lenient,
    #[default]
    Strict,
}

impl ValidationMode {
    pub fn from_lenient(lenient: bool) -> Self {
        if lenient {
            ValidationMode::Lenient
        } else {
            ValidationMode::Strict
        }
    }

    pub fn is_strict(self) -> bool {
        self == ValidationMode::Strict
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationMode::Lenient => "lenient",
            ValidationMode::Strict => "strict",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a byte sequence is not a faithful encoding of text in a charset.
///
/// Offsets in `Malformed` index the input bytes; offsets in `ReplacementCharacter` and
/// `ControlCharacter` index the decoded (UTF-8) text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Malformed { offset: usize },
    ReplacementCharacter { offset: usize },
    ForeignByteOrderMark { bom: &'static str },
    ControlCharacter { ch: char, offset: usize },
    RoundTripMismatch,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Malformed { offset } => write!(f, "malformed input at byte {offset}"),
            Violation::ReplacementCharacter { offset } => {
                write!(f, "replacement character U+FFFD at offset {offset}")
            }
            Violation::ForeignByteOrderMark { bom } => write!(f, "starts with a {bom} byte order mark"),
            Violation::ControlCharacter { ch, offset } => write!(
                f,
                "control character U+{:04X} at offset {offset}",
                u32::from(*ch)
            ),
            Violation::RoundTripMismatch => f.write_str("re-encoding does not reproduce the input"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compliance {
    Compliant,
    NotCompliant(Violation),
}

impl Compliance {
    pub fn is_compliant(&self) -> bool {
        matches!(self, Compliance::Compliant)
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Compliance::Compliant => None,
            Compliance::NotCompliant(violation) => Some(violation),
        }
    }
}

/// A [`check`] bound to one [`ValidationMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplianceChecker {
    mode: ValidationMode,
}

impl ComplianceChecker {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    pub fn lenient() -> Self {
        Self::new(ValidationMode::Lenient)
    }

    pub fn strict() -> Self {
        Self::new(ValidationMode::Strict)
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn check(&self, bytes: &[u8], charset: Charset) -> Compliance {
        check(bytes, charset, self.mode)
    }
}

/// Decide whether `bytes` is a substitution-free encoding of text in `charset`.
///
/// Decoding never substitutes: a malformed sequence is reported as
/// [`Violation::Malformed`], and U+FFFD already present in the decoded text is rejected in every
/// mode. In [`ValidationMode::Strict`] the decoded text must additionally:
/// - not start with the byte order mark of another encoding,
/// - contain no control characters besides TAB, LF, FF and CR (nor U+FFFE / U+FFFF),
/// - re-encode to exactly the input bytes.
///
/// Empty input is compliant with every charset.
pub fn check(bytes: &[u8], charset: Charset, mode: ValidationMode) -> Compliance {
    let compliance = evaluate(bytes, charset, mode);
    if let Compliance::NotCompliant(violation) = &compliance {
        log::debug!(
            "{} bytes are not {mode} {charset}: {violation}",
            bytes.len()
        );
    }
    compliance
}

/// Like [`check`], resolving `label` with [`Charset::for_label`] first.
pub fn check_label(
    bytes: &[u8],
    label: &str,
    mode: ValidationMode,
) -> Result<Compliance, CharsetError> {
    let charset = Charset::for_label(label)?;
    Ok(check(bytes, charset, mode))
}

fn evaluate(bytes: &[u8], charset: Charset, mode: ValidationMode) -> Compliance {
    let decoded = match charset.decode(bytes) {
        Ok(decoded) => decoded,
        Err(err) => return Compliance::NotCompliant(Violation::Malformed { offset: err.offset }),
    };

    if let Some(offset) = decoded.text.find(REPLACEMENT_CHARACTER) {
        return Compliance::NotCompliant(Violation::ReplacementCharacter { offset });
    }

    if !mode.is_strict() {
        return Compliance::Compliant;
    }

    if let Some((bom_encoding, _)) = Encoding::for_bom(bytes) {
        if !charset.owns_bom(bom_encoding) {
            return Compliance::NotCompliant(Violation::ForeignByteOrderMark {
                bom: bom_encoding.name(),
            });
        }
    }

    if let Some((offset, ch)) = decoded
        .text
        .char_indices()
        .find(|&(_, ch)| is_suspicious_char(ch))
    {
        return Compliance::NotCompliant(Violation::ControlCharacter { ch, offset });
    }

    match decoded.effective.encode(&decoded.text) {
        Ok(reencoded) if reencoded.as_slice() == &bytes[decoded.bom_len..] => Compliance::Compliant,
        _ => Compliance::NotCompliant(Violation::RoundTripMismatch),
    }
}

fn is_suspicious_char(ch: char) -> bool {
    match ch {
        '\t' | '\n' | '\u{0C}' | '\r' => false,
        '\u{FFFE}' | '\u{FFFF}' => true,
        _ => ch.is_control(),
    }
}
