use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use encoding_rs::{
    DecoderResult, EncoderResult, Encoding, REPLACEMENT, UTF_16BE, UTF_16LE, UTF_8,
};

use crate::CharsetError;

/// The character a decoder substitutes for byte sequences it cannot map.
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// A character encoding that text can be checked against.
///
/// Most encodings are backed directly by an [`encoding_rs::Encoding`]. A few differ from their
/// WHATWG meaning and are handled here:
/// - `UTF-16` sniffs a byte order mark and falls back to big-endian (WHATWG maps the label to
///   little-endian and cannot encode UTF-16 at all).
/// - `ISO-8859-1` is the real Latin-1 mapping where byte `n` decodes to `U+00nn` (WHATWG maps the
///   label to windows-1252).
/// - `US-ASCII` rejects every byte above `0x7F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Charset {
    kind: Kind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Utf8,
    Utf16,
    Utf16Be,
    Utf16Le,
    Latin1,
    Ascii,
    Legacy(&'static Encoding),
}

/// Text produced by [`Charset::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    /// Charset the payload was actually decoded with. Differs from the requested charset only for
    /// BOM-sniffing `UTF-16`, which resolves to one of the fixed-endian variants.
    pub effective: Charset,
    /// Number of leading bytes consumed as a byte order mark.
    pub bom_len: usize,
}

/// Input that cannot be decoded without substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("malformed {charset} input at byte {offset}")]
pub struct DecodeError {
    pub charset: Charset,
    pub offset: usize,
}

impl Charset {
    pub const UTF_8: Charset = Charset { kind: Kind::Utf8 };
    pub const UTF_16: Charset = Charset { kind: Kind::Utf16 };
    pub const UTF_16BE: Charset = Charset {
        kind: Kind::Utf16Be,
    };
    pub const UTF_16LE: Charset = Charset {
        kind: Kind::Utf16Le,
    };
    pub const ISO_8859_1: Charset = Charset { kind: Kind::Latin1 };
    pub const US_ASCII: Charset = Charset { kind: Kind::Ascii };

    /// Resolve a charset label such as `"UTF-8"`, `"latin1"` or `"windows-1252"`.
    ///
    /// Matching is ASCII case-insensitive and ignores surrounding whitespace.
    pub fn for_label(label: &str) -> Result<Charset, CharsetError> {
        let normalized = label.trim().to_ascii_lowercase();
        let remapped = match normalized.as_str() {
            "utf-16" | "utf16" | "unicode" => Some(Charset::UTF_16),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "iso88591" | "latin1" | "l1" => {
                Some(Charset::ISO_8859_1)
            }
            "us-ascii" | "ascii" | "iso646-us" => Some(Charset::US_ASCII),
            _ => None,
        };
        if let Some(charset) = remapped {
            note_remapped_label(&normalized, charset);
            return Ok(charset);
        }

        let encoding = Encoding::for_label(normalized.as_bytes()).ok_or_else(|| {
            CharsetError::UnknownCharset {
                label: label.to_owned(),
            }
        })?;
        Charset::from_encoding(encoding).map_err(|_| CharsetError::UnknownCharset {
            label: label.to_owned(),
        })
    }

    /// Wrap an `encoding_rs` encoding.
    ///
    /// The WHATWG `replacement` encoding decodes everything to U+FFFD and is rejected.
    pub fn from_encoding(encoding: &'static Encoding) -> Result<Charset, CharsetError> {
        if encoding == REPLACEMENT {
            return Err(CharsetError::UnknownCharset {
                label: encoding.name().to_owned(),
            });
        }
        let kind = if encoding == UTF_8 {
            Kind::Utf8
        } else if encoding == UTF_16BE {
            Kind::Utf16Be
        } else if encoding == UTF_16LE {
            Kind::Utf16Le
        } else {
            Kind::Legacy(encoding)
        };
        Ok(Charset { kind })
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            Kind::Utf8 => "UTF-8",
            Kind::Utf16 => "UTF-16",
            Kind::Utf16Be => "UTF-16BE",
            Kind::Utf16Le => "UTF-16LE",
            Kind::Latin1 => "ISO-8859-1",
            Kind::Ascii => "US-ASCII",
            Kind::Legacy(encoding) => encoding.name(),
        }
    }

    /// The string a lossy decoder of this charset emits for undecodable input.
    pub fn replacement(&self) -> &'static str {
        "\u{FFFD}"
    }

    /// Whether a byte order mark detected by [`Encoding::for_bom`] belongs to this charset.
    pub(crate) fn owns_bom(&self, bom_encoding: &'static Encoding) -> bool {
        match self.kind {
            Kind::Utf8 => bom_encoding == UTF_8,
            Kind::Utf16 => bom_encoding == UTF_16BE || bom_encoding == UTF_16LE,
            Kind::Utf16Be => bom_encoding == UTF_16BE,
            Kind::Utf16Le => bom_encoding == UTF_16LE,
            Kind::Latin1 | Kind::Ascii | Kind::Legacy(_) => false,
        }
    }

    /// Decode `bytes` without substitution.
    ///
    /// Only `UTF-16` consumes a byte order mark; every other charset decodes BOM bytes like any
    /// other input.
    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        match self.kind {
            Kind::Utf16 => {
                let (effective, encoding, bom_len) = match Encoding::for_bom(bytes) {
                    Some((encoding, len)) if encoding == UTF_16LE => {
                        (Charset::UTF_16LE, UTF_16LE, len)
                    }
                    Some((encoding, len)) if encoding == UTF_16BE => {
                        (Charset::UTF_16BE, UTF_16BE, len)
                    }
                    _ => (Charset::UTF_16BE, UTF_16BE, 0),
                };
                let text = decode_without_replacement(encoding, &bytes[bom_len..]).map_err(
                    |offset| DecodeError {
                        charset: *self,
                        offset: bom_len + offset,
                    },
                )?;
                Ok(Decoded {
                    text,
                    effective,
                    bom_len,
                })
            }
            Kind::Latin1 => Ok(self.decoded(encoding_rs::mem::decode_latin1(bytes).into_owned())),
            Kind::Ascii => {
                let valid_up_to = Encoding::ascii_valid_up_to(bytes);
                if valid_up_to < bytes.len() {
                    return Err(DecodeError {
                        charset: *self,
                        offset: valid_up_to,
                    });
                }
                // All bytes are ASCII, so Latin-1 decoding is the identity.
                Ok(self.decoded(encoding_rs::mem::decode_latin1(bytes).into_owned()))
            }
            Kind::Utf8 => self.decode_with(UTF_8, bytes),
            Kind::Utf16Be => self.decode_with(UTF_16BE, bytes),
            Kind::Utf16Le => self.decode_with(UTF_16LE, bytes),
            Kind::Legacy(encoding) => self.decode_with(encoding, bytes),
        }
    }

    fn decode_with(&self, encoding: &'static Encoding, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        decode_without_replacement(encoding, bytes)
            .map(|text| self.decoded(text))
            .map_err(|offset| DecodeError {
                charset: *self,
                offset,
            })
    }

    fn decoded(&self, text: String) -> Decoded {
        Decoded {
            text,
            effective: *self,
            bom_len: 0,
        }
    }

    /// Encode `text`, failing on the first character this charset cannot represent.
    ///
    /// `UTF-16` output starts with a big-endian byte order mark (`FE FF`).
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, CharsetError> {
        match self.kind {
            Kind::Utf8 => Ok(text.as_bytes().to_vec()),
            Kind::Utf16 => {
                let mut out = Vec::with_capacity(2 + text.len() * 2);
                out.extend_from_slice(&[0xFE, 0xFF]);
                out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                Ok(out)
            }
            Kind::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Kind::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            Kind::Latin1 => {
                self.first_unmappable(text, |ch| u32::from(ch) <= 0xFF)?;
                Ok(encoding_rs::mem::encode_latin1_lossy(text).into_owned())
            }
            Kind::Ascii => {
                self.first_unmappable(text, |ch| ch.is_ascii())?;
                Ok(text.as_bytes().to_vec())
            }
            Kind::Legacy(encoding) => encode_without_replacement(*self, encoding, text),
        }
    }

    fn first_unmappable(&self, text: &str, mappable: impl Fn(char) -> bool) -> Result<(), CharsetError> {
        match text.char_indices().find(|&(_, ch)| !mappable(ch)) {
            Some((offset, ch)) => Err(CharsetError::Unmappable {
                charset: self.name(),
                ch,
                offset,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = CharsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Charset::for_label(s)
    }
}

/// Returns the decoded text, or the byte offset where the first malformed sequence starts.
fn decode_without_replacement(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, usize> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut text = String::with_capacity(bytes.len());
    let mut total_read = 0usize;
    loop {
        let (result, read) =
            decoder.decode_to_string_without_replacement(&bytes[total_read..], &mut text, true);
        total_read += read;
        match result {
            DecoderResult::InputEmpty => return Ok(text),
            DecoderResult::OutputFull => {
                let remaining = bytes.len() - total_read;
                let additional = decoder
                    .max_utf8_buffer_length_without_replacement(remaining)
                    .unwrap_or(remaining);
                text.reserve(additional.max(16));
            }
            DecoderResult::Malformed(bad, extra) => {
                // `total_read` includes the malformed sequence and any bytes consumed after it.
                return Err(total_read.saturating_sub(usize::from(bad) + usize::from(extra)));
            }
        }
    }
}

fn encode_without_replacement(
    charset: Charset,
    encoding: &'static Encoding,
    text: &str,
) -> Result<Vec<u8>, CharsetError> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut total_read = 0usize;
    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(&text[total_read..], &mut out, true);
        total_read += read;
        match result {
            EncoderResult::InputEmpty => return Ok(out),
            EncoderResult::OutputFull => {
                let remaining = text.len() - total_read;
                let additional = encoder
                    .max_buffer_length_from_utf8_without_replacement(remaining)
                    .unwrap_or(remaining);
                out.reserve(additional.max(16));
            }
            EncoderResult::Unmappable(ch) => {
                return Err(CharsetError::Unmappable {
                    charset: charset.name(),
                    ch,
                    offset: total_read - ch.len_utf8(),
                });
            }
        }
    }
}

fn note_remapped_label(label: &str, charset: Charset) {
    static NOTED: OnceLock<Mutex<BTreeSet<String>>> = OnceLock::new();

    let noted = NOTED.get_or_init(|| Mutex::new(BTreeSet::new()));
    let mut noted = match noted.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if noted.insert(label.to_owned()) {
        log::debug!("charset label `{label}` resolves to {charset} instead of its WHATWG alias");
    }
}
