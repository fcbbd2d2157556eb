//! `textguard-charset` decides whether a byte sequence is a faithful encoding of text in a given
//! charset.
//!
//! Decoding and encoding go through `encoding_rs`; this crate only adds the policy on top:
//! - substitution is never silent: malformed input and U+FFFD in the decoded text are both
//!   non-compliant,
//! - [`ValidationMode::Strict`] additionally looks for signs that the text was produced by a
//!   different encoding (foreign byte order marks, control characters, lossy round trips).

mod charset;
mod compliance;

pub use charset::{Charset, DecodeError, Decoded, REPLACEMENT_CHARACTER};
pub use compliance::{
    check, check_label, Compliance, ComplianceChecker, ValidationMode, Violation,
};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CharsetError {
    #[error("unknown charset `{label}`")]
    UnknownCharset { label: String },
    #[error("character {ch:?} at offset {offset} cannot be encoded in {charset}")]
    Unmappable {
        charset: &'static str,
        ch: char,
        offset: usize,
    },
}
