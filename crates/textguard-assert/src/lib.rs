//! Encoding assertions over files and in-memory content.
//!
//! Each assertion reads its subject, runs [`textguard_charset::check`] and turns the verdict into
//! a `Result`. The single-argument forms use [`ValidationMode::default`] (strict).

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use textguard_charset::{check, Charset, Compliance, ValidationMode, Violation};
use thiserror::Error;

/// What an assertion was made about, for failure messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    File(PathBuf),
    Bytes(String),
}

impl Subject {
    fn noun(&self) -> &'static str {
        match self {
            Subject::File(_) => "File",
            Subject::Bytes(_) => "Input",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::File(path) => write!(f, "file: {}", path.display()),
            Subject::Bytes(description) => write!(f, "input: {description}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("{} should not be encoded in {charset} ({mode} validation)\n  {subject}", .subject.noun())]
    EncodedIn {
        subject: Subject,
        charset: Charset,
        mode: ValidationMode,
    },
    #[error("{} should be encoded in {charset} ({mode} validation) but found {violation}\n  {subject}", .subject.noun())]
    NotEncodedIn {
        subject: Subject,
        charset: Charset,
        mode: ValidationMode,
        violation: Violation,
    },
    #[error("failed to read {subject}: {source}")]
    Io {
        subject: Subject,
        #[source]
        source: io::Error,
    },
}

fn expect_encoded(
    subject: impl FnOnce() -> Subject,
    bytes: &[u8],
    charset: Charset,
    mode: ValidationMode,
) -> Result<(), AssertionError> {
    match check(bytes, charset, mode) {
        Compliance::Compliant => Ok(()),
        Compliance::NotCompliant(violation) => Err(AssertionError::NotEncodedIn {
            subject: subject(),
            charset,
            mode,
            violation,
        }),
    }
}

fn expect_not_encoded(
    subject: impl FnOnce() -> Subject,
    bytes: &[u8],
    charset: Charset,
    mode: ValidationMode,
) -> Result<(), AssertionError> {
    match check(bytes, charset, mode) {
        Compliance::NotCompliant(_) => Ok(()),
        Compliance::Compliant => Err(AssertionError::EncodedIn {
            subject: subject(),
            charset,
            mode,
        }),
    }
}

/// Encoding assertions about the current contents of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAssert {
    path: PathBuf,
}

impl FileAssert {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_encoded_in(&self, charset: Charset) -> Result<(), AssertionError> {
        self.is_encoded_in_with(charset, ValidationMode::default())
    }

    pub fn is_encoded_in_with(
        &self,
        charset: Charset,
        mode: ValidationMode,
    ) -> Result<(), AssertionError> {
        let bytes = self.read()?;
        expect_encoded(|| self.subject(), &bytes, charset, mode)
    }

    pub fn is_not_encoded_in(&self, charset: Charset) -> Result<(), AssertionError> {
        self.is_not_encoded_in_with(charset, ValidationMode::default())
    }

    /// Passes when the file's bytes are *not* a compliant encoding in `charset` under `mode`.
    ///
    /// Fails with [`AssertionError::EncodedIn`], whose message reads
    /// `File should not be encoded in <charset>` followed by the file path.
    pub fn is_not_encoded_in_with(
        &self,
        charset: Charset,
        mode: ValidationMode,
    ) -> Result<(), AssertionError> {
        let bytes = self.read()?;
        expect_not_encoded(|| self.subject(), &bytes, charset, mode)
    }

    fn subject(&self) -> Subject {
        Subject::File(self.path.clone())
    }

    fn read(&self) -> Result<Vec<u8>, AssertionError> {
        log::trace!("reading {} for an encoding assertion", self.path.display());
        textguard_fs::read_bytes(&self.path).map_err(|source| AssertionError::Io {
            subject: self.subject(),
            source,
        })
    }
}

/// Encoding assertions about content already in memory (or drained from a reader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesAssert {
    description: String,
    bytes: Vec<u8>,
}

impl BytesAssert {
    pub fn new(description: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            description: description.into(),
            bytes: bytes.into(),
        }
    }

    /// Drain `reader` to its end. The reader is consumed once; every assertion then runs against
    /// the same buffered bytes.
    pub fn from_reader(
        description: impl Into<String>,
        mut reader: impl Read,
    ) -> Result<Self, AssertionError> {
        let description = description.into();
        let mut bytes = Vec::new();
        if let Err(source) = reader.read_to_end(&mut bytes) {
            return Err(AssertionError::Io {
                subject: Subject::Bytes(description),
                source,
            });
        }
        Ok(Self { description, bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_encoded_in(&self, charset: Charset) -> Result<(), AssertionError> {
        self.is_encoded_in_with(charset, ValidationMode::default())
    }

    pub fn is_encoded_in_with(
        &self,
        charset: Charset,
        mode: ValidationMode,
    ) -> Result<(), AssertionError> {
        expect_encoded(|| self.subject(), &self.bytes, charset, mode)
    }

    pub fn is_not_encoded_in(&self, charset: Charset) -> Result<(), AssertionError> {
        self.is_not_encoded_in_with(charset, ValidationMode::default())
    }

    pub fn is_not_encoded_in_with(
        &self,
        charset: Charset,
        mode: ValidationMode,
    ) -> Result<(), AssertionError> {
        expect_not_encoded(|| self.subject(), &self.bytes, charset, mode)
    }

    fn subject(&self) -> Subject {
        Subject::Bytes(self.description.clone())
    }
}
