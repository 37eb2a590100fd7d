//! Error types.

use std::io;

use derive_more::derive::{Display, Error, From};

use crate::{cst, lex, patch, spec, sync};

/// Stable error taxonomy, mirroring the POSIX `errno` space for
/// portability of exit-code mapping in hosting layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structurally malformed input (JSON, C source, doc comment).
    InvalidInput,
    /// Allocation failure during parsing or emission.
    OutOfMemory,
    /// Missing file or missing referenced component.
    NotFound,
    /// Transport failure when reading or writing files.
    IOError,
    /// Numeric literal overflow.
    OutOfRange,
    /// Platform-backed feature not compiled in.
    Unsupported,
}

/// Top-level errors, tagged by originating component.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// I/O error.
    #[display("I/O error")]
    Io(io::Error),

    /// JSON error.
    #[display("JSON error")]
    Json(serde_json::Error),

    /// Tokenizer error.
    #[display("Tokenizer error")]
    Lex(lex::Error),

    /// Numeric literal error.
    #[display("Numeric literal error")]
    Number(lex::number::Error),

    /// CST error.
    #[display("CST error")]
    Cst(cst::Error),

    /// Spec error.
    #[display("Spec error")]
    Spec(spec::Error),

    /// Patch error.
    #[display("Patch error")]
    Patch(patch::Error),

    /// Synchronization error.
    #[display("Sync error")]
    Sync(sync::Error),
}

impl Error {
    /// Maps this error onto the stable taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(err) if err.kind() == io::ErrorKind::NotFound => ErrorKind::NotFound,
            Self::Io(_) => ErrorKind::IOError,
            Self::Json(_) => ErrorKind::InvalidInput,
            Self::Lex(_) => ErrorKind::InvalidInput,
            Self::Number(lex::number::Error::OutOfRange) => ErrorKind::OutOfRange,
            Self::Number(_) => ErrorKind::InvalidInput,
            Self::Cst(_) => ErrorKind::InvalidInput,
            Self::Spec(spec::Error::Ref(spec::RefError::Unresolvable(_))) => ErrorKind::NotFound,
            Self::Spec(spec::Error::UnsupportedSpecFileVersion(_)) => ErrorKind::Unsupported,
            Self::Spec(_) => ErrorKind::InvalidInput,
            Self::Patch(_) => ErrorKind::InvalidInput,
            Self::Sync(sync::Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            Self::Sync(sync::Error::Io(_)) => ErrorKind::IOError,
            Self::Sync(_) => ErrorKind::InvalidInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let err = Error::from(lex::Error::UnterminatedString { offset: 3 });
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = Error::from(lex::number::Error::OutOfRange);
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = Error::from(spec::Error::UnsupportedSpecFileVersion(
            semver::Version::new(4, 0, 0),
        ));
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}
