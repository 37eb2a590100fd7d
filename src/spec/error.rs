use derive_more::derive::{Display, Error, From};
use semver::Version;

use crate::spec::r#ref::RefError;

/// Spec errors.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Referenced object was not of the expected type or could not be found.
    #[display("Reference error")]
    Ref(RefError),

    /// The `openapi` field did not hold a parseable semantic version.
    #[display("Semver error")]
    SemVerError(semver::Error),

    /// The document declares a version outside the supported range.
    #[display("Unsupported spec file version ({_0})")]
    UnsupportedSpecFileVersion(#[error(not(source))] Version),
}
