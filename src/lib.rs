//! Bidirectional bridge between annotated C headers and OpenAPI v3.2
//! specifications.
//!
//! The pipeline is leaf-first: bytes are tokenized ([`lex`]), shaped into a
//! flat construct tree ([`cst`]), paired with their documentation comments
//! ([`doc`]) and type definitions ([`inspect`]), built into operations and
//! aggregated into a spec ([`build`]). In the other direction a loaded
//! [`spec::Spec`] drives client code emission ([`codegen`]) and in-place
//! synchronization of existing sources ([`sync`]).
//!
//! # Examples
//!
//! Scanning annotated C into a spec:
//!
//! ```
//! let scan = coas::scan_source("/** @route GET /user/{id} */\nint api_user_get(int id);")?;
//! let mut agg = coas::build::Aggregator::new();
//! agg.add_file(scan);
//! let spec = agg.finish();
//! assert!(spec.operation_by_id("api_user_get").is_some());
//! # Ok::<(), coas::Error>(())
//! ```
//!
//! Loading a spec and emitting a client:
//!
//! ```no_run
//! let spec = coas::from_path("openapi.json")?;
//! let header = coas::codegen::emit_header(&spec, &coas::codegen::GenConfig::default());
//! # let _ = header;
//! # Ok::<(), coas::Error>(())
//! ```

use std::{fs::File, io::Read, path::Path};

use url::Url;

pub mod build;
pub mod cst;
pub mod doc;
mod error;
pub mod fields;
pub mod inspect;
pub mod lex;
pub mod patch;
pub mod spec;
pub mod sync;

pub mod codegen;

pub use error::{Error, ErrorKind};
pub use spec::Spec;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Deserializes an OpenAPI spec from a JSON file.
pub fn from_path<P>(path: P) -> Result<Spec>
where
    P: AsRef<Path>,
{
    from_reader(File::open(path)?)
}

/// Deserializes an OpenAPI spec from a type which implements [`Read`].
pub fn from_reader<R>(read: R) -> Result<Spec>
where
    R: Read,
{
    Ok(serde_json::from_reader::<R, Spec>(read)?)
}

/// Deserializes an OpenAPI spec from a JSON string.
pub fn from_str(json: &str) -> Result<Spec> {
    Ok(serde_json::from_str(json)?)
}

/// Deserializes an OpenAPI spec from a JSON value.
pub fn from_json_value(value: serde_json::Value) -> Result<Spec> {
    Ok(serde_json::from_value(value)?)
}

/// Loads a spec and registers it under its base URI.
///
/// The base URI is taken from `$self` when present, otherwise from
/// `retrieval_uri`; documents with neither are parsed but not registered.
/// Returns the parsed spec together with the canonical URI it was
/// registered under, if any.
pub fn load_into_registry(
    value: serde_json::Value,
    retrieval_uri: Option<&Url>,
    registry: &mut spec::DocumentRegistry,
) -> Result<(Spec, Option<Url>)> {
    let spec = from_json_value(value)?;

    let registered = spec
        .base_uri(retrieval_uri)
        .map(|base_uri| registry.insert(base_uri, spec.clone()));

    Ok((spec, registered))
}

/// Serializes a spec to a canonical JSON value.
pub fn to_json_value(spec: &Spec) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(spec)?)
}

/// Serializes a spec to a pretty-printed JSON string.
pub fn to_json(spec: &Spec) -> Result<String> {
    Ok(serde_json::to_string_pretty(spec)?)
}

/// Serializes a spec to a JSON file.
pub fn to_path<P>(spec: &Spec, path: P) -> Result<()>
where
    P: AsRef<Path>,
{
    Ok(std::fs::write(path, to_json(spec)?)?)
}

/// Scans one C source text into operations, type definitions, and
/// document-level metadata.
pub fn scan_source(src: &str) -> Result<build::FileScan> {
    Ok(build::scan_file(src)?)
}
