use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Example, ObjectOrReference, Spec};

/// The example (singular or keyed map) forms of a Media Type Object.
///
/// The two fields are mutually exclusive, so they are modeled as a flattened
/// sum rather than a pair of options.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MediaTypeExamples {
    /// Example of the media type.
    ///
    /// The example object SHOULD be in the correct format as specified by the media type. The
    /// `example` field is mutually exclusive of the `examples` field. Furthermore, if referencing
    /// a `schema` which contains an example, the `example` value SHALL override the example
    /// provided by the schema.
    Example {
        /// Example of the media type.
        example: serde_json::Value,
    },

    /// Examples of the media type, keyed by name; declaration order is kept.
    ///
    /// Each example object SHOULD match the media type and specified schema if present. The
    /// `examples` field is mutually exclusive of the `example` field.
    Examples {
        /// Examples of the media type.
        examples: IndexMap<String, ObjectOrReference<Example>>,
    },
}

impl MediaTypeExamples {
    /// Resolves references and returns all examples keyed by name.
    ///
    /// The singular `example` form is exposed under the `default` key.
    pub fn resolve_all(&self, spec: &Spec) -> IndexMap<String, Example> {
        match self {
            Self::Example { example } => {
                let example = Example {
                    value: Some(example.clone()),
                    ..Example::default()
                };

                let mut map = IndexMap::new();
                map.insert("default".to_owned(), example);
                map
            }

            Self::Examples { examples } => examples
                .iter()
                .filter_map(|(name, oor)| {
                    oor.resolve(spec).ok().map(|obj| (name.clone(), obj))
                })
                .collect(),
        }
    }
}
