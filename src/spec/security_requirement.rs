use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Lists required security schemes to execute an operation.
///
/// Each name MUST correspond to a security scheme declared in the Components Object, or be an
/// absolute URI resolving to one. A request is authorized when every scheme in one requirement
/// set is satisfied (AND within a set, OR across the `security` array). An empty `security`
/// array means "no security"; an absent one means "inherit from the root".
///
/// See <https://spec.openapis.org/oas/v3.2.0#security-requirement-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
#[serde(transparent)]
pub struct SecurityRequirement {
    /// Scheme name (or absolute scheme URI) to list of required scopes.
    pub schemes: IndexMap<String, Vec<String>>,
}

impl SecurityRequirement {
    /// Returns `true` when the set names `scheme`.
    ///
    /// Absolute URIs ending in `#/components/securitySchemes/<scheme>` are
    /// canonicalized before matching.
    pub fn names_scheme(&self, scheme: &str) -> bool {
        self.schemes
            .keys()
            .any(|key| canonical_scheme_name(key) == scheme)
    }
}

/// Reduces a requirement identifier to its bare scheme name.
pub(crate) fn canonical_scheme_name(identifier: &str) -> &str {
    match identifier.split_once('#') {
        Some((_, fragment)) => fragment
            .strip_prefix("/components/securitySchemes/")
            .unwrap_or(identifier),
        None => identifier,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn canonicalizes_absolute_scheme_uris() {
        assert_eq!(
            canonical_scheme_name(
                "https://example.com/api.json#/components/securitySchemes/bearerAuth"
            ),
            "bearerAuth"
        );
        assert_eq!(canonical_scheme_name("bearerAuth"), "bearerAuth");
    }

    #[test]
    fn matches_scheme_in_requirement_set() {
        let requirement = serde_json::from_str::<SecurityRequirement>(
            r#"{ "ApiKeyAuth": [], "bearerAuth": ["read:pets"] }"#,
        )
        .unwrap();

        assert!(requirement.names_scheme("ApiKeyAuth"));
        assert!(requirement.names_scheme("bearerAuth"));
        assert!(!requirement.names_scheme("basicAuth"));
    }
}
