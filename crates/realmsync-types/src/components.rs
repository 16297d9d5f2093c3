//! Component representation (storage providers, key providers, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A realm component, possibly with nested sub-components.
///
/// The natural key is (`provider_type`, `name`) within the parent scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRepresentation {
    /// Server-assigned id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Factory id, e.g. `rsa-generated`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Interface the component implements, e.g. `org.keycloak.keys.KeyProvider`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,

    /// Server id of the parent (realm id for top-level components).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, Vec<String>>,

    /// Declared sub-components; only meaningful on the desired side, the
    /// remote side lists children by parent id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_components: Vec<ComponentRepresentation>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl ComponentRepresentation {
    /// The component name, or empty string if not set.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}
