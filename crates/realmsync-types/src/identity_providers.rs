//! Identity-provider and identity-provider-mapper representations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A federated identity provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderRepresentation {
    /// Server-assigned internal id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,

    /// Provider alias (natural key).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Provider implementation, e.g. `oidc`, `saml`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_email: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl IdentityProviderRepresentation {
    /// The provider alias, or empty string if not set.
    #[must_use]
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or_default()
    }
}

/// A mapper attached to an identity provider.
///
/// Natural key is the mapper name under its provider alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderMapperRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Alias of the owning identity provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_provider_alias: Option<String>,

    /// Mapper implementation id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_provider_mapper: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl IdentityProviderMapperRepresentation {
    /// The mapper name, or empty string if not set.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}
