//! Organization representations and the desired-state wrapper.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An organization as stored by the identity server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRepresentation {
    /// Server-assigned id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Organization name (natural key).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<OrganizationDomain>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Vec<String>>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl OrganizationRepresentation {
    /// The organization name, or empty string if not set.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// An email domain owned by an organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDomain {
    pub name: String,

    #[serde(default)]
    pub verified: bool,
}

/// Declared organization: the wire representation plus import-only member
/// usernames and linked identity-provider aliases, which the wire format
/// has no place for (composition, not subclassing).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredOrganization {
    /// Wire-format organization settings.
    pub organization: OrganizationRepresentation,

    /// Usernames of declared members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,

    /// Aliases of identity providers linked to this organization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identity_providers: Vec<String>,
}

impl DesiredOrganization {
    /// The organization name, or empty string if not set.
    #[must_use]
    pub fn name(&self) -> &str {
        self.organization.name()
    }
}
