//! Role representations and declared role collections.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A realm-level or client-level role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
    /// Server-assigned id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Role name (natural key within its scope).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the role grants other roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<bool>,

    /// Whether this is a client-level role (server-managed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_role: Option<bool>,

    /// Server id of the container: the realm id, or the owning client's id
    /// for client-level roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,

    /// Declared composite targets, per axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composites: Option<CompositesSpec>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Vec<String>>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl RoleRepresentation {
    /// The role name, or empty string if not set.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Declared composite targets of one role: realm-level target names plus
/// client-level target names grouped by clientId.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositesSpec {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub realm: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub client: BTreeMap<String, BTreeSet<String>>,
}

impl CompositesSpec {
    /// True when neither axis declares any target.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.realm.is_empty() && self.client.values().all(BTreeSet::is_empty)
    }
}

/// Declared roles for one realm: realm-level roles plus client-level roles
/// grouped by the owning client's clientId.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredRoles {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realm: Vec<RoleRepresentation>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub client: BTreeMap<String, Vec<RoleRepresentation>>,
}
